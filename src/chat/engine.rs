//! Delayed reply plumbing shared by both chat panels
//!
//! A request spawns one short-lived thread that sleeps for the configured
//! delay and posts the reply over a channel. The UI thread drains the channel
//! with [`DelayedReplies::poll`]. Dropping the engine drops the receiver, so a
//! reply that lands afterwards is discarded by the failed send.

use std::time::Duration;

use flume::{Receiver, RecvTimeoutError, Sender};
use log::{debug, error};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    pub language: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub files: Vec<String>,
    pub code: Option<CodeBlock>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            files: Vec::new(),
            code: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            files: Vec::new(),
            code: None,
        }
    }

    pub fn with_code(mut self, language: impl Into<String>, content: impl Into<String>) -> Self {
        self.code = Some(CodeBlock {
            language: language.into(),
            content: content.into(),
        });
        self
    }
}

/// A file picked for the next outgoing message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatAttachment {
    pub name: String,
    pub size: u64,
}

impl ChatAttachment {
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ChatError {
    #[error("no API key entered")]
    MissingApiKey,
    #[error("message is empty")]
    EmptyMessage,
    #[error("a response is still pending")]
    Busy,
    #[error("waiting for a language choice")]
    AwaitingLanguage,
    #[error("chat panel is not open")]
    NotOpen,
    #[error("failed to start reply worker: {0}")]
    Worker(String),
}

type RequestId = u64;

struct Reply {
    request: RequestId,
    message: Message,
}

pub struct DelayedReplies {
    tx: Sender<Reply>,
    rx: Receiver<Reply>,
    delay: Duration,
    next_request: RequestId,
    in_flight: Option<RequestId>,
}

impl DelayedReplies {
    pub fn new(delay: Duration) -> Self {
        let (tx, rx) = flume::unbounded();
        Self {
            tx,
            rx,
            delay,
            next_request: 1,
            in_flight: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn is_pending(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Post `message` after the delay. At most one reply is pending at a time.
    pub fn schedule(&mut self, message: Message) -> Result<(), ChatError> {
        if self.in_flight.is_some() {
            return Err(ChatError::Busy);
        }
        let request = self.next_request;
        let tx = self.tx.clone();
        let delay = self.delay;

        std::thread::Builder::new()
            .name(format!("chat-reply-{request}"))
            .spawn(move || {
                std::thread::sleep(delay);
                if tx.send(Reply { request, message }).is_err() {
                    debug!("Dropping reply {request}: chat was closed");
                }
            })
            .map_err(|e| {
                error!("Failed to spawn chat reply thread: {e}");
                ChatError::Worker(e.to_string())
            })?;

        self.next_request += 1;
        self.in_flight = Some(request);
        Ok(())
    }

    /// Replies that have arrived since the last poll
    pub fn poll(&mut self) -> Vec<Message> {
        let mut arrived = Vec::new();
        while let Ok(reply) = self.rx.try_recv() {
            self.accept(reply, &mut arrived);
        }
        arrived
    }

    /// Block until the pending reply arrives or `timeout` passes.
    pub fn wait(&mut self, timeout: Duration) -> Vec<Message> {
        let mut arrived = Vec::new();
        if self.in_flight.is_none() {
            return arrived;
        }
        match self.rx.recv_timeout(timeout) {
            Ok(reply) => self.accept(reply, &mut arrived),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {}
        }
        arrived.extend(self.poll());
        arrived
    }

    fn accept(&mut self, reply: Reply, arrived: &mut Vec<Message>) {
        if self.in_flight == Some(reply.request) {
            self.in_flight = None;
        }
        arrived.push(reply.message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_arrives_after_delay() {
        let mut replies = DelayedReplies::new(Duration::from_millis(30));
        replies.schedule(Message::assistant("pong")).unwrap();

        assert!(replies.poll().is_empty());
        assert!(replies.is_pending());

        let arrived = replies.wait(Duration::from_secs(2));
        assert_eq!(arrived, vec![Message::assistant("pong")]);
        assert!(!replies.is_pending());
    }

    #[test]
    fn second_request_is_rejected_while_pending() {
        let mut replies = DelayedReplies::new(Duration::from_millis(30));
        replies.schedule(Message::assistant("one")).unwrap();
        assert_eq!(
            replies.schedule(Message::assistant("two")),
            Err(ChatError::Busy)
        );

        replies.wait(Duration::from_secs(2));
        assert!(replies.schedule(Message::assistant("three")).is_ok());
    }

    #[test]
    fn dropped_engine_discards_late_reply() {
        let mut replies = DelayedReplies::new(Duration::from_millis(10));
        replies.schedule(Message::assistant("late")).unwrap();
        drop(replies);
        std::thread::sleep(Duration::from_millis(50));
    }
}
