use std::time::Duration;

use log::info;

use super::engine::{ChatAttachment, ChatError, DelayedReplies, Message};
use crate::notification::Notices;
use crate::settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AiModel {
    #[default]
    ChatGpt,
    Gemini,
}

impl AiModel {
    pub const ALL: [AiModel; 2] = [AiModel::ChatGpt, AiModel::Gemini];

    pub fn as_str(&self) -> &'static str {
        match self {
            AiModel::ChatGpt => "chatgpt",
            AiModel::Gemini => "gemini",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AiModel::ChatGpt => "ChatGPT",
            AiModel::Gemini => "Gemini",
        }
    }

    /// Who issues the key, for the key field placeholder
    pub fn key_vendor(&self) -> &'static str {
        match self {
            AiModel::ChatGpt => "OpenAI",
            AiModel::Gemini => "Google AI",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "chatgpt" => Some(AiModel::ChatGpt),
            "gemini" => Some(AiModel::Gemini),
            _ => None,
        }
    }

    pub fn other(&self) -> Self {
        match self {
            AiModel::ChatGpt => AiModel::Gemini,
            AiModel::Gemini => AiModel::ChatGpt,
        }
    }
}

/// Canned assistant reply, naming every attached file.
pub fn simulated_reply(model: AiModel, files: &[String]) -> String {
    let model = model.as_str();
    let mut reply = format!(
        "This is a simulated response from {model}. In a real implementation, \
         this would call the {model} API with your API key."
    );
    if !files.is_empty() {
        reply.push_str(&format!(" Attached files: {}.", files.join(", ")));
    }
    reply
}

/// The AI assistant chat panel. A new instance starts with an empty log.
pub struct AssistantChat {
    model: AiModel,
    api_key: String,
    messages: Vec<Message>,
    replies: DelayedReplies,
}

impl AssistantChat {
    pub fn new(model: AiModel, delay: Duration) -> Self {
        Self {
            model,
            api_key: String::new(),
            messages: Vec::new(),
            replies: DelayedReplies::new(delay),
        }
    }

    pub fn from_settings() -> Self {
        let model = AiModel::parse(&settings::default_model_name()).unwrap_or_default();
        Self::new(model, settings::chat_delay())
    }

    pub fn model(&self) -> AiModel {
        self.model
    }

    pub fn set_model(&mut self, model: AiModel) {
        self.model = model;
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn set_api_key(&mut self, key: impl Into<String>) {
        self.api_key = key.into();
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_waiting(&self) -> bool {
        self.replies.is_pending()
    }

    pub fn send(
        &mut self,
        text: &str,
        attachments: Vec<ChatAttachment>,
        notices: &mut Notices,
    ) -> Result<(), ChatError> {
        if text.trim().is_empty() && attachments.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if self.api_key.is_empty() {
            notices.error("Please enter your API key first");
            return Err(ChatError::MissingApiKey);
        }
        if self.replies.is_pending() {
            notices.info("Please wait for the current response");
            return Err(ChatError::Busy);
        }

        let files: Vec<String> = attachments.into_iter().map(|a| a.name).collect();
        let reply = Message::assistant(simulated_reply(self.model, &files));
        if let Err(e) = self.replies.schedule(reply) {
            notices.error("Failed to get response from AI");
            return Err(e);
        }

        info!(
            "Assistant request to {} with {} attachment(s)",
            self.model.as_str(),
            files.len()
        );
        self.messages.push(Message {
            files,
            ..Message::user(text)
        });
        Ok(())
    }

    /// Append replies that have arrived. Returns how many were added.
    pub fn poll(&mut self) -> usize {
        let arrived = self.replies.poll();
        let count = arrived.len();
        self.messages.extend(arrived);
        count
    }

    pub fn wait(&mut self, timeout: Duration) -> usize {
        let arrived = self.replies.wait(timeout);
        let count = arrived.len();
        self.messages.extend(arrived);
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::Role;

    const FAST: Duration = Duration::from_millis(20);

    #[test]
    fn send_without_key_is_rejected() {
        let mut chat = AssistantChat::new(AiModel::ChatGpt, FAST);
        let mut notices = Notices::new();

        let result = chat.send("hello", Vec::new(), &mut notices);
        assert_eq!(result, Err(ChatError::MissingApiKey));
        assert!(chat.messages().is_empty());
        assert!(notices.contains("Please enter your API key first"));
    }

    #[test]
    fn blank_text_is_ignored_silently() {
        let mut chat = AssistantChat::new(AiModel::ChatGpt, FAST);
        let mut notices = Notices::new();
        assert_eq!(
            chat.send("   ", Vec::new(), &mut notices),
            Err(ChatError::EmptyMessage)
        );
        assert_eq!(notices.count(), 0);
    }

    #[test]
    fn files_alone_can_be_sent() {
        let mut chat = AssistantChat::new(AiModel::ChatGpt, FAST);
        chat.set_api_key("sk-test");
        let mut notices = Notices::new();

        chat.send("", vec![ChatAttachment::new("scan.png", 4096)], &mut notices)
            .unwrap();
        assert_eq!(chat.messages()[0].files, vec!["scan.png".to_string()]);
        assert_eq!(chat.wait(Duration::from_secs(2)), 1);
        let reply = chat.messages().last().unwrap();
        assert_eq!(reply.role, Role::Assistant);
        assert!(reply.content.contains("scan.png"));
    }

    #[test]
    fn reply_names_model_after_delay() {
        let mut chat = AssistantChat::new(AiModel::Gemini, FAST);
        chat.set_api_key("k");
        let mut notices = Notices::new();
        chat.send("summarise", Vec::new(), &mut notices).unwrap();

        assert_eq!(chat.messages().len(), 1);
        assert_eq!(chat.wait(Duration::from_secs(2)), 1);

        let reply = &chat.messages()[1];
        assert_eq!(reply.role, Role::Assistant);
        assert!(reply.content.starts_with("This is a simulated response from gemini."));
    }

    #[test]
    fn overlapping_send_is_rejected() {
        let mut chat = AssistantChat::new(AiModel::ChatGpt, FAST);
        chat.set_api_key("k");
        let mut notices = Notices::new();
        chat.send("one", Vec::new(), &mut notices).unwrap();
        assert_eq!(
            chat.send("two", Vec::new(), &mut notices),
            Err(ChatError::Busy)
        );
        assert_eq!(chat.messages().len(), 1);
    }

    #[test]
    fn model_names_parse() {
        assert_eq!(AiModel::parse("Gemini"), Some(AiModel::Gemini));
        assert_eq!(AiModel::parse("chatgpt"), Some(AiModel::ChatGpt));
        assert_eq!(AiModel::parse("claude"), None);
    }
}
