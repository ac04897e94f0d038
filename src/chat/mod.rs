//! Mock conversation engines
//!
//! Two chat panels with canned replies and a fixed artificial latency. No
//! request leaves the process; the API key is only checked for presence.

mod assistant;
mod developer;
mod engine;

pub use assistant::{AiModel, AssistantChat, simulated_reply};
pub use developer::{
    CodeLanguage, DeveloperChat, GREETING, PreviewMode, SendOutcome, needs_language_choice,
};
pub use engine::{ChatAttachment, ChatError, CodeBlock, DelayedReplies, Message, Role};
