//! Prompt assembly — instruction, chat context, then the question.
//!
//! The segment order is significant: it establishes
//! instruction-then-context-then-question precedence for whichever provider
//! lane ends up answering. Lanes that take a plain text blob use `flatten`.

use serde::{Deserialize, Serialize};

use crate::chat::ChatMessage;
use crate::error::Error;
use crate::session::SessionWindow;

/// The fixed system instruction sent with every question.
const SYSTEM_INSTRUCTION: &str = "You are a helpful AI assistant for a Twitch streamer. \
    You can answer general questions on any topic. You also have access to the streamer's \
    chat logs from their current streaming session. Only use the chat context when the \
    question is specifically about chat, messages, viewers, or stream activity. For general \
    questions (coding, advice, explanations, etc.), answer directly without referencing chat. \
    Always provide concise, helpful answers.";

/// The role of a prompt segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// One role-tagged piece of the prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptSegment {
    pub role: Role,
    pub content: String,
}

impl PromptSegment {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// The chat context embedded in the second segment.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatContext<'a> {
    channel: &'a str,
    started_at: Option<&'a str>,
    messages: &'a [ChatMessage],
    message_count: usize,
}

/// Build the three-segment prompt: system instruction, serialized chat
/// context, and the literal question.
pub fn build_prompt(
    window: &SessionWindow,
    messages: &[ChatMessage],
    question: &str,
) -> Result<Vec<PromptSegment>, Error> {
    let context = ChatContext {
        channel: &window.channel,
        started_at: window.started_at.as_deref(),
        messages,
        message_count: messages.len(),
    };
    let serialized = serde_json::to_string_pretty(&context)?;

    Ok(vec![
        PromptSegment::system(SYSTEM_INSTRUCTION),
        PromptSegment::user(format!(
            "Chat context from current streaming session (only use if the question is about chat):\n{serialized}"
        )),
        PromptSegment::user(format!("Question: {question}")),
    ])
}

/// Flatten a prompt into a single text blob: segment contents joined by a
/// blank line, role labels discarded.
pub fn flatten(segments: &[PromptSegment]) -> String {
    segments
        .iter()
        .map(|s| s.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}
