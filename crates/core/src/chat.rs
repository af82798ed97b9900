//! Chat message value objects and request validation.
//!
//! A `ChatMessage` is the minimal projection of a stored chat record that the
//! prompt ever sees. Timestamps stay as ISO-8601 strings end to end: they
//! sort correctly under plain string comparison and are never interpreted.

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// One chat line, projected down to the fields the prompt needs.
///
/// Serializes compact (`{"u", "m", "t"}`) to keep the serialized chat context
/// small when thousands of messages are embedded in a single prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Sender login
    #[serde(rename = "u")]
    pub username: String,

    /// Message text
    #[serde(rename = "m")]
    pub message: String,

    /// ISO-8601 timestamp, lexicographically sortable
    #[serde(rename = "t")]
    pub timestamp: String,
}

/// Sort messages ascending by timestamp.
///
/// Stable: messages with equal timestamps keep their relative order from the
/// scan, which is arbitrary but consistent across identical inputs.
pub fn sort_by_timestamp(messages: &mut [ChatMessage]) {
    messages.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
}

/// Bounds applied to `maxMessagesPerChunk` at the request boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageLimits {
    pub min: usize,
    pub default: usize,
    pub max: usize,
}

impl Default for MessageLimits {
    fn default() -> Self {
        Self {
            min: 200,
            default: 2000,
            max: 6000,
        }
    }
}

impl MessageLimits {
    /// Clamp a requested message cap into `[min, max]`, falling back to the
    /// default when the caller did not ask for one.
    pub fn clamp(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.default).clamp(self.min, self.max)
    }
}

/// A validated question about a channel's chat.
///
/// Constructed once from caller input at the boundary; immutable afterwards.
#[derive(Debug, Clone)]
pub struct QueryRequest {
    pub question: String,
    pub channel: String,
    pub max_messages: usize,
}

impl QueryRequest {
    /// Validate and normalize caller input.
    ///
    /// `question` and `channel` must be non-empty after trimming; the message
    /// cap is clamped into the configured bounds.
    pub fn new(
        question: &str,
        channel: &str,
        requested_max: Option<usize>,
        limits: MessageLimits,
    ) -> Result<Self, Error> {
        let question = question.trim();
        let channel = channel.trim();

        if question.is_empty() || channel.is_empty() {
            return Err(Error::InvalidRequest(format!(
                "Missing question or channel (got question: {question:?}, channel: {channel:?})"
            )));
        }

        Ok(Self {
            question: question.to_string(),
            channel: channel.to_string(),
            max_messages: limits.clamp(requested_max),
        })
    }
}
