//! Session window — the temporal boundary of "the current broadcast".
//!
//! Resolved once per request from the live-status authority and read-only
//! downstream. `started_at: None` means the channel is offline (or its
//! session is unknown), which switches the scanner to its best-effort path.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SessionError;

/// The current broadcast session of a channel, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionWindow {
    /// Channel login the window was resolved for
    pub channel: String,

    /// Start of the live session (ISO-8601), or `None` when offline
    pub started_at: Option<String>,
}

impl SessionWindow {
    /// A window for a channel with an active broadcast.
    pub fn live(channel: impl Into<String>, started_at: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            started_at: Some(started_at.into()),
        }
    }

    /// A window for a channel with no active broadcast.
    pub fn offline(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            started_at: None,
        }
    }

    pub fn is_live(&self) -> bool {
        self.started_at.is_some()
    }
}

/// Asks the live-status authority whether a channel is currently broadcasting.
///
/// Production implementation: Twitch Helix (client-credentials token grant
/// plus the `/streams` endpoint). Tests use in-memory fakes.
#[async_trait]
pub trait SessionResolver: Send + Sync {
    /// Resolve the current session window for `channel`.
    ///
    /// Credential or query failures are hard errors; "not live" is a valid
    /// offline window, not an error.
    async fn resolve(&self, channel: &str) -> std::result::Result<SessionWindow, SessionError>;
}
