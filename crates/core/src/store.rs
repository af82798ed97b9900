//! Chat log store trait — the paginated filtered scan primitive.
//!
//! The storage engine itself is an external collaborator; this seam exposes
//! exactly one operation, a single page of a scan. Pagination policy (loops,
//! caps, the offline fallback) lives in `streamlens-store::scanner`, on top
//! of this trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::chat::ChatMessage;
use crate::error::StoreError;

/// A chat record as the store holds it, before projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub channel: String,
    pub username: String,
    pub message: String,
    pub timestamp: String,
}

impl From<StoredMessage> for ChatMessage {
    /// Project a stored record down to the prompt-facing fields.
    fn from(record: StoredMessage) -> Self {
        Self {
            username: record.username,
            message: record.message,
            timestamp: record.timestamp,
        }
    }
}

/// Opaque continuation token for resuming a scan.
///
/// Round-tripped between pages verbatim; never inspected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanCursor(pub serde_json::Value);

/// Server-side filter on a scan page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanFilter {
    /// Channel the record must belong to
    pub channel: String,

    /// Minimum timestamp (inclusive), ISO-8601
    pub since: String,
}

/// One page request against the log store.
#[derive(Debug, Clone)]
pub struct ScanRequest {
    /// Maximum records this page may return
    pub limit: usize,

    /// Optional server-side filter; `None` scans the whole table
    pub filter: Option<ScanFilter>,

    /// Resume point from the previous page, if it returned one
    pub start_key: Option<ScanCursor>,
}

/// One page of scan results.
#[derive(Debug, Clone)]
pub struct ScanPage {
    pub items: Vec<StoredMessage>,

    /// Present when the store has more to scan; absent when exhausted
    pub cursor: Option<ScanCursor>,
}

/// The append-only chat log store, consumed one scan page at a time.
///
/// Production implementation: DynamoDB `Scan` over HTTP. Tests use scripted
/// in-memory pages.
#[async_trait]
pub trait ChatLogStore: Send + Sync {
    async fn scan(&self, request: ScanRequest) -> std::result::Result<ScanPage, StoreError>;
}
