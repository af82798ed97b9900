//! Session-scoped retrieval on top of the `ChatLogStore` scan primitive.
//!
//! Two paths: a live session paginates filtered scans until the store is
//! exhausted or the cap is reached; an unresolved session falls back to one
//! unfiltered page filtered client-side. Both end with a stable ascending
//! sort by timestamp.

use tracing::debug;

use streamlens_core::chat::{ChatMessage, sort_by_timestamp};
use streamlens_core::error::StoreError;
use streamlens_core::session::SessionWindow;
use streamlens_core::store::{ChatLogStore, ScanFilter, ScanRequest};

/// Retrieve at most `max_items` chat messages for the window's channel,
/// sorted ascending by timestamp.
///
/// With a live window the scan is filtered server-side to the session
/// (`channel` match and `timestamp >= started_at`) and paginated with the
/// store's continuation cursor; the cursor is only ever sent back when the
/// previous page produced one. Offline windows get a single unfiltered page
/// capped at `max_items` with the channel filter applied client-side — a
/// best-effort path that deliberately does not paginate further even when it
/// comes back short.
///
/// Any store error aborts the retrieval; no partial results are returned.
pub async fn collect_session_messages(
    store: &dyn ChatLogStore,
    window: &SessionWindow,
    max_items: usize,
) -> Result<Vec<ChatMessage>, StoreError> {
    let mut messages = match &window.started_at {
        Some(started_at) => scan_live_session(store, &window.channel, started_at, max_items).await?,
        None => scan_offline_fallback(store, &window.channel, max_items).await?,
    };

    sort_by_timestamp(&mut messages);
    Ok(messages)
}

async fn scan_live_session(
    store: &dyn ChatLogStore,
    channel: &str,
    started_at: &str,
    max_items: usize,
) -> Result<Vec<ChatMessage>, StoreError> {
    let mut messages: Vec<ChatMessage> = Vec::new();
    let mut cursor = None;
    let mut pages = 0usize;

    while messages.len() < max_items {
        let page = store
            .scan(ScanRequest {
                limit: max_items - messages.len(),
                filter: Some(ScanFilter {
                    channel: channel.to_string(),
                    since: started_at.to_string(),
                }),
                start_key: cursor.take(),
            })
            .await?;
        pages += 1;

        messages.extend(page.items.into_iter().map(ChatMessage::from));
        cursor = page.cursor;

        if cursor.is_none() {
            break;
        }
    }

    // Cap holds even if a page over-returns.
    messages.truncate(max_items);

    debug!(channel, pages, count = messages.len(), "Session scan complete");
    Ok(messages)
}

async fn scan_offline_fallback(
    store: &dyn ChatLogStore,
    channel: &str,
    max_items: usize,
) -> Result<Vec<ChatMessage>, StoreError> {
    let page = store
        .scan(ScanRequest {
            limit: max_items,
            filter: None,
            start_key: None,
        })
        .await?;

    let mut messages: Vec<ChatMessage> = page
        .items
        .into_iter()
        .filter(|record| record.channel == channel)
        .map(ChatMessage::from)
        .collect();
    messages.truncate(max_items);

    debug!(channel, count = messages.len(), "Offline fallback scan complete");
    Ok(messages)
}
