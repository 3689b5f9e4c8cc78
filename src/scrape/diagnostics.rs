//! Failure-path page diagnostics.

use tracing::{debug, warn};

use crate::browser::BrowserSession;

/// Text the source renders instead of rankings when it refuses a client.
pub const BLOCKING_MARKERS: [&str; 2] = ["Access Denied", "Just a moment..."];

const PREVIEW_CHARS: usize = 1000;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageDiagnostics {
    pub url: String,
    pub content_length: usize,
    pub snapshot_length: usize,
    pub preview: String,
    pub blocking_marker: Option<&'static str>,
    pub has_table: bool,
}

/// First blocking marker present in `content`, if any.
pub fn find_blocking_marker(content: &str) -> Option<&'static str> {
    BLOCKING_MARKERS
        .iter()
        .copied()
        .find(|marker| content.contains(marker))
}

/// Inspect the current page of `session` and log what was found.
///
/// Never fails: anything the session cannot provide is recorded as empty.
pub async fn capture(
    session: &mut dyn BrowserSession,
    url: &str,
    table_selector: &str,
) -> PageDiagnostics {
    let content = session.content().await.unwrap_or_default();
    let snapshot_length = session.snapshot().await.map(|s| s.len()).unwrap_or(0);
    let has_table = session.has_element(table_selector).await.unwrap_or(false);

    let diagnostics = PageDiagnostics {
        url: url.to_string(),
        content_length: content.len(),
        snapshot_length,
        preview: content.chars().take(PREVIEW_CHARS).collect(),
        blocking_marker: find_blocking_marker(&content),
        has_table,
    };

    warn!(
        url,
        content_length = diagnostics.content_length,
        snapshot_length = diagnostics.snapshot_length,
        blocked = ?diagnostics.blocking_marker,
        has_table = diagnostics.has_table,
        "Page diagnostics"
    );
    debug!(url, preview = %diagnostics.preview, "Page content preview");

    diagnostics
}
