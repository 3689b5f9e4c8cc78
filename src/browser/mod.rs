//! Browser-automation capability used by the extractor.
//!
//! The extractor only talks to these traits; tests substitute scripted
//! sessions and production uses [`http::HttpBrowser`].

pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::Result;

pub use http::HttpBrowser;

/// Marker the source uses in the rank column for an unresolved tie.
pub const TIE_MARKER: &str = "-";

/// One (rank, team) row as it appears in a ranking table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedRow {
    pub rank: String,
    pub team: String,
}

impl RankedRow {
    pub fn new(rank: &str, team: &str) -> Self {
        Self {
            rank: rank.to_string(),
            team: team.to_string(),
        }
    }

    /// Build a row from the text of the first two table cells.
    ///
    /// A blank rank becomes the tie marker. Rows whose team cell is empty or
    /// does not start with an ASCII letter (footers, ads, spacer rows) are
    /// dropped.
    pub fn from_cells(rank: &str, team: &str) -> Option<Self> {
        let team = team.trim();
        if !team.starts_with(|c: char| c.is_ascii_alphabetic()) {
            return None;
        }
        let rank = match rank.trim() {
            "" => TIE_MARKER,
            r => r,
        };
        Some(Self::new(rank, team))
    }

    pub fn is_tie_marker(&self) -> bool {
        self.rank == TIE_MARKER
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// How a session presents itself to the source site.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub user_agent: String,
    pub headers: Vec<(String, String)>,
    pub viewport: Viewport,
    pub javascript_enabled: bool,
    /// Upper bound for any navigation.
    pub navigation_timeout: Duration,
    /// Upper bound for any other wait.
    pub default_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
            headers: vec![
                (
                    "Accept".to_string(),
                    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8"
                        .to_string(),
                ),
                ("Accept-Language".to_string(), "en-US,en;q=0.9".to_string()),
                ("Upgrade-Insecure-Requests".to_string(), "1".to_string()),
            ],
            viewport: Viewport {
                width: 1920,
                height: 1080,
            },
            javascript_enabled: true,
            navigation_timeout: Duration::from_secs(60),
            default_timeout: Duration::from_secs(30),
        }
    }
}

/// Launches sessions. Shared across concurrent extractions.
#[async_trait]
pub trait BrowserEngine: Send + Sync {
    async fn launch(&self, config: &SessionConfig) -> Result<Box<dyn BrowserSession>>;
}

/// One exclusively owned browser session.
#[async_trait]
pub trait BrowserSession: Send {
    /// Load `url`, giving up after `timeout`.
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<()>;

    /// Wait until an element matching `selector` is present.
    async fn wait_for_selector(&mut self, selector: &str, timeout: Duration) -> Result<()>;

    /// Immediate presence check, no waiting.
    async fn has_element(&mut self, selector: &str) -> Result<bool>;

    /// Run the ranking-table extraction routine against the current page.
    async fn extract_rows(&mut self, table_selector: &str) -> Result<Vec<RankedRow>>;

    /// Markup of the current page.
    async fn content(&mut self) -> Result<String>;

    /// Visual (or closest available) capture of the current page.
    async fn snapshot(&mut self) -> Result<Vec<u8>>;

    async fn close(&mut self) -> Result<()>;
}
