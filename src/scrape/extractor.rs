//! The extraction engine for one statistic.

use async_trait::async_trait;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{diagnostics, fill_ties, StatisticScraper};
use crate::{
    browser::{BrowserEngine, BrowserSession, RankedRow, SessionConfig},
    catalog::{self, SourceLocator, DEFAULT_SOURCE_BASE_URL, MAX_SOURCE_PAGES},
    cli::types::RankDate,
    storage::{parse_rank_value, Observation},
    writer::BatchWriter,
    OutrankError, Result,
};

pub const RANKING_TABLE_SELECTOR: &str = ".block-stats__stats-table";

/// Rank the first row of a genuine ranking table always carries.
const ORACLE_RANK: &str = "1";

#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    pub attempts: usize,
    pub pages: u32,
    pub navigation_timeout: Duration,
    pub table_wait: Duration,
    pub base_url: String,
    pub table_selector: String,
    pub session: SessionConfig,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            attempts: 3,
            pages: MAX_SOURCE_PAGES,
            navigation_timeout: Duration::from_secs(45),
            table_wait: Duration::from_secs(20),
            base_url: DEFAULT_SOURCE_BASE_URL.to_string(),
            table_selector: RANKING_TABLE_SELECTOR.to_string(),
            session: SessionConfig::default(),
        }
    }
}

/// Scrapes one statistic's ranking table and turns it into observations.
///
/// Each call owns a fresh browser session for its whole lifetime; the engine
/// and writer are shared.
pub struct Extractor {
    engine: Arc<dyn BrowserEngine>,
    writer: BatchWriter,
    config: ExtractorConfig,
}

impl Extractor {
    pub fn new(engine: Arc<dyn BrowserEngine>, writer: BatchWriter) -> Self {
        Self::with_config(engine, writer, ExtractorConfig::default())
    }

    pub fn with_config(
        engine: Arc<dyn BrowserEngine>,
        writer: BatchWriter,
        config: ExtractorConfig,
    ) -> Self {
        Self {
            engine,
            writer,
            config,
        }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Scrape `statistic` and return one observation per ranked team, dated `date`.
    pub async fn extract(&self, statistic: &str, date: &RankDate) -> Result<Vec<Observation>> {
        let locator = catalog::locator_for(statistic)?;

        let mut session = self.engine.launch(&self.config.session).await?;
        let outcome = AssertUnwindSafe(self.run_attempts(session.as_mut(), statistic, &locator))
            .catch_unwind()
            .await;

        if let Err(e) = session.close().await {
            warn!(statistic, error = %e, "Failed to close browser session");
        }

        let rows = match outcome {
            Ok(result) => result?,
            Err(panic) => std::panic::resume_unwind(panic),
        };

        let observations = fill_ties(&rows)
            .iter()
            .map(|row| Observation::new(&row.team, statistic, date, parse_rank_value(&row.rank)))
            .collect::<Vec<_>>();
        info!(statistic, teams = observations.len(), "Statistic extracted");
        Ok(observations)
    }

    /// Extract and commit; any write failure fails the statistic.
    pub async fn extract_and_store(&self, statistic: &str, date: &RankDate) -> Result<usize> {
        let observations = self.extract(statistic, date).await?;
        let report = self.writer.commit_all(&observations).await?;
        info!(
            statistic,
            items = report.items_written,
            chunks = report.chunks_written,
            table = %self.writer.table(),
            "Statistic stored"
        );
        Ok(observations.len())
    }

    async fn run_attempts(
        &self,
        session: &mut dyn BrowserSession,
        statistic: &str,
        locator: &SourceLocator,
    ) -> Result<Vec<RankedRow>> {
        for attempt in 1..=self.config.attempts {
            let mut rows = Vec::new();
            for page in 1..=self.config.pages {
                let url = locator.page_url(&self.config.base_url, page);
                match self.scrape_page(session, &url).await {
                    Ok(page_rows) => {
                        if page_rows.is_empty() && page > 1 {
                            warn!(statistic, attempt, page, "Page returned no rows");
                        }
                        debug!(statistic, attempt, page, rows = page_rows.len(), "Page scraped");
                        rows.extend(page_rows);
                    }
                    Err(e) if e.is_page_level() => {
                        warn!(statistic, attempt, page, error = %e, "Page failed, continuing");
                    }
                    Err(e) => return Err(e),
                }
            }

            let first_rank = rows.first().map(|row| row.rank.as_str());
            if first_rank == Some(ORACLE_RANK) {
                info!(statistic, attempt, rows = rows.len(), "Attempt accepted");
                return Ok(rows);
            }
            warn!(
                statistic,
                attempt,
                first_rank = ?first_rank,
                "Attempt rejected: first row is not rank 1"
            );
        }

        Err(OutrankError::ExtractionFailed {
            statistic: statistic.to_string(),
            attempts: self.config.attempts,
        })
    }

    /// Load one page and read its rows. Page-level problems come back as
    /// page-level errors so the caller can treat the page as empty; every one
    /// of them is preceded by a diagnostic capture of whatever the session
    /// is showing.
    pub(super) async fn scrape_page(
        &self,
        session: &mut dyn BrowserSession,
        url: &str,
    ) -> Result<Vec<RankedRow>> {
        let failure = match self.navigate(session, url).await {
            Ok(()) => match self.read_table(session, url).await {
                Ok(rows) => return Ok(rows),
                Err(e) => e,
            },
            Err(e) => e,
        };
        if !failure.is_page_level() {
            return Err(failure);
        }

        let found = diagnostics::capture(session, url, &self.config.table_selector).await;
        if let Some(marker) = found.blocking_marker {
            warn!(url, marker, "Source is blocking this client");
            return Err(OutrankError::AccessBlocked {
                url: url.to_string(),
            });
        }
        Err(failure)
    }

    async fn navigate(&self, session: &mut dyn BrowserSession, url: &str) -> Result<()> {
        let limit = self.config.navigation_timeout;
        match tokio::time::timeout(limit, session.navigate(url, limit)).await {
            Ok(result) => result,
            Err(_) => Err(OutrankError::Timeout {
                operation: format!("navigation to {}", url),
                after: limit,
            }),
        }
    }

    async fn read_table(
        &self,
        session: &mut dyn BrowserSession,
        url: &str,
    ) -> Result<Vec<RankedRow>> {
        let selector = self.config.table_selector.as_str();
        let waited = tokio::time::timeout(
            self.config.table_wait,
            session.wait_for_selector(selector, self.config.table_wait),
        )
        .await;
        if let Ok(Ok(())) = waited {
            return session.extract_rows(selector).await;
        }

        if session.has_element(selector).await.unwrap_or(false) {
            debug!(url, "Table present after failed wait, extracting anyway");
            return session.extract_rows(selector).await;
        }
        Err(OutrankError::TableNotFound {
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl StatisticScraper for Extractor {
    async fn scrape(&self, statistic: &str, date: &RankDate) -> Result<usize> {
        self.extract_and_store(statistic, date).await
    }
}
