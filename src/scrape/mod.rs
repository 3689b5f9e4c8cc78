//! Per-statistic extraction: paginated table scraping, retry, tie-break
//! normalisation and conversion to observations.

pub mod diagnostics;
pub mod extractor;

#[cfg(test)]
mod tests;

use async_trait::async_trait;

use crate::{browser::RankedRow, cli::types::RankDate, Result};

pub use extractor::{Extractor, ExtractorConfig, RANKING_TABLE_SELECTOR};

/// Anything that can scrape one statistic and persist the result, returning
/// the number of observations stored.
#[async_trait]
pub trait StatisticScraper: Send + Sync {
    async fn scrape(&self, statistic: &str, date: &RankDate) -> Result<usize>;
}

/// Resolve tie markers by carrying the nearest preceding resolved rank forward.
///
/// `["1", "2", "-", "-", "5"]` becomes `["1", "2", "2", "2", "5"]`. A marker
/// with nothing resolved before it stays a marker. Row order and team names
/// are untouched, and applying the fill twice gives the same result as once.
pub fn fill_ties(rows: &[RankedRow]) -> Vec<RankedRow> {
    let mut last_resolved: Option<&str> = None;
    rows.iter()
        .map(|row| {
            if !row.is_tie_marker() {
                last_resolved = Some(&row.rank);
                return row.clone();
            }
            match last_resolved {
                Some(rank) => RankedRow::new(rank, &row.team),
                None => row.clone(),
            }
        })
        .collect()
}
