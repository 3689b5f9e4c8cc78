//! Backfill of legacy wide records into the rankings table.
//!
//! The legacy table is scanned a page at a time. Each record is unpacked into
//! one observation per recognised attribute, and a page's observations are
//! fully committed (or reported failed) before the next page is read.

use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::{
    catalog,
    cli::types::{RankDate, TableName},
    storage::{LegacyRecord, Observation, RankingStore, ScanCursor},
    writer::{BatchWriter, DEFAULT_WRITE_PARALLELISM},
    OutrankError, Result,
};


/// Records read per scan call.
pub const SCAN_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationSummary {
    #[serde(rename = "totalItemsProcessed")]
    pub items_scanned: usize,
    pub items_written: usize,
    #[serde(rename = "batchCount")]
    pub batches_committed: usize,
    pub batches_failed: usize,
    pub pages_scanned: usize,
    pub records_skipped: usize,
    pub fields_skipped: usize,
}

/// Observations produced from one legacy record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Translation {
    pub observations: Vec<Observation>,
    /// Attributes with no known display name.
    pub unmapped: Vec<String>,
}

/// Unpack one wide legacy record into narrow observations.
///
/// Fails with `MalformedSourceRecord` when team or date is missing. Unknown
/// attributes are listed in `unmapped` and otherwise ignored; values that are
/// not numeric become `UNKNOWN_VALUE`.
pub fn translate_record(record: &LegacyRecord) -> Result<Translation> {
    let (Some(team), Some(raw_date)) = (record.team(), record.date()) else {
        return Err(OutrankError::MalformedSourceRecord {
            reason: "missing team or date".to_string(),
        });
    };
    let date: RankDate = raw_date
        .parse()
        .map_err(|_| OutrankError::MalformedSourceRecord {
            reason: format!("unusable date '{}'", raw_date),
        })?;

    let mut translation = Translation::default();
    for (attribute, value) in record.stat_fields() {
        match catalog::display_name_for_attribute(attribute) {
            Some(statistic) => translation.observations.push(Observation::new(
                team,
                statistic,
                &date,
                value.rank_value(),
            )),
            None => translation.unmapped.push(attribute.to_string()),
        }
    }
    Ok(translation)
}

pub struct Migrator {
    store: Arc<dyn RankingStore>,
    parallelism: usize,
    page_size: usize,
}

impl Migrator {
    pub fn new(store: Arc<dyn RankingStore>) -> Self {
        Self {
            store,
            parallelism: DEFAULT_WRITE_PARALLELISM,
            page_size: SCAN_PAGE_SIZE,
        }
    }

    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism.max(1);
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Copy every legacy record in `source` into `destination`.
    pub async fn migrate(
        &self,
        source: &TableName,
        destination: &TableName,
    ) -> Result<MigrationSummary> {
        self.preflight(source, destination).await?;
        info!(source = %source, destination = %destination, "Starting migration");

        let writer = BatchWriter::new(self.store.clone(), destination.clone())
            .with_parallelism(self.parallelism);
        let mut summary = MigrationSummary::default();
        let mut cursor: Option<ScanCursor> = None;

        loop {
            let page = self
                .store
                .scan_legacy(source, cursor, self.page_size)
                .await?;
            if page.records.is_empty() {
                info!("No more items to process");
                break;
            }
            summary.pages_scanned += 1;
            summary.items_scanned += page.records.len();

            let mut observations = Vec::new();
            for record in &page.records {
                match translate_record(record) {
                    Ok(translation) => {
                        for attribute in &translation.unmapped {
                            warn!(attribute = %attribute, "Unknown attribute, skipping");
                        }
                        summary.fields_skipped += translation.unmapped.len();
                        observations.extend(translation.observations);
                    }
                    Err(e) => {
                        warn!(error = %e, "Skipping legacy record");
                        summary.records_skipped += 1;
                    }
                }
            }

            let report = writer.commit(&observations).await;
            summary.items_written += report.items_written;
            summary.batches_committed += report.chunks_written;
            summary.batches_failed += report.failures.len();
            if !report.is_success() {
                error!(
                    page = summary.pages_scanned,
                    failed = report.failures.len(),
                    "Some batches failed, continuing"
                );
            }
            info!(
                scanned = summary.items_scanned,
                written = summary.items_written,
                batches = summary.batches_committed,
                "Processed page"
            );

            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        info!(
            total = summary.items_scanned,
            written = summary.items_written,
            "Migration complete"
        );
        Ok(summary)
    }

    /// Both tables must exist before anything moves.
    async fn preflight(&self, source: &TableName, destination: &TableName) -> Result<()> {
        for (role, table) in [("Source", source), ("Destination", destination)] {
            let exists = self.store.table_exists(table).await.map_err(|e| {
                OutrankError::MigrationAborted {
                    reason: format!("{} table {} is unreachable: {}", role, table, e),
                }
            })?;
            if !exists {
                return Err(OutrankError::MigrationAborted {
                    reason: format!("{} table {} does not exist", role, table),
                });
            }
        }
        Ok(())
    }
}
