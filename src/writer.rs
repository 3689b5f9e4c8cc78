//! Chunked, bounded-parallel observation writes.
//!
//! Items are split into chunks of at most [`MAX_BATCH_ITEMS`] and written in
//! groups of `parallelism` concurrent chunk writes. A group always settles
//! completely before the next one starts. Chunk failures are reported, never
//! retried here.

use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::{
    cli::types::TableName,
    storage::{Observation, RankingStore, MAX_BATCH_ITEMS},
    OutrankError, Result,
};

#[cfg(test)]
mod tests;

pub const DEFAULT_WRITE_PARALLELISM: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkFailure {
    /// Zero-based chunk index within the commit.
    pub chunk: usize,
    pub items: usize,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitReport {
    pub chunks_written: usize,
    pub items_written: usize,
    pub failures: Vec<ChunkFailure>,
}

impl CommitReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn chunks_attempted(&self) -> usize {
        self.chunks_written + self.failures.len()
    }
}

#[derive(Clone)]
pub struct BatchWriter {
    store: Arc<dyn RankingStore>,
    table: TableName,
    parallelism: usize,
}

impl BatchWriter {
    pub fn new(store: Arc<dyn RankingStore>, table: TableName) -> Self {
        Self {
            store,
            table,
            parallelism: DEFAULT_WRITE_PARALLELISM,
        }
    }

    /// Set the number of concurrent chunk writes per group (minimum 1).
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism.max(1);
        self
    }

    pub fn table(&self) -> &TableName {
        &self.table
    }

    pub fn parallelism(&self) -> usize {
        self.parallelism
    }

    /// Write every item, reporting per-chunk outcomes.
    pub async fn commit(&self, items: &[Observation]) -> CommitReport {
        let mut report = CommitReport::default();
        let chunks: Vec<&[Observation]> = items.chunks(MAX_BATCH_ITEMS).collect();

        for (group_index, group) in chunks.chunks(self.parallelism).enumerate() {
            let first_chunk = group_index * self.parallelism;
            let results = join_all(
                group
                    .iter()
                    .map(|chunk| self.store.put_batch(&self.table, chunk)),
            )
            .await;

            for (offset, (chunk, result)) in group.iter().zip(results).enumerate() {
                match result {
                    Ok(()) => {
                        report.chunks_written += 1;
                        report.items_written += chunk.len();
                    }
                    Err(e) => {
                        warn!(
                            table = %self.table,
                            chunk = first_chunk + offset,
                            items = chunk.len(),
                            error = %e,
                            "Chunk write failed"
                        );
                        report.failures.push(ChunkFailure {
                            chunk: first_chunk + offset,
                            items: chunk.len(),
                            message: e.to_string(),
                        });
                    }
                }
            }
            debug!(
                table = %self.table,
                group = group_index,
                chunks = group.len(),
                "Write group settled"
            );
        }

        report
    }

    /// Like [`commit`](Self::commit), but any failed chunk is an error.
    pub async fn commit_all(&self, items: &[Observation]) -> Result<CommitReport> {
        let report = self.commit(items).await;
        if report.is_success() {
            return Ok(report);
        }
        let message = report
            .failures
            .iter()
            .map(|f| format!("chunk {}: {}", f.chunk, f.message))
            .collect::<Vec<_>>()
            .join("; ");
        Err(OutrankError::WriteFailure {
            table: self.table.to_string(),
            failed_chunks: report.failures.len(),
            message,
        })
    }
}
