//! Storage layer for the ranking pipeline
//!
//! This module provides the store abstraction the pipeline writes through,
//! organized into logical components:
//! - `models`: Data structures
//! - `schema`: SQLite connection and schema management
//! - `queries`: Writes, legacy scans and read-path queries
//! - `cache`: LRU memoisation of read-path results

pub mod cache;
pub mod models;
pub mod queries;
pub mod schema;


use async_trait::async_trait;

use crate::{cli::types::TableName, Result};

pub use models::*;
pub use schema::SqliteRankingStore;

/// Hard per-call limit on items in one batch write.
pub const MAX_BATCH_ITEMS: usize = 25;

/// The store capability the ingestion core depends on.
///
/// Implementations are shared by every concurrent writer, so all methods take
/// `&self`. Writes are upserts keyed by (team, statistic, date); concurrent
/// writers never need mutual exclusion beyond the store's per-key atomicity.
#[async_trait]
pub trait RankingStore: Send + Sync {
    /// Whether `table` exists and can be reached.
    async fn table_exists(&self, table: &TableName) -> Result<bool>;

    /// Upsert at most [`MAX_BATCH_ITEMS`] observations into `table`.
    async fn put_batch(&self, table: &TableName, items: &[Observation]) -> Result<()>;

    /// Read up to `limit` legacy records after `cursor`.
    async fn scan_legacy(
        &self,
        table: &TableName,
        cursor: Option<ScanCursor>,
        limit: usize,
    ) -> Result<ScanPage>;
}
