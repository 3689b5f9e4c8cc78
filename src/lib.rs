//! Outrank: team ranking ingestion
//!
//! Collects per-team statistical rankings from a paginated external source,
//! normalises them into (team, statistic, date) observations and stores them
//! in a queryable table. Also backfills historical wide-format records into
//! the same table.
//!
//! ## Features
//!
//! - **Extraction**: Paginated table scraping with retry and tie-break fill
//! - **Orchestration**: Concurrent runs over every statistic with isolated failures and one report
//! - **Batch Writes**: 25-item chunks written in bounded parallel groups
//! - **Migration**: Cursor-paginated backfill with attribute-name translation
//! - **Storage**: SQLite-backed store with an LRU read cache
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use outrank::{
//!     browser::HttpBrowser, scrape::Extractor, writer::BatchWriter, RankDate,
//!     SqliteRankingStore, TableName,
//! };
//!
//! # async fn example() -> outrank::Result<()> {
//! let store = SqliteRankingStore::open_default()?;
//! store.ensure_rankings_table(&TableName::rankings())?;
//!
//! let writer = BatchWriter::new(Arc::new(store), TableName::rankings());
//! let extractor = Extractor::new(Arc::new(HttpBrowser::new()), writer);
//! let stored = extractor
//!     .extract_and_store("Total Offense", &RankDate::now())
//!     .await?;
//! println!("{} teams stored", stored);
//! # Ok(())
//! # }
//! ```
//!
//! ## Environment Configuration
//!
//! ```bash
//! export OUTRANK_DB_PATH=/var/lib/outrank/rankings.db
//! export OUTRANK_REPORT_WEBHOOK=https://relay.example.com/report
//! export OUTRANK_REPORT_RECIPIENTS=ops@example.com
//! ```

pub mod browser;
pub mod catalog;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod migration;
pub mod notify;
pub mod orchestrator;
pub mod scrape;
pub mod storage;
pub mod writer;

// Re-export commonly used types
pub use cli::types::{RankDate, TableName};
pub use error::{OutrankError, Result};
pub use storage::{Observation, RankingStore, SqliteRankingStore, UNKNOWN_VALUE};

pub const DB_PATH_ENV_VAR: &str = "OUTRANK_DB_PATH";
pub const RANKINGS_TABLE_ENV_VAR: &str = "OUTRANK_RANKINGS_TABLE";
pub const LEGACY_TABLE_ENV_VAR: &str = "OUTRANK_LEGACY_TABLE";
pub const WRITE_PARALLELISM_ENV_VAR: &str = "OUTRANK_WRITE_PARALLELISM";
pub const REPORT_WEBHOOK_ENV_VAR: &str = "OUTRANK_REPORT_WEBHOOK";
pub const REPORT_SENDER_ENV_VAR: &str = "OUTRANK_REPORT_SENDER";
pub const REPORT_RECIPIENTS_ENV_VAR: &str = "OUTRANK_REPORT_RECIPIENTS";
