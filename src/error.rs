//! Error types for the ranking ingestion pipeline

use std::time::Duration;
use thiserror::Error;


pub type Result<T> = std::result::Result<T, OutrankError>;

#[derive(Error, Debug)]
pub enum OutrankError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error("No source locator registered for statistic: {statistic}")]
    UnknownStatistic { statistic: String },

    #[error("Access blocked by the website: {url}")]
    AccessBlocked { url: String },

    #[error("Ranking table not found on page: {url}")]
    TableNotFound { url: String },

    #[error("Failed to scrape data for {statistic} after {attempts} attempts")]
    ExtractionFailed { statistic: String, attempts: usize },

    #[error("Write to {table} failed for {failed_chunks} chunk(s): {message}")]
    WriteFailure {
        table: String,
        failed_chunks: usize,
        message: String,
    },

    #[error("Migration aborted: {reason}")]
    MigrationAborted { reason: String },

    #[error("Malformed source record: {reason}")]
    MalformedSourceRecord { reason: String },

    #[error("{operation} timed out after {after:?}")]
    Timeout { operation: String, after: Duration },

    #[error("Invalid CSS selector: {selector}")]
    InvalidSelector { selector: String },

    #[error("Invalid table name: {name}")]
    InvalidTableName { name: String },

    #[error("{name} parameter is required")]
    MissingParameter { name: String },

    #[error("Invalid date: {value}")]
    InvalidDate { value: String },

    #[error("Batch of {size} items exceeds the per-call limit of {limit}")]
    BatchTooLarge { size: usize, limit: usize },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Browser session is closed")]
    SessionClosed,

    #[error("No page has been loaded in this browser session")]
    NoPageLoaded,

    #[error("Statistic catalog is inconsistent: {}", problems.join("; "))]
    CatalogInvalid { problems: Vec<String> },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("No data found for {what}")]
    NoData { what: String },

    #[error("Background task failed: {message}")]
    TaskFailed { message: String },
}

impl OutrankError {
    /// Page-level failures are absorbed and retried at the attempt level.
    pub fn is_page_level(&self) -> bool {
        matches!(
            self,
            OutrankError::AccessBlocked { .. }
                | OutrankError::TableNotFound { .. }
                | OutrankError::NoPageLoaded
                | OutrankError::Timeout { .. }
                | OutrankError::Http(_)
        )
    }
}

impl From<tokio::task::JoinError> for OutrankError {
    fn from(err: tokio::task::JoinError) -> Self {
        OutrankError::TaskFailed {
            message: err.to_string(),
        }
    }
}
