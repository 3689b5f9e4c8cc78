//! Shared resources for command handlers.

use serde::Serialize;
use std::sync::Arc;

use crate::{
    browser::HttpBrowser,
    cli::types::{RankDate, TableName},
    config::Settings,
    orchestrator::Orchestrator,
    scrape::Extractor,
    storage::SqliteRankingStore,
    writer::BatchWriter,
    Result,
};

/// Settings plus the open store, built once per invocation.
pub struct CommandContext {
    pub settings: Settings,
    pub store: Arc<SqliteRankingStore>,
}

impl CommandContext {
    /// Open the configured database, creating tables as needed.
    pub fn new(settings: Settings) -> Result<Self> {
        let store = settings.open_store()?;
        Ok(Self::with_store(settings, store))
    }

    pub fn with_store(settings: Settings, store: SqliteRankingStore) -> Self {
        Self {
            settings,
            store: Arc::new(store),
        }
    }

    /// Override table, or the configured rankings table.
    pub fn rankings_table(&self, table: Option<TableName>) -> TableName {
        table.unwrap_or_else(|| self.settings.rankings_table.clone())
    }

    pub fn writer(&self, table: TableName) -> BatchWriter {
        BatchWriter::new(self.store.clone(), table)
            .with_parallelism(self.settings.write_parallelism)
    }

    pub fn extractor(&self, table: TableName) -> Extractor {
        Extractor::new(Arc::new(HttpBrowser::new()), self.writer(table))
    }

    pub fn orchestrator(&self, table: TableName) -> Orchestrator {
        Orchestrator::new(Arc::new(self.extractor(table)), self.settings.notifier())
            .with_recipients(self.settings.report_recipients.clone())
    }
}

/// The given date, or now.
pub fn resolve_date(date: Option<RankDate>) -> RankDate {
    date.unwrap_or_else(RankDate::now)
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
