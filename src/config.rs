//! Runtime settings from the environment.

use std::path::PathBuf;
use std::sync::Arc;

use crate::{
    cli::types::TableName,
    notify::{LogNotifier, Notifier, WebhookNotifier},
    storage::SqliteRankingStore,
    writer::DEFAULT_WRITE_PARALLELISM,
    OutrankError, Result, DB_PATH_ENV_VAR, LEGACY_TABLE_ENV_VAR, RANKINGS_TABLE_ENV_VAR,
    REPORT_RECIPIENTS_ENV_VAR, REPORT_SENDER_ENV_VAR, REPORT_WEBHOOK_ENV_VAR,
    WRITE_PARALLELISM_ENV_VAR,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// `None` means the default cache location.
    pub db_path: Option<PathBuf>,
    pub rankings_table: TableName,
    pub legacy_table: TableName,
    pub write_parallelism: usize,
    pub report_webhook: Option<String>,
    pub report_sender: Option<String>,
    pub report_recipients: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            db_path: None,
            rankings_table: TableName::rankings(),
            legacy_table: TableName::legacy(),
            write_parallelism: DEFAULT_WRITE_PARALLELISM,
            report_webhook: None,
            report_sender: None,
            report_recipients: Vec::new(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let mut settings = Self::default();

        if let Some(path) = get(DB_PATH_ENV_VAR) {
            settings.db_path = Some(PathBuf::from(path));
        }
        if let Some(name) = get(RANKINGS_TABLE_ENV_VAR) {
            settings.rankings_table = TableName::new(&name)?;
        }
        if let Some(name) = get(LEGACY_TABLE_ENV_VAR) {
            settings.legacy_table = TableName::new(&name)?;
        }
        if let Some(raw) = get(WRITE_PARALLELISM_ENV_VAR) {
            settings.write_parallelism = match raw.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(OutrankError::Config {
                        message: format!(
                            "{} must be a positive integer, got '{}'",
                            WRITE_PARALLELISM_ENV_VAR, raw
                        ),
                    })
                }
            };
        }
        settings.report_webhook = get(REPORT_WEBHOOK_ENV_VAR);
        settings.report_sender = get(REPORT_SENDER_ENV_VAR);
        if let Some(raw) = get(REPORT_RECIPIENTS_ENV_VAR) {
            settings.report_recipients = raw
                .split(',')
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_string)
                .collect();
        }

        Ok(settings)
    }

    pub fn with_db_path(mut self, path: Option<PathBuf>) -> Self {
        if path.is_some() {
            self.db_path = path;
        }
        self
    }

    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.db_path {
            Some(path) => Ok(path.clone()),
            None => SqliteRankingStore::database_path(),
        }
    }

    /// Open the configured store and make sure both tables exist.
    pub fn open_store(&self) -> Result<SqliteRankingStore> {
        let store = SqliteRankingStore::open(&self.database_path()?)?;
        store.ensure_rankings_table(&self.rankings_table)?;
        store.ensure_legacy_table(&self.legacy_table)?;
        Ok(store)
    }

    /// Webhook delivery when configured, log output otherwise.
    pub fn notifier(&self) -> Arc<dyn Notifier> {
        match &self.report_webhook {
            Some(url) => Arc::new(WebhookNotifier::new(url, self.report_sender.clone())),
            None => Arc::new(LogNotifier),
        }
    }
}
