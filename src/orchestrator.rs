//! Fan-out of one run across many statistics.
//!
//! Every statistic is scraped on its own task. A failure or panic in one task
//! only marks that statistic as failed; the rest keep going. Exactly one
//! report goes to the notifier per run, whether the run succeeded, partially
//! failed, or died on a systemic error.

use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::{
    catalog, cli::types::RankDate, notify::Notifier, scrape::StatisticScraper, OutrankError,
    Result,
};


/// Result of one statistic within a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScrapeOutcome {
    #[serde(rename = "stat")]
    pub statistic: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScrapeOutcome {
    pub fn succeeded(statistic: &str) -> Self {
        Self {
            statistic: statistic.to_string(),
            success: true,
            error: None,
        }
    }

    pub fn failed(statistic: &str, error: String) -> Self {
        Self {
            statistic: statistic.to_string(),
            success: false,
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub total_stats: usize,
    pub success_count: usize,
    pub failures: Vec<ScrapeOutcome>,
    pub started_at: RankDate,
    pub finished_at: RankDate,
}

impl RunSummary {
    pub fn from_outcomes(
        outcomes: Vec<ScrapeOutcome>,
        started_at: RankDate,
        finished_at: RankDate,
    ) -> Self {
        let total_stats = outcomes.len();
        let (successes, failures): (Vec<_>, Vec<_>) =
            outcomes.into_iter().partition(|o| o.success);
        Self {
            total_stats,
            success_count: successes.len(),
            failures,
            started_at,
            finished_at,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A rendered run report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub subject: String,
    pub html_body: String,
}

impl Report {
    pub fn for_summary(summary: &RunSummary) -> Self {
        let message = if summary.failures.is_empty() {
            "All stats successfully scraped".to_string()
        } else {
            let lines = summary
                .failures
                .iter()
                .map(|f| format!("{} - {}", f.statistic, f.error.as_deref().unwrap_or("")))
                .collect::<Vec<_>>()
                .join("\n");
            format!("Failed stats: {}", lines)
        };
        Self::render(
            summary.is_success(),
            &summary.started_at,
            &summary.finished_at,
            &message,
        )
    }

    pub fn for_error(started_at: &RankDate, finished_at: &RankDate, err: &OutrankError) -> Self {
        Self::render(
            false,
            started_at,
            finished_at,
            &format!("Overall error: {}", err),
        )
    }

    fn render(success: bool, started_at: &RankDate, finished_at: &RankDate, message: &str) -> Self {
        let subject = if success {
            "Scrape Successful"
        } else {
            "Scrape Failed"
        };
        let html_body = format!(
            "<h2>{}</h2>\n<p>Start Time: {}</p>\n<p>End Time: {}</p>\n<p>{}</p>",
            subject, started_at, finished_at, message
        );
        Self {
            subject: subject.to_string(),
            html_body,
        }
    }
}

pub struct Orchestrator {
    scraper: Arc<dyn StatisticScraper>,
    notifier: Arc<dyn Notifier>,
    recipients: Vec<String>,
    catalog_check: fn() -> Result<()>,
}

impl Orchestrator {
    pub fn new(scraper: Arc<dyn StatisticScraper>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            scraper,
            notifier,
            recipients: Vec::new(),
            catalog_check: catalog::validate,
        }
    }

    pub fn with_recipients(mut self, recipients: Vec<String>) -> Self {
        self.recipients = recipients;
        self
    }

    #[cfg(test)]
    pub(crate) fn with_catalog_check(mut self, check: fn() -> Result<()>) -> Self {
        self.catalog_check = check;
        self
    }

    /// Scrape every statistic in `statistics` concurrently, all dated `date`.
    pub async fn run_all(&self, statistics: &[String], date: &RankDate) -> Result<RunSummary> {
        let started_at = RankDate::now();
        info!(stats = statistics.len(), date = %date, "Starting run");

        match self.fan_out(statistics, date).await {
            Ok(outcomes) => {
                let summary = RunSummary::from_outcomes(outcomes, started_at, RankDate::now());
                info!(
                    total = summary.total_stats,
                    succeeded = summary.success_count,
                    failed = summary.failures.len(),
                    "Run finished"
                );
                self.deliver(Report::for_summary(&summary)).await;
                Ok(summary)
            }
            Err(e) => {
                error!(error = %e, "Run aborted");
                self.deliver(Report::for_error(&started_at, &RankDate::now(), &e))
                    .await;
                Err(e)
            }
        }
    }

    async fn fan_out(&self, statistics: &[String], date: &RankDate) -> Result<Vec<ScrapeOutcome>> {
        (self.catalog_check)()?;

        let handles = statistics.iter().map(|statistic| {
            let scraper = self.scraper.clone();
            let statistic = statistic.clone();
            let date = date.clone();
            tokio::spawn(async move { scraper.scrape(&statistic, &date).await })
        });
        let joined = join_all(handles.collect::<Vec<_>>()).await;

        let mut outcomes = Vec::with_capacity(statistics.len());
        for (statistic, result) in statistics.iter().zip(joined) {
            let outcome = match result {
                Ok(Ok(stored)) => {
                    info!(statistic = %statistic, stored, "Statistic succeeded");
                    ScrapeOutcome::succeeded(statistic)
                }
                Ok(Err(e)) => {
                    warn!(statistic = %statistic, error = %e, "Statistic failed");
                    ScrapeOutcome::failed(statistic, e.to_string())
                }
                Err(join_error) if join_error.is_panic() => {
                    warn!(statistic = %statistic, "Statistic task panicked");
                    ScrapeOutcome::failed(statistic, panic_message(join_error.into_panic()))
                }
                Err(join_error) => return Err(join_error.into()),
            };
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    async fn deliver(&self, report: Report) {
        if let Err(e) = self
            .notifier
            .send(&report.subject, &report.html_body, &self.recipients)
            .await
        {
            error!(error = %e, subject = %report.subject, "Failed to send run report");
        }
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("task panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("task panicked: {}", message)
    } else {
        "task panicked".to_string()
    }
}
