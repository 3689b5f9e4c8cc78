//! Report delivery.
//!
//! The pipeline hands a finished report to a [`Notifier`] once and moves on;
//! delivery problems are the caller's to log, never retried.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info};

use crate::Result;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, subject: &str, html_body: &str, recipients: &[String]) -> Result<()>;
}

/// Writes reports to the log. Used when no delivery endpoint is configured.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, subject: &str, html_body: &str, recipients: &[String]) -> Result<()> {
        info!(subject, recipients = ?recipients, "Run report");
        debug!(body = html_body, "Run report body");
        Ok(())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WebhookPayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    sender: Option<&'a str>,
    recipients: &'a [String],
    subject: &'a str,
    html_body: &'a str,
}

/// Posts reports as JSON to a mail relay or chat webhook.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: Client,
    url: String,
    sender: Option<String>,
}

impl WebhookNotifier {
    pub fn new(url: &str, sender: Option<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.to_string(),
            sender,
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, subject: &str, html_body: &str, recipients: &[String]) -> Result<()> {
        let payload = WebhookPayload {
            sender: self.sender.as_deref(),
            recipients,
            subject,
            html_body,
        };
        self.client
            .post(&self.url)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;
        info!(subject, url = %self.url, "Run report delivered");
        Ok(())
    }
}
