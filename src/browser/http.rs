//! Browser engine backed by plain HTTP requests and HTML parsing.
//!
//! Pages are fetched with `reqwest` using the session's user agent, headers
//! and timeouts, and queried with `scraper`. No script runs, so a selector
//! that is absent from the delivered markup never appears.

use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue},
    Client,
};
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::debug;

use super::{BrowserEngine, BrowserSession, RankedRow, SessionConfig};
use crate::{OutrankError, Result};

#[cfg(test)]
mod tests;

#[derive(Debug, Clone, Default)]
pub struct HttpBrowser;

impl HttpBrowser {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl BrowserEngine for HttpBrowser {
    async fn launch(&self, config: &SessionConfig) -> Result<Box<dyn BrowserSession>> {
        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| OutrankError::Config {
                message: format!("invalid header name '{}': {}", name, e),
            })?;
            headers.insert(name, HeaderValue::from_str(value)?);
        }

        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .timeout(config.navigation_timeout)
            .connect_timeout(config.default_timeout)
            .build()?;

        Ok(Box::new(HttpSession {
            client: Some(client),
            page: None,
        }))
    }
}

struct LoadedPage {
    url: String,
    status: u16,
    html: String,
}

pub struct HttpSession {
    client: Option<Client>,
    page: Option<LoadedPage>,
}

impl HttpSession {
    fn page(&self) -> Result<&LoadedPage> {
        if self.client.is_none() {
            return Err(OutrankError::SessionClosed);
        }
        self.page.as_ref().ok_or(OutrankError::NoPageLoaded)
    }
}

#[async_trait]
impl BrowserSession for HttpSession {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<()> {
        let client = self.client.as_ref().ok_or(OutrankError::SessionClosed)?;
        let response = client.get(url).timeout(timeout).send().await.map_err(|e| {
            if e.is_timeout() {
                OutrankError::Timeout {
                    operation: format!("navigation to {}", url),
                    after: timeout,
                }
            } else {
                OutrankError::Http(e)
            }
        })?;

        // Error statuses still carry the page a blocker rendered, which is
        // what diagnostics need to see.
        let status = response.status().as_u16();
        let html = response.text().await?;
        debug!(url, status, bytes = html.len(), "Page loaded");

        self.page = Some(LoadedPage {
            url: url.to_string(),
            status,
            html,
        });
        Ok(())
    }

    async fn wait_for_selector(&mut self, selector: &str, timeout: Duration) -> Result<()> {
        let page = self.page()?;
        if document_has(&page.html, selector)? {
            Ok(())
        } else {
            Err(OutrankError::Timeout {
                operation: format!("waiting for '{}' on {} (status {})", selector, page.url, page.status),
                after: timeout,
            })
        }
    }

    async fn has_element(&mut self, selector: &str) -> Result<bool> {
        document_has(&self.page()?.html, selector)
    }

    async fn extract_rows(&mut self, table_selector: &str) -> Result<Vec<RankedRow>> {
        extract_ranked_rows(&self.page()?.html, table_selector)
    }

    async fn content(&mut self) -> Result<String> {
        Ok(self.page()?.html.clone())
    }

    async fn snapshot(&mut self) -> Result<Vec<u8>> {
        Ok(self.page()?.html.as_bytes().to_vec())
    }

    async fn close(&mut self) -> Result<()> {
        self.client = None;
        self.page = None;
        Ok(())
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|_| OutrankError::InvalidSelector {
        selector: selector.to_string(),
    })
}

fn cell_text(cell: &ElementRef<'_>) -> String {
    cell.text().collect::<String>().trim().to_string()
}

/// Whether any element in `html` matches `selector`.
pub fn document_has(html: &str, selector: &str) -> Result<bool> {
    let selector = parse_selector(selector)?;
    let document = Html::parse_document(html);
    let found = document.select(&selector).next().is_some();
    Ok(found)
}

/// The ranking-table extraction routine: for the first table matching
/// `table_selector`, read each body row's first two cells as (rank, team).
pub fn extract_ranked_rows(html: &str, table_selector: &str) -> Result<Vec<RankedRow>> {
    let table_selector = parse_selector(table_selector)?;
    let row_selector = parse_selector("tbody > tr")?;
    let cell_selector = parse_selector("td")?;

    let document = Html::parse_document(html);
    let Some(table) = document.select(&table_selector).next() else {
        return Ok(Vec::new());
    };

    let rows = table
        .select(&row_selector)
        .filter_map(|row| {
            let cells: Vec<_> = row.select(&cell_selector).take(2).collect();
            if cells.len() < 2 {
                return None;
            }
            RankedRow::from_cells(&cell_text(&cells[0]), &cell_text(&cells[1]))
        })
        .collect();
    Ok(rows)
}
