//! Tests for tie-break fill and the extractor, driven by a scripted browser

use super::*;
use crate::{
    browser::{BrowserEngine, BrowserSession, SessionConfig},
    catalog,
    cli::types::TableName,
    storage::{
        Observation, RankingStore, ScanCursor, ScanPage, SqliteRankingStore, UNKNOWN_VALUE,
    },
    writer::BatchWriter,
    OutrankError,
};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const BASE: &str = "https://stats.test/team";
const STAT: &str = "Total Offense";

fn ranks(values: &[&str]) -> Vec<RankedRow> {
    values
        .iter()
        .enumerate()
        .map(|(i, rank)| RankedRow::new(rank, &format!("Team {}", i)))
        .collect()
}

fn rank_values(rows: &[RankedRow]) -> Vec<&str> {
    rows.iter().map(|r| r.rank.as_str()).collect()
}

#[test]
fn test_fill_ties_carries_previous_rank() {
    let filled = fill_ties(&ranks(&["1", "2", "-", "-", "5"]));
    assert_eq!(rank_values(&filled), vec!["1", "2", "2", "2", "5"]);
}

#[test]
fn test_fill_ties_leading_marker_stays_unresolved() {
    let filled = fill_ties(&ranks(&["-", "2"]));
    assert_eq!(rank_values(&filled), vec!["-", "2"]);
}

#[test]
fn test_fill_ties_is_idempotent_and_keeps_order() {
    let input = ranks(&["-", "1", "-", "3", "-", "-", "6", "-"]);
    let once = fill_ties(&input);
    let twice = fill_ties(&once);
    assert_eq!(once, twice);
    assert_eq!(rank_values(&once), vec!["-", "1", "1", "3", "3", "3", "6", "6"]);

    let teams: Vec<_> = once.iter().map(|r| r.team.clone()).collect();
    let original: Vec<_> = input.iter().map(|r| r.team.clone()).collect();
    assert_eq!(teams, original);
}

#[test]
fn test_fill_ties_empty() {
    assert!(fill_ties(&[]).is_empty());
}

// Scripted browser

#[derive(Debug, Clone)]
enum FakePage {
    Rows(Vec<RankedRow>),
    Blocked,
    Challenge,
    Unreachable,
    Opaque,
    Empty,
    Hang,
    Crash,
}

#[derive(Default)]
struct Script {
    pages: Mutex<HashMap<String, VecDeque<FakePage>>>,
    launches: AtomicUsize,
    closes: AtomicUsize,
    navigations: AtomicUsize,
    captures: AtomicUsize,
}

impl Script {
    /// Queue responses for a page; the last one repeats once the queue runs dry.
    fn page(&self, page: u32, responses: Vec<FakePage>) {
        self.pages
            .lock()
            .unwrap()
            .insert(url(page), responses.into_iter().collect());
    }

    fn next(&self, url: &str) -> FakePage {
        let mut pages = self.pages.lock().unwrap();
        match pages.get_mut(url) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue.front().cloned().unwrap_or(FakePage::Empty),
            None => FakePage::Empty,
        }
    }
}

struct FakeEngine(Arc<Script>);

#[async_trait]
impl BrowserEngine for FakeEngine {
    async fn launch(&self, _config: &SessionConfig) -> Result<Box<dyn BrowserSession>> {
        self.0.launches.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSession {
            script: self.0.clone(),
            current: FakePage::Empty,
        }))
    }
}

struct FakeSession {
    script: Arc<Script>,
    current: FakePage,
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<()> {
        self.script.navigations.fetch_add(1, Ordering::SeqCst);
        self.current = self.script.next(url);
        match self.current {
            FakePage::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(())
            }
            FakePage::Unreachable => Err(OutrankError::Timeout {
                operation: format!("navigation to {}", url),
                after: timeout,
            }),
            _ => Ok(()),
        }
    }

    async fn wait_for_selector(&mut self, selector: &str, timeout: Duration) -> Result<()> {
        match self.current {
            FakePage::Rows(_) | FakePage::Crash => Ok(()),
            _ => Err(OutrankError::Timeout {
                operation: format!("waiting for {}", selector),
                after: timeout,
            }),
        }
    }

    async fn has_element(&mut self, _selector: &str) -> Result<bool> {
        Ok(matches!(self.current, FakePage::Rows(_)))
    }

    async fn extract_rows(&mut self, _table_selector: &str) -> Result<Vec<RankedRow>> {
        match &self.current {
            FakePage::Rows(rows) => Ok(rows.clone()),
            FakePage::Crash => panic!("renderer crashed"),
            _ => Ok(Vec::new()),
        }
    }

    async fn content(&mut self) -> Result<String> {
        self.script.captures.fetch_add(1, Ordering::SeqCst);
        self.body()
    }

    async fn snapshot(&mut self) -> Result<Vec<u8>> {
        self.body().map(String::into_bytes)
    }

    async fn close(&mut self) -> Result<()> {
        self.script.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl FakeSession {
    fn body(&self) -> Result<String> {
        match self.current {
            FakePage::Blocked => Ok("<html><h1>Access Denied</h1></html>".to_string()),
            FakePage::Challenge => {
                Ok("<html><title>Just a moment...</title></html>".to_string())
            }
            FakePage::Opaque => Err(OutrankError::NoPageLoaded),
            _ => Ok("<html></html>".to_string()),
        }
    }
}

fn url(page: u32) -> String {
    catalog::locator_for(STAT).unwrap().page_url(BASE, page)
}

fn rows(pairs: &[(&str, &str)]) -> FakePage {
    FakePage::Rows(pairs.iter().map(|(r, t)| RankedRow::new(r, t)).collect())
}

fn test_config() -> ExtractorConfig {
    ExtractorConfig {
        base_url: BASE.to_string(),
        navigation_timeout: Duration::from_millis(50),
        table_wait: Duration::from_millis(50),
        ..ExtractorConfig::default()
    }
}

fn memory_store() -> Arc<SqliteRankingStore> {
    let store = SqliteRankingStore::new_in_memory().unwrap();
    store.ensure_rankings_table(&TableName::rankings()).unwrap();
    Arc::new(store)
}

fn extractor(script: &Arc<Script>, store: Arc<dyn RankingStore>) -> Extractor {
    Extractor::with_config(
        Arc::new(FakeEngine(script.clone())),
        BatchWriter::new(store, TableName::rankings()),
        test_config(),
    )
}

fn date() -> RankDate {
    "2024-10-01T14:00:00.000Z".parse().unwrap()
}

#[tokio::test]
async fn test_unknown_statistic_fails_before_browser_activity() {
    let script = Arc::new(Script::default());
    let result = extractor(&script, memory_store())
        .extract("Not A Real Stat", &date())
        .await;

    match result {
        Err(OutrankError::UnknownStatistic { statistic }) => {
            assert_eq!(statistic, "Not A Real Stat")
        }
        other => panic!("Expected UnknownStatistic, got {:?}", other),
    }
    assert_eq!(script.launches.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_extract_scrapes_all_pages_and_fills_ties() {
    let script = Arc::new(Script::default());
    script.page(1, vec![rows(&[("1", "Ohio St."), ("2", "Oregon"), ("-", "Texas")])]);
    script.page(2, vec![rows(&[("4", "Army"), ("n/a", "Navy")])]);
    script.page(3, vec![FakePage::Empty]);

    let observations = extractor(&script, memory_store())
        .extract(STAT, &date())
        .await
        .unwrap();

    assert_eq!(
        observations,
        vec![
            Observation::new("Ohio St.", STAT, &date(), 1),
            Observation::new("Oregon", STAT, &date(), 2),
            Observation::new("Texas", STAT, &date(), 2),
            Observation::new("Army", STAT, &date(), 4),
            Observation::new("Navy", STAT, &date(), UNKNOWN_VALUE),
        ]
    );
    assert_eq!(script.navigations.load(Ordering::SeqCst), 3);
    assert_eq!(script.launches.load(Ordering::SeqCst), 1);
    assert_eq!(script.closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_first_row_not_rank_one_is_retried_then_fails() {
    let script = Arc::new(Script::default());
    script.page(1, vec![rows(&[("2", "Oregon"), ("3", "Texas")])]);

    let result = extractor(&script, memory_store()).extract(STAT, &date()).await;

    match result {
        Err(OutrankError::ExtractionFailed {
            statistic,
            attempts,
        }) => {
            assert_eq!(statistic, STAT);
            assert_eq!(attempts, 3);
        }
        other => panic!("Expected ExtractionFailed, got {:?}", other),
    }
    assert_eq!(script.navigations.load(Ordering::SeqCst), 9);
    assert_eq!(script.closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_blocked_first_attempt_discards_rows_and_retries() {
    let script = Arc::new(Script::default());
    script.page(1, vec![FakePage::Blocked, rows(&[("1", "Ohio St.")])]);
    script.page(2, vec![rows(&[("2", "Stale")]), rows(&[("2", "Oregon")])]);

    let observations = extractor(&script, memory_store())
        .extract(STAT, &date())
        .await
        .unwrap();

    let teams: Vec<_> = observations.iter().map(|o| o.team.as_str()).collect();
    assert_eq!(teams, vec!["Ohio St.", "Oregon"]);
    assert_eq!(script.navigations.load(Ordering::SeqCst), 6);
}

#[tokio::test]
async fn test_later_page_failure_does_not_reject_attempt() {
    let script = Arc::new(Script::default());
    script.page(1, vec![rows(&[("1", "Ohio St.")])]);
    script.page(2, vec![FakePage::Blocked]);
    script.page(3, vec![rows(&[("3", "Texas")])]);

    let observations = extractor(&script, memory_store())
        .extract(STAT, &date())
        .await
        .unwrap();
    assert_eq!(observations.len(), 2);
}

#[tokio::test]
async fn test_navigation_timeout_is_page_level() {
    let script = Arc::new(Script::default());
    script.page(1, vec![FakePage::Hang]);

    let result = extractor(&script, memory_store()).extract(STAT, &date()).await;
    assert!(matches!(result, Err(OutrankError::ExtractionFailed { .. })));
    assert_eq!(script.closes.load(Ordering::SeqCst), 1);
    // Every failed page, hung navigations included, was inspected.
    assert_eq!(script.captures.load(Ordering::SeqCst), 9);
}

#[tokio::test]
async fn test_session_closed_when_extraction_panics() {
    let script = Arc::new(Script::default());
    script.page(1, vec![FakePage::Crash]);
    let extractor = Arc::new(extractor(&script, memory_store()));

    let handle = tokio::spawn({
        let extractor = extractor.clone();
        async move { extractor.extract(STAT, &date()).await }
    });
    let joined = handle.await;

    assert!(joined.unwrap_err().is_panic());
    assert_eq!(script.closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_extract_and_store_writes_observations() {
    let script = Arc::new(Script::default());
    script.page(1, vec![rows(&[("1", "Ohio St."), ("-", "Oregon")])]);
    let store = memory_store();

    let stored = extractor(&script, store.clone())
        .scrape(STAT, &date())
        .await
        .unwrap();

    assert_eq!(stored, 2);
    assert_eq!(
        store.count_observations(&TableName::rankings()).await.unwrap(),
        2
    );
    let oregon = store
        .get_observation(&TableName::rankings(), "Oregon", STAT, date().as_str())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(oregon.value, 1);
}

struct BrokenStore;

#[async_trait]
impl RankingStore for BrokenStore {
    async fn table_exists(&self, _table: &TableName) -> Result<bool> {
        Ok(true)
    }

    async fn put_batch(&self, _table: &TableName, _items: &[Observation]) -> Result<()> {
        Err(OutrankError::Storage {
            message: "unavailable".to_string(),
        })
    }

    async fn scan_legacy(
        &self,
        _table: &TableName,
        _cursor: Option<ScanCursor>,
        _limit: usize,
    ) -> Result<ScanPage> {
        Ok(ScanPage::default())
    }
}

#[tokio::test]
async fn test_write_failure_fails_the_statistic() {
    let script = Arc::new(Script::default());
    script.page(1, vec![rows(&[("1", "Ohio St.")])]);

    let result = extractor(&script, Arc::new(BrokenStore))
        .extract_and_store(STAT, &date())
        .await;
    assert!(matches!(result, Err(OutrankError::WriteFailure { .. })));
}

// Diagnostics

async fn open_fake_session(script: &Arc<Script>) -> Box<dyn BrowserSession> {
    FakeEngine(script.clone())
        .launch(&SessionConfig::default())
        .await
        .unwrap()
}

#[test]
fn test_find_blocking_marker() {
    assert_eq!(
        diagnostics::find_blocking_marker("<title>Just a moment...</title>"),
        Some("Just a moment...")
    );
    assert_eq!(
        diagnostics::find_blocking_marker("<h1>Access Denied</h1>"),
        Some("Access Denied")
    );
    assert_eq!(diagnostics::find_blocking_marker("<table></table>"), None);
}

#[tokio::test]
async fn test_challenge_page_is_access_blocked() {
    let script = Arc::new(Script::default());
    script.page(1, vec![FakePage::Challenge]);
    let extractor = extractor(&script, memory_store());
    let mut session = open_fake_session(&script).await;

    let result = extractor.scrape_page(&mut *session, &url(1)).await;

    match result {
        Err(OutrankError::AccessBlocked { url: blocked }) => assert_eq!(blocked, url(1)),
        other => panic!("Expected AccessBlocked, got {:?}", other),
    }
    assert_eq!(script.captures.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_navigation_failure_is_captured() {
    let script = Arc::new(Script::default());
    script.page(1, vec![FakePage::Unreachable]);
    let extractor = extractor(&script, memory_store());
    let mut session = open_fake_session(&script).await;

    let result = extractor.scrape_page(&mut *session, &url(1)).await;

    assert!(matches!(result, Err(OutrankError::Timeout { .. })));
    assert_eq!(script.captures.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_capture_survives_unreadable_session() {
    let script = Arc::new(Script::default());
    script.page(1, vec![FakePage::Opaque]);
    let mut session = open_fake_session(&script).await;
    session.navigate(&url(1), Duration::from_secs(1)).await.unwrap();

    let found = diagnostics::capture(&mut *session, &url(1), RANKING_TABLE_SELECTOR).await;

    assert_eq!(found.url, url(1));
    assert_eq!(found.content_length, 0);
    assert_eq!(found.snapshot_length, 0);
    assert!(found.preview.is_empty());
    assert_eq!(found.blocking_marker, None);
    assert!(!found.has_table);
}

#[tokio::test]
async fn test_capture_records_page_details() {
    let script = Arc::new(Script::default());
    script.page(1, vec![FakePage::Blocked]);
    let mut session = open_fake_session(&script).await;
    session.navigate(&url(1), Duration::from_secs(1)).await.unwrap();

    let found = diagnostics::capture(&mut *session, &url(1), RANKING_TABLE_SELECTOR).await;

    let body = "<html><h1>Access Denied</h1></html>";
    assert_eq!(found.content_length, body.len());
    assert_eq!(found.snapshot_length, body.len());
    assert_eq!(found.preview, body);
    assert_eq!(found.blocking_marker, Some("Access Denied"));
}
