//! Tests for the HTTP-backed browser engine

use super::*;
use crate::browser::SessionConfig;
use wiremock::{
    matchers::{header, method, path},
    Mock, MockServer, ResponseTemplate,
};

const TABLE: &str = ".block-stats__stats-table";

fn ranking_page() -> String {
    r#"<html><body>
        <table class="block-stats__stats-table">
          <thead><tr><th>Rank</th><th>Team</th><th>G</th></tr></thead>
          <tbody>
            <tr><td>1</td><td>Ohio St.</td><td>6</td></tr>
            <tr><td>2</td><td>Oregon</td><td>6</td></tr>
            <tr><td></td><td>Texas</td><td>6</td></tr>
            <tr><td>4</td><td>* Includes bowl games</td><td></td></tr>
            <tr><td colspan="3">ad</td></tr>
          </tbody>
        </table>
    </body></html>"#
        .to_string()
}

async fn open_session() -> Box<dyn BrowserSession> {
    HttpBrowser::new()
        .launch(&SessionConfig::default())
        .await
        .unwrap()
}

#[test]
fn test_extract_ranked_rows_reads_first_two_cells() {
    let rows = extract_ranked_rows(&ranking_page(), TABLE).unwrap();
    assert_eq!(
        rows,
        vec![
            RankedRow::new("1", "Ohio St."),
            RankedRow::new("2", "Oregon"),
            RankedRow::new("-", "Texas"),
        ]
    );
}

#[test]
fn test_extract_ranked_rows_without_table_is_empty() {
    let rows = extract_ranked_rows("<html><body><p>nothing</p></body></html>", TABLE).unwrap();
    assert!(rows.is_empty());
}

#[test]
fn test_invalid_selector() {
    match document_has("<p></p>", "<<<") {
        Err(OutrankError::InvalidSelector { selector }) => assert_eq!(selector, "<<<"),
        other => panic!("Expected InvalidSelector, got {:?}", other),
    }
}

#[tokio::test]
async fn test_navigate_sends_browser_identity() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stats/football/fbs/current/team/21"))
        .and(header("Accept-Language", "en-US,en;q=0.9"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ranking_page()))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = open_session().await;
    let url = format!("{}/stats/football/fbs/current/team/21", server.uri());
    session.navigate(&url, Duration::from_secs(5)).await.unwrap();

    session.wait_for_selector(TABLE, Duration::from_secs(1)).await.unwrap();
    let rows = session.extract_rows(TABLE).await.unwrap();
    assert_eq!(rows.len(), 3);
    session.close().await.unwrap();
}

#[tokio::test]
async fn test_blocked_page_content_is_kept() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(403).set_body_string("<html><h1>Access Denied</h1></html>"),
        )
        .mount(&server)
        .await;

    let mut session = open_session().await;
    session
        .navigate(&server.uri(), Duration::from_secs(5))
        .await
        .unwrap();

    assert!(session.content().await.unwrap().contains("Access Denied"));
    assert!(!session.has_element(TABLE).await.unwrap());
    let waited = session.wait_for_selector(TABLE, Duration::from_secs(1)).await;
    assert!(matches!(waited, Err(OutrankError::Timeout { .. })));
}

#[tokio::test]
async fn test_navigation_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let mut session = open_session().await;
    let result = session
        .navigate(&server.uri(), Duration::from_millis(200))
        .await;
    assert!(matches!(result, Err(OutrankError::Timeout { .. })));
}

#[tokio::test]
async fn test_closed_session_rejects_use() {
    let mut session = open_session().await;
    session.close().await.unwrap();

    let result = session
        .navigate("http://127.0.0.1:9/", Duration::from_secs(1))
        .await;
    assert!(matches!(result, Err(OutrankError::SessionClosed)));
    assert!(matches!(
        session.content().await,
        Err(OutrankError::SessionClosed)
    ));
}

#[tokio::test]
async fn test_reading_before_navigation_is_no_page_loaded() {
    let mut session = open_session().await;

    let content = session.content().await;
    assert!(matches!(content, Err(OutrankError::NoPageLoaded)));
    assert!(content.unwrap_err().is_page_level());
    assert!(matches!(
        session.extract_rows(TABLE).await,
        Err(OutrankError::NoPageLoaded)
    ));
}
