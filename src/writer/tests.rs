//! Tests for chunked batch writes

use super::*;
use crate::storage::{ScanCursor, ScanPage};
use crate::RankDate;
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

/// Records every chunk write and the peak number of writes in flight.
#[derive(Default)]
struct RecordingStore {
    events: Mutex<Vec<String>>,
    chunk_sizes: Mutex<Vec<usize>>,
    in_flight: Mutex<usize>,
    peak: Mutex<usize>,
    fail_teams: Vec<String>,
}

impl RecordingStore {
    fn failing_on(team: &str) -> Self {
        Self {
            fail_teams: vec![team.to_string()],
            ..Default::default()
        }
    }
}

#[async_trait]
impl RankingStore for RecordingStore {
    async fn table_exists(&self, _table: &TableName) -> Result<bool> {
        Ok(true)
    }

    async fn put_batch(&self, _table: &TableName, items: &[Observation]) -> Result<()> {
        let first = items[0].team.clone();
        {
            let mut in_flight = self.in_flight.lock().unwrap();
            *in_flight += 1;
            let mut peak = self.peak.lock().unwrap();
            *peak = (*peak).max(*in_flight);
        }
        self.events.lock().unwrap().push(format!("start {}", first));
        self.chunk_sizes.lock().unwrap().push(items.len());

        tokio::time::sleep(Duration::from_millis(5)).await;

        *self.in_flight.lock().unwrap() -= 1;
        self.events.lock().unwrap().push(format!("end {}", first));

        if items.iter().any(|i| self.fail_teams.contains(&i.team)) {
            return Err(OutrankError::Storage {
                message: "throttled".to_string(),
            });
        }
        Ok(())
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

fn items(count: usize) -> Vec<Observation> {
    let date: RankDate = "2024-10-01".parse().unwrap();
    (0..count)
        .map(|i| Observation::new(&format!("Team {:03}", i), "Total Offense", &date, i as i64 + 1))
        .collect()
}

fn writer(store: Arc<RecordingStore>) -> BatchWriter {
    BatchWriter::new(store, TableName::rankings())
}

#[tokio::test]
async fn test_zero_items_performs_no_writes() {
    let store = Arc::new(RecordingStore::default());
    let report = writer(store.clone()).commit(&[]).await;

    assert_eq!(report, CommitReport::default());
    assert!(store.chunk_sizes.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_26_items_make_two_chunks() {
    let store = Arc::new(RecordingStore::default());
    let report = writer(store.clone()).commit(&items(26)).await;

    assert_eq!(report.chunks_written, 2);
    assert_eq!(report.items_written, 26);
    let mut sizes = store.chunk_sizes.lock().unwrap().clone();
    sizes.sort();
    assert_eq!(sizes, vec![1, 25]);
}

#[tokio::test]
async fn test_chunk_count_is_ceiling() {
    for (count, expected) in [(1, 1), (25, 1), (50, 2), (51, 3), (260, 11)] {
        let store = Arc::new(RecordingStore::default());
        let report = writer(store.clone()).commit(&items(count)).await;
        assert_eq!(report.chunks_attempted(), expected, "for {} items", count);
        assert_eq!(store.chunk_sizes.lock().unwrap().len(), expected);
    }
}

#[tokio::test]
async fn test_groups_settle_before_next_group_starts() {
    let store = Arc::new(RecordingStore::default());
    // 5 chunks in groups of 2: [0, 1], [2, 3], [4]
    let report = writer(store.clone())
        .with_parallelism(2)
        .commit(&items(125))
        .await;
    assert_eq!(report.chunks_written, 5);
    assert!(*store.peak.lock().unwrap() <= 2);

    let events = store.events.lock().unwrap().clone();
    let position = |event: &str| events.iter().position(|e| e == event).unwrap();
    // chunk 0 starts at Team 000, chunk 2 at Team 050, chunk 4 at Team 100
    assert!(position("end Team 000") < position("start Team 050"));
    assert!(position("end Team 025") < position("start Team 050"));
    assert!(position("end Team 075") < position("start Team 100"));
}

#[tokio::test]
async fn test_group_runs_chunks_concurrently() {
    let store = Arc::new(RecordingStore::default());
    writer(store.clone()).commit(&items(100)).await;
    assert_eq!(*store.peak.lock().unwrap(), 4);
}

#[tokio::test]
async fn test_failed_chunk_is_reported_not_retried() {
    let store = Arc::new(RecordingStore::failing_on("Team 030"));
    let report = writer(store.clone()).commit(&items(60)).await;

    assert_eq!(report.chunks_written, 2);
    assert_eq!(report.items_written, 35);
    assert_eq!(
        report.failures,
        vec![ChunkFailure {
            chunk: 1,
            items: 25,
            message: "Storage error: throttled".to_string(),
        }]
    );
    assert_eq!(store.chunk_sizes.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn test_commit_all_turns_failures_into_write_failure() {
    let store = Arc::new(RecordingStore::failing_on("Team 000"));
    match writer(store).commit_all(&items(3)).await {
        Err(OutrankError::WriteFailure {
            table,
            failed_chunks,
            ..
        }) => {
            assert_eq!(table, "AllRankings");
            assert_eq!(failed_chunks, 1);
        }
        other => panic!("Expected WriteFailure, got {:?}", other),
    }
}

#[test]
fn test_parallelism_is_at_least_one() {
    let store = Arc::new(RecordingStore::default());
    assert_eq!(writer(store).with_parallelism(0).parallelism(), 1);
}
