//! Writes, legacy scans and read-path queries

use async_trait::async_trait;
use rusqlite::{params, OptionalExtension};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};

use super::{
    cache::{CachedResult, QueryKey},
    models::*,
    schema::SqliteRankingStore,
    RankingStore, MAX_BATCH_ITEMS,
};
use crate::{cli::types::TableName, OutrankError, Result};

#[async_trait]
impl RankingStore for SqliteRankingStore {
    async fn table_exists(&self, table: &TableName) -> Result<bool> {
        let name = table.as_str().to_string();
        self.with_conn(move |conn| {
            let found: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
                    params![name],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(found.is_some())
        })
        .await
    }

    async fn put_batch(&self, table: &TableName, items: &[Observation]) -> Result<()> {
        if items.len() > MAX_BATCH_ITEMS {
            return Err(OutrankError::BatchTooLarge {
                size: items.len(),
                limit: MAX_BATCH_ITEMS,
            });
        }
        if items.is_empty() {
            return Ok(());
        }

        let sql = format!(
            "INSERT OR REPLACE INTO {} (team, date, statistic, value) VALUES (?1, ?2, ?3, ?4)",
            table.as_str()
        );
        let items = items.to_vec();
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare_cached(&sql)?;
                for item in &items {
                    stmt.execute(params![
                        item.team,
                        item.date.as_str(),
                        item.statistic,
                        item.value
                    ])?;
                }
            }
            tx.commit()?;
            Ok(())
        })
        .await?;

        self.cache.clear();
        Ok(())
    }

    async fn scan_legacy(
        &self,
        table: &TableName,
        cursor: Option<ScanCursor>,
        limit: usize,
    ) -> Result<ScanPage> {
        let sql = format!(
            "SELECT id, item FROM {} WHERE id > ?1 ORDER BY id LIMIT ?2",
            table.as_str()
        );
        let after = cursor.map(|c| c.0).unwrap_or(0);
        let limit = limit.max(1);

        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![after, limit as i64], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
            })?;

            let mut records = Vec::new();
            let mut last_id = None;
            for row in rows {
                let (id, item) = row?;
                last_id = Some(id);
                let record = serde_json::from_str::<LegacyRecord>(&item).unwrap_or_else(|e| {
                    warn!(id, error = %e, "Unreadable legacy row, passing it on empty");
                    LegacyRecord::default()
                });
                records.push(record);
            }

            let next_cursor = if records.len() == limit {
                last_id.map(ScanCursor)
            } else {
                None
            };
            Ok(ScanPage {
                records,
                next_cursor,
            })
        })
        .await
    }
}

impl SqliteRankingStore {
    /// Append legacy records to a legacy table, returning how many were stored.
    pub async fn insert_legacy_records(
        &self,
        table: &TableName,
        records: &[LegacyRecord],
    ) -> Result<usize> {
        let sql = format!("INSERT INTO {} (item) VALUES (?1)", table.as_str());
        let encoded = records
            .iter()
            .map(serde_json::to_string)
            .collect::<std::result::Result<Vec<_>, _>>()?;

        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare_cached(&sql)?;
                for item in &encoded {
                    stmt.execute(params![item])?;
                }
            }
            tx.commit()?;
            Ok(encoded.len())
        })
        .await
    }

    /// Look up one observation by its identity.
    pub async fn get_observation(
        &self,
        table: &TableName,
        team: &str,
        statistic: &str,
        date: &str,
    ) -> Result<Option<Observation>> {
        let sql = format!(
            "SELECT team, statistic, date, value FROM {}
             WHERE team = ?1 AND statistic = ?2 AND date = ?3",
            table.as_str()
        );
        let (team, statistic, date) = (team.to_string(), statistic.to_string(), date.to_string());

        self.with_conn(move |conn| {
            let found = conn
                .query_row(&sql, params![team, statistic, date], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, i64>(3)?,
                    ))
                })
                .optional()?;

            found
                .map(|(team, statistic, date, value)| -> Result<Observation> {
                    Ok(Observation {
                        team,
                        statistic,
                        date: date.parse()?,
                        value,
                    })
                })
                .transpose()
        })
        .await
    }

    /// Number of observations in a rankings table.
    pub async fn count_observations(&self, table: &TableName) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", table.as_str());
        self.with_conn(move |conn| {
            let count: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
            Ok(count as u64)
        })
        .await
    }

    /// All statistics for a team on the most recent date it has data for.
    pub async fn latest_for_team(
        &self,
        table: &TableName,
        team: &str,
    ) -> Result<Option<TeamSnapshot>> {
        let key = QueryKey::LatestForTeam {
            table: table.to_string(),
            team: team.to_string(),
        };
        if let Some(CachedResult::Snapshot(hit)) = self.cache.get(&key) {
            debug!(team, "Latest team stats served from cache");
            return Ok(hit);
        }
        let generation = self.cache.generation();

        let latest_sql = format!(
            "SELECT date FROM {} WHERE team = ?1 ORDER BY date DESC LIMIT 1",
            table.as_str()
        );
        let stats_sql = format!(
            "SELECT statistic, value FROM {} WHERE team = ?1 AND date = ?2",
            table.as_str()
        );
        let team_owned = team.to_string();

        let snapshot = self
            .with_conn(move |conn| {
                let latest: Option<String> = conn
                    .query_row(&latest_sql, params![team_owned], |row| row.get(0))
                    .optional()?;
                let Some(date) = latest else {
                    return Ok(None);
                };

                let mut stmt = conn.prepare(&stats_sql)?;
                let rows = stmt.query_map(params![team_owned, date], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
                })?;
                let mut stats = BTreeMap::new();
                for row in rows {
                    let (statistic, value) = row?;
                    stats.insert(statistic, value);
                }

                Ok(Some(TeamSnapshot {
                    team: team_owned,
                    date,
                    stats,
                }))
            })
            .await?;

        self.cache.put(key, CachedResult::Snapshot(snapshot.clone()), generation);
        Ok(snapshot)
    }

    /// A team's statistics between two dates, grouped by date. The end date is
    /// prefix-inclusive: `2024-10-01` includes every timestamp on that day.
    pub async fn team_history(
        &self,
        table: &TableName,
        team: &str,
        start: &str,
        end: &str,
    ) -> Result<TeamHistory> {
        let key = QueryKey::TeamHistory {
            table: table.to_string(),
            team: team.to_string(),
            start: start.to_string(),
            end: end.to_string(),
        };
        if let Some(CachedResult::History(hit)) = self.cache.get(&key) {
            return Ok(hit);
        }
        let generation = self.cache.generation();

        let sql = format!(
            "SELECT date, statistic, value FROM {}
             WHERE team = ?1 AND date >= ?2
               AND (date <= ?3 OR substr(date, 1, length(?3)) = ?3)
             ORDER BY date",
            table.as_str()
        );
        let (team_owned, start_owned, end_owned) =
            (team.to_string(), start.to_string(), end.to_string());

        let history = self
            .with_conn(move |conn| {
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(params![team_owned, start_owned, end_owned], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                })?;

                let mut stats_by_date: BTreeMap<String, BTreeMap<String, i64>> = BTreeMap::new();
                for row in rows {
                    let (date, statistic, value) = row?;
                    stats_by_date.entry(date).or_default().insert(statistic, value);
                }

                Ok(TeamHistory {
                    team: team_owned,
                    start_date: start_owned,
                    end_date: end_owned,
                    stats_by_date,
                })
            })
            .await?;

        self.cache.put(key, CachedResult::History(history.clone()), generation);
        Ok(history)
    }

    /// Each team's most recent value for one statistic, most recent first.
    pub async fn latest_by_statistic(
        &self,
        table: &TableName,
        statistic: &str,
    ) -> Result<Vec<TeamStanding>> {
        let key = QueryKey::LatestByStatistic {
            table: table.to_string(),
            statistic: statistic.to_string(),
        };
        if let Some(CachedResult::Standings(hit)) = self.cache.get(&key) {
            return Ok(hit);
        }
        let generation = self.cache.generation();

        let sql = format!(
            "SELECT team, date, value FROM {}
             WHERE statistic = ?1
             ORDER BY date DESC, team",
            table.as_str()
        );
        let statistic_owned = statistic.to_string();

        let standings = self
            .with_conn(move |conn| {
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(params![statistic_owned], |row| {
                    Ok(TeamStanding {
                        team: row.get(0)?,
                        date: row.get(1)?,
                        value: row.get(2)?,
                    })
                })?;

                let mut seen = HashSet::new();
                let mut standings = Vec::new();
                for row in rows {
                    let standing = row?;
                    if seen.insert(standing.team.clone()) {
                        standings.push(standing);
                    }
                }
                Ok(standings)
            })
            .await?;

        self.cache.put(key, CachedResult::Standings(standings.clone()), generation);
        Ok(standings)
    }
}
