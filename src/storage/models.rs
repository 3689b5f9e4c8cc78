//! Data models for the storage layer

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::cli::types::RankDate;

/// Stored in place of a rank the source did not provide. Sorts after every
/// real rank, so "best N" range queries keep unknown values last.
pub const UNKNOWN_VALUE: i64 = 99999;

/// One (team, statistic, date) -> rank fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub team: String,
    pub statistic: String,
    pub date: RankDate,
    pub value: i64,
}

impl Observation {
    pub fn new(team: &str, statistic: &str, date: &RankDate, value: i64) -> Self {
        Self {
            team: team.to_string(),
            statistic: statistic.to_string(),
            date: date.clone(),
            value,
        }
    }

    /// Primary access path key (`team#<team>`).
    pub fn partition_key(&self) -> String {
        format!("team#{}", self.team)
    }

    /// Primary access path sort key (`date#<date>#stat#<stat>`).
    pub fn sort_key(&self) -> String {
        format!("date#{}#stat#{}", self.date, self.statistic)
    }

    /// Secondary access path key (`stat#<stat>`).
    pub fn index_partition_key(&self) -> String {
        format!("stat#{}", self.statistic)
    }

    /// Secondary access path sort key (`date#<date>#team#<team>`).
    pub fn index_sort_key(&self) -> String {
        format!("date#{}#team#{}", self.date, self.team)
    }

    pub fn is_unknown(&self) -> bool {
        self.value == UNKNOWN_VALUE
    }
}

/// Parse a rank or legacy numeric value the way the source data has always
/// been read: leading sign and digits are taken, anything after them is
/// ignored, and text without a leading integer becomes [`UNKNOWN_VALUE`].
pub fn parse_rank_value(raw: &str) -> i64 {
    let trimmed = raw.trim();
    let digits_start = usize::from(trimmed.starts_with(['-', '+']));
    let digits_len = trimmed[digits_start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .count();
    if digits_len == 0 {
        return UNKNOWN_VALUE;
    }
    trimmed[..digits_start + digits_len]
        .parse()
        .unwrap_or(UNKNOWN_VALUE)
}

/// A typed attribute of a legacy record, in the `{"S": ..}` / `{"N": ..}`
/// shape the legacy export uses.
///
/// Set, list, map and binary attributes are carried as raw JSON in `Other`
/// so a record holding one still loads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeValue {
    S(String),
    N(String),
    #[serde(rename = "BOOL")]
    Bool(bool),
    #[serde(rename = "NULL")]
    Null(bool),
    #[serde(untagged)]
    Other(serde_json::Value),
}

impl AttributeValue {
    pub fn as_string(&self) -> Option<&str> {
        match self {
            AttributeValue::S(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric value, or [`UNKNOWN_VALUE`] when the attribute is not a
    /// non-empty number.
    pub fn rank_value(&self) -> i64 {
        match self {
            AttributeValue::N(n) if !n.trim().is_empty() => parse_rank_value(n),
            _ => UNKNOWN_VALUE,
        }
    }
}

/// A wide-format historical record: `team`, `date` and one attribute per
/// statistic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LegacyRecord {
    pub attributes: BTreeMap<String, AttributeValue>,
}

impl LegacyRecord {
    pub const TEAM_FIELD: &'static str = "team";
    pub const DATE_FIELD: &'static str = "date";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: AttributeValue) -> Self {
        self.attributes.insert(name.to_string(), value);
        self
    }

    pub fn team(&self) -> Option<&str> {
        self.non_empty_string(Self::TEAM_FIELD)
    }

    pub fn date(&self) -> Option<&str> {
        self.non_empty_string(Self::DATE_FIELD)
    }

    /// Every attribute except the key fields.
    pub fn stat_fields(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.attributes
            .iter()
            .filter(|(name, _)| {
                name.as_str() != Self::TEAM_FIELD && name.as_str() != Self::DATE_FIELD
            })
            .map(|(name, value)| (name.as_str(), value))
    }

    fn non_empty_string(&self, field: &str) -> Option<&str> {
        self.attributes
            .get(field)
            .and_then(AttributeValue::as_string)
            .filter(|s| !s.is_empty())
    }
}

/// Opaque position in a legacy scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanCursor(pub i64);

/// One page of a cursor-paginated scan.
#[derive(Debug, Clone, Default)]
pub struct ScanPage {
    pub records: Vec<LegacyRecord>,
    /// `None` once the source has nothing further to return.
    pub next_cursor: Option<ScanCursor>,
}

/// Every statistic for a team on its most recent date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamSnapshot {
    pub team: String,
    pub date: String,
    pub stats: BTreeMap<String, i64>,
}

/// A team's statistics grouped by date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamHistory {
    pub team: String,
    pub start_date: String,
    pub end_date: String,
    pub stats_by_date: BTreeMap<String, BTreeMap<String, i64>>,
}

/// A team's latest standing for one statistic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamStanding {
    pub team: String,
    pub date: String,
    pub value: i64,
}
