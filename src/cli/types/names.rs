//! Store table names.

use crate::error::{OutrankError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default table holding normalized observations.
pub const DEFAULT_RANKINGS_TABLE: &str = "AllRankings";

/// Default table holding legacy wide-format records.
pub const DEFAULT_LEGACY_TABLE: &str = "historicalRankingsTable";

/// A validated table name.
///
/// Table names are interpolated into SQL, so only ASCII letters, digits and
/// underscores are accepted and the first character must not be a digit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TableName(String);

impl TableName {
    pub fn new(name: &str) -> Result<Self> {
        let valid = name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if valid {
            Ok(Self(name.to_string()))
        } else {
            Err(OutrankError::InvalidTableName {
                name: name.to_string(),
            })
        }
    }

    pub fn rankings() -> Self {
        Self(DEFAULT_RANKINGS_TABLE.to_string())
    }

    pub fn legacy() -> Self {
        Self(DEFAULT_LEGACY_TABLE.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TableName {
    type Err = OutrankError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for TableName {
    type Error = OutrankError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(&value)
    }
}

impl From<TableName> for String {
    fn from(value: TableName) -> Self {
        value.0
    }
}
