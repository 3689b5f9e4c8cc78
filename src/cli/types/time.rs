//! Observation date type.

use crate::error::{OutrankError, Result};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The date an observation was recorded for.
///
/// Dates are kept as the exact string the caller supplied (scrapes stamp an
/// ISO-8601 UTC timestamp, migrated records keep their legacy value) so that
/// lexicographic order matches chronological order for ISO input.
///
/// # Examples
///
/// ```rust
/// use outrank::RankDate;
///
/// let date: RankDate = "2024-10-01T14:00:00.000Z".parse().unwrap();
/// assert_eq!(date.as_str(), "2024-10-01T14:00:00.000Z");
/// assert!("   ".parse::<RankDate>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RankDate(String);

impl RankDate {
    /// Current instant in the same millisecond ISO format scrapes have always used.
    pub fn now() -> Self {
        Self(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RankDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RankDate {
    type Err = OutrankError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(OutrankError::InvalidDate {
                value: s.to_string(),
            });
        }
        Ok(Self(trimmed.to_string()))
    }
}
