//! Type-safe wrappers for dates and table names.

pub mod names;
pub mod time;

pub use names::TableName;
pub use time::RankDate;
