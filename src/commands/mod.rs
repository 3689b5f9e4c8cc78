//! Command implementations for the outrank CLI

pub mod api;
pub mod common;
pub mod ingest;
pub mod migrate;
pub mod query;


pub use common::{resolve_date, CommandContext};
