//! CLI argument definitions and parsing.

pub mod types;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use types::{RankDate, TableName};

#[derive(Debug, Subcommand)]
pub enum StatsCmd {
    /// List every known statistic with its source locator and legacy attribute
    List {
        /// Output as JSON instead of a table.
        #[clap(long)]
        json: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum QueryCmd {
    /// Latest statistics for one team
    Team {
        #[clap(long, short)]
        team: String,

        /// Rankings table to read (defaults to `OUTRANK_RANKINGS_TABLE` or AllRankings).
        #[clap(long)]
        table: Option<TableName>,

        #[clap(long)]
        json: bool,
    },

    /// One team's statistics between two dates (end date matches the whole day)
    History {
        #[clap(long, short)]
        team: String,

        #[clap(long)]
        start: String,

        #[clap(long)]
        end: String,

        #[clap(long)]
        table: Option<TableName>,

        #[clap(long)]
        json: bool,
    },

    /// Every team's latest value for one statistic
    Stat {
        #[clap(long, short)]
        stat: String,

        #[clap(long)]
        table: Option<TableName>,

        #[clap(long)]
        json: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scrape a single statistic and store the rankings.
    Scrape {
        /// Statistic name, e.g. "Total Offense".
        #[clap(long, short)]
        stat: String,

        /// Observation date (ISO-8601). Defaults to now.
        #[clap(long, short)]
        date: Option<RankDate>,

        /// Rankings table to write to.
        #[clap(long)]
        table: Option<TableName>,
    },

    /// Scrape many statistics concurrently and send one summary report.
    ///
    /// Without `--stat`, every statistic in the catalog is scraped.
    RunAll {
        /// Observation date (ISO-8601). Defaults to now.
        #[clap(long, short)]
        date: Option<RankDate>,

        /// Limit the run to these statistics (repeatable).
        #[clap(long = "stat", short = 's')]
        stats: Vec<String>,

        #[clap(long)]
        table: Option<TableName>,

        /// Print the run summary as JSON.
        #[clap(long)]
        json: bool,
    },

    /// Backfill legacy wide records into the rankings table.
    Migrate {
        /// Legacy table to read (defaults to historicalRankingsTable).
        source: Option<TableName>,

        /// Rankings table to write (defaults to AllRankings).
        destination: Option<TableName>,

        /// Concurrent chunk writes per group.
        #[clap(long)]
        parallelism: Option<usize>,

        #[clap(long)]
        json: bool,
    },

    /// Load a JSON array of legacy records into a legacy table.
    ImportLegacy {
        #[clap(long, short)]
        file: PathBuf,

        #[clap(long)]
        table: Option<TableName>,
    },

    /// Create the rankings and legacy tables.
    Init {
        #[clap(long)]
        table: Option<TableName>,

        #[clap(long)]
        legacy_table: Option<TableName>,
    },

    /// Inspect the statistic catalog
    Stats {
        #[clap(subcommand)]
        cmd: StatsCmd,
    },

    /// Read stored rankings
    Query {
        #[clap(subcommand)]
        cmd: QueryCmd,
    },
}

#[derive(Debug, Parser)]
#[clap(name = "outrank", about = "Team ranking scraper and store")]
pub struct Outrank {
    /// Database file (or set `OUTRANK_DB_PATH`).
    #[clap(long, global = true)]
    pub db: Option<PathBuf>,

    /// Debug-level logging unless `RUST_LOG` is set.
    #[clap(long, short, global = true)]
    pub verbose: bool,

    #[clap(subcommand)]
    pub command: Commands,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scrape() {
        let cli = Outrank::try_parse_from([
            "outrank",
            "scrape",
            "--stat",
            "Total Offense",
            "--date",
            "2024-10-01T14:00:00.000Z",
        ])
        .unwrap();

        match cli.command {
            Commands::Scrape { stat, date, table } => {
                assert_eq!(stat, "Total Offense");
                assert_eq!(date.unwrap().as_str(), "2024-10-01T14:00:00.000Z");
                assert!(table.is_none());
            }
            other => panic!("Expected Scrape, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_migrate_positional_tables() {
        let cli =
            Outrank::try_parse_from(["outrank", "--db", "/tmp/r.db", "migrate", "Old", "New"])
                .unwrap();
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/r.db")));
        match cli.command {
            Commands::Migrate {
                source,
                destination,
                ..
            } => {
                assert_eq!(source.unwrap().as_str(), "Old");
                assert_eq!(destination.unwrap().as_str(), "New");
            }
            other => panic!("Expected Migrate, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_run_all_repeated_stats() {
        let cli = Outrank::try_parse_from([
            "outrank",
            "run-all",
            "-s",
            "Total Offense",
            "-s",
            "Total Defense",
            "--json",
        ])
        .unwrap();
        match cli.command {
            Commands::RunAll { stats, json, .. } => {
                assert_eq!(stats.len(), 2);
                assert!(json);
            }
            other => panic!("Expected RunAll, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_table_name_rejected_at_parse() {
        assert!(Outrank::try_parse_from(["outrank", "init", "--table", "bad;name"]).is_err());
    }
}
