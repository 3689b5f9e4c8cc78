//! Entry point: parse CLI, set up logging and dispatch to command handlers.

use clap::Parser;
use outrank::{
    cli::{Commands, Outrank, QueryCmd, StatsCmd},
    commands::{ingest, migrate, query, CommandContext},
    config::Settings,
};
use tracing_subscriber::EnvFilter;

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Run the CLI.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app = Outrank::parse();
    init_logging(app.verbose);

    if let Commands::Stats { cmd } = &app.command {
        match cmd {
            StatsCmd::List { json } => ingest::handle_stats_list(*json)?,
        }
        return Ok(());
    }

    let settings = Settings::from_env()?.with_db_path(app.db);
    let ctx = CommandContext::new(settings)?;

    match app.command {
        Commands::Scrape { stat, date, table } => {
            ingest::handle_scrape(&ctx, &stat, date, table).await?
        }

        Commands::RunAll {
            date,
            stats,
            table,
            json,
        } => {
            let summary = ingest::handle_run_all(&ctx, stats, date, table, json).await?;
            if !summary.is_success() {
                anyhow::bail!(
                    "{} of {} statistics failed",
                    summary.failures.len(),
                    summary.total_stats
                );
            }
        }

        Commands::Migrate {
            source,
            destination,
            parallelism,
            json,
        } => {
            migrate::handle_migrate(&ctx, source, destination, parallelism, json).await?;
        }

        Commands::ImportLegacy { file, table } => {
            migrate::handle_import_legacy(&ctx, &file, table).await?;
        }

        Commands::Init {
            table,
            legacy_table,
        } => migrate::handle_init(&ctx, table, legacy_table)?,

        Commands::Query { cmd } => match cmd {
            QueryCmd::Team { team, table, json } => {
                query::handle_team_query(&ctx, &team, table, json).await?
            }
            QueryCmd::History {
                team,
                start,
                end,
                table,
                json,
            } => query::handle_history_query(&ctx, &team, &start, &end, table, json).await?,
            QueryCmd::Stat { stat, table, json } => {
                query::handle_stat_query(&ctx, &stat, table, json).await?
            }
        },

        Commands::Stats { .. } => {}
    }

    Ok(())
}
