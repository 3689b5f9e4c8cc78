//! Scrape commands: one statistic, or an orchestrated run over many.

use tracing::info;

use crate::{
    catalog,
    cli::types::{RankDate, TableName},
    orchestrator::RunSummary,
    Result,
};

use super::common::{print_json, resolve_date, CommandContext};

/// Scrape and store a single statistic.
pub async fn handle_scrape(
    ctx: &CommandContext,
    stat: &str,
    date: Option<RankDate>,
    table: Option<TableName>,
) -> Result<()> {
    let date = resolve_date(date);
    let table = ctx.rankings_table(table);
    println!("Scraping {} for {}...", stat, date);

    // tarpaulin::skip - live network scrape, exercised via fake engines in tests
    let stored = ctx.extractor(table.clone()).extract_and_store(stat, &date).await?;

    println!("✓ Stored {} teams for {} in {}", stored, stat, table);
    Ok(())
}

/// Statistics to run: the ones asked for, or the whole catalog.
pub fn select_statistics(requested: Vec<String>) -> Vec<String> {
    if requested.is_empty() {
        catalog::ALL_STATISTICS.iter().map(|s| s.to_string()).collect()
    } else {
        requested
    }
}

/// Run every selected statistic concurrently and report once.
pub async fn handle_run_all(
    ctx: &CommandContext,
    stats: Vec<String>,
    date: Option<RankDate>,
    table: Option<TableName>,
    as_json: bool,
) -> Result<RunSummary> {
    let date = resolve_date(date);
    let stats = select_statistics(stats);
    let table = ctx.rankings_table(table);
    info!(stats = stats.len(), table = %table, "Orchestrated run requested");

    // tarpaulin::skip - live network scrape
    let summary = ctx.orchestrator(table).run_all(&stats, &date).await?;

    if as_json {
        print_json(&summary)?;
    } else {
        print_summary(&summary);
    }
    Ok(summary)
}

fn print_summary(summary: &RunSummary) {
    println!(
        "✓ {}/{} statistics scraped ({} → {})",
        summary.success_count, summary.total_stats, summary.started_at, summary.finished_at
    );
    for failure in &summary.failures {
        println!(
            "  ✗ {}: {}",
            failure.statistic,
            failure.error.as_deref().unwrap_or("unknown error")
        );
    }
}

/// Print the statistic catalog with locator ids and legacy attribute names.
pub fn handle_stats_list(as_json: bool) -> Result<()> {
    catalog::validate()?;
    let rows: Vec<_> = catalog::ALL_STATISTICS
        .iter()
        .map(|stat| {
            let id = catalog::locator_for(stat).map(|l| l.id).unwrap_or_default();
            let attribute = catalog::attribute_for_display_name(stat).unwrap_or("");
            (stat.to_string(), id, attribute.to_string())
        })
        .collect();

    if as_json {
        let entries: Vec<_> = rows
            .iter()
            .map(|(stat, id, attribute)| {
                serde_json::json!({ "stat": stat, "locator": id, "attribute": attribute })
            })
            .collect();
        return print_json(&entries);
    }

    for (stat, id, attribute) in &rows {
        println!("{:<34} {:>4}  {}", stat, id, attribute);
    }
    println!("{} statistics", rows.len());
    Ok(())
}
