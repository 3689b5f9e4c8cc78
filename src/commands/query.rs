//! Read-path commands over stored rankings.

use crate::{cli::types::TableName, storage::UNKNOWN_VALUE, OutrankError, Result};

use super::common::{print_json, CommandContext};

fn display_value(value: i64) -> String {
    if value == UNKNOWN_VALUE {
        "-".to_string()
    } else {
        value.to_string()
    }
}

/// Latest statistics for one team.
pub async fn handle_team_query(
    ctx: &CommandContext,
    team: &str,
    table: Option<TableName>,
    as_json: bool,
) -> Result<()> {
    let table = ctx.rankings_table(table);
    let snapshot = ctx
        .store
        .latest_for_team(&table, team)
        .await?
        .ok_or_else(|| OutrankError::NoData {
            what: format!("team '{}'", team),
        })?;

    if as_json {
        return print_json(&snapshot);
    }
    println!("{} as of {}", snapshot.team, snapshot.date);
    for (stat, value) in &snapshot.stats {
        println!("  {:<34} {:>5}", stat, display_value(*value));
    }
    Ok(())
}

/// One team's statistics between two dates.
pub async fn handle_history_query(
    ctx: &CommandContext,
    team: &str,
    start: &str,
    end: &str,
    table: Option<TableName>,
    as_json: bool,
) -> Result<()> {
    let table = ctx.rankings_table(table);
    let history = ctx.store.team_history(&table, team, start, end).await?;

    if as_json {
        return print_json(&history);
    }
    if history.stats_by_date.is_empty() {
        println!("No data for {} between {} and {}", team, start, end);
        return Ok(());
    }
    for (date, stats) in &history.stats_by_date {
        println!("{}", date);
        for (stat, value) in stats {
            println!("  {:<34} {:>5}", stat, display_value(*value));
        }
    }
    Ok(())
}

/// Every team's most recent value for one statistic.
pub async fn handle_stat_query(
    ctx: &CommandContext,
    stat: &str,
    table: Option<TableName>,
    as_json: bool,
) -> Result<()> {
    let table = ctx.rankings_table(table);
    let standings = ctx.store.latest_by_statistic(&table, stat).await?;

    if as_json {
        return print_json(&standings);
    }
    if standings.is_empty() {
        println!("No data for {}", stat);
        return Ok(());
    }
    for standing in &standings {
        println!(
            "{:>5}  {:<30} {}",
            display_value(standing.value),
            standing.team,
            standing.date
        );
    }
    Ok(())
}
