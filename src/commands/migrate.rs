//! Backfill, legacy import and table setup commands.

use std::path::Path;

use crate::{
    cli::types::TableName,
    migration::{MigrationSummary, Migrator},
    storage::LegacyRecord,
    Result,
};

use super::common::{print_json, CommandContext};

/// Migrate legacy records from `source` into `destination`.
///
/// Missing table names fall back to the configured legacy and rankings tables.
pub async fn handle_migrate(
    ctx: &CommandContext,
    source: Option<TableName>,
    destination: Option<TableName>,
    parallelism: Option<usize>,
    as_json: bool,
) -> Result<MigrationSummary> {
    let source = source.unwrap_or_else(|| ctx.settings.legacy_table.clone());
    let destination = ctx.rankings_table(destination);
    let parallelism = parallelism.unwrap_or(ctx.settings.write_parallelism);

    println!("Migrating {} → {}...", source, destination);
    let summary = Migrator::new(ctx.store.clone())
        .with_parallelism(parallelism)
        .migrate(&source, &destination)
        .await?;

    if as_json {
        print_json(&summary)?;
    } else {
        println!(
            "✓ Migration complete: {} records scanned, {} observations written in {} batches",
            summary.items_scanned, summary.items_written, summary.batches_committed
        );
        if summary.batches_failed > 0 || summary.records_skipped > 0 {
            println!(
                "  {} batches failed, {} records skipped, {} unknown fields skipped",
                summary.batches_failed, summary.records_skipped, summary.fields_skipped
            );
        }
    }
    Ok(summary)
}

/// Load a JSON array of legacy records from `file` into a legacy table.
pub async fn handle_import_legacy(
    ctx: &CommandContext,
    file: &Path,
    table: Option<TableName>,
) -> Result<usize> {
    let table = table.unwrap_or_else(|| ctx.settings.legacy_table.clone());
    let raw = std::fs::read_to_string(file)?;
    let records: Vec<LegacyRecord> = serde_json::from_str(&raw)?;

    ctx.store.ensure_legacy_table(&table)?;
    let inserted = ctx.store.insert_legacy_records(&table, &records).await?;
    println!("✓ Imported {} legacy records into {}", inserted, table);
    Ok(inserted)
}

/// Create the rankings and legacy tables.
pub fn handle_init(
    ctx: &CommandContext,
    table: Option<TableName>,
    legacy_table: Option<TableName>,
) -> Result<()> {
    let table = ctx.rankings_table(table);
    let legacy_table = legacy_table.unwrap_or_else(|| ctx.settings.legacy_table.clone());

    ctx.store.ensure_rankings_table(&table)?;
    ctx.store.ensure_legacy_table(&legacy_table)?;
    println!("✓ Tables ready: {} and {}", table, legacy_table);
    Ok(())
}
