//! Status command - ledger summary

use anyhow::Result;
use colored::Colorize;

use super::get_context;
use crate::output;

pub async fn run(json: bool) -> Result<()> {
    let ctx = get_context()?;
    let status = ctx.status_service.get_status().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("{}", "Inflow Status".bold());
    println!();

    let mut table = output::create_table();
    table.add_row(vec!["Transactions", &status.total_transactions.to_string()]);
    table.add_row(vec!["Import batches", &status.import_batches.to_string()]);
    table.add_row(vec!["Recorded imports", &status.recorded_imports.to_string()]);
    println!("{}", table);
    println!();

    if let (Some(earliest), Some(latest)) =
        (&status.date_range.earliest, &status.date_range.latest)
    {
        println!("Date range: {} to {}", earliest, latest);
    }
    if let Some(last) = &status.last_import {
        println!(
            "Last import: {} on {} ({} of {})",
            last.file_name,
            last.committed_at.format("%Y-%m-%d"),
            last.imported,
            last.total
        );
    }
    println!(
        "Database: {} ({})",
        status.database_path,
        output::format_size(status.database_size_bytes)
    );

    Ok(())
}
