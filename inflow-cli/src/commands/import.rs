//! Import command - parse, review and commit a statement file

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use colored::Colorize;
use dialoguer::{Confirm, Input, MultiSelect};
use indicatif::ProgressBar;

use inflow_core::config::Config;
use inflow_core::domain::currency::{currency_config, CurrencyConfig};
use inflow_core::services::dedup::MatchStrength;
use inflow_core::services::{ImportPreview, LogEvent};
use inflow_core::{ImportSession, InflowContext};

use super::{get_context, get_inflow_dir, get_logger, log_event};
use crate::output;

pub async fn run(
    file: PathBuf,
    yes: bool,
    preview_only: bool,
    flip_signs: bool,
    json: bool,
) -> Result<()> {
    let logger = get_logger();
    log_event(&logger, LogEvent::new("command_executed").with_command("import"));

    let ctx = build_context(flip_signs)?;

    let preview = ctx
        .import_service
        .preview_file(&file)
        .await
        .with_context(|| format!("Could not read '{}'", file.display()))?;
    let format_label = preview
        .format
        .map(|f| f.as_str().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    if preview.is_fatal() {
        for error in &preview.result.errors {
            output::error(error);
        }
        log_event(
            &logger,
            LogEvent::new("import_failed")
                .with_command("import")
                .with_format(&format_label)
                .with_error(preview.result.errors.join("; ")),
        );
        anyhow::bail!("Could not parse '{}'", preview.file_name);
    }

    if json && preview_only {
        println!("{}", serde_json::to_string_pretty(&preview)?);
        return Ok(());
    }

    let currency = currency_config(&preview.result.currency);

    if !json {
        print_header(&preview, &format_label);
    }

    if preview.result.transactions.is_empty() {
        log_event(
            &logger,
            LogEvent::new("import_empty")
                .with_command("import")
                .with_format(&format_label),
        );
        println!("Nothing to import.");
        return Ok(());
    }

    let mut session = ctx.import_service.start_session(&preview);

    if !json {
        print_candidates(&preview, &session, currency);
    }

    if preview_only {
        println!("{}", "Preview only - nothing imported.".yellow());
        return Ok(());
    }

    let interactive = !yes && !json && atty::is(atty::Stream::Stdout);

    if interactive {
        if !review(&preview, &mut session, &ctx, currency).await? {
            session.cancel()?;
            log_event(
                &logger,
                LogEvent::new("import_cancelled")
                    .with_command("import")
                    .with_format(&format_label),
            );
            println!("Cancelled.");
            return Ok(());
        }
    } else {
        if session.selected_count() == 0 {
            log_event(
                &logger,
                LogEvent::new("import_skipped")
                    .with_command("import")
                    .with_format(&format_label),
            );
            println!("Every candidate looks like a duplicate; nothing imported.");
            println!("Re-run interactively to include them anyway.");
            return Ok(());
        }
        suggest_categories(&mut session, &ctx).await;
    }

    let spinner = commit_spinner(json, session.selected_count());
    let report = session.commit(&*ctx.store).await?;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    ctx.import_service.record_commit(&preview, &report).await?;
    log_event(
        &logger,
        LogEvent::new("import_committed")
            .with_command("import")
            .with_format(&format_label)
            .with_batch(report.batch_id.to_string()),
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let summary = format!(
        "Imported {} of {} transactions",
        report.committed, report.attempted
    );
    if report.is_complete() {
        output::success(&summary);
    } else {
        output::warning(&summary);
        for failure in &report.failures {
            output::error(&format!("  {}: {}", failure.description, failure.error));
        }
    }
    println!("Batch {}", output::short_id(&report.batch_id).dimmed());

    Ok(())
}

/// Build the context, applying the --flip-signs override on top of settings
fn build_context(flip_signs: bool) -> Result<InflowContext> {
    if !flip_signs {
        return get_context();
    }
    let inflow_dir = get_inflow_dir();
    std::fs::create_dir_all(&inflow_dir)
        .with_context(|| format!("Failed to create inflow directory: {:?}", inflow_dir))?;
    let mut config = Config::load(&inflow_dir)?;
    config.import.flip_signs = true;
    InflowContext::with_config(&inflow_dir, config).context("Failed to initialize inflow context")
}

fn print_header(preview: &ImportPreview, format_label: &str) {
    println!();
    println!("{}", preview.file_name.bold());
    if let Some(bank) = &preview.result.bank_name {
        println!("  Institution: {}", bank);
    }
    println!(
        "  Format: {}  Currency: {}",
        format_label.to_uppercase(),
        preview.result.currency
    );
    if let Some(period) = preview.result.period {
        println!("  Period: {} to {}", period.start, period.end);
    }
    println!();

    for warning in &preview.result.warnings {
        output::warning(warning);
    }
    if !preview.result.warnings.is_empty() {
        println!();
    }
}

fn print_candidates(preview: &ImportPreview, session: &ImportSession, currency: &CurrencyConfig) {
    let mut table = output::create_table();
    table.set_header(vec!["#", "", "Date", "Description", "Amount", "Note"]);

    for (i, candidate) in session.candidates().iter().enumerate() {
        let marker = if session.is_selected(i) { "x" } else { " " };
        table.add_row(vec![
            (i + 1).to_string(),
            marker.to_string(),
            candidate.date.to_string(),
            candidate.description.clone(),
            output::signed_amount(candidate.amount, candidate.kind, currency),
            duplicate_note(preview, i),
        ]);
    }

    println!("{}", table);

    let duplicates = preview.duplicate_count();
    if duplicates > 0 {
        output::warning(&format!(
            "{} of {} candidates look like duplicates and start deselected",
            duplicates,
            session.candidates().len()
        ));
    }
    println!();
}

fn duplicate_note(preview: &ImportPreview, index: usize) -> String {
    match &preview.matches[index] {
        Some(m) => {
            let label = match m.strength {
                MatchStrength::Exact => "duplicate of".red().to_string(),
                MatchStrength::Partial => "similar to".yellow().to_string(),
            };
            format!("{} {} ({})", label, m.existing_description, m.existing_date)
        }
        None => String::new(),
    }
}

/// Interactive review: adjust selection, suggest and edit categories,
/// confirm. Returns false when the user backs out.
async fn review(
    preview: &ImportPreview,
    session: &mut ImportSession,
    ctx: &InflowContext,
    currency: &CurrencyConfig,
) -> Result<bool> {
    let items: Vec<String> = session
        .candidates()
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let mut line = format!(
                "{}  {:<30}  {}",
                c.date,
                c.description,
                output::signed_amount(c.amount, c.kind, currency)
            );
            if preview.matches[i].is_some() {
                line.push_str("  [dup]");
            }
            line
        })
        .collect();
    let defaults: Vec<bool> = (0..items.len()).map(|i| session.is_selected(i)).collect();

    let chosen = MultiSelect::new()
        .with_prompt("Select transactions to import (space toggles, enter confirms)")
        .items(&items)
        .defaults(&defaults)
        .interact()?;

    for index in 0..items.len() {
        let wanted = chosen.contains(&index);
        if wanted != session.is_selected(index) {
            session.toggle_select(index)?;
        }
    }

    if session.selected_count() == 0 {
        return Ok(false);
    }

    if Confirm::new()
        .with_prompt("Suggest categories automatically?")
        .default(true)
        .interact()?
    {
        suggest_categories(session, ctx).await;
    }

    if Confirm::new()
        .with_prompt("Edit categories before import?")
        .default(false)
        .interact()?
    {
        edit_categories(session)?;
    }

    Confirm::new()
        .with_prompt(format!(
            "Import {} of {} transactions?",
            session.selected_count(),
            session.candidates().len()
        ))
        .default(true)
        .interact()
        .map_err(Into::into)
}

/// Run the categorizer; a failure downgrades to a warning because the user
/// can still categorize by hand
async fn suggest_categories(session: &mut ImportSession, ctx: &InflowContext) {
    if let Err(e) = session.categorize_all(ctx.categorizer.as_ref()).await {
        output::warning(&format!("Category suggestions unavailable: {}", e));
    }
}

fn edit_categories(session: &mut ImportSession) -> Result<()> {
    loop {
        let raw: String = Input::new()
            .with_prompt("Row to edit (blank to continue)")
            .allow_empty(true)
            .interact_text()?;
        let raw = raw.trim().to_string();
        if raw.is_empty() {
            return Ok(());
        }
        let row: usize = match raw.parse() {
            Ok(n) => n,
            Err(_) => {
                output::warning("Enter a row number from the table");
                continue;
            }
        };
        if row == 0 || row > session.candidates().len() {
            output::warning("No such row");
            continue;
        }

        let index = row - 1;
        let current = session.candidates()[index]
            .category
            .clone()
            .unwrap_or_default();
        let category: String = Input::new()
            .with_prompt(format!("Category for row {}", row))
            .with_initial_text(current)
            .allow_empty(true)
            .interact_text()?;
        session.update_category(index, &category)?;
    }
}

fn commit_spinner(json: bool, count: usize) -> Option<ProgressBar> {
    if json || !atty::is(atty::Stream::Stdout) {
        return None;
    }
    let spinner = ProgressBar::new_spinner();
    spinner.set_message(format!("Writing {} transactions...", count));
    spinner.enable_steady_tick(Duration::from_millis(80));
    Some(spinner)
}
