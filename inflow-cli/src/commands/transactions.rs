//! Transactions command - list the ledger

use anyhow::{Context, Result};
use colored::Colorize;
use rust_decimal::Decimal;
use uuid::Uuid;

use inflow_core::domain::currency::currency_config;
use inflow_core::ports::TransactionStore;
use inflow_core::TransactionKind;

use super::get_context;
use crate::output;

pub async fn run(limit: usize, batch: Option<String>, json: bool) -> Result<()> {
    let ctx = get_context()?;

    let mut transactions = ctx.store.list().await?;
    if let Some(batch) = batch {
        let batch_id = Uuid::parse_str(batch.trim()).context("Invalid batch id")?;
        transactions.retain(|t| t.batch_id == Some(batch_id));
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&transactions)?);
        return Ok(());
    }

    if transactions.is_empty() {
        println!("No transactions found.");
        println!("Import a statement with: inflow import <file>");
        return Ok(());
    }

    let currency = currency_config(&ctx.config.default_currency);

    // Rows come back oldest first; show the most recent `limit`
    let total = transactions.len();
    let shown = &transactions[total.saturating_sub(limit)..];

    let mut table = output::create_table();
    table.set_header(vec!["Date", "Description", "Category", "Amount", "Batch"]);
    for t in shown {
        table.add_row(vec![
            t.date.to_string(),
            t.description.clone(),
            t.category.clone().unwrap_or_default(),
            output::signed_amount(t.amount, t.kind, currency),
            t.batch_id
                .as_ref()
                .map(output::short_id)
                .unwrap_or_default(),
        ]);
    }
    println!("{}", table);

    if shown.len() < total {
        println!("Showing {} of {} transactions", shown.len(), total);
    }

    let income: Decimal = sum_by_kind(&transactions, TransactionKind::Income);
    let expenses: Decimal = sum_by_kind(&transactions, TransactionKind::Expense);
    println!(
        "Income {}   Expenses {}",
        inflow_core::domain::currency::format_amount(income, currency).green(),
        inflow_core::domain::currency::format_amount(expenses, currency).red(),
    );

    Ok(())
}

fn sum_by_kind(transactions: &[inflow_core::Transaction], kind: TransactionKind) -> Decimal {
    transactions
        .iter()
        .filter(|t| t.kind == kind)
        .map(|t| t.amount)
        .sum()
}
