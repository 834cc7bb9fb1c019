//! New command - record a manual transaction

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;

use inflow_core::domain::currency::currency_config;
use inflow_core::domain::NewTransaction;
use inflow_core::ports::TransactionStore;
use inflow_core::services::LogEvent;
use inflow_core::TransactionKind;

use super::{get_context, get_logger, log_event};
use crate::output;

pub async fn run(
    description: String,
    amount: String,
    category: Option<String>,
    date: Option<String>,
    income: bool,
    json: bool,
) -> Result<()> {
    let logger = get_logger();
    log_event(&logger, LogEvent::new("command_executed").with_command("new"));

    let ctx = get_context()?;

    let amount = parse_amount(&amount)
        .with_context(|| format!("'{}' is not an amount (use a number like 230.50)", amount))?;
    if amount.is_sign_negative() && income {
        bail!("A negative amount is an expense; drop --income or the minus sign");
    }
    let (amount, kind) = if amount.is_sign_negative() {
        (-amount, TransactionKind::Expense)
    } else if income {
        (amount, TransactionKind::Income)
    } else {
        (amount, TransactionKind::Expense)
    };

    let date = match date {
        Some(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .with_context(|| format!("'{}' is not a date (use YYYY-MM-DD)", raw))?,
        None => Local::now().date_naive(),
    };

    let transaction = ctx
        .store
        .create(NewTransaction {
            description: description.trim().to_string(),
            amount,
            kind,
            category: category
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
            date,
            batch_id: None,
        })
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&transaction)?);
        return Ok(());
    }

    let currency = currency_config(&ctx.config.default_currency);
    output::success(&format!(
        "Recorded {} {} on {}",
        transaction.description,
        output::signed_amount(transaction.amount, transaction.kind, currency),
        transaction.date
    ));

    Ok(())
}

/// Parse a typed amount; a lone comma is treated as the decimal separator
fn parse_amount(raw: &str) -> Result<Decimal> {
    let raw = raw.trim();
    let normalized = if raw.contains(',') && !raw.contains('.') {
        raw.replace(',', ".")
    } else {
        raw.to_string()
    };
    Ok(normalized.parse()?)
}
