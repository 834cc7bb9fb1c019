//! Output formatting utilities

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL_CONDENSED, ContentArrangement, Table};
use rust_decimal::Decimal;
use uuid::Uuid;

use inflow_core::domain::currency::{format_amount, CurrencyConfig};
use inflow_core::TransactionKind;

/// Print a success message
pub fn success(msg: &str) {
    println!("{}", msg.green());
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{}", msg.red());
}

/// Print a warning message
pub fn warning(msg: &str) {
    println!("{}", msg.yellow());
}

/// Print an info message
pub fn info(msg: &str) {
    println!("{}", msg.cyan());
}

/// Create a styled table
pub fn create_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Signed amount cell: expenses prefixed with -, income with +
pub fn signed_amount(amount: Decimal, kind: TransactionKind, config: &CurrencyConfig) -> String {
    let formatted = format_amount(amount, config);
    match kind {
        TransactionKind::Income => format!("+{}", formatted),
        TransactionKind::Expense => format!("-{}", formatted),
    }
}

/// First segment of a UUID, enough for humans to tell batches apart
pub fn short_id(id: &Uuid) -> String {
    id.to_string().chars().take(8).collect()
}

/// Format bytes as human-readable size
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
