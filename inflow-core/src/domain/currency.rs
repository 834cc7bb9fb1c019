//! Currency configuration table
//!
//! Display-only lookup from currency code to symbol, decimal places, and
//! locale. Not involved in parsing decisions beyond supplying the base
//! currency and symbol detection hints.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Currency assumed when a statement carries no currency information
pub const BASE_CURRENCY: &str = "BRL";

/// Display configuration for one currency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyConfig {
    pub code: &'static str,
    pub symbol: &'static str,
    pub decimal_places: u32,
    pub locale: &'static str,
}

const CURRENCY_CONFIG: &[CurrencyConfig] = &[
    CurrencyConfig {
        code: "BRL",
        symbol: "R$",
        decimal_places: 2,
        locale: "pt-BR",
    },
    CurrencyConfig {
        code: "USD",
        symbol: "$",
        decimal_places: 2,
        locale: "en-US",
    },
    CurrencyConfig {
        code: "EUR",
        symbol: "€",
        decimal_places: 2,
        locale: "de-DE",
    },
    CurrencyConfig {
        code: "GBP",
        symbol: "£",
        decimal_places: 2,
        locale: "en-GB",
    },
];

/// Look up display configuration for a currency code.
/// Unknown codes fall back to the base currency.
pub fn currency_config(code: &str) -> &'static CurrencyConfig {
    let upper = code.trim().to_uppercase();
    CURRENCY_CONFIG
        .iter()
        .find(|c| c.code == upper)
        .or_else(|| CURRENCY_CONFIG.iter().find(|c| c.code == BASE_CURRENCY))
        .unwrap_or(&CURRENCY_CONFIG[0])
}

/// Guess a currency code from a symbol appearing in statement text
pub fn detect_from_symbol(text: &str) -> Option<&'static str> {
    // Order matters: R$ and US$ contain $
    if text.contains("R$") {
        Some("BRL")
    } else if text.contains("US$") || text.contains('$') {
        Some("USD")
    } else if text.contains('€') {
        Some("EUR")
    } else if text.contains('£') {
        Some("GBP")
    } else {
        None
    }
}

/// Format a positive magnitude with its currency symbol, e.g. "R$ 120.50"
pub fn format_amount(amount: Decimal, config: &CurrencyConfig) -> String {
    format!(
        "{} {:.prec$}",
        config.symbol,
        amount,
        prec = config.decimal_places as usize
    )
}
