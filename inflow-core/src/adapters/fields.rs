//! Field-level parsing shared by the statement adapters
//!
//! Statements disagree on date layouts, decimal separators, and sign
//! conventions; every adapter funnels raw cell text through these helpers so
//! the quirks are handled once.

use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Try common statement date formats in order.
///
/// Day-first formats come before month-first ones, so an ambiguous date like
/// 03/04/2024 reads as April 3rd, the convention of the statements this tool
/// grew up on; unambiguous month-first dates (04/13/2024) still parse through
/// the later formats.
pub(crate) fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let formats = [
        "%Y-%m-%d",
        "%d/%m/%Y",
        "%m/%d/%Y",
        "%d-%m-%Y",
        "%m-%d-%Y",
        "%Y/%m/%d",
        "%d.%m.%Y",
    ];

    for fmt in &formats {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date);
        }
    }
    None
}

/// Decimal separator conventionally used by a locale
pub(crate) fn decimal_separator(locale: &str) -> char {
    match locale.split(['-', '_']).next().unwrap_or("") {
        "pt" | "de" | "es" | "fr" | "it" => ',',
        _ => '.',
    }
}

/// Parse a statement amount with no locale information
pub(crate) fn parse_amount(s: &str) -> Option<Decimal> {
    parse_amount_hinted(s, None)
}

/// Parse a statement amount.
///
/// Handles currency symbols, thousands separators, parentheses negatives,
/// and trailing minus signs. When both `.` and `,` appear, the last one is
/// the decimal point. A single separator is resolved by `decimal_hint` when
/// given; otherwise exactly two trailing digits read as a decimal point,
/// exactly three as a thousands group, anything else as a decimal point.
pub(crate) fn parse_amount_hinted(s: &str, decimal_hint: Option<char>) -> Option<Decimal> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    // Parentheses notation for negatives: (100.00) -> -100.00
    let (mut negative, s) = if s.starts_with('(') && s.ends_with(')') && s.len() > 2 {
        (true, &s[1..s.len() - 1])
    } else {
        (false, s)
    };

    // Keep digits, separators, and signs; drop symbols and letters
    let mut cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-' | '+'))
        .collect();

    // Trailing minus, as printed by some bank exports
    if cleaned.ends_with('-') {
        negative = true;
        cleaned.pop();
    }
    if let Some(rest) = cleaned.strip_prefix('-') {
        negative = true;
        cleaned = rest.to_string();
    }
    if let Some(rest) = cleaned.strip_prefix('+') {
        cleaned = rest.to_string();
    }
    if cleaned.is_empty() || cleaned.contains('-') || cleaned.contains('+') {
        return None;
    }

    let normalized = normalize_separators(&cleaned, decimal_hint)?;
    let mut amount: Decimal = normalized.parse().ok()?;
    if negative {
        amount = -amount;
    }
    Some(amount)
}

/// Reduce a digit-and-separator string to plain `1234.56` form
fn normalize_separators(s: &str, decimal_hint: Option<char>) -> Option<String> {
    let dots = s.matches('.').count();
    let commas = s.matches(',').count();

    let decimal_sep = match (dots, commas) {
        (0, 0) => None,
        // Both present: the last separator is the decimal point
        (d, c) if d > 0 && c > 0 => {
            let last_dot = s.rfind('.')?;
            let last_comma = s.rfind(',')?;
            Some(if last_dot > last_comma { '.' } else { ',' })
        }
        // One kind, repeated: thousands grouping only
        (d, 0) if d > 1 => None,
        (0, c) if c > 1 => None,
        // One kind, once: locale hint, else trailing-digit heuristic
        (1, 0) => single_separator_role(s, '.', decimal_hint),
        (0, 1) => single_separator_role(s, ',', decimal_hint),
        _ => None,
    };

    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '.' | ',' => {
                if Some(c) == decimal_sep {
                    out.push('.');
                }
            }
            other => out.push(other),
        }
    }
    if out == "." || out.is_empty() {
        return None;
    }
    Some(out)
}

/// Decide whether a lone separator is a decimal point or thousands grouping
fn single_separator_role(s: &str, sep: char, decimal_hint: Option<char>) -> Option<char> {
    if let Some(hint) = decimal_hint {
        return if sep == hint { Some(sep) } else { None };
    }
    let idx = s.rfind(sep)?;
    let trailing = s.len() - idx - 1;
    match trailing {
        2 => Some(sep),
        3 => None,
        _ => Some(sep),
    }
}
