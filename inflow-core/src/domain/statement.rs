//! Parse results for imported statement files

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::candidate::ParsedTransaction;
use crate::domain::currency::BASE_CURRENCY;

/// Date range covered by a statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// The outcome of parsing one statement file.
///
/// `transactions` preserves file order, which is the order the whole review
/// flow operates on. `errors` are fatal (nothing parsed); `warnings` describe
/// lines that were skipped or fields that were guessed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseResult {
    pub transactions: Vec<ParsedTransaction>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// Detected institution label, when the layout is recognized
    pub bank_name: Option<String>,
    /// Date range covered by the parsed transactions
    pub period: Option<StatementPeriod>,
    /// ISO-like currency code; defaults to the base currency when undetected
    pub currency: String,
}

impl ParseResult {
    /// Empty result in the base currency
    pub fn new() -> Self {
        Self {
            transactions: Vec::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
            bank_name: None,
            period: None,
            currency: BASE_CURRENCY.to_string(),
        }
    }

    /// Fatal outcome: format unreadable, nothing parsed
    pub fn failed(error: impl Into<String>) -> Self {
        let mut result = Self::new();
        result.errors.push(error.into());
        result
    }

    /// True when parsing failed entirely and no partial import is possible
    pub fn is_fatal(&self) -> bool {
        self.transactions.is_empty() && !self.errors.is_empty()
    }

    /// Fill `period` from the parsed transactions (file order is not
    /// chronological, so scan for min/max)
    pub fn compute_period(&mut self) {
        let mut dates = self.transactions.iter().map(|t| t.date);
        let first = match dates.next() {
            Some(d) => d,
            None => return,
        };
        let (start, end) = dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d)));
        self.period = Some(StatementPeriod { start, end });
    }

    /// Enforce the empty-parse invariant: a result with no transactions and
    /// no errors must explain itself through at least one warning.
    pub fn ensure_explained(&mut self) {
        if self.transactions.is_empty() && self.errors.is_empty() && self.warnings.is_empty() {
            self.warnings
                .push("Statement contained no recognizable transactions".to_string());
        }
    }
}

impl Default for ParseResult {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TransactionKind;
    use rust_decimal::Decimal;

    fn candidate(day: u32) -> ParsedTransaction {
        ParsedTransaction::new(
            NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            Some("Coffee".to_string()),
            Decimal::new(500, 2),
            TransactionKind::Expense,
        )
    }

    #[test]
    fn test_empty_parse_gets_explanatory_warning() {
        let mut result = ParseResult::new();
        result.ensure_explained();
        assert!(result.transactions.is_empty());
        assert!(result.errors.is_empty());
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_explained_results_are_left_alone() {
        let mut result = ParseResult::new();
        result.warnings.push("3 lines skipped".to_string());
        result.ensure_explained();
        assert_eq!(result.warnings.len(), 1);

        let mut result = ParseResult::failed("not a statement");
        result.ensure_explained();
        assert!(result.warnings.is_empty());
        assert!(result.is_fatal());
    }

    #[test]
    fn test_period_spans_min_max_regardless_of_file_order() {
        let mut result = ParseResult::new();
        result.transactions = vec![candidate(15), candidate(3), candidate(28)];
        result.compute_period();
        let period = result.period.unwrap();
        assert_eq!(period.start, NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
        assert_eq!(period.end, NaiveDate::from_ymd_opt(2024, 1, 28).unwrap());
    }
}
