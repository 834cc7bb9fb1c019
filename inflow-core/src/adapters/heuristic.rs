//! Deterministic built-in collaborators
//!
//! Production deployments wire AI services into the `TextExtractor` and
//! `Categorizer` ports. These built-ins keep the CLI and the test suite
//! working offline: a line-shape extractor for statement text and a keyword
//! categorizer. Both are pure functions of their input.

use async_trait::async_trait;

use crate::adapters::fields::{parse_amount, parse_date};
use crate::domain::result::Result;
use crate::domain::{ParsedTransaction, TransactionKind};
use crate::ports::{CategorizeItem, Categorizer, CategorySuggestion, TextExtractor};

/// Extracts transactions from statement text lines shaped like
/// `date description... amount [C|D]`.
#[derive(Debug, Default)]
pub struct HeuristicExtractor;

impl HeuristicExtractor {
    pub fn new() -> Self {
        Self
    }

    fn parse_line(line: &str) -> Option<ParsedTransaction> {
        let mut tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < 2 {
            return None;
        }

        let date = parse_date(tokens[0])?;
        tokens.remove(0);

        // Brazilian statements mark lines with a trailing C (credit) or D (debit)
        let mut marker: Option<char> = None;
        if let Some(last) = tokens.last() {
            match last.to_ascii_uppercase().as_str() {
                "C" | "CR" => {
                    marker = Some('C');
                    tokens.pop();
                }
                "D" | "DB" => {
                    marker = Some('D');
                    tokens.pop();
                }
                _ => {}
            }
        }

        // The amount is the last token, or the last two when the currency
        // symbol is separated ("R$ 24,90")
        let raw_last = *tokens.last()?;
        let (signed, amount_tokens) = match parse_amount(raw_last) {
            Some(v) => (v, 1),
            None if tokens.len() >= 2 => {
                let joined = format!("{} {}", tokens[tokens.len() - 2], raw_last);
                (parse_amount(&joined)?, 2)
            }
            None => return None,
        };
        tokens.truncate(tokens.len() - amount_tokens);
        // A currency symbol printed as its own token travels with the amount
        if let Some(&sym) = tokens.last() {
            if matches!(sym, "R$" | "US$" | "$" | "€" | "£") {
                tokens.pop();
            }
        }
        if signed.is_zero() || tokens.is_empty() {
            return None;
        }

        let description = tokens.join(" ");
        let kind = match marker {
            Some('C') => TransactionKind::Income,
            Some('D') => TransactionKind::Expense,
            // Unsigned lines read as expenses: card statements list charges
            // without a sign
            _ => {
                if raw_last.starts_with('+') {
                    TransactionKind::Income
                } else {
                    TransactionKind::Expense
                }
            }
        };

        Some(ParsedTransaction::new(
            date,
            Some(description),
            signed.abs(),
            kind,
        ))
    }
}

#[async_trait]
impl TextExtractor for HeuristicExtractor {
    async fn extract(&self, text: &str) -> Result<Vec<ParsedTransaction>> {
        Ok(text.lines().filter_map(Self::parse_line).collect())
    }
}

/// Keyword rules: (needle, category). First hit wins.
const CATEGORY_RULES: &[(&str, &str)] = &[
    ("uber", "Transport"),
    ("99app", "Transport"),
    ("taxi", "Transport"),
    ("posto", "Transport"),
    ("ifood", "Food"),
    ("restaurante", "Food"),
    ("restaurant", "Food"),
    ("burger", "Food"),
    ("pizza", "Food"),
    ("padaria", "Food"),
    ("mercado", "Groceries"),
    ("supermercado", "Groceries"),
    ("market", "Groceries"),
    ("açúcar", "Groceries"),
    ("netflix", "Subscriptions"),
    ("spotify", "Subscriptions"),
    ("prime", "Subscriptions"),
    ("disney", "Subscriptions"),
    ("farmácia", "Health"),
    ("farmacia", "Health"),
    ("drogaria", "Health"),
    ("salary", "Income"),
    ("salário", "Income"),
    ("salario", "Income"),
    ("payroll", "Income"),
    ("aluguel", "Housing"),
    ("rent", "Housing"),
];

/// Confidence reported for a keyword hit
const KEYWORD_CONFIDENCE: u8 = 90;

/// Confidence reported for the fallback bucket
const FALLBACK_CONFIDENCE: u8 = 25;

/// Categorizes by merchant keywords, falling back to "Other"
#[derive(Debug, Default)]
pub struct KeywordCategorizer;

impl KeywordCategorizer {
    pub fn new() -> Self {
        Self
    }

    fn suggest(item: &CategorizeItem) -> CategorySuggestion {
        let lower = item.description.to_lowercase();
        for (needle, category) in CATEGORY_RULES {
            if lower.contains(needle) {
                return CategorySuggestion {
                    category: category.to_string(),
                    confidence: KEYWORD_CONFIDENCE,
                };
            }
        }
        if item.kind == TransactionKind::Income {
            return CategorySuggestion {
                category: "Income".to_string(),
                confidence: FALLBACK_CONFIDENCE,
            };
        }
        CategorySuggestion {
            category: "Other".to_string(),
            confidence: FALLBACK_CONFIDENCE,
        }
    }
}

#[async_trait]
impl Categorizer for KeywordCategorizer {
    async fn categorize(&self, items: &[CategorizeItem]) -> Result<Vec<CategorySuggestion>> {
        Ok(items.iter().map(Self::suggest).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn test_extractor_parses_statement_lines() {
        let text = "Extrato Conta Corrente\n\
                    Data Histórico Valor\n\
                    05/01/2024 SALÁRIO ACME LTDA 5.000,00 C\n\
                    06/01/2024 MERCADO PÃO DE AÇÚCAR 120,50 D\n\
                    saldo final 4.879,50\n";
        let candidates = HeuristicExtractor::new().extract(text).await.unwrap();

        assert_eq!(candidates.len(), 2);

        let salary = &candidates[0];
        assert_eq!(salary.date, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        assert_eq!(salary.description, "SALÁRIO ACME LTDA");
        assert_eq!(salary.amount, Decimal::new(500000, 2));
        assert_eq!(salary.kind, TransactionKind::Income);

        let market = &candidates[1];
        assert_eq!(market.kind, TransactionKind::Expense);
        assert_eq!(market.amount, Decimal::new(12050, 2));
    }

    #[tokio::test]
    async fn test_extractor_handles_split_currency_symbol() {
        let text = "05/01/2024 Uber Trip R$ 24,90\n06/01/2024 Padaria Estrela 9,99 €\n";
        let candidates = HeuristicExtractor::new().extract(text).await.unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].description, "Uber Trip");
        assert_eq!(candidates[0].amount, Decimal::new(2490, 2));
        assert_eq!(candidates[0].kind, TransactionKind::Expense);
        assert_eq!(candidates[1].description, "Padaria Estrela");
        assert_eq!(candidates[1].amount, Decimal::new(999, 2));
    }

    #[tokio::test]
    async fn test_extractor_is_deterministic() {
        let text = "05/01/2024 Uber Trip 24,90\n06/01/2024 Netflix 55,90\n";
        let extractor = HeuristicExtractor::new();
        let first = extractor.extract(text).await.unwrap();
        let second = extractor.extract(text).await.unwrap();
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.fingerprint(), b.fingerprint());
        }
    }

    #[tokio::test]
    async fn test_categorizer_alignment_and_keywords() {
        let items = vec![
            CategorizeItem {
                description: "UBER *TRIP".to_string(),
                amount: Decimal::new(2490, 2),
                kind: TransactionKind::Expense,
            },
            CategorizeItem {
                description: "NETFLIX.COM".to_string(),
                amount: Decimal::new(5590, 2),
                kind: TransactionKind::Expense,
            },
            CategorizeItem {
                description: "XYZ 123".to_string(),
                amount: Decimal::new(100, 2),
                kind: TransactionKind::Expense,
            },
        ];
        let suggestions = KeywordCategorizer::new().categorize(&items).await.unwrap();

        assert_eq!(suggestions.len(), items.len());
        assert_eq!(suggestions[0].category, "Transport");
        assert_eq!(suggestions[1].category, "Subscriptions");
        assert_eq!(suggestions[2].category, "Other");
        assert!(suggestions[2].confidence < suggestions[0].confidence);
    }
}
