//! Statement transaction candidates
//!
//! A candidate is a transaction extracted from an imported statement. It is
//! not part of the ledger until the user commits it; until then it carries
//! review state (duplicate confidence, category suggestions) that the ledger
//! never sees.

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::transaction::{to_cents, TransactionKind};

/// Confidence assigned when a candidate is flagged as a likely duplicate.
/// Reserved sentinel: the review UI auto-deselects these.
pub const DUPLICATE_CONFIDENCE: u8 = 0;

/// Confidence assigned when no existing transaction matches
pub const FULL_CONFIDENCE: u8 = 100;

/// Placeholder used when a statement line has no usable description
pub const FALLBACK_DESCRIPTION: &str = "(no description)";

/// A transaction candidate extracted from a statement file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedTransaction {
    pub date: NaiveDate,
    /// Merchant/memo text; never empty (falls back to a placeholder)
    pub description: String,
    /// Positive magnitude; sign lives in `kind`
    pub amount: Decimal,
    pub kind: TransactionKind,
    /// Optional category, possibly filled by the categorization step
    pub category: Option<String>,
    /// Confidence of the categorization step in [0,100], when it ran
    pub category_confidence: Option<u8>,
    /// Probability this is NOT a duplicate, in [0,100].
    /// 0 means flagged as likely duplicate.
    pub confidence: u8,
}

impl ParsedTransaction {
    /// Create a candidate with full confidence (duplicate detection runs later)
    pub fn new(
        date: NaiveDate,
        description: Option<String>,
        amount: Decimal,
        kind: TransactionKind,
    ) -> Self {
        let description = match description {
            Some(d) if !d.trim().is_empty() => d.trim().to_string(),
            _ => FALLBACK_DESCRIPTION.to_string(),
        };
        Self {
            date,
            description,
            amount,
            kind,
            category: None,
            category_confidence: None,
            confidence: FULL_CONFIDENCE,
        }
    }

    /// Amount in signed integer cents (expenses negative)
    pub fn signed_cents(&self) -> i64 {
        to_cents(self.amount) * self.kind.sign()
    }

    /// True once the duplicate detector flagged this candidate
    pub fn is_flagged_duplicate(&self) -> bool {
        self.confidence == DUPLICATE_CONFIDENCE
    }

    /// Deterministic row fingerprint: date, signed cents, normalized description.
    ///
    /// SHA256 truncated to 16 hex chars, same shape the ledger uses for
    /// re-import protection.
    pub fn fingerprint(&self) -> String {
        let input = format!(
            "{}|{}|{}",
            self.date.format("%Y-%m-%d"),
            self.signed_cents(),
            normalize_description(&self.description)
        );
        let mut hasher = Sha256::new();
        hasher.update(input.as_bytes());
        let digest = hasher.finalize();
        hex::encode(&digest[..8])
    }
}

/// Normalize a description for comparison: case-folded, masked card numbers
/// collapsed to their trailing digits, punctuation stripped to spaces, runs
/// of whitespace collapsed to one space.
pub fn normalize_description(desc: &str) -> String {
    let lower = desc.to_lowercase();

    // Literal "null" strings left behind by sloppy CSV exports
    let null_re = Regex::new(r"\bnull\b").unwrap();
    let cleaned = null_re.replace_all(&lower, " ");

    // Masked card/account numbers: keep the last four digits, which banks
    // print consistently across statement formats
    let mask_re = Regex::new(r"[x*]{4,}[x*\d]*(\d{4})").unwrap();
    let cleaned = mask_re.replace_all(&cleaned, "$1");

    let folded: String = cleaned
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(desc: &str, cents: i64) -> ParsedTransaction {
        let (amount, kind) = TransactionKind::from_signed(Decimal::new(cents, 2));
        ParsedTransaction::new(
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            Some(desc.to_string()),
            amount,
            kind,
        )
    }

    #[test]
    fn test_empty_description_falls_back_to_placeholder() {
        let c = ParsedTransaction::new(
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            Some("   ".to_string()),
            Decimal::new(100, 2),
            TransactionKind::Expense,
        );
        assert_eq!(c.description, FALLBACK_DESCRIPTION);

        let c = ParsedTransaction::new(
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            None,
            Decimal::new(100, 2),
            TransactionKind::Expense,
        );
        assert_eq!(c.description, FALLBACK_DESCRIPTION);
    }

    #[test]
    fn test_normalize_description() {
        assert_eq!(
            normalize_description("  UBER *TRIP   \tHELP.UBER.COM "),
            "uber trip help uber com"
        );
        assert_eq!(normalize_description("PÃO-DE-AÇÚCAR"), "pão de açúcar");
        assert_eq!(normalize_description("***"), "");
    }

    #[test]
    fn test_normalize_collapses_card_masks() {
        assert_eq!(
            normalize_description("PAYMENT XXXXXXXXXXXX1234"),
            "payment 1234"
        );
        assert_eq!(
            normalize_description("payment ************1234"),
            "payment 1234"
        );
        assert_eq!(normalize_description("null PIX TRANSF"), "pix transf");
        // Short mask runs are left alone
        assert_eq!(normalize_description("xx1234 store"), "xx1234 store");
    }

    #[test]
    fn test_fingerprint_is_stable_and_sign_sensitive() {
        let a = candidate("Uber Trip", -2490);
        let b = candidate("uber   trip!", -2490);
        let c = candidate("Uber Trip", 2490);

        assert_eq!(a.fingerprint().len(), 16);
        // Normalization makes punctuation/case irrelevant
        assert_eq!(a.fingerprint(), b.fingerprint());
        // Income vs expense of same magnitude differ
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn test_new_candidate_starts_at_full_confidence() {
        let c = candidate("Market", -12050);
        assert_eq!(c.confidence, FULL_CONFIDENCE);
        assert!(!c.is_flagged_duplicate());
    }
}
