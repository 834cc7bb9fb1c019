//! Ledger transaction domain model

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Error, Result};

/// Direction of a transaction. Amounts are stored as positive magnitudes;
/// the kind carries the sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }

    /// Parse from the stored string form
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            other => Err(Error::validation(format!(
                "Unknown transaction kind: {}",
                other
            ))),
        }
    }

    /// Sign multiplier for cent-level comparisons
    pub fn sign(&self) -> i64 {
        match self {
            TransactionKind::Income => 1,
            TransactionKind::Expense => -1,
        }
    }

    /// Split a signed amount into (magnitude, kind)
    pub fn from_signed(amount: Decimal) -> (Decimal, Self) {
        if amount < Decimal::ZERO {
            (-amount, TransactionKind::Expense)
        } else {
            (amount, TransactionKind::Income)
        }
    }
}

/// Convert a decimal amount to integer cents.
///
/// Monetary comparisons are done at cent precision so two amounts that
/// render the same never diverge through floating-point noise.
pub(crate) fn to_cents(amount: Decimal) -> i64 {
    (amount * Decimal::new(100, 0))
        .round()
        .to_i64()
        .unwrap_or(i64::MAX)
}

/// A committed transaction in the user's ledger.
///
/// This is the comparison set for duplicate detection; the import subsystem
/// reads these but never mutates them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub description: String,
    /// Positive magnitude; sign lives in `kind`
    pub amount: Decimal,
    pub kind: TransactionKind,
    pub category: Option<String>,
    pub date: NaiveDate,
    /// Which import batch created this transaction, if any
    pub batch_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Build a stored transaction from a create payload.
    ///
    /// The store assigns identity here; callers never pick ids.
    pub fn new(payload: NewTransaction) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            description: payload.description,
            amount: payload.amount,
            kind: payload.kind,
            category: payload.category,
            date: payload.date,
            batch_id: payload.batch_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Amount in signed integer cents (expenses negative)
    pub fn signed_cents(&self) -> i64 {
        to_cents(self.amount) * self.kind.sign()
    }
}

/// Payload for the transaction store's create operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTransaction {
    pub description: String,
    pub amount: Decimal,
    pub kind: TransactionKind,
    pub category: Option<String>,
    pub date: NaiveDate,
    pub batch_id: Option<Uuid>,
}

impl NewTransaction {
    /// Validate invariants before handing to a store
    pub fn validate(&self) -> Result<()> {
        if self.description.trim().is_empty() {
            return Err(Error::validation("Description must not be empty"));
        }
        if self.amount <= Decimal::ZERO {
            return Err(Error::validation("Amount must be a positive magnitude"));
        }
        Ok(())
    }
}
