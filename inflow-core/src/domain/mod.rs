//! Core domain entities
//!
//! All business entities are defined here. These are pure data structures
//! with validation logic - no I/O or external dependencies.

mod candidate;
pub mod currency;
mod statement;
mod transaction;
pub mod result;

pub use candidate::{
    normalize_description, ParsedTransaction, DUPLICATE_CONFIDENCE, FALLBACK_DESCRIPTION,
    FULL_CONFIDENCE,
};
pub use currency::{currency_config, CurrencyConfig, BASE_CURRENCY};
pub use result::{Error, Result};
pub use statement::{ParseResult, StatementPeriod};
pub use transaction::{NewTransaction, Transaction, TransactionKind};
