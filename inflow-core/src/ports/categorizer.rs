//! Categorizer port - external category suggestion service

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::result::Result;
use crate::domain::TransactionKind;

/// One candidate sent for categorization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorizeItem {
    pub description: String,
    pub amount: Decimal,
    pub kind: TransactionKind,
}

/// One suggestion returned by the categorizer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySuggestion {
    pub category: String,
    /// Categorizer self-assessment in [0,100]
    pub confidence: u8,
}

/// Batch category suggestion service (an AI model in production).
///
/// Results are positionally aligned with the input slice. Failures are soft:
/// callers keep their current categories when this errors.
#[async_trait]
pub trait Categorizer: Send + Sync {
    async fn categorize(&self, items: &[CategorizeItem]) -> Result<Vec<CategorySuggestion>>;
}
