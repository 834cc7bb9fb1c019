//! Transaction store port - ledger persistence abstraction

use async_trait::async_trait;

use crate::domain::result::Result;
use crate::domain::{NewTransaction, Transaction};

/// The user's transaction ledger.
///
/// The import subsystem only ever creates transactions and reads the full
/// list (the duplicate-comparison snapshot). It never updates or deletes
/// what the ledger owns.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Persist one transaction. The store assigns identity.
    async fn create(&self, payload: NewTransaction) -> Result<Transaction>;

    /// All ledger transactions, used as the duplicate-comparison snapshot
    async fn list(&self) -> Result<Vec<Transaction>>;
}
