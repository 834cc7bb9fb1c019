//! In-memory store adapters
//!
//! Back the `TransactionStore` and `KeyValueStore` ports with plain process
//! memory. Used by the test suite and by dry runs that must not touch the
//! database on disk. `MemoryStore::failing_on` simulates per-row store
//! failures so commit error paths can be exercised.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::{Error, NewTransaction, Result, Transaction};
use crate::ports::{KeyValueStore, TransactionStore};

/// Transaction store held in a `Mutex<Vec<_>>`
#[derive(Debug, Default)]
pub struct MemoryStore {
    transactions: Mutex<Vec<Transaction>>,
    /// When set, `create` fails for descriptions containing this needle
    fail_on: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that rejects creates whose description contains `needle`
    pub fn failing_on(needle: &str) -> Self {
        Self {
            transactions: Mutex::new(Vec::new()),
            fail_on: Some(needle.to_string()),
        }
    }

    /// Pre-load the ledger, for tests that need an existing history
    pub fn with_transactions(transactions: Vec<Transaction>) -> Self {
        Self {
            transactions: Mutex::new(transactions),
            fail_on: None,
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<Transaction>>> {
        self.transactions
            .lock()
            .map_err(|e| Error::database(format!("Failed to acquire store lock: {}", e)))
    }
}

#[async_trait]
impl TransactionStore for MemoryStore {
    async fn create(&self, payload: NewTransaction) -> Result<Transaction> {
        payload.validate()?;
        if let Some(needle) = &self.fail_on {
            if payload.description.contains(needle.as_str()) {
                return Err(Error::database(format!(
                    "Simulated store failure for '{}'",
                    payload.description
                )));
            }
        }
        let transaction = Transaction::new(payload);
        self.lock()?.push(transaction.clone());
        Ok(transaction)
    }

    async fn list(&self) -> Result<Vec<Transaction>> {
        Ok(self.lock()?.clone())
    }
}

/// Key-value store held in a `Mutex<HashMap<_, _>>`
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|e| Error::database(format!("Failed to acquire store lock: {}", e)))
    }
}

#[async_trait]
impl KeyValueStore for MemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TransactionKind;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn payload(description: &str) -> NewTransaction {
        NewTransaction {
            description: description.to_string(),
            amount: Decimal::new(2490, 2),
            kind: TransactionKind::Expense,
            category: None,
            date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            batch_id: None,
        }
    }

    #[tokio::test]
    async fn test_create_assigns_identity_and_lists_in_order() {
        let store = MemoryStore::new();
        let first = store.create(payload("Uber Trip")).await.unwrap();
        let second = store.create(payload("Netflix")).await.unwrap();
        assert_ne!(first.id, second.id);

        let all = store.list().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].description, "Uber Trip");
        assert_eq!(all[1].description, "Netflix");
    }

    #[tokio::test]
    async fn test_failing_store_rejects_matching_descriptions() {
        let store = MemoryStore::failing_on("Netflix");
        assert!(store.create(payload("Uber Trip")).await.is_ok());
        assert!(store.create(payload("Netflix")).await.is_err());
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_kv_round_trip_and_delete() {
        let kv = MemoryKvStore::new();
        assert_eq!(kv.get("import:history").await.unwrap(), None);

        kv.put("import:history", "[]").await.unwrap();
        assert_eq!(
            kv.get("import:history").await.unwrap(),
            Some("[]".to_string())
        );

        kv.delete("import:history").await.unwrap();
        assert_eq!(kv.get("import:history").await.unwrap(), None);
    }
}
