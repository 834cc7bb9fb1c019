//! Key-value store port - small-state persistence abstraction

use async_trait::async_trait;

use crate::domain::result::Result;

/// Minimal key-value persistence, used for import history.
///
/// Keeping this behind a port means the import logic is testable with an
/// in-memory map and indifferent to where the host application keeps small
/// state.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn put(&self, key: &str, value: &str) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;
}
