//! Import history - remembers which statement files were already imported
//!
//! History lives behind the key-value port as a single JSON array. Entries
//! are validated on load; malformed records are dropped instead of poisoning
//! the whole history. A file is recognized by the checksum of its bytes, so
//! renaming a statement does not defeat the check.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::domain::Result;
use crate::ports::KeyValueStore;

/// Key under which the history array is stored
const HISTORY_KEY: &str = "import:history";

/// Records kept before the oldest are discarded
const MAX_RECORDS: usize = 100;

/// One committed import
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRecord {
    pub batch_id: Uuid,
    pub file_name: String,
    /// SHA256 of the file bytes, truncated to 16 hex chars
    pub checksum: String,
    pub format: String,
    pub currency: String,
    /// Transactions written to the ledger
    pub imported: usize,
    /// Transactions the commit attempted (the user's selection)
    pub total: usize,
    pub committed_at: DateTime<Utc>,
}

/// Checksum used for re-import detection
pub fn file_checksum(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    hex::encode(&digest[..8])
}

/// Service tracking which files were imported before
pub struct ImportHistoryService {
    kv: Arc<dyn KeyValueStore>,
}

impl ImportHistoryService {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// The previous import of a file with this checksum, if any
    pub async fn find_by_checksum(&self, checksum: &str) -> Result<Option<ImportRecord>> {
        let records = self.load().await?;
        Ok(records.into_iter().find(|r| r.checksum == checksum))
    }

    /// Append a record, discarding the oldest beyond the cap
    pub async fn record(&self, record: ImportRecord) -> Result<()> {
        let mut records = self.load().await?;
        records.push(record);
        if records.len() > MAX_RECORDS {
            let excess = records.len() - MAX_RECORDS;
            records.drain(..excess);
        }
        self.kv
            .put(HISTORY_KEY, &serde_json::to_string(&records)?)
            .await
    }

    /// Most recent imports, newest first
    pub async fn recent(&self, limit: usize) -> Result<Vec<ImportRecord>> {
        let mut records = self.load().await?;
        records.reverse();
        records.truncate(limit);
        Ok(records)
    }

    /// Total number of recorded imports
    pub async fn count(&self) -> Result<usize> {
        Ok(self.load().await?.len())
    }

    async fn load(&self) -> Result<Vec<ImportRecord>> {
        let raw = match self.kv.get(HISTORY_KEY).await? {
            Some(raw) => raw,
            None => return Ok(Vec::new()),
        };
        // Validate entry by entry; a corrupted record must not take the
        // rest of the history with it
        let values: Vec<serde_json::Value> = match serde_json::from_str(&raw) {
            Ok(values) => values,
            Err(_) => return Ok(Vec::new()),
        };
        Ok(values
            .into_iter()
            .filter_map(|v| serde_json::from_value(v).ok())
            .collect())
    }
}
