//! Status service - ledger and storage summaries

use std::sync::Arc;

use serde::Serialize;

use crate::adapters::DuckDbStore;
use crate::domain::Result;
use crate::services::history::{ImportHistoryService, ImportRecord};

/// Snapshot of what the ledger currently holds
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSummary {
    pub total_transactions: i64,
    /// Distinct import batches with at least one committed row
    pub import_batches: i64,
    /// Imports remembered by the history log
    pub recorded_imports: usize,
    /// Most recent recorded import, if any
    pub last_import: Option<ImportRecord>,
    pub date_range: DateRange,
    pub database_path: String,
    pub database_size_bytes: u64,
}

/// Earliest and latest transaction dates, as `YYYY-MM-DD`
#[derive(Debug, Serialize)]
pub struct DateRange {
    pub earliest: Option<String>,
    pub latest: Option<String>,
}

/// Status service for ledger summaries
pub struct StatusService {
    store: Arc<DuckDbStore>,
    history: ImportHistoryService,
}

impl StatusService {
    pub fn new(store: Arc<DuckDbStore>, history: ImportHistoryService) -> Self {
        Self { store, history }
    }

    /// Get overall status summary
    pub async fn get_status(&self) -> Result<StatusSummary> {
        let total_transactions = self.store.transaction_count()?;
        let import_batches = self.store.batch_count()?;
        let recorded_imports = self.history.count().await?;
        let last_import = self.history.recent(1).await?.into_iter().next();
        let range = self.store.transaction_date_range()?;

        let database_size_bytes = std::fs::metadata(self.store.db_path())
            .map(|m| m.len())
            .unwrap_or(0);

        Ok(StatusSummary {
            total_transactions,
            import_batches,
            recorded_imports,
            last_import,
            date_range: DateRange {
                earliest: range.map(|(lo, _)| lo.to_string()),
                latest: range.map(|(_, hi)| hi.to_string()),
            },
            database_path: self.store.db_path().display().to_string(),
            database_size_bytes,
        })
    }
}
