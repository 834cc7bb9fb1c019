//! DuckDB store implementation
//!
//! Backs the `TransactionStore` and `KeyValueStore` ports with a single
//! on-disk DuckDB database. All access goes through one connection behind a
//! Mutex; the database calls themselves are synchronous.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use duckdb::{params, Connection};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::{Error, NewTransaction, Result, Transaction, TransactionKind};
use crate::ports::{KeyValueStore, TransactionStore};
use crate::services::{MigrationResult, MigrationService};

/// Maximum number of retries when database file is locked
const MAX_RETRIES: u32 = 5;

/// Initial retry delay in milliseconds (doubles each retry: 50, 100, 200, 400, 800ms)
const INITIAL_RETRY_DELAY_MS: u64 = 50;

/// Check if an error message indicates a file locking issue that should be retried
fn is_retryable_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    // Windows error messages
    lower.contains("being used by another process")
        || lower.contains("cannot access the file")
        // Unix/macOS error messages
        || lower.contains("resource temporarily unavailable")
        || lower.contains("database is locked")
        || lower.contains("file is already open")
}

/// DuckDB-backed store
pub struct DuckDbStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl DuckDbStore {
    /// Open (or create) the database at `db_path`.
    ///
    /// Includes retry logic with exponential backoff for file locking errors,
    /// which can occur when two commands hit the database simultaneously.
    pub fn new(db_path: &Path) -> Result<Self> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            match Self::try_open_connection(db_path) {
                Ok(conn) => {
                    return Ok(Self {
                        conn: Mutex::new(conn),
                        db_path: db_path.to_path_buf(),
                    });
                }
                Err(e) => {
                    let err_msg = e.to_string();
                    if is_retryable_error(&err_msg) && attempt < MAX_RETRIES - 1 {
                        let delay =
                            Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt));
                        eprintln!(
                            "[inflow] Database busy, retrying in {}ms (attempt {}/{}): {}",
                            delay.as_millis(),
                            attempt + 1,
                            MAX_RETRIES,
                            err_msg
                        );
                        thread::sleep(delay);
                        last_error = Some(e);
                        continue;
                    }
                    return Err(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            Error::database(format!("Failed to open database after {} retries", MAX_RETRIES))
        }))
    }

    /// Attempt to open a database connection (called by new() with retry logic)
    fn try_open_connection(db_path: &Path) -> Result<Connection> {
        // Disable extension autoloading: cached extensions in ~/.duckdb may
        // have been built for a different engine version
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        let conn = Connection::open_with_flags(db_path, config)?;
        Ok(conn)
    }

    /// Run database migrations using the MigrationService
    pub fn run_migrations(&self) -> Result<MigrationResult> {
        let conn = self.lock()?;
        let migration_service = MigrationService::new(&conn);
        migration_service.run_pending()
    }

    /// Ensure database schema exists (runs pending migrations)
    pub fn ensure_schema(&self) -> Result<()> {
        self.run_migrations()?;
        Ok(())
    }

    /// Path of the database file
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| Error::database(format!("Failed to acquire database lock: {}", e)))
    }

    // === Transaction operations (sync internals) ===

    fn insert_transaction(&self, tx: &Transaction) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO sys_transactions (transaction_id, description, amount, kind, category,
                                           transaction_date, batch_id, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                tx.id.to_string(),
                tx.description,
                amount_to_f64(tx.amount),
                tx.kind.as_str(),
                tx.category,
                tx.date.format("%Y-%m-%d").to_string(),
                tx.batch_id.map(|id| id.to_string()),
                tx.created_at.to_rfc3339(),
                tx.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn select_transactions(&self) -> Result<Vec<Transaction>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT transaction_id, description, amount, kind, category,
                    transaction_date::VARCHAR, batch_id, created_at, updated_at
             FROM sys_transactions
             ORDER BY transaction_date, created_at",
        )?;

        let transactions = stmt
            .query_map([], |row| Ok(row_to_transaction(row)))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(transactions)
    }

    /// Count of stored transactions
    pub fn transaction_count(&self) -> Result<i64> {
        let conn = self.lock()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM sys_transactions", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Earliest and latest transaction dates, when any exist
    pub fn transaction_date_range(&self) -> Result<Option<(NaiveDate, NaiveDate)>> {
        let conn = self.lock()?;
        let result: (Option<String>, Option<String>) = conn.query_row(
            "SELECT MIN(transaction_date)::VARCHAR, MAX(transaction_date)::VARCHAR
             FROM sys_transactions",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        match (result.0, result.1) {
            (Some(min), Some(max)) => Ok(Some((parse_date(&min), parse_date(&max)))),
            _ => Ok(None),
        }
    }

    /// Count of distinct import batches
    pub fn batch_count(&self) -> Result<i64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(DISTINCT batch_id) FROM sys_transactions WHERE batch_id IS NOT NULL",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    // === Key-value operations (sync internals) ===

    fn kv_get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.lock()?;
        let value = conn
            .query_row("SELECT value FROM sys_kv WHERE key = ?", [key], |row| {
                row.get::<_, String>(0)
            })
            .ok();
        Ok(value)
    }

    fn kv_put(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO sys_kv (key, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT (key) DO UPDATE SET
                value = EXCLUDED.value,
                updated_at = EXCLUDED.updated_at",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn kv_delete(&self, key: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM sys_kv WHERE key = ?", [key])?;
        Ok(())
    }
}

#[async_trait]
impl TransactionStore for DuckDbStore {
    async fn create(&self, payload: NewTransaction) -> Result<Transaction> {
        payload.validate()?;
        let transaction = Transaction::new(payload);
        self.insert_transaction(&transaction)?;
        Ok(transaction)
    }

    async fn list(&self) -> Result<Vec<Transaction>> {
        self.select_transactions()
    }
}

#[async_trait]
impl KeyValueStore for DuckDbStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.kv_get(key)
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        self.kv_put(key, value)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.kv_delete(key)
    }
}

fn row_to_transaction(row: &duckdb::Row) -> Transaction {
    // Column indices from SELECT:
    // 0: transaction_id, 1: description, 2: amount, 3: kind, 4: category,
    // 5: transaction_date, 6: batch_id, 7: created_at, 8: updated_at
    let id_str: String = row.get(0).unwrap_or_default();
    let amount: f64 = row.get(2).unwrap_or(0.0);
    let kind_str: String = row.get(3).unwrap_or_else(|_| "expense".to_string());
    let date_str: String = row.get(5).unwrap_or_default();
    let batch_str: Option<String> = row.get(6).ok();
    let created_str: String = row.get(7).unwrap_or_default();
    let updated_str: String = row.get(8).unwrap_or_default();

    Transaction {
        id: Uuid::parse_str(&id_str).unwrap_or_else(|_| Uuid::new_v4()),
        description: row.get(1).unwrap_or_default(),
        amount: Decimal::try_from(amount).unwrap_or_default(),
        kind: TransactionKind::parse(&kind_str).unwrap_or(TransactionKind::Expense),
        category: row.get(4).ok(),
        date: parse_date(&date_str),
        batch_id: batch_str.and_then(|s| Uuid::parse_str(&s).ok()),
        created_at: parse_timestamp(&created_str),
        updated_at: parse_timestamp(&updated_str),
    }
}

// Helper functions

/// Amounts are persisted as DOUBLE; cent-level precision survives the trip
/// because reads round back through integer cents.
fn amount_to_f64(amount: Decimal) -> f64 {
    use rust_decimal::prelude::ToPrimitive;
    amount.to_f64().unwrap_or(0.0)
}

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn parse_date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap_or_else(|_| Utc::now().date_naive())
}
