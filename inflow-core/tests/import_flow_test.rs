//! End-to-end statement import tests
//!
//! These drive the full pipeline through InflowContext with a real DuckDB
//! file: parse, screen against the ledger, review, commit, re-import.
//!
//! Run with: cargo test --test import_flow_test -- --nocapture

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tempfile::TempDir;

use inflow_core::domain::NewTransaction;
use inflow_core::ports::{StatementFormat, TransactionStore};
use inflow_core::services::{CommitReport, ImportPreview};
use inflow_core::{InflowContext, ParserInput, SessionState, TransactionKind};

// ============================================================================
// Test Helpers
// ============================================================================

const MARCH_CSV: &str = "date,description,amount\n\
    2024-03-01,Salary ACME,5000.00\n\
    2024-03-02,Market Central,-230.50\n\
    2024-03-03,Uber Trip,-24.90\n\
    2024-03-04,Netflix.com,-55.90\n";

const MARCH_OFX: &str = "OFXHEADER:100\n<OFX><CURDEF>BRL\n<BANKTRANLIST>\n\
    <STMTTRN><TRNTYPE>CREDIT\n<DTPOSTED>20240301\n<TRNAMT>5000.00\n<NAME>Salary ACME\n</STMTTRN>\n\
    <STMTTRN><TRNTYPE>DEBIT\n<DTPOSTED>20240302\n<TRNAMT>-230.50\n<NAME>Market Central\n</STMTTRN>\n\
    </BANKTRANLIST></OFX>";

/// Create a context over a fresh inflow directory
fn context(dir: &TempDir) -> InflowContext {
    InflowContext::new(dir.path()).expect("context should initialize")
}

fn input(file_name: &str, content: &str) -> ParserInput {
    ParserInput::new(file_name, content.as_bytes().to_vec())
}

/// Preview a file, commit every selected candidate, record the import
async fn import_all(
    ctx: &InflowContext,
    file_name: &str,
    content: &str,
) -> (ImportPreview, CommitReport) {
    let preview = ctx
        .import_service
        .preview(input(file_name, content))
        .await
        .unwrap();
    let mut session = ctx.import_service.start_session(&preview);
    let report = session.commit(&*ctx.store).await.unwrap();
    ctx.import_service
        .record_commit(&preview, &report)
        .await
        .unwrap();
    (preview, report)
}

// ============================================================================
// Import Flow
// ============================================================================

#[tokio::test]
async fn test_full_import_flow() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir);

    let preview = ctx
        .import_service
        .preview(input("march.csv", MARCH_CSV))
        .await
        .unwrap();

    assert!(!preview.is_fatal());
    assert_eq!(preview.format, Some(StatementFormat::Csv));
    assert_eq!(preview.result.transactions.len(), 4);
    assert_eq!(preview.duplicate_count(), 0);

    let mut session = ctx.import_service.start_session(&preview);
    assert_eq!(session.selected_count(), 4);

    session
        .categorize_all(ctx.categorizer.as_ref())
        .await
        .unwrap();
    let categories: Vec<Option<&str>> = session
        .candidates()
        .iter()
        .map(|c| c.category.as_deref())
        .collect();
    assert_eq!(categories[0], Some("Income"));
    assert_eq!(categories[2], Some("Transport"));
    assert_eq!(categories[3], Some("Subscriptions"));

    let report = session.commit(&*ctx.store).await.unwrap();
    assert_eq!(report.attempted, 4);
    assert_eq!(report.committed, 4);
    assert!(report.is_complete());
    assert_eq!(session.state(), SessionState::Committed);

    ctx.import_service
        .record_commit(&preview, &report)
        .await
        .unwrap();

    let stored = ctx.store.list().await.unwrap();
    assert_eq!(stored.len(), 4);
    assert!(stored.iter().all(|t| t.batch_id == Some(preview.batch_id)));

    let summary = ctx.status_service.get_status().await.unwrap();
    assert_eq!(summary.total_transactions, 4);
    assert_eq!(summary.import_batches, 1);
    assert_eq!(summary.recorded_imports, 1);
}

#[tokio::test]
async fn test_reimport_flags_every_row_and_deselects() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir);
    import_all(&ctx, "march.csv", MARCH_CSV).await;

    let again = ctx
        .import_service
        .preview(input("march.csv", MARCH_CSV))
        .await
        .unwrap();

    assert!(again.previous_import.is_some());
    assert!(again
        .result
        .warnings
        .iter()
        .any(|w| w.contains("already imported")));
    assert_eq!(again.duplicate_count(), 4);
    assert!(again
        .result
        .transactions
        .iter()
        .all(|t| t.is_flagged_duplicate()));

    // Duplicates start deselected, so a blind confirm imports nothing
    let session = ctx.import_service.start_session(&again);
    assert_eq!(session.selected_count(), 0);
}

#[tokio::test]
async fn test_partial_selection_commits_only_selected() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir);

    let preview = ctx
        .import_service
        .preview(input("march.csv", MARCH_CSV))
        .await
        .unwrap();
    let mut session = ctx.import_service.start_session(&preview);

    // Drop the salary row from the selection
    session.toggle_select(0).unwrap();
    assert_eq!(session.selected_count(), 3);

    let report = session.commit(&*ctx.store).await.unwrap();
    assert_eq!(report.attempted, 3);
    assert_eq!(report.committed, 3);

    let stored = ctx.store.list().await.unwrap();
    assert_eq!(stored.len(), 3);
    assert!(stored.iter().all(|t| t.description != "Salary ACME"));
    // No categorization ran, so every row got the fallback category
    assert!(stored
        .iter()
        .all(|t| t.category.as_deref() == Some("Uncategorized")));
}

#[tokio::test]
async fn test_cancelled_session_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir);

    let preview = ctx
        .import_service
        .preview(input("march.csv", MARCH_CSV))
        .await
        .unwrap();
    let mut session = ctx.import_service.start_session(&preview);

    session.cancel().unwrap();
    assert_eq!(session.state(), SessionState::Cancelled);
    assert!(session.commit(&*ctx.store).await.is_err());

    assert!(ctx.store.list().await.unwrap().is_empty());
    assert_eq!(
        ctx.import_service.history().count().await.unwrap(),
        0,
        "cancelled sessions must not reach the history log"
    );
}

#[tokio::test]
async fn test_ofx_statement_through_same_pipeline() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir);

    let preview = ctx
        .import_service
        .preview(input("extrato.ofx", MARCH_OFX))
        .await
        .unwrap();
    assert_eq!(preview.format, Some(StatementFormat::Ofx));
    assert_eq!(preview.result.currency, "BRL");
    assert_eq!(preview.result.transactions.len(), 2);

    let mut session = ctx.import_service.start_session(&preview);
    let report = session.commit(&*ctx.store).await.unwrap();
    assert_eq!(report.committed, 2);

    // The OFX rows match the CSV rows for the same period, so a CSV export
    // of the same account now screens as duplicates
    let csv_preview = ctx
        .import_service
        .preview(input(
            "march.csv",
            "date,description,amount\n2024-03-01,Salary ACME,5000.00\n",
        ))
        .await
        .unwrap();
    assert_eq!(csv_preview.duplicate_count(), 1);
}

// ============================================================================
// Persistence
// ============================================================================

#[tokio::test]
async fn test_ledger_and_history_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let batch_id = {
        let ctx = context(&dir);
        let (preview, _) = import_all(&ctx, "march.csv", MARCH_CSV).await;
        preview.batch_id
        // ctx dropped here, releasing the database file
    };

    let ctx = context(&dir);
    let stored = ctx.store.list().await.unwrap();
    assert_eq!(stored.len(), 4);
    assert!(stored.iter().all(|t| t.batch_id == Some(batch_id)));

    let again = ctx
        .import_service
        .preview(input("march.csv", MARCH_CSV))
        .await
        .unwrap();
    assert!(again.previous_import.is_some());
    assert_eq!(again.duplicate_count(), 4);
}

#[tokio::test]
async fn test_concurrent_creates_on_shared_store() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir);
    let store = ctx.store.clone();

    let mut handles = Vec::new();
    for task in 0..6 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            for i in 0..5 {
                store
                    .create(NewTransaction {
                        description: format!("Task {} entry {}", task, i),
                        amount: Decimal::new(1000 + i, 2),
                        kind: TransactionKind::Expense,
                        category: None,
                        date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
                        batch_id: None,
                    })
                    .await
                    .unwrap();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(ctx.store.list().await.unwrap().len(), 30);
}
