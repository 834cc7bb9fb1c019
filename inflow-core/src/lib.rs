//! Inflow Core - statement import and reconciliation for personal finances
//!
//! This crate implements the core domain logic following hexagonal architecture:
//!
//! - **domain**: Core business entities (Transaction, ParsedTransaction, ParseResult)
//! - **ports**: Trait definitions for external dependencies (TransactionStore, StatementParser, Categorizer)
//! - **services**: Business logic orchestration (preview, review session, duplicate detection)
//! - **adapters**: Concrete implementations (DuckDB, CSV/OFX/PDF parsers, keyword heuristics)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod log_migrations;
pub mod migrations;
pub mod ports;
pub mod services;

use std::path::Path;
use std::sync::Arc;

use adapters::{
    CsvOptions, CsvParser, DuckDbStore, HeuristicExtractor, KeywordCategorizer, OfxParser,
    PdfParser,
};
use config::Config;
use ports::{Categorizer, KeyValueStore, StatementParser, TransactionStore};
use services::{DuplicateDetector, ImportHistoryService, ImportService, StatusService};

// Re-export commonly used types at crate root
pub use domain::{
    Error, ParseResult, ParsedTransaction, Result, Transaction, TransactionKind,
};
pub use ports::ParserInput;
pub use services::{CommitReport, ImportPreview, ImportSession, SessionState};

/// Main context for Inflow operations
///
/// This is the primary entry point for all business logic. It holds
/// the database handle, configuration, and all services.
pub struct InflowContext {
    pub config: Config,
    pub store: Arc<DuckDbStore>,
    pub categorizer: Arc<dyn Categorizer>,
    pub import_service: ImportService,
    pub status_service: StatusService,
}

impl InflowContext {
    /// Create a new Inflow context
    pub fn new(inflow_dir: &Path) -> Result<Self> {
        Self::with_config(inflow_dir, Config::load(inflow_dir)?)
    }

    /// Create a context with an explicit configuration, e.g. with CLI flag
    /// overrides applied on top of the settings file
    pub fn with_config(inflow_dir: &Path, config: Config) -> Result<Self> {
        let db_path = inflow_dir.join("inflow.duckdb");
        let store = Arc::new(DuckDbStore::new(&db_path)?);

        // Initialize schema
        store.ensure_schema()?;

        let kv: Arc<dyn KeyValueStore> = store.clone();
        let transactions: Arc<dyn TransactionStore> = store.clone();

        // CSV goes last: its content sniff is the loosest of the three
        let extractor = Arc::new(HeuristicExtractor::new());
        let parsers: Vec<Arc<dyn StatementParser>> = vec![
            Arc::new(OfxParser::new()),
            Arc::new(PdfParser::new(extractor)),
            Arc::new(CsvParser::with_options(CsvOptions {
                flip_signs: config.import.flip_signs,
            })),
        ];

        let import_service = ImportService::new(
            parsers,
            DuplicateDetector::with_config(config.detector.clone()),
            transactions,
            kv.clone(),
        );
        let status_service = StatusService::new(store.clone(), ImportHistoryService::new(kv));
        let categorizer: Arc<dyn Categorizer> = Arc::new(KeywordCategorizer::new());

        Ok(Self {
            config,
            store,
            categorizer,
            import_service,
            status_service,
        })
    }
}
