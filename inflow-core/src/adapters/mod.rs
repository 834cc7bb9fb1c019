//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - DuckDB for the TransactionStore and KeyValueStore ports
//! - CSV, OFX and PDF parsers for the StatementParser port
//! - Deterministic heuristics for the TextExtractor and Categorizer ports
//! - In-memory stores for tests and dry runs

pub mod csv;
pub mod duckdb;
pub mod heuristic;
pub mod memory;
pub mod ofx;
pub mod pdf;

pub(crate) mod fields;

pub use csv::{CsvOptions, CsvParser};
pub use duckdb::DuckDbStore;
pub use heuristic::{HeuristicExtractor, KeywordCategorizer};
pub use memory::{MemoryKvStore, MemoryStore};
pub use ofx::OfxParser;
pub use pdf::PdfParser;
