//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. The core domain
//! depends only on these traits, not on concrete implementations.

mod categorizer;
mod extractor;
mod kv;
mod parser;
mod store;

pub use categorizer::{CategorizeItem, Categorizer, CategorySuggestion};
pub use extractor::TextExtractor;
pub use kv::KeyValueStore;
pub use parser::{ParserInput, StatementFormat, StatementParser};
pub use store::TransactionStore;
