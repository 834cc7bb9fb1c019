//! Text extractor port - unstructured statement text to candidates

use async_trait::async_trait;

use crate::domain::result::Result;
use crate::domain::ParsedTransaction;

/// Turns unstructured statement text (typically extracted from a PDF) into
/// transaction candidates.
///
/// Best-effort: an empty list is a valid answer for text that contains no
/// recognizable transactions. Production wires an AI extraction service
/// here; tests and the CLI default use the deterministic heuristic adapter.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, text: &str) -> Result<Vec<ParsedTransaction>>;
}
