//! Statement parser port - format-specific extraction

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::ParseResult;

/// Statement file formats with a bundled adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatementFormat {
    Csv,
    Ofx,
    Pdf,
}

impl StatementFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatementFormat::Csv => "csv",
            StatementFormat::Ofx => "ofx",
            StatementFormat::Pdf => "pdf",
        }
    }

    /// Map a file extension to a format
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "csv" | "txt" => Some(StatementFormat::Csv),
            "ofx" | "qfx" => Some(StatementFormat::Ofx),
            "pdf" => Some(StatementFormat::Pdf),
            _ => None,
        }
    }
}

/// Raw statement file handed to an adapter
#[derive(Debug, Clone)]
pub struct ParserInput {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ParserInput {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Lowercased file extension, if any
    pub fn extension(&self) -> Option<String> {
        std::path::Path::new(&self.file_name)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
    }

    /// File contents decoded as UTF-8, with invalid sequences replaced
    pub fn text_lossy(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

/// A format-specific statement parser.
///
/// Adapters are forgiving by contract: malformed lines become warnings in
/// the result, and a file the adapter cannot read at all becomes a result
/// with `errors` populated. `parse` itself never fails.
#[async_trait]
pub trait StatementParser: Send + Sync {
    /// Which format this adapter handles
    fn format(&self) -> StatementFormat;

    /// Cheap content sniff used when the file extension is missing or wrong
    fn detect(&self, input: &ParserInput) -> bool;

    /// Extract candidates from the file
    async fn parse(&self, input: &ParserInput) -> ParseResult;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            StatementFormat::from_extension("CSV"),
            Some(StatementFormat::Csv)
        );
        assert_eq!(
            StatementFormat::from_extension("qfx"),
            Some(StatementFormat::Ofx)
        );
        assert_eq!(
            StatementFormat::from_extension("pdf"),
            Some(StatementFormat::Pdf)
        );
        assert_eq!(StatementFormat::from_extension("xlsx"), None);
    }

    #[test]
    fn test_parser_input_extension() {
        let input = ParserInput::new("extrato Janeiro.OFX", Vec::new());
        assert_eq!(input.extension().as_deref(), Some("ofx"));

        let input = ParserInput::new("statement", Vec::new());
        assert_eq!(input.extension(), None);
    }
}
