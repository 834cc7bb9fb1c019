//! PDF statement adapter
//!
//! Extracts the text layer from the PDF, then delegates text-to-transaction
//! extraction to the injected `TextExtractor` port. Inputs that are already
//! plain text (pre-extracted statements) skip straight to the extractor.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::currency::detect_from_symbol;
use crate::domain::ParseResult;
use crate::ports::{ParserInput, StatementFormat, StatementParser, TextExtractor};

/// Institution names worth scanning for in statement text
const KNOWN_BANKS: &[&str] = &["Nubank", "Itaú", "Banco do Brasil", "Bradesco", "Caixa"];

/// PDF statement parser
pub struct PdfParser {
    extractor: Arc<dyn TextExtractor>,
}

impl PdfParser {
    pub fn new(extractor: Arc<dyn TextExtractor>) -> Self {
        Self { extractor }
    }

    fn detect_bank(text: &str) -> Option<String> {
        let lower = text.to_lowercase();
        KNOWN_BANKS
            .iter()
            .find(|b| lower.contains(&b.to_lowercase()))
            .map(|b| b.to_string())
    }
}

#[async_trait]
impl StatementParser for PdfParser {
    fn format(&self) -> StatementFormat {
        StatementFormat::Pdf
    }

    fn detect(&self, input: &ParserInput) -> bool {
        input.bytes.starts_with(b"%PDF")
    }

    async fn parse(&self, input: &ParserInput) -> ParseResult {
        let mut result = ParseResult::new();

        let text = if input.bytes.starts_with(b"%PDF") {
            // Text-layer extraction is CPU-bound, keep it off the runtime
            let bytes = input.bytes.clone();
            let extracted =
                tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
                    .await;
            match extracted {
                Ok(Ok(text)) => text,
                Ok(Err(e)) => {
                    result
                        .errors
                        .push(format!("Could not extract text from PDF: {}", e));
                    return result;
                }
                Err(e) => {
                    result
                        .errors
                        .push(format!("PDF text extraction did not finish: {}", e));
                    return result;
                }
            }
        } else {
            input.text_lossy()
        };

        if text.trim().is_empty() {
            result
                .errors
                .push("PDF contains no extractable text (scanned image?)".to_string());
            return result;
        }

        result.bank_name = Self::detect_bank(&text);
        if let Some(code) = detect_from_symbol(&text) {
            result.currency = code.to_string();
        }

        match self.extractor.extract(&text).await {
            Ok(candidates) => {
                if candidates.is_empty() {
                    result
                        .warnings
                        .push("No transactions recognized in the statement text".to_string());
                }
                result.transactions = candidates;
            }
            Err(e) => {
                result
                    .errors
                    .push(format!("Transaction extraction failed: {}", e));
                return result;
            }
        }

        result.compute_period();
        result.ensure_explained();
        result
    }
}
