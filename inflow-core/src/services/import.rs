//! Import orchestration - from statement file to review session

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::domain::{ParseResult, Result};
use crate::ports::{KeyValueStore, ParserInput, StatementFormat, StatementParser, TransactionStore};
use crate::services::dedup::{DuplicateDetector, DuplicateMatch};
use crate::services::history::{file_checksum, ImportHistoryService, ImportRecord};
use crate::services::session::{CommitReport, ImportSession};

/// A parsed statement annotated with everything the review flow needs
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportPreview {
    /// Batch id assigned up front so history and committed rows agree
    pub batch_id: Uuid,
    pub file_name: String,
    /// Format of the adapter that produced the result, when one was resolved
    pub format: Option<StatementFormat>,
    /// Checksum of the raw file bytes
    pub checksum: String,
    pub result: ParseResult,
    /// Duplicate verdicts aligned with `result.transactions`
    pub matches: Vec<Option<DuplicateMatch>>,
    /// Earlier import of a byte-identical file, if any
    pub previous_import: Option<ImportRecord>,
}

impl ImportPreview {
    /// True when nothing was parsed and review cannot proceed
    pub fn is_fatal(&self) -> bool {
        self.result.is_fatal()
    }

    /// Candidates flagged as likely duplicates of ledger rows
    pub fn duplicate_count(&self) -> usize {
        self.matches.iter().filter(|m| m.is_some()).count()
    }
}

/// Coordinates parsing, duplicate detection and import history.
///
/// Adapters are tried in registration order when the file extension does
/// not settle the format, so the loosest sniffer (CSV) must come last.
pub struct ImportService {
    parsers: Vec<Arc<dyn StatementParser>>,
    detector: DuplicateDetector,
    store: Arc<dyn TransactionStore>,
    history: ImportHistoryService,
}

impl ImportService {
    pub fn new(
        parsers: Vec<Arc<dyn StatementParser>>,
        detector: DuplicateDetector,
        store: Arc<dyn TransactionStore>,
        kv: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self {
            parsers,
            detector,
            store,
            history: ImportHistoryService::new(kv),
        }
    }

    /// Import history backing this service
    pub fn history(&self) -> &ImportHistoryService {
        &self.history
    }

    /// Read a statement file from disk and build its preview
    pub async fn preview_file(&self, path: &Path) -> Result<ImportPreview> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.preview(ParserInput::new(file_name, bytes)).await
    }

    /// Parse a statement, screen it against the ledger and report what an
    /// import would do.
    ///
    /// Parsing failures are carried inside the returned preview; `Err` is
    /// reserved for infrastructure (store or history) failures.
    pub async fn preview(&self, input: ParserInput) -> Result<ImportPreview> {
        let checksum = file_checksum(&input.bytes);

        let (format, mut result) = match self.resolve_parser(&input) {
            Some(parser) => (Some(parser.format()), parser.parse(&input).await),
            None => (None, unsupported_format(&input.file_name)),
        };

        let previous_import = self.history.find_by_checksum(&checksum).await?;
        if let Some(previous) = &previous_import {
            result.warnings.push(format!(
                "This file was already imported on {} ({} of {} transactions committed)",
                previous.committed_at.format("%Y-%m-%d"),
                previous.imported,
                previous.total,
            ));
        }

        // One ledger snapshot per preview; the whole review runs against it
        let existing = self.store.list().await?;
        let matches = self.detector.detect(&mut result.transactions, &existing);

        Ok(ImportPreview {
            batch_id: Uuid::new_v4(),
            file_name: input.file_name,
            format,
            checksum,
            result,
            matches,
            previous_import,
        })
    }

    /// Parse without duplicate screening, for callers that only need candidates
    pub async fn parse(&self, input: &ParserInput) -> ParseResult {
        match self.resolve_parser(input) {
            Some(parser) => parser.parse(input).await,
            None => unsupported_format(&input.file_name),
        }
    }

    /// Open a review session over the preview's candidates.
    ///
    /// The session gets its own copy so the preview stays usable for display
    /// while selection and categories change.
    pub fn start_session(&self, preview: &ImportPreview) -> ImportSession {
        ImportSession::new(preview.batch_id, preview.result.transactions.clone())
    }

    /// Record a committed session in the import history.
    ///
    /// Sessions that wrote nothing are skipped, so a commit where every row
    /// failed does not mark the file as imported.
    pub async fn record_commit(
        &self,
        preview: &ImportPreview,
        report: &CommitReport,
    ) -> Result<()> {
        if report.committed == 0 {
            return Ok(());
        }
        self.history
            .record(ImportRecord {
                batch_id: report.batch_id,
                file_name: preview.file_name.clone(),
                checksum: preview.checksum.clone(),
                format: preview
                    .format
                    .map(|f| f.as_str().to_string())
                    .unwrap_or_else(|| "unknown".to_string()),
                currency: preview.result.currency.clone(),
                imported: report.committed,
                total: report.attempted,
                committed_at: chrono::Utc::now(),
            })
            .await
    }

    /// Pick the adapter for a file: extension first, then content sniffing
    fn resolve_parser(&self, input: &ParserInput) -> Option<&Arc<dyn StatementParser>> {
        if let Some(format) = input
            .extension()
            .as_deref()
            .and_then(StatementFormat::from_extension)
        {
            if let Some(parser) = self
                .parsers
                .iter()
                .find(|p| p.format() == format && p.detect(input))
            {
                return Some(parser);
            }
        }
        self.parsers.iter().find(|p| p.detect(input))
    }
}

fn unsupported_format(file_name: &str) -> ParseResult {
    ParseResult::failed(format!(
        "Unsupported statement format: '{}' (expected CSV, OFX or PDF)",
        file_name
    ))
}
