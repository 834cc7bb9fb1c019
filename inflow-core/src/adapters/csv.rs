//! CSV statement adapter
//!
//! Best-effort extraction from delimited exports. Columns are auto-detected
//! from the header row, known institution layouts fill `bank_name`, and
//! unparsable lines turn into warnings instead of failures.

use async_trait::async_trait;

use crate::adapters::fields::{decimal_separator, parse_amount_hinted, parse_date};
use crate::domain::currency::detect_from_symbol;
use crate::domain::{currency_config, ParseResult, ParsedTransaction, TransactionKind};
use crate::ports::{ParserInput, StatementFormat, StatementParser};

/// Per-line warnings are capped so a structurally broken file does not
/// produce thousands of them
const MAX_LINE_WARNINGS: usize = 20;

/// Options controlling CSV sign conventions
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvOptions {
    /// Flip signs on single-amount columns (credit card exports list
    /// charges as positive)
    pub flip_signs: bool,
}

/// CSV statement parser
#[derive(Debug, Default)]
pub struct CsvParser {
    options: CsvOptions,
}

/// Resolved header columns, by index into each record
#[derive(Debug, Default)]
struct ColumnMap {
    date: usize,
    description: Option<usize>,
    amount: Option<usize>,
    debit: Option<usize>,
    credit: Option<usize>,
}

impl CsvParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: CsvOptions) -> Self {
        Self { options }
    }

    /// Pick the delimiter that splits the header into the most fields
    fn sniff_delimiter(line: &str) -> u8 {
        let candidates = [b',', b';', b'\t'];
        let mut best = b',';
        let mut best_count = 0;
        for &d in &candidates {
            let count = line.matches(d as char).count();
            if count > best_count {
                best = d;
                best_count = count;
            }
        }
        best
    }

    /// Match header names against known field patterns
    fn detect_columns(headers: &[String]) -> Option<ColumnMap> {
        let date_patterns = [
            "date", "data", "posted", "post date", "dt", "dia",
        ];
        let desc_patterns = [
            "description", "descrição", "descricao", "desc", "memo", "payee", "merchant",
            "details", "narration", "histórico", "historico", "lançamento", "lancamento",
            "title", "título", "titulo", "estabelecimento",
        ];
        let amount_patterns = ["amount", "amt", "valor", "total", "transaction amount"];
        let debit_patterns = ["debit", "débito", "debito", "dr", "withdrawal", "saída", "saida"];
        let credit_patterns = [
            "credit", "crédito", "credito", "cr", "deposit", "entrada",
        ];

        let lower: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
        let find = |patterns: &[&str]| -> Option<usize> {
            lower
                .iter()
                .position(|h| patterns.iter().any(|p| h.contains(p)))
        };

        let date = find(&date_patterns)?;

        let mut map = ColumnMap {
            date,
            ..ColumnMap::default()
        };

        map.amount = find(&amount_patterns);
        if map.amount.is_none() {
            map.debit = find(&debit_patterns);
            map.credit = find(&credit_patterns);
        }
        if map.amount.is_none() && map.debit.is_none() && map.credit.is_none() {
            return None;
        }

        map.description = lower
            .iter()
            .enumerate()
            .find(|(i, h)| *i != date && desc_patterns.iter().any(|p| h.contains(p)))
            .map(|(i, _)| i);

        Some(map)
    }

    /// Recognize known institution export layouts from the header set
    fn detect_bank(headers: &[String]) -> Option<&'static str> {
        let set: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
        let has = |name: &str| set.iter().any(|h| h == name);

        if has("date") && has("title") && has("amount") {
            return Some("Nubank");
        }
        if has("data") && has("valor") && has("identificador") {
            return Some("Nubank");
        }
        if has("data") && (has("lançamento") || has("lancamento")) {
            return Some("Itaú");
        }
        if has("data") && (has("histórico") || has("historico")) {
            return Some("Banco do Brasil");
        }
        None
    }

    /// Extract one candidate from a record, or a reason it was skipped
    fn parse_record(
        &self,
        record: &csv::StringRecord,
        map: &ColumnMap,
        decimal_hint: Option<char>,
    ) -> std::result::Result<ParsedTransaction, String> {
        let date_str = record.get(map.date).unwrap_or("").trim();
        let date = parse_date(date_str).ok_or_else(|| {
            if date_str.is_empty() {
                "missing date".to_string()
            } else {
                format!("unrecognized date '{}'", date_str)
            }
        })?;

        let (amount, kind) = if let Some(idx) = map.amount {
            let raw = record.get(idx).unwrap_or("");
            let mut signed = parse_amount_hinted(raw, decimal_hint)
                .ok_or_else(|| format!("unrecognized amount '{}'", raw.trim()))?;
            if self.options.flip_signs {
                signed = -signed;
            }
            TransactionKind::from_signed(signed)
        } else {
            let debit = map
                .debit
                .and_then(|i| record.get(i))
                .filter(|s| !s.trim().is_empty())
                .and_then(|s| parse_amount_hinted(s, decimal_hint));
            let credit = map
                .credit
                .and_then(|i| record.get(i))
                .filter(|s| !s.trim().is_empty())
                .and_then(|s| parse_amount_hinted(s, decimal_hint));

            match (debit, credit) {
                // Both populated: the larger magnitude wins
                (Some(d), Some(c)) if d.abs() >= c.abs() => (d.abs(), TransactionKind::Expense),
                (Some(_), Some(c)) => (c.abs(), TransactionKind::Income),
                (Some(d), None) => (d.abs(), TransactionKind::Expense),
                (None, Some(c)) => (c.abs(), TransactionKind::Income),
                (None, None) => return Err("missing amount".to_string()),
            }
        };

        if amount.is_zero() {
            return Err("zero amount".to_string());
        }

        let description = map
            .description
            .and_then(|i| record.get(i))
            .map(|s| s.to_string());

        Ok(ParsedTransaction::new(date, description, amount, kind))
    }
}

#[async_trait]
impl StatementParser for CsvParser {
    fn format(&self) -> StatementFormat {
        StatementFormat::Csv
    }

    fn detect(&self, input: &ParserInput) -> bool {
        if input.bytes.starts_with(b"%PDF") {
            return false;
        }
        let text = input.text_lossy();
        let head: String = text.chars().take(2048).collect();
        if head.to_uppercase().contains("<OFX>") || head.to_uppercase().contains("OFXHEADER") {
            return false;
        }
        head.lines()
            .find(|l| !l.trim().is_empty())
            .map(|l| l.contains(',') || l.contains(';') || l.contains('\t'))
            .unwrap_or(false)
    }

    async fn parse(&self, input: &ParserInput) -> ParseResult {
        let mut result = ParseResult::new();

        let mut text = input.text_lossy();
        if let Some(stripped) = text.strip_prefix('\u{feff}') {
            text = stripped.to_string();
        }
        if text.contains('\u{fffd}') {
            result
                .warnings
                .push("Some characters could not be decoded as UTF-8".to_string());
        }

        if text.trim().is_empty() {
            result.warnings.push("File is empty".to_string());
            return result;
        }

        // Currency from symbols anywhere in the file; locale then resolves
        // single-separator amounts
        let mut decimal_hint = None;
        if let Some(code) = detect_from_symbol(&text) {
            result.currency = code.to_string();
            decimal_hint = Some(decimal_separator(currency_config(code).locale));
        }

        let first_line = match text.lines().find(|l| !l.trim().is_empty()) {
            Some(l) => l.to_string(),
            None => {
                result.warnings.push("File is empty".to_string());
                return result;
            }
        };
        let delimiter = Self::sniff_delimiter(&first_line);

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let headers: Vec<String> = match reader.headers() {
            Ok(h) => h.iter().map(|s| s.to_string()).collect(),
            Err(e) => {
                result.errors.push(format!("Could not read CSV header: {}", e));
                return result;
            }
        };

        result.bank_name = Self::detect_bank(&headers).map(|b| b.to_string());

        let map = match Self::detect_columns(&headers) {
            Some(map) => map,
            None => {
                result.errors.push(format!(
                    "Could not identify date and amount columns in header: {}",
                    headers.join(", ")
                ));
                return result;
            }
        };

        let mut skipped_beyond_cap = 0usize;
        let mut rows = 0usize;
        for record in reader.records() {
            rows += 1;
            let record = match record {
                Ok(r) => r,
                Err(e) => {
                    result.warnings.push(format!("Skipped a malformed line: {}", e));
                    continue;
                }
            };
            let line = record
                .position()
                .map(|p| p.line())
                .unwrap_or(rows as u64 + 1);

            match self.parse_record(&record, &map, decimal_hint) {
                Ok(candidate) => result.transactions.push(candidate),
                Err(reason) => {
                    if result.warnings.len() < MAX_LINE_WARNINGS {
                        result
                            .warnings
                            .push(format!("Line {} skipped: {}", line, reason));
                    } else {
                        skipped_beyond_cap += 1;
                    }
                }
            }
        }

        if skipped_beyond_cap > 0 {
            result
                .warnings
                .push(format!("{} additional lines skipped", skipped_beyond_cap));
        }
        if rows == 0 {
            result
                .warnings
                .push("Statement has a header but no transaction rows".to_string());
        }

        result.compute_period();
        result.ensure_explained();
        result
    }
}
