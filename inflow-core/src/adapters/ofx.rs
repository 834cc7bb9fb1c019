//! OFX/QFX statement adapter
//!
//! OFX 1.x is SGML with unclosed leaf tags, so this is a forgiving tag
//! scanner rather than an XML parse. Each `<STMTTRN>` block yields one
//! candidate; blocks missing required tags become warnings.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::adapters::fields::parse_amount;
use crate::domain::{ParseResult, ParsedTransaction, StatementPeriod, TransactionKind};
use crate::ports::{ParserInput, StatementFormat, StatementParser};

/// TRNTYPE values that mean money out even when TRNAMT is unsigned
const DEBIT_TYPES: &[&str] = &["DEBIT", "PAYMENT", "FEE", "SRVCHG", "ATM", "POS", "CHECK"];

/// OFX statement parser
#[derive(Debug, Default)]
pub struct OfxParser;

impl OfxParser {
    pub fn new() -> Self {
        Self
    }

    /// Value of the first `<TAG>` leaf in `text`: everything up to the next
    /// tag or line break
    fn tag_value<'a>(text: &'a str, tag: &str) -> Option<&'a str> {
        // ASCII uppercasing keeps byte offsets valid for slicing `text`
        let upper = text.to_ascii_uppercase();
        let open = format!("<{}>", tag);
        let start = upper.find(&open)? + open.len();
        let rest = &text[start..];
        let end = rest.find(['<', '\r', '\n']).unwrap_or(rest.len());
        let value = rest[..end].trim();
        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    }

    /// OFX dates are YYYYMMDD with optional time and timezone suffix
    fn parse_ofx_date(value: &str) -> Option<NaiveDate> {
        let digits: String = value.chars().take_while(|c| c.is_ascii_digit()).collect();
        if digits.len() < 8 {
            return None;
        }
        NaiveDate::parse_from_str(&digits[..8], "%Y%m%d").ok()
    }

    /// Split the document into `<STMTTRN>` blocks. A missing close tag ends
    /// the block at the next open tag or end of input.
    fn transaction_blocks(text: &str) -> Vec<&str> {
        let upper = text.to_ascii_uppercase();
        let mut blocks = Vec::new();
        let mut at = 0;
        while let Some(rel) = upper[at..].find("<STMTTRN>") {
            let start = at + rel + "<STMTTRN>".len();
            let close = upper[start..].find("</STMTTRN>");
            let next_open = upper[start..].find("<STMTTRN>");
            let end = match (close, next_open) {
                (Some(c), Some(n)) => c.min(n),
                (Some(c), None) => c,
                (None, Some(n)) => n,
                (None, None) => upper.len() - start,
            };
            blocks.push(&text[start..start + end]);
            at = start + end;
        }
        blocks
    }

    fn parse_block(block: &str) -> std::result::Result<ParsedTransaction, String> {
        let date = Self::tag_value(block, "DTPOSTED")
            .and_then(Self::parse_ofx_date)
            .ok_or("missing or invalid DTPOSTED")?;

        let raw_amount = Self::tag_value(block, "TRNAMT").ok_or("missing TRNAMT")?;
        let mut signed = parse_amount(raw_amount)
            .ok_or_else(|| format!("unreadable TRNAMT '{}'", raw_amount))?;
        if signed.is_zero() {
            return Err("zero TRNAMT".to_string());
        }

        // Some issuers leave TRNAMT unsigned and put the direction in TRNTYPE
        if let Some(trntype) = Self::tag_value(block, "TRNTYPE") {
            let trntype = trntype.to_uppercase();
            if DEBIT_TYPES.iter().any(|t| *t == trntype) && signed > rust_decimal::Decimal::ZERO {
                signed = -signed;
            }
        }

        let name = Self::tag_value(block, "NAME");
        let memo = Self::tag_value(block, "MEMO");
        let description = match (name, memo) {
            (Some(n), Some(m)) if n != m => Some(format!("{} {}", n, m)),
            (Some(n), _) => Some(n.to_string()),
            (None, Some(m)) => Some(m.to_string()),
            (None, None) => None,
        };

        let (amount, kind) = TransactionKind::from_signed(signed);
        Ok(ParsedTransaction::new(date, description, amount, kind))
    }
}

#[async_trait]
impl StatementParser for OfxParser {
    fn format(&self) -> StatementFormat {
        StatementFormat::Ofx
    }

    fn detect(&self, input: &ParserInput) -> bool {
        let head: String = input.text_lossy().chars().take(2048).collect();
        let upper = head.to_uppercase();
        upper.contains("OFXHEADER") || upper.contains("<OFX")
    }

    async fn parse(&self, input: &ParserInput) -> ParseResult {
        let mut result = ParseResult::new();
        let text = input.text_lossy();
        let upper = text.to_ascii_uppercase();

        if !upper.contains("<OFX") && !upper.contains("OFXHEADER") {
            result
                .errors
                .push("Not an OFX document (no OFX header or <OFX> tag)".to_string());
            return result;
        }

        if let Some(code) = Self::tag_value(&text, "CURDEF") {
            result.currency = code.to_uppercase();
        }
        if let Some(org) = Self::tag_value(&text, "ORG") {
            result.bank_name = Some(org.to_string());
        }

        for (i, block) in Self::transaction_blocks(&text).iter().enumerate() {
            match Self::parse_block(block) {
                Ok(candidate) => result.transactions.push(candidate),
                Err(reason) => result
                    .warnings
                    .push(format!("Transaction {} skipped: {}", i + 1, reason)),
            }
        }

        // Statement range tags take precedence over computed bounds
        let start = Self::tag_value(&text, "DTSTART").and_then(Self::parse_ofx_date);
        let end = Self::tag_value(&text, "DTEND").and_then(Self::parse_ofx_date);
        match (start, end) {
            (Some(start), Some(end)) => result.period = Some(StatementPeriod { start, end }),
            _ => result.compute_period(),
        }

        if result.transactions.is_empty() && result.errors.is_empty() && result.warnings.is_empty()
        {
            result
                .warnings
                .push("OFX document contains no transactions".to_string());
        }
        result.ensure_explained();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    const SAMPLE: &str = "OFXHEADER:100\n\
        DATA:OFXSGML\n\
        <OFX>\n\
        <SIGNONMSGSRSV1><SONRS><FI><ORG>Banco Exemplo</ORG></FI></SONRS></SIGNONMSGSRSV1>\n\
        <BANKMSGSRSV1><STMTTRNRS><STMTRS>\n\
        <CURDEF>BRL\n\
        <BANKTRANLIST>\n\
        <DTSTART>20240101\n\
        <DTEND>20240131\n\
        <STMTTRN>\n\
        <TRNTYPE>CREDIT\n\
        <DTPOSTED>20240105120000[-3:BRT]\n\
        <TRNAMT>5000.00\n\
        <NAME>Salary\n\
        </STMTTRN>\n\
        <STMTTRN>\n\
        <TRNTYPE>DEBIT\n\
        <DTPOSTED>20240106\n\
        <TRNAMT>-120.50\n\
        <NAME>Market\n\
        <MEMO>Weekly groceries\n\
        </STMTTRN>\n\
        </BANKTRANLIST>\n\
        </STMTRS></STMTTRNRS></BANKMSGSRSV1>\n\
        </OFX>\n";

    async fn parse_ofx(content: &str) -> ParseResult {
        OfxParser::new()
            .parse(&ParserInput::new("extrato.ofx", content.as_bytes().to_vec()))
            .await
    }

    #[tokio::test]
    async fn test_parse_sample_statement() {
        let result = parse_ofx(SAMPLE).await;

        assert!(result.errors.is_empty(), "errors: {:?}", result.errors);
        assert_eq!(result.currency, "BRL");
        assert_eq!(result.bank_name.as_deref(), Some("Banco Exemplo"));
        assert_eq!(result.transactions.len(), 2);

        let salary = &result.transactions[0];
        assert_eq!(salary.kind, TransactionKind::Income);
        assert_eq!(salary.amount, Decimal::new(500000, 2));
        assert_eq!(salary.date, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());

        let market = &result.transactions[1];
        assert_eq!(market.kind, TransactionKind::Expense);
        assert_eq!(market.description, "Market Weekly groceries");

        let period = result.period.unwrap();
        assert_eq!(period.start, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(period.end, NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
    }

    #[tokio::test]
    async fn test_unsigned_debit_flipped_by_trntype() {
        let doc = "<OFX><CURDEF>USD\n\
            <STMTTRN><TRNTYPE>DEBIT\n<DTPOSTED>20240110\n<TRNAMT>42.00\n<NAME>Fee\n</STMTTRN>\
            </OFX>";
        let result = parse_ofx(doc).await;
        assert_eq!(result.transactions.len(), 1);
        assert_eq!(result.transactions[0].kind, TransactionKind::Expense);
        assert_eq!(result.transactions[0].amount, Decimal::new(4200, 2));
    }

    #[tokio::test]
    async fn test_block_missing_date_becomes_warning() {
        let doc = "<OFX>\
            <STMTTRN><TRNAMT>-10.00\n<NAME>NoDate\n</STMTTRN>\
            <STMTTRN><DTPOSTED>20240110\n<TRNAMT>-10.00\n<NAME>Good\n</STMTTRN>\
            </OFX>";
        let result = parse_ofx(doc).await;
        assert_eq!(result.transactions.len(), 1);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("DTPOSTED"));
    }

    #[tokio::test]
    async fn test_non_ofx_input_is_fatal() {
        let result = parse_ofx("date,amount\n2024-01-01,5.00\n").await;
        assert!(result.is_fatal());
    }

    #[tokio::test]
    async fn test_empty_ofx_document_explains_itself() {
        let result = parse_ofx("OFXHEADER:100\n<OFX></OFX>").await;
        assert!(result.transactions.is_empty());
        assert!(result.errors.is_empty());
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_detect_accepts_qfx_headers() {
        let parser = OfxParser::new();
        assert!(parser.detect(&ParserInput::new("a.qfx", b"OFXHEADER:100".to_vec())));
        assert!(!parser.detect(&ParserInput::new("a.csv", b"date,amount".to_vec())));
    }
}
