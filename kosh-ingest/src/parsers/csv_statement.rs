//! Header-driven CSV statement parser
//!
//! Bank exports disagree on column names, so the header row is mapped onto
//! a fixed set of roles through case-insensitive aliases:
//!   Date,Narration,Withdrawal Amt,Deposit Amt,Closing Balance
//!   Txn Date,Description,Amount,Balance

use anyhow::{Context, Result, bail};
use std::io::Read;
use std::path::Path;

use super::{parse_amount, parse_date};
use crate::types::StatementTransaction;

const DATE_ALIASES: &[&str] = &["date", "transaction_date", "txn_date", "value_date"];
const DESCRIPTION_ALIASES: &[&str] = &["description", "narration", "particulars", "details", "remarks"];
const AMOUNT_ALIASES: &[&str] = &["amount", "transaction_amount"];
const DEBIT_ALIASES: &[&str] = &["debit", "withdrawal", "withdrawal_amt", "withdrawal_amount", "dr"];
const CREDIT_ALIASES: &[&str] = &["credit", "deposit", "deposit_amt", "deposit_amount", "cr"];
const BALANCE_ALIASES: &[&str] = &["balance", "closing_balance"];

/// Column positions resolved from the header row
#[derive(Debug, Default, Clone, PartialEq)]
struct ColumnMap {
    date: Option<usize>,
    description: Option<usize>,
    amount: Option<usize>,
    debit: Option<usize>,
    credit: Option<usize>,
    balance: Option<usize>,
}

/// "Withdrawal Amt." -> "withdrawal_amt"
fn normalize_header(h: &str) -> String {
    h.trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '_')
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

impl ColumnMap {
    fn from_headers(headers: &csv::StringRecord) -> Self {
        let names: Vec<String> = headers.iter().map(normalize_header).collect();
        let find = |aliases: &[&str]| names.iter().position(|n| aliases.contains(&n.as_str()));
        Self {
            date: find(DATE_ALIASES),
            description: find(DESCRIPTION_ALIASES),
            amount: find(AMOUNT_ALIASES),
            debit: find(DEBIT_ALIASES),
            credit: find(CREDIT_ALIASES),
            balance: find(BALANCE_ALIASES),
        }
    }

    fn has_amounts(&self) -> bool {
        self.amount.is_some() || self.debit.is_some() || self.credit.is_some()
    }
}

/// Rows parsed from one CSV plus the number of rows that were dropped
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CsvParse {
    pub rows: Vec<StatementTransaction>,
    pub skipped: usize,
}

fn cell<'a>(record: &'a csv::StringRecord, idx: Option<usize>) -> &'a str {
    idx.and_then(|i| record.get(i)).unwrap_or("").trim()
}

/// Signed amount for a row: a single amount column is taken as-is, otherwise
/// a non-zero debit is negative and a non-zero credit positive.
fn row_amount(record: &csv::StringRecord, cols: &ColumnMap) -> f64 {
    if cols.amount.is_some() {
        return parse_amount(cell(record, cols.amount)).unwrap_or(0.0);
    }
    let debit = parse_amount(cell(record, cols.debit)).unwrap_or(0.0);
    if debit != 0.0 {
        return -debit.abs();
    }
    parse_amount(cell(record, cols.credit)).unwrap_or(0.0).abs()
}

/// Parse CSV statement data from any reader.
pub fn parse_csv_reader<R: Read>(reader: R) -> Result<CsvParse> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);

    let headers = rdr.headers().context("reading CSV header row")?.clone();
    let cols = ColumnMap::from_headers(&headers);
    if cols.date.is_none() || !cols.has_amounts() {
        bail!("CSV header has no recognizable date/amount columns: {:?}", headers);
    }

    let mut out = CsvParse::default();
    for (line, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("reading CSV row {}", line + 2))?;

        let Some(date) = parse_date(cell(&record, cols.date)) else {
            out.skipped += 1;
            continue;
        };

        let amount = row_amount(&record, &cols);
        if amount == 0.0 {
            out.skipped += 1;
            continue;
        }

        out.rows.push(StatementTransaction {
            date,
            description: cell(&record, cols.description).to_string(),
            amount,
            balance: parse_amount(cell(&record, cols.balance)),
        });
    }

    if out.skipped > 0 {
        tracing::warn!(skipped = out.skipped, "skipped CSV rows without a date or amount");
    }
    tracing::debug!(rows = out.rows.len(), "parsed CSV statement");
    Ok(out)
}

/// Parse a CSV statement export from disk.
pub fn parse_csv_statement(path: impl AsRef<Path>) -> Result<CsvParse> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    parse_csv_reader(file).with_context(|| format!("parsing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header(" Withdrawal Amt. "), "withdrawal_amt");
        assert_eq!(normalize_header("Txn Date"), "txn_date");
        assert_eq!(normalize_header("NARRATION"), "narration");
    }

    #[test]
    fn test_single_amount_column() {
        let data = "\
Date,Description,Amount,Balance
2023-04-01,SALARY CREDIT ACME,\"1,00,000.00\",\"1,20,000.00\"
2023-04-03,SWIGGY ORDER,-450,\"1,19,550.00\"
";
        let parsed = parse_csv_reader(data.as_bytes()).unwrap();
        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.skipped, 0);
        assert_eq!(parsed.rows[0].amount, 100_000.0);
        assert_eq!(parsed.rows[0].balance, Some(120_000.0));
        assert_eq!(parsed.rows[1].amount, -450.0);
        assert_eq!(parsed.rows[1].date, NaiveDate::from_ymd_opt(2023, 4, 3).unwrap());
    }

    #[test]
    fn test_split_debit_credit_columns() {
        let data = "\
Txn Date,Narration,Withdrawal Amt.,Deposit Amt.,Closing Balance
05/04/2023,HOME LOAN EMI,32000,,88000
06/04/2023,INTEREST CREDIT,,210.50,88210.50
07/04/2023,REVERSED,0,0,88210.50
";
        let parsed = parse_csv_reader(data.as_bytes()).unwrap();
        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.skipped, 1);
        assert_eq!(parsed.rows[0].amount, -32_000.0);
        assert_eq!(parsed.rows[0].description, "HOME LOAN EMI");
        assert_eq!(parsed.rows[1].amount, 210.5);
    }

    #[test]
    fn test_skips_undated_rows() {
        let data = "\
Date,Particulars,Amount
,Opening balance,5000
01-05-2023,UPI transfer,(1200)
";
        let parsed = parse_csv_reader(data.as_bytes()).unwrap();
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.skipped, 1);
        assert_eq!(parsed.rows[0].amount, -1_200.0);
    }

    #[test]
    fn test_rejects_unknown_layout() {
        let data = "foo,bar\n1,2\n";
        assert!(parse_csv_reader(data.as_bytes()).is_err());
    }
}
