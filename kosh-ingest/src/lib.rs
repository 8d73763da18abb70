//! kosh-ingest: statement ingestion (CSV / extracted PDF text) into
//! normalized, categorized transactions.

pub mod parsers;
pub mod types;

pub use parsers::csv_statement::{CsvParse, parse_csv_reader, parse_csv_statement};
pub use parsers::statement_text::parse_statement_text;
pub use types::{StatementKind, StatementTransaction};

use anyhow::{Context, Result, bail};
use kosh_core::Transaction;
use std::path::Path;

/// Pick a parser from the file extension
pub fn statement_kind(path: &Path) -> Result<StatementKind> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "csv" => Ok(StatementKind::Csv),
        "txt" => Ok(StatementKind::Text),
        other => bail!("unsupported file format: {:?} (expected .csv or .txt)", other),
    }
}

/// Load a statement file from disk into normalized rows.
pub fn load_statement(path: impl AsRef<Path>) -> Result<Vec<StatementTransaction>> {
    let path = path.as_ref();
    match statement_kind(path)? {
        StatementKind::Csv => Ok(parse_csv_statement(path)?.rows),
        StatementKind::Text => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            parse_statement_text(&text)
        }
    }
}

/// Categorize parsed rows into core transactions, oldest first.
pub fn normalize(rows: Vec<StatementTransaction>) -> Vec<Transaction> {
    let mut txns: Vec<Transaction> = rows.into_iter().map(|r| r.into_transaction()).collect();
    txns.sort_by_key(|t| t.date);
    tracing::debug!(count = txns.len(), "normalized statement rows");
    txns
}

/// `load_statement` followed by `normalize`
pub fn load_transactions(path: impl AsRef<Path>) -> Result<Vec<Transaction>> {
    Ok(normalize(load_statement(path)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use kosh_core::{Category, Direction};

    #[test]
    fn test_statement_kind_from_extension() {
        assert_eq!(statement_kind(Path::new("hdfc.CSV")).unwrap(), StatementKind::Csv);
        assert_eq!(statement_kind(Path::new("sbi.txt")).unwrap(), StatementKind::Text);
        assert!(statement_kind(Path::new("sbi.xlsx")).is_err());
        assert!(statement_kind(Path::new("noext")).is_err());
    }

    #[test]
    fn test_normalize_sorts_and_categorizes() {
        let text = "\
10-04-2023  UBER TRIP 55  -320.00
01-04-2023  SALARY CREDIT ACME  +90000
";
        let txns = normalize(parse_statement_text(text).unwrap());
        assert_eq!(txns.len(), 2);
        assert_eq!(txns[0].category, Category::Salary);
        assert_eq!(txns[0].direction, Direction::Credit);
        assert_eq!(txns[1].category, Category::Transportation);
        assert_eq!(txns[1].direction, Direction::Debit);
        assert_eq!(txns[1].amount, 320.0);
    }

    #[test]
    fn test_load_statement_missing_file() {
        let err = load_statement("/nonexistent/kosh/statement.csv").unwrap_err();
        assert!(format!("{:#}", err).contains("opening"));
    }
}
