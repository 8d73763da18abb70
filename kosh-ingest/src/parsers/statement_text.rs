//! Parser for text extracted from PDF bank statements
//!
//! Expected rows, one per line:
//!   01-04-2023   SALARY CREDIT ACME TECH            +85,000.00
//!   03/04/2023   SWIGGY ORDER 99812                     -450.00
//! An unsigned amount is a credit.

use anyhow::Result;
use regex::Regex;

use super::{parse_amount, parse_date};
use crate::types::StatementTransaction;

/// Parse extracted statement text into transactions. Lines that do not look
/// like a transaction row are ignored.
pub fn parse_statement_text(text: &str) -> Result<Vec<StatementTransaction>> {
    let txn_re = Regex::new(concat!(
        r"^\s*(?P<date>\d{2}[-/]\d{2}[-/]\d{4})\s+",
        r"(?P<desc>.+?)\s+",
        r"(?P<amount>[+-]?[\d,]+(?:\.\d+)?)\s*$"
    ))?;

    let mut out = Vec::new();
    let mut skipped = 0usize;

    for line in text.lines() {
        let Some(caps) = txn_re.captures(line) else {
            continue;
        };

        let Some(date) = parse_date(&caps["date"]) else {
            skipped += 1;
            continue;
        };

        let amount = match parse_amount(&caps["amount"]) {
            Some(a) if a != 0.0 => a,
            _ => {
                skipped += 1;
                continue;
            }
        };

        out.push(StatementTransaction {
            date,
            description: caps["desc"].trim().to_string(),
            amount,
            balance: None,
        });
    }

    if skipped > 0 {
        tracing::warn!(skipped, "skipped statement lines with a bad date or zero amount");
    }
    tracing::debug!(rows = out.len(), "parsed statement text");
    Ok(out)
}
