use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use kosh_core::{Direction, Transaction, categorize_transaction};

/// Where a batch of rows came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatementKind {
    /// Spreadsheet export with a header row
    Csv,
    /// Text extracted from a PDF statement
    Text,
}

/// Normalized output of statement parsers (bank-agnostic)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementTransaction {
    pub date: NaiveDate,
    pub description: String,
    /// Negative means debit (money out); positive means credit.
    pub amount: f64,
    /// Optional running balance
    pub balance: Option<f64>,
}

impl StatementTransaction {
    pub fn direction(&self) -> Direction {
        if self.amount < 0.0 {
            Direction::Debit
        } else {
            Direction::Credit
        }
    }

    /// Convert into a categorized core transaction
    pub fn into_transaction(self) -> Transaction {
        let direction = self.direction();
        let mut txn = Transaction::new(self.date, self.description, self.amount, direction);
        categorize_transaction(&mut txn);
        txn
    }
}
