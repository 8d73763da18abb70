//! Error types for kosh-finance

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FinanceError {
    #[error("Invalid financial year label: {0:?} (expected e.g. \"2023-24\")")]
    InvalidFinancialYear(String),

    #[error("No tax tables for financial year {0}")]
    UnknownFinancialYear(String),

    #[error("Invalid slab table for {year} {regime} regime: {reason}")]
    InvalidSlabs {
        year: String,
        regime: &'static str,
        reason: String,
    },

    #[error("Tax table parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, FinanceError>;
