//! kosh-core: transaction model and the rule-based categorizer

pub mod categorizer;
pub mod deductions;
pub mod transaction;

pub use categorizer::{
    CategoryResult, CategoryRule, Matcher, categorize, categorize_all, categorize_transaction,
    rules,
};
pub use deductions::{SectionSuggestion, tax_deduction_suggestions};
pub use transaction::{
    Category, CategoryCorrection, Direction, Frequency, TaxSection, Transaction, deduction_limit,
};
