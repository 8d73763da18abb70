//! kosh-finance: income tax under both regimes, deduction optimization,
//! credit score estimation and period summaries

pub mod cibil;
pub mod error;
pub mod fiscal_year;
pub mod money;
pub mod summary;
pub mod tax;

pub use cibil::{CibilAnalysisRecord, ScenarioFlag, SimulationOutcome, analyze_cibil, simulate};
pub use error::{FinanceError, Result};
pub use fiscal_year::FinancialYear;
pub use money::{format_inr, format_rate};
pub use summary::{FinancialSummary, Insight, insights};
pub use tax::{OptimizationSuggestions, Regime, TaxCalculator, TaxResult, TaxTables, suggest};
