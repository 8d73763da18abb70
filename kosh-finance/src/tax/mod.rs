pub mod calculator;
pub mod config;
pub mod optimizer;

pub use calculator::{
    DeductionSet, DeductionUtilization, IncomeSummary, Regime, RegimeComparison, RegimeTax,
    ScenarioOutcome, SlabLine, TaxBreakdown, TaxCalculator, TaxResult, TaxScenario, slab_breakdown,
    slab_tax,
};
pub use config::{Rebate, RegimeConfig, Slab, TaxTables, TaxYearConfig};
pub use optimizer::{OptimizationSuggestions, suggest};
