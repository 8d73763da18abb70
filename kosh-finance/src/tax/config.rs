//! Versioned per-year tax tables
//!
//! Every financial year gets its own `TaxYearConfig` record. FY2023-24 ships
//! built in; later years are injected from TOML:
//!
//! ```toml
//! [[year]]
//! financial_year = "2024-25"
//! standard_deduction = 75000
//! cess_rate = 0.04
//!
//! [year.old_regime]
//! slabs = [
//!   { lower = 0, upper = 250000, rate = 0.0 },
//!   { lower = 250000, upper = 500000, rate = 0.05 },
//!   { lower = 500000, upper = 1000000, rate = 0.20 },
//!   { lower = 1000000, rate = 0.30 },
//! ]
//! rebate = { income_limit = 500000, amount = 12500 }
//! ```

use kosh_core::{TaxSection, deduction_limit};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{FinanceError, Result};
use crate::fiscal_year::FinancialYear;

/// One progressive bracket. `upper = None` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Slab {
    pub lower: f64,
    #[serde(default)]
    pub upper: Option<f64>,
    pub rate: f64,
}

impl Slab {
    pub fn width(&self) -> f64 {
        self.upper.map_or(f64::INFINITY, |u| u - self.lower)
    }
}

/// Section 87A style rebate: `amount` off the slab tax when taxable income is
/// at most `income_limit`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rebate {
    pub income_limit: f64,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeConfig {
    pub slabs: Vec<Slab>,
    #[serde(default)]
    pub rebate: Option<Rebate>,
}

/// Tax tables for one financial year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxYearConfig {
    pub financial_year: FinancialYear,
    pub standard_deduction: f64,
    pub cess_rate: f64,
    pub old_regime: RegimeConfig,
    pub new_regime: RegimeConfig,
    /// Caps for the old-regime deduction sections. Missing sections are uncapped.
    #[serde(default = "default_deduction_limits")]
    pub deduction_limits: BTreeMap<TaxSection, f64>,
}

fn default_deduction_limits() -> BTreeMap<TaxSection, f64> {
    TaxSection::DEDUCTIBLE
        .iter()
        .filter_map(|s| deduction_limit(*s).map(|l| (*s, l)))
        .collect()
}

fn slab(lower: f64, upper: Option<f64>, rate: f64) -> Slab {
    Slab { lower, upper, rate }
}

impl TaxYearConfig {
    /// FY2023-24 slabs, rebates and limits
    pub fn fy_2023_24() -> Self {
        Self {
            financial_year: FinancialYear(2023),
            standard_deduction: 50_000.0,
            cess_rate: 0.04,
            old_regime: RegimeConfig {
                slabs: vec![
                    slab(0.0, Some(250_000.0), 0.0),
                    slab(250_000.0, Some(500_000.0), 0.05),
                    slab(500_000.0, Some(1_000_000.0), 0.20),
                    slab(1_000_000.0, None, 0.30),
                ],
                rebate: Some(Rebate { income_limit: 500_000.0, amount: 12_500.0 }),
            },
            new_regime: RegimeConfig {
                slabs: vec![
                    slab(0.0, Some(300_000.0), 0.0),
                    slab(300_000.0, Some(600_000.0), 0.05),
                    slab(600_000.0, Some(900_000.0), 0.10),
                    slab(900_000.0, Some(1_200_000.0), 0.15),
                    slab(1_200_000.0, Some(1_500_000.0), 0.20),
                    slab(1_500_000.0, None, 0.30),
                ],
                rebate: Some(Rebate { income_limit: 700_000.0, amount: 25_000.0 }),
            },
            deduction_limits: default_deduction_limits(),
        }
    }

    pub fn deduction_limit(&self, section: TaxSection) -> Option<f64> {
        self.deduction_limits.get(&section).copied()
    }

    /// Slabs must start at 0, be contiguous and ascending, end unbounded, and
    /// carry rates in [0, 1].
    pub fn validate(&self) -> Result<()> {
        self.check_regime("old", &self.old_regime)?;
        self.check_regime("new", &self.new_regime)?;
        if !(0.0..=1.0).contains(&self.cess_rate) || self.standard_deduction < 0.0 {
            return Err(FinanceError::InvalidSlabs {
                year: self.financial_year.label(),
                regime: "both",
                reason: "cess rate or standard deduction out of range".to_string(),
            });
        }
        Ok(())
    }

    fn check_regime(&self, regime: &'static str, cfg: &RegimeConfig) -> Result<()> {
        let fail = |reason: String| FinanceError::InvalidSlabs {
            year: self.financial_year.label(),
            regime,
            reason,
        };

        let Some(first) = cfg.slabs.first() else {
            return Err(fail("no slabs".to_string()));
        };
        if first.lower != 0.0 {
            return Err(fail(format!("first slab starts at {}", first.lower)));
        }

        let last = cfg.slabs.len() - 1;
        for (i, s) in cfg.slabs.iter().enumerate() {
            if !(0.0..=1.0).contains(&s.rate) {
                return Err(fail(format!("slab {} has rate {}", i, s.rate)));
            }
            match s.upper {
                None if i != last => return Err(fail(format!("slab {} is unbounded but not last", i))),
                Some(_) if i == last => return Err(fail("last slab must be unbounded".to_string())),
                Some(u) if u <= s.lower => {
                    return Err(fail(format!("slab {} has upper {} <= lower {}", i, u, s.lower)));
                }
                _ => {}
            }
            if i > 0 && cfg.slabs[i - 1].upper != Some(s.lower) {
                return Err(fail(format!("gap before slab {}", i)));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct TablesFile {
    #[serde(default)]
    year: Vec<TaxYearConfig>,
}

/// Registry of per-year tables, keyed by financial year
#[derive(Debug, Clone, PartialEq)]
pub struct TaxTables {
    years: BTreeMap<FinancialYear, TaxYearConfig>,
}

impl Default for TaxTables {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TaxTables {
    /// Tables compiled into the crate
    pub fn builtin() -> Self {
        let fy = TaxYearConfig::fy_2023_24();
        Self {
            years: BTreeMap::from([(fy.financial_year, fy)]),
        }
    }

    /// Add or replace one year's tables after validating them
    pub fn insert(&mut self, config: TaxYearConfig) -> Result<()> {
        config.validate()?;
        tracing::debug!(year = %config.financial_year, "registered tax tables");
        self.years.insert(config.financial_year, config);
        Ok(())
    }

    /// Merge `[[year]]` records from a TOML document. Returns how many were added.
    pub fn extend_from_toml(&mut self, text: &str) -> Result<usize> {
        let file: TablesFile = toml::from_str(text)?;
        let n = file.year.len();
        for cfg in file.year {
            self.insert(cfg)?;
        }
        Ok(n)
    }

    pub fn get(&self, fy: FinancialYear) -> Result<&TaxYearConfig> {
        self.years
            .get(&fy)
            .ok_or_else(|| FinanceError::UnknownFinancialYear(fy.label()))
    }

    pub fn years(&self) -> impl Iterator<Item = FinancialYear> + '_ {
        self.years.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_tables_are_valid() {
        let tables = TaxTables::builtin();
        let cfg = tables.get(FinancialYear(2023)).unwrap();
        cfg.validate().unwrap();
        assert_eq!(cfg.standard_deduction, 50_000.0);
        assert_eq!(cfg.deduction_limit(TaxSection::Sec80C), Some(150_000.0));
        assert_eq!(cfg.deduction_limit(TaxSection::Hra), None);
        assert!(matches!(
            tables.get(FinancialYear(2030)),
            Err(FinanceError::UnknownFinancialYear(_))
        ));
    }

    #[test]
    fn test_extend_from_toml() {
        let text = r#"
[[year]]
financial_year = "2024-25"
standard_deduction = 75000
cess_rate = 0.04

[year.old_regime]
slabs = [
  { lower = 0, upper = 250000, rate = 0.0 },
  { lower = 250000, upper = 500000, rate = 0.05 },
  { lower = 500000, upper = 1000000, rate = 0.20 },
  { lower = 1000000, rate = 0.30 },
]
rebate = { income_limit = 500000, amount = 12500 }

[year.new_regime]
slabs = [
  { lower = 0, upper = 300000, rate = 0.0 },
  { lower = 300000, upper = 700000, rate = 0.05 },
  { lower = 700000, rate = 0.10 },
]
"#;
        let mut tables = TaxTables::builtin();
        assert_eq!(tables.extend_from_toml(text).unwrap(), 1);
        let cfg = tables.get(FinancialYear(2024)).unwrap();
        assert_eq!(cfg.standard_deduction, 75_000.0);
        assert_eq!(cfg.new_regime.rebate, None);
        // Limits default to the statutory caps
        assert_eq!(cfg.deduction_limit(TaxSection::Sec80D), Some(25_000.0));
        assert_eq!(tables.years().count(), 2);
    }

    #[test]
    fn test_rejects_gapped_slabs() {
        let mut cfg = TaxYearConfig::fy_2023_24();
        cfg.old_regime.slabs[2].lower = 600_000.0;
        assert!(matches!(cfg.validate(), Err(FinanceError::InvalidSlabs { regime: "old", .. })));

        let mut cfg = TaxYearConfig::fy_2023_24();
        cfg.new_regime.slabs.last_mut().unwrap().upper = Some(5_000_000.0);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_bad_toml_is_an_error() {
        let mut tables = TaxTables::builtin();
        assert!(matches!(
            tables.extend_from_toml("[[year]]\nfinancial_year = 12"),
            Err(FinanceError::Toml(_))
        ));
    }
}
