//! Income-tax computation under the old and new regimes
//!
//! All amounts are rupees. Inputs that are negative, NaN or infinite are
//! clamped to zero with a warning, so no result ever carries a negative tax
//! or taxable income.

use kosh_core::{Category, TaxSection, Transaction};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::Result;
use crate::fiscal_year::FinancialYear;
use crate::money::{format_inr, format_rate};
use crate::tax::config::{RegimeConfig, Slab, TaxTables, TaxYearConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Regime {
    Old,
    New,
}

impl Regime {
    pub fn as_str(&self) -> &'static str {
        match self {
            Regime::Old => "old",
            Regime::New => "new",
        }
    }
}

/// Income derived from credit transactions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeSummary {
    pub salary_income: f64,
    pub other_income: f64,
    pub gross_income: f64,
    pub standard_deduction: f64,
    /// May be negative for tiny incomes; taxable income never is
    pub net_income: f64,
}

/// Claimed amounts per deductible section, already capped at the year's limits.
/// Only built through `TaxCalculator::cap_deductions`/`calculate_deductions`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DeductionSet(BTreeMap<TaxSection, f64>);

impl DeductionSet {
    pub fn get(&self, section: TaxSection) -> f64 {
        self.0.get(&section).copied().unwrap_or(0.0)
    }

    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TaxSection, f64)> + '_ {
        self.0.iter().map(|(s, a)| (*s, *a))
    }
}

/// One line of the per-slab breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlabLine {
    /// "₹2,50,000 - ₹5,00,000" or "Above ₹10,00,000"
    pub slab: String,
    pub rate: String,
    pub income_in_slab: f64,
    pub tax: f64,
}

/// Tax under one regime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeTax {
    pub regime: Regime,
    pub gross_income: f64,
    /// Deductions plus the standard deduction
    pub total_deductions: f64,
    pub taxable_income: f64,
    /// Slab tax after rebate
    pub income_tax: f64,
    pub rebate: f64,
    pub cess: f64,
    pub total_tax: f64,
    pub effective_rate: f64,
    pub slabs: Vec<SlabLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeComparison {
    pub old_regime: RegimeTax,
    pub new_regime: RegimeTax,
    pub recommended_regime: Regime,
    pub potential_savings: f64,
    pub savings_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaxBreakdown {
    pub income: IncomeSummary,
    pub expenses: BTreeMap<Category, f64>,
    pub deductions: DeductionSet,
    pub old_regime: RegimeTax,
    pub new_regime: RegimeTax,
    pub savings_percentage: f64,
}

/// Full result of a year's computation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaxResult {
    pub financial_year: FinancialYear,
    pub gross_income: f64,
    /// Capped deductions, excluding the standard deduction
    pub total_deductions: f64,
    /// Old-regime taxable income
    pub taxable_income: f64,
    pub old_regime_tax: f64,
    pub new_regime_tax: f64,
    pub recommended_regime: Regime,
    pub potential_savings: f64,
    pub breakdown: TaxBreakdown,
}

/// A named what-if set of deduction claims
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxScenario {
    pub name: String,
    #[serde(default)]
    pub deductions: BTreeMap<TaxSection, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioOutcome {
    pub scenario: String,
    pub deductions: DeductionSet,
    pub old_regime_tax: f64,
    pub new_regime_tax: f64,
    pub recommended: Regime,
    /// Old-regime tax saved compared with claiming nothing
    pub savings_vs_base: f64,
}

/// Usage of one capped section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeductionUtilization {
    pub section: TaxSection,
    pub used: f64,
    pub limit: f64,
    pub utilization_percentage: f64,
    pub remaining: f64,
}

/// Clamp negative and non-finite amounts to zero
pub(crate) fn non_negative(value: f64, what: &str) -> f64 {
    if value.is_finite() && value >= 0.0 {
        value
    } else {
        tracing::warn!(value, what, "clamping invalid amount to 0");
        0.0
    }
}

/// Marginal tax over ascending slabs. Each slab taxes only the part of the
/// income that falls inside it.
pub fn slab_tax(taxable_income: f64, slabs: &[Slab]) -> f64 {
    slab_breakdown(taxable_income, slabs).iter().map(|l| l.tax).sum()
}

/// Per-slab breakdown of `slab_tax`. Slabs the income never reaches are omitted.
pub fn slab_breakdown(taxable_income: f64, slabs: &[Slab]) -> Vec<SlabLine> {
    let mut remaining = non_negative(taxable_income, "taxable income");
    let mut lines = Vec::new();

    for s in slabs {
        if remaining <= 0.0 {
            break;
        }
        let in_slab = remaining.min(s.width());
        if in_slab > 0.0 {
            let label = match s.upper {
                Some(u) => format!("{} - {}", format_inr(s.lower), format_inr(u)),
                None => format!("Above {}", format_inr(s.lower)),
            };
            lines.push(SlabLine {
                slab: label,
                rate: format_rate(s.rate),
                income_in_slab: in_slab,
                tax: in_slab * s.rate,
            });
            remaining -= in_slab;
        }
    }
    lines
}

/// Tax calculator bound to one year's tables
#[derive(Debug, Clone)]
pub struct TaxCalculator {
    config: TaxYearConfig,
}

impl TaxCalculator {
    pub fn new(config: TaxYearConfig) -> Self {
        Self { config }
    }

    /// Look up a year in a table registry
    pub fn for_year(tables: &TaxTables, fy: FinancialYear) -> Result<Self> {
        Ok(Self::new(tables.get(fy)?.clone()))
    }

    pub fn config(&self) -> &TaxYearConfig {
        &self.config
    }

    pub fn financial_year(&self) -> FinancialYear {
        self.config.financial_year
    }

    pub fn calculate_income(&self, txns: &[Transaction]) -> IncomeSummary {
        let mut salary_income = 0.0;
        let mut other_income = 0.0;
        for t in txns.iter().filter(|t| t.is_credit()) {
            if t.category == Category::Salary {
                salary_income += t.amount;
            } else if t.category.is_other_income() {
                other_income += t.amount;
            }
        }
        let gross_income = salary_income + other_income;
        IncomeSummary {
            salary_income,
            other_income,
            gross_income,
            standard_deduction: self.config.standard_deduction,
            net_income: gross_income - self.config.standard_deduction,
        }
    }

    /// Debit totals per category
    pub fn categorize_expenses(&self, txns: &[Transaction]) -> BTreeMap<Category, f64> {
        let mut out = BTreeMap::new();
        for t in txns.iter().filter(|t| t.is_debit()) {
            *out.entry(t.category).or_insert(0.0) += t.amount;
        }
        out
    }

    /// Cap raw claims at the section limits. Claims are accumulated first and
    /// clamped once; excess is discarded. `income` claims are ignored.
    pub fn cap_deductions(&self, claims: impl IntoIterator<Item = (TaxSection, f64)>) -> DeductionSet {
        let mut sums: BTreeMap<TaxSection, f64> =
            TaxSection::DEDUCTIBLE.iter().map(|s| (*s, 0.0)).collect();
        for (section, amount) in claims {
            if !section.is_deductible() {
                continue;
            }
            *sums.entry(section).or_insert(0.0) += non_negative(amount, "deduction claim");
        }
        for (section, amount) in sums.iter_mut() {
            if let Some(limit) = self.config.deduction_limit(*section) {
                *amount = amount.min(limit);
            }
        }
        DeductionSet(sums)
    }

    /// Declared deductions plus tax-relevant debits, capped per section
    pub fn calculate_deductions(
        &self,
        txns: &[Transaction],
        additional: &BTreeMap<TaxSection, f64>,
    ) -> DeductionSet {
        let from_txns = txns
            .iter()
            .filter(|t| t.is_debit() && t.tax_relevant)
            .filter_map(|t| t.tax_section.map(|s| (s, t.amount)));
        let declared = additional.iter().map(|(s, a)| (*s, *a));
        self.cap_deductions(declared.chain(from_txns))
    }

    fn regime_tax(
        &self,
        regime: Regime,
        cfg: &RegimeConfig,
        gross_income: f64,
        deductions: f64,
    ) -> RegimeTax {
        let gross_income = non_negative(gross_income, "gross income");
        let total_deductions = deductions + self.config.standard_deduction;
        let taxable_income = (gross_income - total_deductions).max(0.0);

        let slabs = slab_breakdown(taxable_income, &cfg.slabs);
        let slab_total: f64 = slabs.iter().map(|l| l.tax).sum();
        let income_tax = match cfg.rebate {
            Some(r) if taxable_income <= r.income_limit => (slab_total - r.amount).max(0.0),
            _ => slab_total,
        };
        let cess = income_tax * self.config.cess_rate;
        let total_tax = income_tax + cess;

        RegimeTax {
            regime,
            gross_income,
            total_deductions,
            taxable_income,
            income_tax,
            rebate: slab_total - income_tax,
            cess,
            total_tax,
            effective_rate: if gross_income > 0.0 { total_tax / gross_income * 100.0 } else { 0.0 },
            slabs,
        }
    }

    pub fn calculate_old_regime_tax(&self, gross_income: f64, deductions: &DeductionSet) -> RegimeTax {
        self.regime_tax(Regime::Old, &self.config.old_regime, gross_income, deductions.total())
    }

    /// Only the standard deduction applies under the new regime
    pub fn calculate_new_regime_tax(&self, gross_income: f64) -> RegimeTax {
        self.regime_tax(Regime::New, &self.config.new_regime, gross_income, 0.0)
    }

    /// Old wins an exact tie
    pub fn compare_regimes(&self, gross_income: f64, deductions: &DeductionSet) -> RegimeComparison {
        let old_regime = self.calculate_old_regime_tax(gross_income, deductions);
        let new_regime = self.calculate_new_regime_tax(gross_income);

        let recommended_regime = if old_regime.total_tax <= new_regime.total_tax {
            Regime::Old
        } else {
            Regime::New
        };
        let potential_savings = (old_regime.total_tax - new_regime.total_tax).abs();
        let max = old_regime.total_tax.max(new_regime.total_tax);
        let savings_percentage = if max > 0.0 { potential_savings / max * 100.0 } else { 0.0 };

        RegimeComparison {
            old_regime,
            new_regime,
            recommended_regime,
            potential_savings,
            savings_percentage,
        }
    }

    /// Full computation over the transactions that fall in this calculator's
    /// financial year
    pub fn compute(&self, txns: &[Transaction], additional: &BTreeMap<TaxSection, f64>) -> TaxResult {
        let fy = self.config.financial_year;
        let in_year: Vec<Transaction> = txns.iter().filter(|t| fy.contains(t.date)).cloned().collect();
        if in_year.len() != txns.len() {
            tracing::debug!(
                year = %fy,
                kept = in_year.len(),
                dropped = txns.len() - in_year.len(),
                "filtered transactions to financial year"
            );
        }

        let income = self.calculate_income(&in_year);
        let expenses = self.categorize_expenses(&in_year);
        let deductions = self.calculate_deductions(&in_year, additional);
        let cmp = self.compare_regimes(income.gross_income, &deductions);

        TaxResult {
            financial_year: fy,
            gross_income: income.gross_income,
            total_deductions: deductions.total(),
            taxable_income: cmp.old_regime.taxable_income,
            old_regime_tax: cmp.old_regime.total_tax,
            new_regime_tax: cmp.new_regime.total_tax,
            recommended_regime: cmp.recommended_regime,
            potential_savings: cmp.potential_savings,
            breakdown: TaxBreakdown {
                income,
                expenses,
                deductions,
                old_regime: cmp.old_regime,
                new_regime: cmp.new_regime,
                savings_percentage: cmp.savings_percentage,
            },
        }
    }

    /// Base case (no deductions) followed by each named scenario
    pub fn simulate_scenarios(&self, gross_income: f64, scenarios: &[TaxScenario]) -> Vec<ScenarioOutcome> {
        let new_tax = self.calculate_new_regime_tax(gross_income).total_tax;
        let outcome = |name: &str, deductions: DeductionSet, base_old: f64| {
            let old_tax = self.calculate_old_regime_tax(gross_income, &deductions).total_tax;
            ScenarioOutcome {
                scenario: name.to_string(),
                deductions,
                old_regime_tax: old_tax,
                new_regime_tax: new_tax,
                recommended: if old_tax <= new_tax { Regime::Old } else { Regime::New },
                savings_vs_base: base_old - old_tax,
            }
        };

        let base_old = self.calculate_old_regime_tax(gross_income, &DeductionSet::default()).total_tax;
        let mut out = vec![outcome("Base (No additional deductions)", DeductionSet::default(), base_old)];
        for s in scenarios {
            let capped = self.cap_deductions(s.deductions.iter().map(|(k, v)| (*k, *v)));
            out.push(outcome(&s.name, capped, base_old));
        }
        out
    }

    /// Used vs limit for every capped section
    pub fn deduction_utilization(&self, deductions: &DeductionSet) -> Vec<DeductionUtilization> {
        self.config
            .deduction_limits
            .iter()
            .map(|(section, limit)| {
                let used = deductions.get(*section);
                DeductionUtilization {
                    section: *section,
                    used,
                    limit: *limit,
                    utilization_percentage: if *limit > 0.0 { used / limit * 100.0 } else { 0.0 },
                    remaining: (limit - used).max(0.0),
                }
            })
            .collect()
    }
}

impl Default for TaxCalculator {
    fn default() -> Self {
        Self::new(TaxYearConfig::fy_2023_24())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use kosh_core::{Direction, categorize_all};

    fn calc() -> TaxCalculator {
        TaxCalculator::default()
    }

    fn claims(pairs: &[(TaxSection, f64)]) -> BTreeMap<TaxSection, f64> {
        pairs.iter().copied().collect()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    fn txn(y: i32, m: u32, d: u32, desc: &str, amount: f64, dir: Direction) -> Transaction {
        Transaction::new(NaiveDate::from_ymd_opt(y, m, d).unwrap(), desc, amount, dir)
    }

    #[test]
    fn test_twelve_lakh_with_full_80c_80d() {
        let c = calc();
        let ded = c.cap_deductions([(TaxSection::Sec80C, 150_000.0), (TaxSection::Sec80D, 25_000.0)]);
        let cmp = c.compare_regimes(1_200_000.0, &ded);

        // 250k@0 + 250k@5% + 475k@20%
        assert!(close(cmp.old_regime.taxable_income, 975_000.0));
        assert!(close(cmp.old_regime.income_tax, 107_500.0));
        assert!(close(cmp.old_regime.cess, 4_300.0));
        assert!(close(cmp.old_regime.total_tax, 111_800.0));

        // 300k@0 + 300k@5% + 300k@10% + 250k@15%
        assert!(close(cmp.new_regime.taxable_income, 1_150_000.0));
        assert!(close(cmp.new_regime.income_tax, 82_500.0));
        assert!(close(cmp.new_regime.total_tax, 85_800.0));

        assert_eq!(cmp.recommended_regime, Regime::New);
        assert!(close(cmp.potential_savings, 26_000.0));
        assert!(close(cmp.savings_percentage, 26_000.0 / 111_800.0 * 100.0));
    }

    #[test]
    fn test_old_regime_wins_with_heavy_deductions() {
        let c = calc();
        let ded = c.cap_deductions([
            (TaxSection::Sec80C, 150_000.0),
            (TaxSection::Sec80D, 25_000.0),
            (TaxSection::Sec24b, 200_000.0),
            (TaxSection::Hra, 180_000.0),
        ]);
        let cmp = c.compare_regimes(1_200_000.0, &ded);
        // taxable 595k: 12,500 + 95k@20% = 31,500 -> 32,760 with cess
        assert!(close(cmp.old_regime.total_tax, 32_760.0));
        assert_eq!(cmp.recommended_regime, Regime::Old);
        assert!(close(cmp.potential_savings, 85_800.0 - 32_760.0));
    }

    #[test]
    fn test_slab_tax_is_continuous() {
        let binding = calc();
        let slabs = &binding.config().old_regime.slabs;
        assert_eq!(slab_tax(250_000.0, slabs), 0.0);
        assert!(close(slab_tax(250_001.0, slabs), 0.05));
        assert!(close(slab_tax(500_000.0, slabs), 12_500.0));
        assert!(close(slab_tax(500_001.0, slabs), 12_500.2));
    }

    #[test]
    fn test_slab_breakdown_labels() {
        let lines = slab_breakdown(1_100_000.0, &calc().config().old_regime.slabs);
        let labels: Vec<&str> = lines.iter().map(|l| l.slab.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "₹0 - ₹2,50,000",
                "₹2,50,000 - ₹5,00,000",
                "₹5,00,000 - ₹10,00,000",
                "Above ₹10,00,000",
            ]
        );
        assert_eq!(lines[3].rate, "30%");
        assert!(close(lines[3].income_in_slab, 100_000.0));
    }

    #[test]
    fn test_rebates() {
        let c = calc();
        // Old: taxable exactly 5L gets the full 12,500 rebate
        let old = c.calculate_old_regime_tax(550_000.0, &DeductionSet::default());
        assert!(close(old.taxable_income, 500_000.0));
        assert_eq!(old.total_tax, 0.0);
        assert!(close(old.rebate, 12_500.0));

        // New: taxable 7L -> slab tax 25,000, rebated to 0
        let new = c.calculate_new_regime_tax(750_000.0);
        assert!(close(new.taxable_income, 700_000.0));
        assert_eq!(new.total_tax, 0.0);

        // One rupee over the limit loses the rebate
        let new = c.calculate_new_regime_tax(750_001.0);
        assert!(new.total_tax > 25_000.0);
    }

    #[test]
    fn test_invalid_income_clamps_to_zero() {
        let c = calc();
        for bad in [-10_000.0, f64::NAN, f64::NEG_INFINITY] {
            let cmp = c.compare_regimes(bad, &DeductionSet::default());
            assert_eq!(cmp.old_regime.gross_income, 0.0);
            assert_eq!(cmp.old_regime.taxable_income, 0.0);
            assert_eq!(cmp.new_regime.total_tax, 0.0);
            assert_eq!(cmp.savings_percentage, 0.0);
            // Exact tie goes to old
            assert_eq!(cmp.recommended_regime, Regime::Old);
        }
    }

    #[test]
    fn test_taxable_income_monotonic() {
        let c = calc();
        let ded = c.cap_deductions([(TaxSection::Sec80C, 100_000.0)]);
        let mut prev_taxable = 0.0;
        for step in 0..60 {
            let gross = step as f64 * 50_000.0;
            let old = c.calculate_old_regime_tax(gross, &ded);
            let new = c.calculate_new_regime_tax(gross);
            assert!(old.taxable_income >= prev_taxable);
            assert!(old.total_tax >= 0.0 && new.total_tax >= 0.0);
            prev_taxable = old.taxable_income;
        }
    }

    #[test]
    fn test_deductions_accumulate_then_clamp() {
        let c = calc();
        let mut txns = vec![
            txn(2023, 6, 1, "SIP 001 axis bluechip", 120_000.0, Direction::Debit),
            txn(2023, 7, 1, "SIP 002 axis bluechip", 60_000.0, Direction::Debit),
            txn(2023, 7, 9, "Apollo hospital", 40_000.0, Direction::Debit),
            txn(2023, 8, 1, "House rent August", 25_000.0, Direction::Debit),
        ];
        categorize_all(&mut txns);

        let ded = c.calculate_deductions(&txns, &claims(&[(TaxSection::Sec80G, 5_000.0)]));
        assert_eq!(ded.get(TaxSection::Sec80C), 150_000.0);
        assert_eq!(ded.get(TaxSection::Sec80D), 25_000.0);
        assert_eq!(ded.get(TaxSection::Sec80G), 5_000.0);
        // HRA is uncapped
        assert_eq!(ded.get(TaxSection::Hra), 25_000.0);
        // Excess 80C is not carried to 80G
        assert_eq!(ded.total(), 205_000.0);
    }

    #[test]
    fn test_negative_claims_are_ignored() {
        let ded = calc().cap_deductions([(TaxSection::Sec80C, -5_000.0), (TaxSection::Income, 9_000.0)]);
        assert_eq!(ded.total(), 0.0);
    }

    #[test]
    fn test_compute_filters_to_financial_year() {
        let c = calc();
        let mut txns = vec![
            txn(2023, 3, 31, "Salary credit March", 100_000.0, Direction::Credit),
            txn(2023, 4, 30, "Salary credit April", 100_000.0, Direction::Credit),
            txn(2024, 3, 31, "Salary credit March", 100_000.0, Direction::Credit),
            txn(2023, 9, 1, "FD interest payout", 8_000.0, Direction::Credit),
            txn(2023, 5, 5, "Swiggy order", 900.0, Direction::Debit),
        ];
        categorize_all(&mut txns);

        let r = c.compute(&txns, &BTreeMap::new());
        assert_eq!(r.financial_year, FinancialYear(2023));
        assert!(close(r.breakdown.income.salary_income, 200_000.0));
        assert!(close(r.breakdown.income.other_income, 8_000.0));
        assert!(close(r.gross_income, 208_000.0));
        assert_eq!(r.breakdown.expenses.get(&Category::Food), Some(&900.0));
        assert_eq!(r.old_regime_tax, 0.0);
        assert_eq!(r.recommended_regime, Regime::Old);
    }

    #[test]
    fn test_simulate_scenarios() {
        let c = calc();
        let scenarios = vec![TaxScenario {
            name: "Max 80C".to_string(),
            deductions: claims(&[(TaxSection::Sec80C, 200_000.0)]),
        }];
        let out = c.simulate_scenarios(1_000_000.0, &scenarios);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].savings_vs_base, 0.0);
        assert_eq!(out[1].deductions.get(TaxSection::Sec80C), 150_000.0);
        // 1.5L moved out of the 20% band, plus cess
        assert!(close(out[1].savings_vs_base, 150_000.0 * 0.20 * 1.04));
    }

    #[test]
    fn test_deduction_utilization() {
        let c = calc();
        let ded = c.cap_deductions([(TaxSection::Sec80C, 75_000.0)]);
        let util = c.deduction_utilization(&ded);
        assert_eq!(util.len(), 4);
        let c80 = util.iter().find(|u| u.section == TaxSection::Sec80C).unwrap();
        assert_eq!(c80.utilization_percentage, 50.0);
        assert_eq!(c80.remaining, 75_000.0);
        assert!(util.iter().all(|u| u.section != TaxSection::Hra));
    }
}
