//! Deduction and investment suggestions bounded by the statutory limits
//!
//! Savings estimates use a flat marginal-rate lookup on gross income, which is
//! deliberately coarser than the slab calculator.

use kosh_core::{Category, TaxSection};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::money::format_inr;
use crate::tax::calculator::DeductionSet;

const DISCRETIONARY_THRESHOLD: f64 = 100_000.0;
const REDIRECT_SHARE: f64 = 0.30;
const ASSUMED_RATE: f64 = 0.20;
const HIGH_RENT_THRESHOLD: f64 = 20_000.0 * 12.0;
/// 2L home-loan interest (24b) plus 1.5L principal (80C)
const HOME_PURCHASE_DEDUCTION: f64 = 350_000.0;
const SUGGESTED_80C_TICKET: f64 = 50_000.0;

/// Capped sections the optimizer plans for, with their limits
const PLANNED_LIMITS: [(TaxSection, f64); 4] = [
    (TaxSection::Sec80C, 150_000.0),
    (TaxSection::Sec80D, 25_000.0),
    (TaxSection::Sec80G, 100_000.0),
    (TaxSection::Sec24b, 200_000.0),
];

/// Flat marginal rate used for savings estimates
pub fn marginal_tax_rate(gross_income: f64) -> f64 {
    match gross_income {
        g if g <= 300_000.0 => 0.0,
        g if g <= 600_000.0 => 0.05,
        g if g <= 900_000.0 => 0.10,
        g if g <= 1_200_000.0 => 0.15,
        g if g <= 1_500_000.0 => 0.20,
        _ => 0.30,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncomeBand {
    Low,
    Medium,
    High,
}

impl IncomeBand {
    pub fn of(gross_income: f64) -> Self {
        if gross_income < 500_000.0 {
            IncomeBand::Low
        } else if gross_income < 1_500_000.0 {
            IncomeBand::Medium
        } else {
            IncomeBand::High
        }
    }

    pub fn strategy(&self) -> &'static str {
        match self {
            IncomeBand::Low => "Focus on low-risk, guaranteed returns",
            IncomeBand::Medium => "Balanced approach with moderate risk",
            IncomeBand::High => "Aggressive tax planning with diversification",
        }
    }

    /// Instrument short names in preference order
    pub fn primary_focus(&self) -> &'static [&'static str] {
        match self {
            IncomeBand::Low => &["PPF", "EPF", "NSC"],
            IncomeBand::Medium => &["PPF", "ELSS", "Health Insurance"],
            IncomeBand::High => &["ELSS", "PPF", "Home Loan", "Health Insurance"],
        }
    }

    pub fn secondary_focus(&self) -> &'static [&'static str] {
        match self {
            IncomeBand::Low => &["Health Insurance"],
            IncomeBand::Medium => &["Life Insurance", "Home Loan"],
            IncomeBand::High => &["Charitable Donations", "Life Insurance"],
        }
    }
}

/// A tax-saving product eligible under some section
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Instrument {
    pub short_name: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub risk: &'static str,
    pub returns: &'static str,
    pub liquidity: &'static str,
}

const fn inst(
    short_name: &'static str,
    name: &'static str,
    description: &'static str,
    risk: &'static str,
    returns: &'static str,
    liquidity: &'static str,
) -> Instrument {
    Instrument { short_name, name, description, risk, returns, liquidity }
}

const INSTRUMENTS_80C: &[Instrument] = &[
    inst("PPF", "Public Provident Fund (PPF)", "Tax-free returns after 15 years, lock-in period", "Low", "7-8%", "Low (15 years lock-in)"),
    inst("ELSS", "Equity Linked Savings Scheme (ELSS)", "Mutual funds with 3-year lock-in, potential for higher returns", "High", "10-15%", "Medium (3 years lock-in)"),
    inst("EPF", "Employee Provident Fund (EPF)", "Compulsory for salaried employees, stable returns", "Low", "8-9%", "Low (retirement/specific conditions)"),
    inst("Life Insurance", "Life Insurance Premium", "Term/endowment plans, provides life cover", "Low", "4-6%", "Low"),
    inst("NSC", "National Savings Certificate (NSC)", "5-year fixed deposit with tax benefits", "Low", "6-7%", "Low (5 years)"),
];

const INSTRUMENTS_80D: &[Instrument] = &[
    inst("Health Insurance", "Health Insurance Premium", "Medical insurance for self and family", "Low", "Tax deduction + health coverage", "n/a"),
    inst("Health Check-up", "Preventive Health Check-up", "Annual health check-ups, up to ₹5,000 within the 80D limit", "Low", "Early detection", "n/a"),
];

const INSTRUMENTS_80G: &[Instrument] = &[inst(
    "Charitable Donations",
    "Charitable Donations",
    "Donations to approved charitable organizations, 50% or 100% deductible",
    "n/a",
    "n/a",
    "n/a",
)];

const INSTRUMENTS_24B: &[Instrument] = &[inst(
    "Home Loan",
    "Home Loan Interest",
    "Interest paid on home loan for self-occupied property, up to ₹2 lakh",
    "n/a",
    "Asset creation",
    "n/a",
)];

const INSTRUMENTS_HRA: &[Instrument] = &[inst(
    "HRA",
    "House Rent Allowance",
    "Minimum of actual HRA, 50%/40% of basic salary, rent minus 10% of basic",
    "n/a",
    "n/a",
    "n/a",
)];

/// Static catalogue of instruments per section
pub fn instruments(section: TaxSection) -> &'static [Instrument] {
    match section {
        TaxSection::Sec80C => INSTRUMENTS_80C,
        TaxSection::Sec80D => INSTRUMENTS_80D,
        TaxSection::Sec80G => INSTRUMENTS_80G,
        TaxSection::Sec24b => INSTRUMENTS_24B,
        TaxSection::Hra => INSTRUMENTS_HRA,
        TaxSection::Income => &[],
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationSummary {
    pub current_deductions: f64,
    pub max_possible_deductions: f64,
    pub optimization_potential: f64,
    pub estimated_tax_savings: f64,
    pub optimization_percentage: f64,
}

/// Unused headroom in one section
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeductionOpportunity {
    pub section: TaxSection,
    pub current_utilization: f64,
    pub limit: f64,
    pub remaining_opportunity: f64,
    pub utilization_percentage: f64,
    pub estimated_tax_savings: f64,
    pub instruments: &'static [Instrument],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Priority {
    High,
    Medium,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvestmentRecommendation {
    pub section: TaxSection,
    pub instrument: &'static str,
    pub suggested_amount: f64,
    pub rationale: &'static str,
    pub risk_return: Option<String>,
    pub priority: Priority,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvestmentPlan {
    pub income_band: IncomeBand,
    pub strategy: &'static str,
    pub recommendations: Vec<InvestmentRecommendation>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExpenseOptimization {
    Discretionary {
        current_amount: f64,
        suggestion: String,
        potential_tax_saving: f64,
    },
    Housing {
        current_rent: f64,
        suggestion: String,
        potential_deduction: f64,
        tax_savings: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalaryComponent {
    pub component: &'static str,
    pub recommendation: &'static str,
    pub benefit: &'static str,
    pub annual_saving: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionItem {
    pub priority: u8,
    pub action: String,
    pub timeline: &'static str,
    pub impact: String,
    pub steps: Vec<&'static str>,
}

/// Everything `suggest` returns
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationSuggestions {
    pub summary: OptimizationSummary,
    pub deduction_opportunities: Vec<DeductionOpportunity>,
    pub investment_recommendations: InvestmentPlan,
    pub expense_optimization: Vec<ExpenseOptimization>,
    pub salary_restructuring: Vec<SalaryComponent>,
    pub action_plan: Vec<ActionItem>,
}

/// Build ranked suggestions from a year's gross income, capped deductions and
/// debit totals per category.
pub fn suggest(
    gross_income: f64,
    deductions: &DeductionSet,
    expenses: &BTreeMap<Category, f64>,
) -> OptimizationSuggestions {
    let gross_income = if gross_income.is_finite() { gross_income.max(0.0) } else { 0.0 };
    let suggestions = OptimizationSuggestions {
        summary: summary(gross_income, deductions),
        deduction_opportunities: deduction_opportunities(gross_income, deductions),
        investment_recommendations: investment_plan(gross_income, deductions),
        expense_optimization: expense_optimizations(expenses),
        salary_restructuring: salary_restructuring(),
        action_plan: action_plan(deductions),
    };
    tracing::debug!(
        opportunities = suggestions.deduction_opportunities.len(),
        actions = suggestions.action_plan.len(),
        "built tax optimization suggestions"
    );
    suggestions
}

fn summary(gross_income: f64, deductions: &DeductionSet) -> OptimizationSummary {
    let current: f64 = PLANNED_LIMITS
        .iter()
        .map(|&(section, limit)| deductions.get(section).min(limit))
        .sum();
    let max_possible: f64 = PLANNED_LIMITS.iter().map(|(_, l)| l).sum();
    let potential = (max_possible - current).max(0.0);
    OptimizationSummary {
        current_deductions: current,
        max_possible_deductions: max_possible,
        optimization_potential: potential,
        estimated_tax_savings: potential * marginal_tax_rate(gross_income),
        optimization_percentage: potential / max_possible * 100.0,
    }
}

/// Headroom per capped section, largest first
pub fn deduction_opportunities(gross_income: f64, deductions: &DeductionSet) -> Vec<DeductionOpportunity> {
    let rate = marginal_tax_rate(gross_income);
    let mut out: Vec<DeductionOpportunity> = PLANNED_LIMITS
        .iter()
        .filter_map(|&(section, limit)| {
            let used = deductions.get(section);
            let remaining = (limit - used).max(0.0);
            (remaining > 0.0).then(|| DeductionOpportunity {
                section,
                current_utilization: used,
                limit,
                remaining_opportunity: remaining,
                utilization_percentage: used / limit * 100.0,
                estimated_tax_savings: remaining * rate,
                instruments: instruments(section),
            })
        })
        .collect();
    out.sort_by(|a, b| b.remaining_opportunity.total_cmp(&a.remaining_opportunity));
    out
}

/// 80C instruments in the band's preference order, then 80D cover
pub fn investment_plan(gross_income: f64, deductions: &DeductionSet) -> InvestmentPlan {
    let band = IncomeBand::of(gross_income);
    let mut recommendations = Vec::new();

    let remaining_80c = (150_000.0 - deductions.get(TaxSection::Sec80C)).max(0.0);
    if remaining_80c > 0.0 {
        let ranked = band
            .primary_focus()
            .iter()
            .map(|f| (f, Priority::High))
            .chain(band.secondary_focus().iter().map(|f| (f, Priority::Medium)));
        for (focus, priority) in ranked {
            if let Some(i) = INSTRUMENTS_80C.iter().find(|i| i.short_name == *focus) {
                recommendations.push(InvestmentRecommendation {
                    section: TaxSection::Sec80C,
                    instrument: i.name,
                    suggested_amount: remaining_80c.min(SUGGESTED_80C_TICKET),
                    rationale: i.description,
                    risk_return: Some(format!("Risk: {}, Returns: {}", i.risk, i.returns)),
                    priority,
                });
            }
        }
    }

    let remaining_80d = (25_000.0 - deductions.get(TaxSection::Sec80D)).max(0.0);
    if remaining_80d > 0.0 {
        recommendations.push(InvestmentRecommendation {
            section: TaxSection::Sec80D,
            instrument: "Health Insurance",
            suggested_amount: remaining_80d,
            rationale: "Essential for health coverage and tax benefits",
            risk_return: None,
            priority: Priority::High,
        });
    }

    InvestmentPlan {
        income_band: band,
        strategy: band.strategy(),
        recommendations,
    }
}

pub fn expense_optimizations(expenses: &BTreeMap<Category, f64>) -> Vec<ExpenseOptimization> {
    let spent = |c: Category| expenses.get(&c).copied().unwrap_or(0.0);
    let mut out = Vec::new();

    let discretionary: f64 = expenses
        .iter()
        .filter(|(c, _)| c.is_discretionary())
        .map(|(_, a)| a)
        .sum();
    if discretionary > DISCRETIONARY_THRESHOLD {
        out.push(ExpenseOptimization::Discretionary {
            current_amount: discretionary,
            suggestion: "Consider redirecting some discretionary spending to tax-saving investments such as ELSS".to_string(),
            potential_tax_saving: discretionary * REDIRECT_SHARE * ASSUMED_RATE,
        });
    }

    let rent = spent(Category::Rent);
    if rent > HIGH_RENT_THRESHOLD && spent(Category::Emi) == 0.0 {
        out.push(ExpenseOptimization::Housing {
            current_rent: rent,
            suggestion: "Consider a home purchase for deductions under Section 24(b) and 80C".to_string(),
            potential_deduction: HOME_PURCHASE_DEDUCTION,
            tax_savings: HOME_PURCHASE_DEDUCTION * ASSUMED_RATE,
        });
    }
    out
}

pub fn salary_restructuring() -> Vec<SalaryComponent> {
    vec![
        SalaryComponent {
            component: "House Rent Allowance (HRA)",
            recommendation: "Structure 40-50% of basic salary as HRA if living in rented accommodation",
            benefit: "Significant tax savings on rent payments",
            annual_saving: None,
        },
        SalaryComponent {
            component: "Food Allowance",
            recommendation: "Include food allowance/meal vouchers up to ₹2,200/month",
            benefit: "Tax-free allowance for food expenses",
            annual_saving: Some(2_200.0 * 12.0),
        },
        SalaryComponent {
            component: "Transport Allowance",
            recommendation: "Include transport allowance up to ₹1,600/month",
            benefit: "Tax-free allowance for commuting",
            annual_saving: Some(1_600.0 * 12.0),
        },
        SalaryComponent {
            component: "Communication Allowance",
            recommendation: "Include mobile/internet reimbursement as per company policy",
            benefit: "Tax-free reimbursement for work-related communication",
            annual_saving: None,
        },
    ]
}

/// Priority 1: fill 80C. Priority 2: health cover. Priority 3: salary structure.
pub fn action_plan(deductions: &DeductionSet) -> Vec<ActionItem> {
    let mut items = Vec::new();

    let used_80c = deductions.get(TaxSection::Sec80C);
    if used_80c < 150_000.0 {
        let remaining = 150_000.0 - used_80c;
        items.push(ActionItem {
            priority: 1,
            action: format!("Invest {} in 80C instruments", format_inr(remaining)),
            timeline: "Before March 31st",
            impact: format!("Tax saving: {}", format_inr(remaining * ASSUMED_RATE)),
            steps: vec![
                "Open PPF account if not already done",
                "Invest in ELSS mutual funds",
                "Increase EPF contribution if possible",
            ],
        });
    }

    if deductions.get(TaxSection::Sec80D) < 25_000.0 {
        items.push(ActionItem {
            priority: 2,
            action: "Get comprehensive health insurance".to_string(),
            timeline: "Immediate",
            impact: "Tax saving + Health coverage".to_string(),
            steps: vec![
                "Compare health insurance plans",
                "Choose family floater or individual plans",
                "Pay premium before March 31st",
            ],
        });
    }

    items.push(ActionItem {
        priority: 3,
        action: "Optimize salary structure".to_string(),
        timeline: "Next appraisal cycle",
        impact: "Ongoing tax savings".to_string(),
        steps: vec![
            "Discuss HRA component with HR",
            "Include tax-free allowances",
            "Submit rent receipts and declarations",
        ],
    });

    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tax::calculator::TaxCalculator;

    fn deductions(pairs: &[(TaxSection, f64)]) -> DeductionSet {
        TaxCalculator::default().cap_deductions(pairs.iter().copied())
    }

    #[test]
    fn test_marginal_rate_table() {
        assert_eq!(marginal_tax_rate(300_000.0), 0.0);
        assert_eq!(marginal_tax_rate(300_001.0), 0.05);
        assert_eq!(marginal_tax_rate(900_000.0), 0.10);
        assert_eq!(marginal_tax_rate(1_200_000.0), 0.15);
        assert_eq!(marginal_tax_rate(1_500_000.0), 0.20);
        assert_eq!(marginal_tax_rate(2_000_000.0), 0.30);
    }

    #[test]
    fn test_income_bands() {
        assert_eq!(IncomeBand::of(499_999.0), IncomeBand::Low);
        assert_eq!(IncomeBand::of(500_000.0), IncomeBand::Medium);
        assert_eq!(IncomeBand::of(1_500_000.0), IncomeBand::High);
    }

    #[test]
    fn test_opportunities_ranked_by_headroom() {
        let ded = deductions(&[(TaxSection::Sec80C, 100_000.0), (TaxSection::Sec80D, 25_000.0)]);
        let ops = deduction_opportunities(1_000_000.0, &ded);
        let order: Vec<TaxSection> = ops.iter().map(|o| o.section).collect();
        // 24b 200k, 80G 100k, 80C 50k; 80D is full
        assert_eq!(order, vec![TaxSection::Sec24b, TaxSection::Sec80G, TaxSection::Sec80C]);
        assert_eq!(ops[2].remaining_opportunity, 50_000.0);
        assert_eq!(ops[2].estimated_tax_savings, 50_000.0 * 0.15);
        assert!(!ops[2].instruments.is_empty());
    }

    #[test]
    fn test_summary() {
        let ded = deductions(&[(TaxSection::Sec80C, 150_000.0)]);
        let s = suggest(1_000_000.0, &ded, &BTreeMap::new()).summary;
        assert_eq!(s.max_possible_deductions, 475_000.0);
        assert_eq!(s.optimization_potential, 325_000.0);
        assert_eq!(s.estimated_tax_savings, 325_000.0 * 0.15);
    }

    #[test]
    fn test_summary_ignores_uncapped_hra() {
        let ded = deductions(&[(TaxSection::Sec80C, 150_000.0), (TaxSection::Hra, 600_000.0)]);
        let s = suggest(1_000_000.0, &ded, &BTreeMap::new()).summary;
        assert_eq!(s.current_deductions, 150_000.0);
        assert_eq!(s.optimization_potential, 325_000.0);
    }

    #[test]
    fn test_investment_plan_follows_band_preferences() {
        let plan = investment_plan(2_000_000.0, &DeductionSet::default());
        assert_eq!(plan.income_band, IncomeBand::High);
        let names: Vec<&str> = plan.recommendations.iter().map(|r| r.instrument).collect();
        assert_eq!(
            names,
            vec![
                "Equity Linked Savings Scheme (ELSS)",
                "Public Provident Fund (PPF)",
                "Life Insurance Premium",
                "Health Insurance",
            ]
        );
        assert_eq!(plan.recommendations[0].suggested_amount, 50_000.0);
        assert_eq!(plan.recommendations[2].priority, Priority::Medium);
        assert_eq!(plan.recommendations[3].suggested_amount, 25_000.0);
    }

    #[test]
    fn test_no_80c_recommendations_when_full() {
        let ded = deductions(&[(TaxSection::Sec80C, 150_000.0), (TaxSection::Sec80D, 25_000.0)]);
        assert!(investment_plan(800_000.0, &ded).recommendations.is_empty());
    }

    #[test]
    fn test_expense_optimizations() {
        let expenses = BTreeMap::from([
            (Category::Food, 60_000.0),
            (Category::Shopping, 50_000.0),
            (Category::Rent, 300_000.0),
        ]);
        let out = expense_optimizations(&expenses);
        assert_eq!(out.len(), 2);
        match &out[0] {
            ExpenseOptimization::Discretionary { potential_tax_saving, .. } => {
                assert!((potential_tax_saving - 110_000.0 * 0.3 * 0.2).abs() < 1e-6);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            out[1],
            ExpenseOptimization::Housing { potential_deduction, .. } if potential_deduction == 350_000.0
        ));

        // An existing EMI suppresses the home-purchase idea
        let mut with_emi = expenses.clone();
        with_emi.insert(Category::Emi, 30_000.0);
        assert_eq!(expense_optimizations(&with_emi).len(), 1);
    }

    #[test]
    fn test_action_plan_order() {
        let plan = action_plan(&DeductionSet::default());
        let prio: Vec<u8> = plan.iter().map(|a| a.priority).collect();
        assert_eq!(prio, vec![1, 2, 3]);
        assert_eq!(plan[0].action, "Invest ₹1,50,000 in 80C instruments");

        let full = deductions(&[(TaxSection::Sec80C, 150_000.0), (TaxSection::Sec80D, 25_000.0)]);
        let plan = action_plan(&full);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].priority, 3);
    }
}
