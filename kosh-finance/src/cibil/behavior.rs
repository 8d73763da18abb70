//! Behavioral signals derived from a transaction window
//!
//! Utilization and inquiry counts are keyword heuristics over free-text
//! narrations, not bureau data. They approximate the real factors and should
//! be read as such.

use chrono::{Datelike, NaiveDate};
use kosh_core::{Category, Transaction};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::grade::Grade;

const DAYS_PER_MONTH: f64 = 30.44;
/// Assumed credit limit as a multiple of average monthly card spend
const LIMIT_MULTIPLE: f64 = 4.0;
const INSTITUTION_TERMS: [&str; 4] = ["bank", "card", "finance", "loan"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentConsistency {
    pub grade: Grade,
    /// Share of months in the EMI span that carry at least one EMI debit
    pub consistency: f64,
    pub missed_payments: u32,
    pub total_months: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditUtilization {
    pub grade: Grade,
    /// Capped at 100 for display; the grade uses the raw value
    pub estimated_utilization: f64,
    pub estimated_balance: f64,
    pub estimated_limit: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditType {
    HomeLoan,
    AutoLoan,
    PersonalLoan,
    CreditCard,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditDiversity {
    pub grade: Grade,
    pub credit_types: Vec<CreditType>,
    pub diversity_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditInquiries {
    pub grade: Grade,
    pub estimated_new_accounts: usize,
    /// Institution tokens in first-seen order
    pub institutions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountAge {
    pub grade: Grade,
    pub estimated_age_months: f64,
    pub data_span_days: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtToIncome {
    pub grade: Grade,
    /// Percent
    pub ratio: f64,
    pub monthly_income: f64,
    pub monthly_emi: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendingPattern {
    /// `NoData` when fewer than two months of debits exist
    pub stability: Grade,
    pub coefficient_of_variation: f64,
    pub mean_monthly_spending: f64,
    pub spending_volatility: f64,
    pub months_analyzed: usize,
}

/// All graded factors for one window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorProfile {
    pub payment_consistency: PaymentConsistency,
    pub credit_utilization: CreditUtilization,
    pub credit_diversity: CreditDiversity,
    pub new_credit_inquiries: CreditInquiries,
    pub account_age: AccountAge,
    pub debt_to_income: DebtToIncome,
    pub spending_patterns: SpendingPattern,
}

fn month_index(d: NaiveDate) -> i32 {
    d.year() * 12 + d.month0() as i32
}

fn is_emi_debit(t: &Transaction) -> bool {
    t.is_debit() && t.category == Category::Emi
}

/// Months from the first EMI debit to the last one. A month inside that
/// span without an EMI debit counts as missed; months after the last EMI do not.
pub fn payment_consistency(txns: &[Transaction]) -> PaymentConsistency {
    let months: BTreeSet<i32> = txns.iter().filter(|t| is_emi_debit(t)).map(|t| month_index(t.date)).collect();
    let (Some(&first), Some(&last)) = (months.first(), months.last()) else {
        return PaymentConsistency {
            grade: Grade::NoData,
            consistency: 0.0,
            missed_payments: 0,
            total_months: 0,
        };
    };

    let total_months = (last - first + 1).max(1) as u32;
    let paid = months.len() as u32;
    let consistency = paid as f64 / total_months as f64 * 100.0;
    PaymentConsistency {
        grade: Grade::at_least(consistency, [95.0, 85.0, 70.0, 50.0]),
        consistency,
        missed_payments: total_months.saturating_sub(paid),
        total_months,
    }
}

/// Card spend vs card payments, identified by "credit" in the narration
pub fn credit_utilization(txns: &[Transaction]) -> CreditUtilization {
    let mentions_credit = |t: &&Transaction| t.description.to_lowercase().contains("credit");
    let spend: f64 = txns.iter().filter(mentions_credit).filter(|t| t.is_debit()).map(|t| t.amount).sum();
    let payments: f64 = txns.iter().filter(mentions_credit).filter(|t| t.is_credit()).map(|t| t.amount).sum();

    if spend == 0.0 {
        return CreditUtilization {
            grade: Grade::NoData,
            estimated_utilization: 0.0,
            estimated_balance: 0.0,
            estimated_limit: 0.0,
        };
    }

    let limit = spend / 12.0 * LIMIT_MULTIPLE;
    let balance = (spend - payments).max(0.0);
    let utilization = if limit > 0.0 { balance / limit * 100.0 } else { 0.0 };
    CreditUtilization {
        grade: Grade::at_most(utilization, [10.0, 30.0, 50.0, 70.0]),
        estimated_utilization: utilization.min(100.0),
        estimated_balance: balance,
        estimated_limit: limit,
    }
}

fn credit_type(desc_lower: &str) -> Option<CreditType> {
    let has = |terms: &[&str]| terms.iter().any(|t| desc_lower.contains(t));
    if has(&["emi", "loan", "mortgage"]) {
        Some(if has(&["home", "house"]) {
            CreditType::HomeLoan
        } else if has(&["car", "auto"]) {
            CreditType::AutoLoan
        } else {
            CreditType::PersonalLoan
        })
    } else if desc_lower.contains("credit") {
        Some(CreditType::CreditCard)
    } else {
        None
    }
}

pub fn credit_diversity(txns: &[Transaction]) -> CreditDiversity {
    if txns.is_empty() {
        return CreditDiversity {
            grade: Grade::NoData,
            credit_types: Vec::new(),
            diversity_count: 0,
        };
    }
    let types: BTreeSet<CreditType> = txns
        .iter()
        .filter_map(|t| credit_type(&t.description.to_lowercase()))
        .collect();
    let count = types.len();
    CreditDiversity {
        grade: Grade::at_least(count as f64, [4.0, 3.0, 2.0, 1.0]),
        credit_types: types.into_iter().collect(),
        diversity_count: count,
    }
}

/// First word of each narration that looks like a lender, counted once
pub fn credit_inquiries(txns: &[Transaction]) -> CreditInquiries {
    if txns.is_empty() {
        return CreditInquiries {
            grade: Grade::NoData,
            estimated_new_accounts: 0,
            institutions: Vec::new(),
        };
    }

    let mut ordered: Vec<&Transaction> = txns.iter().collect();
    ordered.sort_by_key(|t| t.date);

    let mut seen = BTreeSet::new();
    let mut institutions = Vec::new();
    for t in ordered {
        let desc = t.description.to_lowercase();
        let token = desc
            .split_whitespace()
            .find(|w| INSTITUTION_TERMS.iter().any(|term| w.contains(term)));
        if let Some(word) = token
            && seen.insert(word.to_string())
        {
            institutions.push(word.to_string());
        }
    }

    let n = institutions.len();
    CreditInquiries {
        grade: Grade::at_most(n as f64, [0.0, 2.0, 4.0, 6.0]),
        estimated_new_accounts: n,
        institutions,
    }
}

/// Span between the oldest and newest transaction
pub fn account_age(txns: &[Transaction]) -> AccountAge {
    let (Some(oldest), Some(newest)) = (
        txns.iter().map(|t| t.date).min(),
        txns.iter().map(|t| t.date).max(),
    ) else {
        return AccountAge {
            grade: Grade::NoData,
            estimated_age_months: 0.0,
            data_span_days: 0,
        };
    };
    let days = (newest - oldest).num_days();
    let months = days as f64 / DAYS_PER_MONTH;
    AccountAge {
        grade: Grade::at_least(months, [60.0, 36.0, 24.0, 12.0]),
        estimated_age_months: months,
        data_span_days: days,
    }
}

/// Monthly EMI over monthly salary, both averaged over twelve months
pub fn debt_to_income(txns: &[Transaction]) -> DebtToIncome {
    let income: f64 = txns
        .iter()
        .filter(|t| t.is_credit() && t.category == Category::Salary)
        .map(|t| t.amount)
        .sum::<f64>()
        / 12.0;
    let emi: f64 = txns.iter().filter(|t| is_emi_debit(t)).map(|t| t.amount).sum::<f64>() / 12.0;

    if income == 0.0 {
        return DebtToIncome {
            grade: Grade::NoData,
            ratio: 0.0,
            monthly_income: 0.0,
            monthly_emi: emi,
        };
    }
    let ratio = emi / income * 100.0;
    DebtToIncome {
        grade: Grade::at_most(ratio, [20.0, 36.0, 50.0, 70.0]),
        ratio,
        monthly_income: income,
        monthly_emi: emi,
    }
}

/// Coefficient of variation of monthly debit totals
pub fn spending_patterns(txns: &[Transaction]) -> SpendingPattern {
    let mut monthly: BTreeMap<i32, f64> = BTreeMap::new();
    for t in txns.iter().filter(|t| t.is_debit()) {
        *monthly.entry(month_index(t.date)).or_insert(0.0) += t.amount;
    }
    let amounts: Vec<f64> = monthly.into_values().collect();
    let n = amounts.len();
    if n < 2 {
        return SpendingPattern {
            stability: Grade::NoData,
            coefficient_of_variation: 0.0,
            mean_monthly_spending: amounts.first().copied().unwrap_or(0.0),
            spending_volatility: 0.0,
            months_analyzed: n,
        };
    }

    let mean = amounts.iter().sum::<f64>() / n as f64;
    let variance = amounts.iter().map(|a| (a - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    let std = variance.sqrt();
    let cv = if mean > 0.0 { std / mean * 100.0 } else { 0.0 };
    SpendingPattern {
        stability: Grade::at_most(cv, [15.0, 25.0, 40.0, 60.0]),
        coefficient_of_variation: cv,
        mean_monthly_spending: mean,
        spending_volatility: std,
        months_analyzed: n,
    }
}

/// Run every sub-analysis over the window
pub fn analyze_behavior(txns: &[Transaction]) -> BehaviorProfile {
    let profile = BehaviorProfile {
        payment_consistency: payment_consistency(txns),
        credit_utilization: credit_utilization(txns),
        credit_diversity: credit_diversity(txns),
        new_credit_inquiries: credit_inquiries(txns),
        account_age: account_age(txns),
        debt_to_income: debt_to_income(txns),
        spending_patterns: spending_patterns(txns),
    };
    tracing::debug!(
        transactions = txns.len(),
        payment = %profile.payment_consistency.grade,
        utilization = %profile.credit_utilization.grade,
        mix = %profile.credit_diversity.grade,
        "analyzed credit behavior"
    );
    profile
}

#[cfg(test)]
mod tests {
    use super::*;
    use kosh_core::{Direction, categorize_all};

    fn txn(y: i32, m: u32, d: u32, desc: &str, amount: f64, dir: Direction) -> Transaction {
        Transaction::new(NaiveDate::from_ymd_opt(y, m, d).unwrap(), desc, amount, dir)
    }

    fn categorized(mut txns: Vec<Transaction>) -> Vec<Transaction> {
        categorize_all(&mut txns);
        txns
    }

    #[test]
    fn test_empty_window_is_all_no_data() {
        let p = analyze_behavior(&[]);
        assert_eq!(p.payment_consistency.grade, Grade::NoData);
        assert_eq!(p.credit_utilization.grade, Grade::NoData);
        assert_eq!(p.credit_diversity.grade, Grade::NoData);
        assert_eq!(p.new_credit_inquiries.grade, Grade::NoData);
        assert_eq!(p.account_age.grade, Grade::NoData);
        assert_eq!(p.debt_to_income.grade, Grade::NoData);
        assert_eq!(p.spending_patterns.stability, Grade::NoData);
    }

    #[test]
    fn test_payment_consistency_counts_gaps() {
        // EMIs in Jan, Feb, Apr; March is missed, May carries no EMI
        let txns = categorized(vec![
            txn(2023, 1, 5, "HDFC home loan EMI", 20_000.0, Direction::Debit),
            txn(2023, 2, 5, "HDFC home loan EMI", 20_000.0, Direction::Debit),
            txn(2023, 4, 5, "HDFC home loan EMI", 20_000.0, Direction::Debit),
            txn(2023, 5, 20, "Swiggy order", 300.0, Direction::Debit),
        ]);
        let pc = payment_consistency(&txns);
        assert_eq!(pc.total_months, 4);
        assert_eq!(pc.missed_payments, 1);
        assert!((pc.consistency - 75.0).abs() < 1e-9);
        assert_eq!(pc.grade, Grade::Fair);
    }

    #[test]
    fn test_payment_consistency_single_missed_month() {
        let txns = categorized(
            (1..=12)
                .filter(|m| *m != 7)
                .map(|m| txn(2023, m, 5, "HDFC home loan EMI", 20_000.0, Direction::Debit))
                .collect(),
        );
        let pc = payment_consistency(&txns);
        assert_eq!(pc.total_months, 12);
        assert_eq!(pc.missed_payments, 1);
        assert!((pc.consistency - 11.0 / 12.0 * 100.0).abs() < 1e-9);
        assert_eq!(pc.grade, Grade::Good);
    }

    #[test]
    fn test_payment_consistency_loan_repaid_early() {
        let mut txns: Vec<Transaction> = (1..=12)
            .map(|m| txn(2022, m, 5, "HOME LOAN EMI", 20_000.0, Direction::Debit))
            .collect();
        txns.push(txn(2023, 12, 20, "SWIGGY ORDER", 450.0, Direction::Debit));
        let pc = payment_consistency(&categorized(txns));
        assert_eq!(pc.total_months, 12);
        assert_eq!(pc.missed_payments, 0);
        assert!((pc.consistency - 100.0).abs() < 1e-9);
        assert_eq!(pc.grade, Grade::Excellent);
    }

    #[test]
    fn test_payment_consistency_every_month() {
        let txns = categorized(
            (1..=12)
                .map(|m| txn(2023, m, 3, "Car loan EMI", 9_000.0, Direction::Debit))
                .collect(),
        );
        let pc = payment_consistency(&txns);
        assert_eq!(pc.total_months, 12);
        assert_eq!(pc.missed_payments, 0);
        assert_eq!(pc.grade, Grade::Excellent);
    }

    #[test]
    fn test_utilization_grade_uses_raw_value() {
        let txns = vec![
            txn(2023, 1, 10, "credit card spend", 120_000.0, Direction::Debit),
            txn(2023, 2, 10, "credit card payment", 30_000.0, Direction::Credit),
        ];
        let u = credit_utilization(&txns);
        // limit 40k, balance 90k -> 225%
        assert_eq!(u.estimated_limit, 40_000.0);
        assert_eq!(u.estimated_balance, 90_000.0);
        assert_eq!(u.estimated_utilization, 100.0);
        assert_eq!(u.grade, Grade::Bad);
    }

    #[test]
    fn test_utilization_fully_paid() {
        let txns = vec![
            txn(2023, 1, 10, "credit card spend", 12_000.0, Direction::Debit),
            txn(2023, 2, 10, "credit card payment", 12_000.0, Direction::Credit),
        ];
        assert_eq!(credit_utilization(&txns).grade, Grade::Excellent);
    }

    #[test]
    fn test_credit_diversity() {
        let txns = vec![
            txn(2023, 1, 1, "Home loan EMI", 1.0, Direction::Debit),
            txn(2023, 1, 2, "Auto loan EMI", 1.0, Direction::Debit),
            txn(2023, 1, 3, "credit card bill", 1.0, Direction::Debit),
            txn(2023, 1, 4, "Home loan EMI", 1.0, Direction::Debit),
        ];
        let d = credit_diversity(&txns);
        assert_eq!(d.diversity_count, 3);
        assert_eq!(d.credit_types, vec![CreditType::HomeLoan, CreditType::AutoLoan, CreditType::CreditCard]);
        assert_eq!(d.grade, Grade::Good);

        let none = credit_diversity(&[txn(2023, 1, 1, "Swiggy", 1.0, Direction::Debit)]);
        assert_eq!(none.grade, Grade::Bad);
    }

    #[test]
    fn test_credit_inquiries_first_seen() {
        let txns = vec![
            txn(2023, 3, 1, "payment to axisbank", 1.0, Direction::Debit),
            txn(2023, 1, 1, "sbicard annual fee", 1.0, Direction::Debit),
            txn(2023, 2, 1, "sbicard payment", 1.0, Direction::Debit),
            txn(2023, 4, 1, "grocery store", 1.0, Direction::Debit),
        ];
        let inq = credit_inquiries(&txns);
        assert_eq!(inq.institutions, vec!["sbicard".to_string(), "axisbank".to_string()]);
        assert_eq!(inq.grade, Grade::Good);

        let clean = credit_inquiries(&[txn(2023, 1, 1, "grocery", 1.0, Direction::Debit)]);
        assert_eq!(clean.grade, Grade::Excellent);
    }

    #[test]
    fn test_account_age() {
        let txns = vec![
            txn(2020, 1, 1, "a", 1.0, Direction::Debit),
            txn(2023, 1, 1, "b", 1.0, Direction::Debit),
        ];
        let age = account_age(&txns);
        assert_eq!(age.data_span_days, 1096);
        assert!(age.estimated_age_months > 36.0);
        assert_eq!(age.grade, Grade::Good);
    }

    #[test]
    fn test_debt_to_income() {
        let txns = categorized(vec![
            txn(2023, 1, 1, "Salary credit", 1_200_000.0, Direction::Credit),
            txn(2023, 1, 5, "Home loan EMI", 300_000.0, Direction::Debit),
        ]);
        let dti = debt_to_income(&txns);
        assert!((dti.ratio - 25.0).abs() < 1e-9);
        assert_eq!(dti.grade, Grade::Good);
    }

    #[test]
    fn test_spending_stability() {
        let steady = vec![
            txn(2023, 1, 1, "rent", 10_000.0, Direction::Debit),
            txn(2023, 2, 1, "rent", 10_000.0, Direction::Debit),
            txn(2023, 3, 1, "rent", 10_000.0, Direction::Debit),
        ];
        let s = spending_patterns(&steady);
        assert_eq!(s.months_analyzed, 3);
        assert_eq!(s.coefficient_of_variation, 0.0);
        assert_eq!(s.stability, Grade::Excellent);

        let one_month = spending_patterns(&steady[..1]);
        assert_eq!(one_month.stability, Grade::NoData);
    }
}
