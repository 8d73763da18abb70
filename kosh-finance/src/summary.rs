//! Period summary: totals, trends, category split, recurring payments, insights

use chrono::{Datelike, Months, NaiveDate};
use kosh_core::{Category, Transaction};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::money::format_inr;

const RECURRING_PREFIX_CHARS: usize = 20;
const RECURRING_MIN_OCCURRENCES: usize = 3;
const LOW_SAVINGS_RATE: f64 = 20.0;
const TAX_SAVINGS_INSIGHT: f64 = 10_000.0;
const CIBIL_INSIGHT: u32 = 700;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialSummary {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub total_income: f64,
    pub total_expenses: f64,
    pub net_savings: f64,
    pub savings_rate: f64,
    pub average_monthly_income: f64,
    pub average_monthly_expenses: f64,
    /// Income of the end month against the month before, in percent
    pub income_growth: f64,
    pub transaction_count: usize,
    pub monthly_trends: Vec<MonthlyTrend>,
    pub category_breakdown: BTreeMap<Category, f64>,
    pub recurring: Vec<RecurringPattern>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTrend {
    /// "Apr 2023"
    pub month: String,
    pub income: f64,
    pub expenses: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringPattern {
    pub description: String,
    /// Nearest hundred
    pub amount: f64,
    pub occurrences: usize,
    pub total_amount: f64,
    pub category: Category,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    Financial,
    Tax,
    Cibil,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub kind: InsightKind,
    pub priority: String,
    pub title: String,
    pub message: String,
    pub action: String,
}

fn ratio_pct(num: f64, den: f64) -> f64 {
    if den > 0.0 { num / den * 100.0 } else { 0.0 }
}

fn month_start(d: NaiveDate) -> NaiveDate {
    d.with_day(1).unwrap_or(d)
}

fn month_key(d: NaiveDate) -> (i32, u32) {
    (d.year(), d.month())
}

/// Month-by-month income and expenses for every month touching [start, end],
/// including empty months
pub fn monthly_trends(txns: &[Transaction], start: NaiveDate, end: NaiveDate) -> Vec<MonthlyTrend> {
    let mut by_month: BTreeMap<(i32, u32), (f64, f64)> = BTreeMap::new();
    for t in txns {
        let entry = by_month.entry(month_key(t.date)).or_default();
        if t.is_credit() {
            entry.0 += t.amount;
        } else {
            entry.1 += t.amount;
        }
    }

    let mut out = Vec::new();
    let mut cursor = month_start(start);
    while cursor <= end {
        let (income, expenses) = by_month.get(&month_key(cursor)).copied().unwrap_or_default();
        out.push(MonthlyTrend {
            month: cursor.format("%b %Y").to_string(),
            income,
            expenses,
        });
        match cursor.checked_add_months(Months::new(1)) {
            Some(next) => cursor = next,
            None => break,
        }
    }
    out
}

/// Debit totals per category
pub fn category_breakdown(txns: &[Transaction]) -> BTreeMap<Category, f64> {
    let mut out = BTreeMap::new();
    for t in txns.iter().filter(|t| t.is_debit()) {
        *out.entry(t.category).or_insert(0.0) += t.amount;
    }
    out
}

/// Transactions sharing a description prefix and an amount to the nearest
/// hundred, seen at least three times
pub fn recurring_transactions(txns: &[Transaction]) -> Vec<RecurringPattern> {
    let mut groups: BTreeMap<(String, i64), Vec<&Transaction>> = BTreeMap::new();
    for t in txns {
        let prefix: String = t.description.chars().take(RECURRING_PREFIX_CHARS).collect();
        let hundreds = (t.amount / 100.0).round() as i64;
        groups.entry((prefix, hundreds)).or_default().push(t);
    }

    groups
        .into_iter()
        .filter(|(_, items)| items.len() >= RECURRING_MIN_OCCURRENCES)
        .map(|((description, hundreds), items)| RecurringPattern {
            description,
            amount: hundreds as f64 * 100.0,
            occurrences: items.len(),
            total_amount: items.iter().map(|t| t.amount).sum(),
            category: items[0].category,
        })
        .collect()
}

fn income_in_month(txns: &[Transaction], month: (i32, u32)) -> f64 {
    txns.iter()
        .filter(|t| t.is_credit() && month_key(t.date) == month)
        .map(|t| t.amount)
        .sum()
}

impl FinancialSummary {
    /// Summarize the transactions dated within [start, end]
    pub fn build(txns: &[Transaction], start: NaiveDate, end: NaiveDate) -> Self {
        let window: Vec<Transaction> = txns
            .iter()
            .filter(|t| t.date >= start && t.date <= end)
            .cloned()
            .collect();

        let total_income: f64 = window.iter().filter(|t| t.is_credit()).map(|t| t.amount).sum();
        let total_expenses: f64 = window.iter().filter(|t| t.is_debit()).map(|t| t.amount).sum();
        let net_savings = total_income - total_expenses;

        let active_months = window
            .iter()
            .map(|t| month_key(t.date))
            .collect::<std::collections::BTreeSet<_>>()
            .len()
            .max(1) as f64;

        let current = month_key(end);
        let previous = month_start(end)
            .checked_sub_months(Months::new(1))
            .map(month_key)
            .unwrap_or(current);
        let current_income = income_in_month(&window, current);
        let previous_income = income_in_month(&window, previous);

        tracing::debug!(transactions = window.len(), %start, %end, "built financial summary");

        FinancialSummary {
            start,
            end,
            total_income,
            total_expenses,
            net_savings,
            savings_rate: ratio_pct(net_savings, total_income),
            average_monthly_income: total_income / active_months,
            average_monthly_expenses: total_expenses / active_months,
            income_growth: ratio_pct(current_income - previous_income, previous_income),
            transaction_count: window.len(),
            monthly_trends: monthly_trends(&window, start, end),
            category_breakdown: category_breakdown(&window),
            recurring: recurring_transactions(&window),
        }
    }
}

/// Rule-based nudges from the summary, the tax result and the credit score
pub fn insights(summary: &FinancialSummary, tax_savings: f64, cibil_score: Option<u32>) -> Vec<Insight> {
    let mut out = Vec::new();

    if summary.savings_rate < LOW_SAVINGS_RATE {
        out.push(Insight {
            kind: InsightKind::Financial,
            priority: "high".into(),
            title: "Low Savings Rate".into(),
            message: format!(
                "Your savings rate is {:.1}%. Consider reducing discretionary spending.",
                summary.savings_rate
            ),
            action: "Review your expense categories and identify areas to cut back.".into(),
        });
    }

    if tax_savings > TAX_SAVINGS_INSIGHT {
        out.push(Insight {
            kind: InsightKind::Tax,
            priority: "medium".into(),
            title: "Tax Optimization Opportunity".into(),
            message: format!("You could save {} in taxes.", format_inr(tax_savings)),
            action: "Review tax-saving investment options under Section 80C.".into(),
        });
    }

    if let Some(score) = cibil_score
        && score < CIBIL_INSIGHT
    {
        out.push(Insight {
            kind: InsightKind::Cibil,
            priority: "high".into(),
            title: "CIBIL Score Improvement".into(),
            message: format!("Your CIBIL score of {} needs improvement.", score),
            action: "Focus on timely payments and reducing credit utilization.".into(),
        });
    }

    out
}
