//! Plain-text rendering of command results

use kosh_core::{CategoryResult, Transaction};
use kosh_finance::cibil::{BestScenario, CibilAnalysisRecord, SimulationOutcome};
use kosh_finance::summary::{FinancialSummary, Insight};
use kosh_finance::tax::optimizer::ExpenseOptimization;
use kosh_finance::tax::{
    DeductionUtilization, OptimizationSuggestions, RegimeTax, ScenarioOutcome, TaxResult,
};
use kosh_finance::{format_inr, format_rate};

pub fn print_category(description: &str, amount: f64, r: &CategoryResult) {
    println!("{} ({})", description, format_inr(amount));
    println!("  category:     {} / {}", r.category, r.subcategory);
    match r.tax_section {
        Some(section) if r.tax_relevant => println!("  tax section:  {}", section),
        _ => println!("  tax section:  -"),
    }
    match r.recurring_frequency {
        Some(freq) => println!("  recurring:    {:?}", freq),
        None => println!("  recurring:    no"),
    }
}

pub fn print_transactions(txns: &[Transaction]) {
    for t in txns {
        let section = t.tax_section.map(|s| s.to_string()).unwrap_or_default();
        println!(
            "{}  {:>14}  {:<14} {:<18} {:<6} {}",
            t.date,
            format_inr(t.signed_amount()),
            t.category.as_str(),
            t.subcategory,
            section,
            t.description
        );
    }
    let debits = txns.iter().filter(|t| t.is_debit()).count();
    println!(
        "\n{} transactions ({} debits, {} credits)",
        txns.len(),
        debits,
        txns.len() - debits
    );
}

fn print_regime(label: &str, r: &RegimeTax) {
    println!("\n{} regime", label);
    println!("  taxable income   {}", format_inr(r.taxable_income));
    for line in r.slabs.iter().filter(|l| l.income_in_slab > 0.0) {
        println!(
            "    {:<28} {:>5}  on {:>12}  = {:>10}",
            line.slab,
            line.rate,
            format_inr(line.income_in_slab),
            format_inr(line.tax)
        );
    }
    if r.rebate > 0.0 {
        println!("  rebate          -{}", format_inr(r.rebate));
    }
    println!("  income tax       {}", format_inr(r.income_tax));
    println!("  cess             {}", format_inr(r.cess));
    println!("  total tax        {}  ({:.2}% effective)", format_inr(r.total_tax), r.effective_rate);
}

pub fn print_tax_result(result: &TaxResult) {
    let b = &result.breakdown;
    println!("# Income tax, FY {}\n", result.financial_year);
    println!("Salary income      {}", format_inr(b.income.salary_income));
    println!("Other income       {}", format_inr(b.income.other_income));
    println!("Gross income       {}", format_inr(result.gross_income));
    println!("Standard deduction {}", format_inr(b.income.standard_deduction));

    println!("\nDeductions (capped)");
    for (section, amount) in b.deductions.iter().filter(|(_, a)| *a > 0.0) {
        println!("  {:<6} {}", section, format_inr(amount));
    }
    println!("  total  {}", format_inr(result.total_deductions));

    print_regime("Old", &b.old_regime);
    print_regime("New", &b.new_regime);

    println!(
        "\nRecommended: {} regime, saving {} ({:.1}%)",
        result.recommended_regime.as_str(),
        format_inr(result.potential_savings),
        b.savings_percentage
    );
}

pub fn print_utilization(rows: &[DeductionUtilization]) {
    println!("\nDeduction utilization");
    for u in rows {
        println!(
            "  {:<4} {:>10} of {:>10}  {:>5.1}%  ({} left)",
            u.section,
            format_inr(u.used),
            format_inr(u.limit),
            u.utilization_percentage,
            format_inr(u.remaining)
        );
    }
}

pub fn print_optimization(s: &OptimizationSuggestions) {
    let sum = &s.summary;
    println!("# Tax optimization\n");
    println!(
        "Using {} of {} possible deductions ({:.0}% headroom); up to {} in tax savings",
        format_inr(sum.current_deductions),
        format_inr(sum.max_possible_deductions),
        sum.optimization_percentage,
        format_inr(sum.estimated_tax_savings)
    );

    println!("\nOpportunities");
    for o in s.deduction_opportunities.iter().filter(|o| o.remaining_opportunity > 0.0) {
        let names: Vec<&str> = o.instruments.iter().map(|i| i.short_name).collect();
        println!(
            "  {:<4} {} left (saves ~{})  {}",
            o.section,
            format_inr(o.remaining_opportunity),
            format_inr(o.estimated_tax_savings),
            names.join(", ")
        );
    }

    let plan = &s.investment_recommendations;
    println!("\nInvestments ({:?} income): {}", plan.income_band, plan.strategy);
    for r in &plan.recommendations {
        println!(
            "  [{:?}] {} under {}: {}  ({})",
            r.priority,
            r.instrument,
            r.section,
            format_inr(r.suggested_amount),
            r.rationale
        );
    }

    if !s.expense_optimization.is_empty() {
        println!("\nExpenses");
        for e in &s.expense_optimization {
            match e {
                ExpenseOptimization::Discretionary { suggestion, potential_tax_saving, .. } => {
                    println!("  {} (~{})", suggestion, format_inr(*potential_tax_saving))
                }
                ExpenseOptimization::Housing { suggestion, tax_savings, .. } => {
                    println!("  {} (~{})", suggestion, format_inr(*tax_savings))
                }
            }
        }
    }

    println!("\nSalary structure");
    for c in &s.salary_restructuring {
        println!("  {}: {}", c.component, c.recommendation);
    }

    println!("\nAction plan");
    for a in &s.action_plan {
        println!("  {}. {} ({}): {}", a.priority, a.action, a.timeline, a.impact);
        for step in &a.steps {
            println!("     - {}", step);
        }
    }
}

pub fn print_scenarios(rows: &[ScenarioOutcome]) {
    println!(
        "{:<20} {:>12} {:>12} {:>12} {:>8}",
        "scenario", "deductions", "old regime", "new regime", "pick"
    );
    for r in rows {
        println!(
            "{:<20} {:>12} {:>12} {:>12} {:>8}",
            r.scenario,
            format_inr(r.deductions.total()),
            format_inr(r.old_regime_tax),
            format_inr(r.new_regime_tax),
            r.recommended.as_str()
        );
    }
}

pub fn print_cibil(r: &CibilAnalysisRecord) {
    println!("# CIBIL estimate\n");
    println!(
        "Predicted score {} ({:?}, {}; {})",
        r.predicted_score,
        r.score_band,
        r.score_band.range(),
        r.score_band.description()
    );
    if let Some(current) = r.current_score {
        println!("Reported score  {}", current);
    }
    println!("Transactions    {}", r.transactions_analyzed);

    println!("\nFactors");
    for (factor, f) in &r.score_factors {
        println!(
            "  {:<20} {:<10} weight {:>4}",
            factor.label(),
            f.grade.as_str(),
            format_rate(f.weight)
        );
    }

    if !r.improvement_factors.is_empty() {
        println!("\nTo improve");
        for f in &r.improvement_factors {
            println!(
                "  P{} {:<20} {:<5} up to +{} points",
                f.priority, f.label, f.current_grade, f.improvement_potential
            );
        }
    }

    for rec in &r.recommendations {
        println!("\n[{}] {}: {}", rec.priority, rec.category.label(), rec.recommendation);
        println!("  {} ({})", rec.impact, rec.timeline);
        for a in &rec.specific_actions {
            println!("  - {}", a);
        }
    }

    if !r.improvement_timeline.is_empty() {
        println!("\nTimeline");
        for m in &r.improvement_timeline {
            println!(
                "  month {:>2}: {} (+{})  {}",
                m.month,
                m.projected_score,
                m.score_increase,
                m.improvements.join("; ")
            );
        }
    }
}

pub fn print_simulation(label: &str, s: &SimulationOutcome) {
    println!(
        "{:<24} {} -> {} (+{}) over {}",
        label, s.current_score, s.new_score, s.score_change, s.timeline
    );
    for k in &s.key_factors {
        println!("  - {}", k);
    }
}

pub fn print_best(best: &BestScenario) {
    println!(
        "\n{} (+{} over {})",
        best.recommendation, best.max_improvement, best.timeline
    );
}

pub fn print_history(records: &[CibilAnalysisRecord]) {
    if records.is_empty() {
        println!("No CIBIL analyses recorded yet. Run: kosh cibil analyze --file <statement>");
        return;
    }
    for r in records {
        let reported = r.current_score.map(|s| s.to_string()).unwrap_or_else(|| "-".into());
        println!(
            "{}  predicted {:>3}  reported {:>3}  {:?}",
            r.analyzed_at.format("%Y-%m-%d %H:%M"),
            r.predicted_score,
            reported,
            r.score_band
        );
    }
}

pub fn print_summary(s: &FinancialSummary, insights: &[Insight]) {
    println!("# Summary {} to {}\n", s.start, s.end);
    println!("Income        {}", format_inr(s.total_income));
    println!("Expenses      {}", format_inr(s.total_expenses));
    println!("Net savings   {}  ({:.1}% savings rate)", format_inr(s.net_savings), s.savings_rate);
    println!("Income growth {:.1}% month over month", s.income_growth);

    println!("\nMonthly");
    for m in &s.monthly_trends {
        println!("  {}  in {:>12}  out {:>12}", m.month, format_inr(m.income), format_inr(m.expenses));
    }

    let mut categories: Vec<_> = s.category_breakdown.iter().collect();
    categories.sort_by(|a, b| b.1.total_cmp(a.1));
    println!("\nSpending by category");
    for (c, amount) in categories {
        println!("  {:<16} {}", c.as_str(), format_inr(*amount));
    }

    if !s.recurring.is_empty() {
        println!("\nRecurring");
        for r in &s.recurring {
            println!("  {:<20} ~{} x{}", r.description, format_inr(r.amount), r.occurrences);
        }
    }

    if !insights.is_empty() {
        println!("\nInsights");
        for i in insights {
            println!("  [{}] {}: {}", i.priority, i.title, i.message);
            println!("    {}", i.action);
        }
    }
}
