//! Per-section totals of tax-relevant spending

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::transaction::{TaxSection, Transaction, deduction_limit};

/// What the transactions alone could claim under one section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionSuggestion {
    pub section: TaxSection,
    pub total_amount: f64,
    pub transaction_count: usize,
    /// `None` for uncapped sections
    pub eligible_limit: Option<f64>,
    pub potential_deduction: f64,
}

/// Group tax-relevant transactions by section. Only debits add to the total,
/// but every tagged transaction is counted.
pub fn tax_deduction_suggestions(txns: &[Transaction]) -> Vec<SectionSuggestion> {
    let mut groups: BTreeMap<TaxSection, (f64, usize)> = BTreeMap::new();

    for t in txns.iter().filter(|t| t.tax_relevant) {
        let Some(section) = t.tax_section else { continue };
        let entry = groups.entry(section).or_insert((0.0, 0));
        if t.is_debit() {
            entry.0 += t.amount;
        }
        entry.1 += 1;
    }

    groups
        .into_iter()
        .map(|(section, (total, count))| {
            let limit = deduction_limit(section);
            SectionSuggestion {
                section,
                total_amount: total,
                transaction_count: count,
                eligible_limit: limit,
                potential_deduction: limit.map_or(total, |l| total.min(l)),
            }
        })
        .collect()
}
