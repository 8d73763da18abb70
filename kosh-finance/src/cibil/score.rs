//! Weighted score prediction and improvement factors

use serde::{Deserialize, Serialize};

use super::behavior::BehaviorProfile;
use super::grade::Grade;

pub const MIN_SCORE: u32 = 300;
pub const MAX_SCORE: u32 = 900;

/// A graded factor of the behavior profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Factor {
    PaymentHistory,
    CreditUtilization,
    CreditMix,
    NewCredit,
    LengthOfHistory,
    DebtToIncome,
}

impl Factor {
    /// The five factors that make up the score, in weight order
    pub const SCORED: [Factor; 5] = [
        Factor::PaymentHistory,
        Factor::CreditUtilization,
        Factor::CreditMix,
        Factor::NewCredit,
        Factor::LengthOfHistory,
    ];

    pub const ALL: [Factor; 6] = [
        Factor::PaymentHistory,
        Factor::CreditUtilization,
        Factor::CreditMix,
        Factor::NewCredit,
        Factor::LengthOfHistory,
        Factor::DebtToIncome,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Factor::PaymentHistory => "Payment History",
            Factor::CreditUtilization => "Credit Utilization",
            Factor::CreditMix => "Credit Mix",
            Factor::NewCredit => "New Credit",
            Factor::LengthOfHistory => "Length Of History",
            Factor::DebtToIncome => "Debt To Income",
        }
    }

    /// Share of the predicted score; debt-to-income is informational only
    pub fn weight(&self) -> f64 {
        match self {
            Factor::PaymentHistory => 0.35,
            Factor::CreditUtilization => 0.30,
            Factor::CreditMix => 0.15,
            Factor::NewCredit => 0.10,
            Factor::LengthOfHistory => 0.10,
            Factor::DebtToIncome => 0.0,
        }
    }

    /// Points a grade could recover if brought to excellent
    pub fn improvement_potential(&self, grade: Grade) -> u32 {
        let table: [u32; 5] = match self {
            Factor::PaymentHistory => [0, 20, 40, 80, 120],
            Factor::CreditUtilization => [0, 15, 30, 60, 100],
            Factor::CreditMix => [0, 10, 20, 40, 60],
            Factor::NewCredit => [0, 5, 15, 25, 40],
            Factor::LengthOfHistory => [0, 5, 10, 20, 30],
            Factor::DebtToIncome => [0; 5],
        };
        match grade {
            Grade::Excellent => table[0],
            Grade::Good => table[1],
            Grade::Fair => table[2],
            Grade::Poor => table[3],
            Grade::Bad => table[4],
            Grade::NoData => 0,
        }
    }

    /// 1 is most urgent, 5 least
    pub fn improvement_priority(&self, grade: Grade) -> u8 {
        let (bad, poor, fair) = match self {
            Factor::PaymentHistory => (1, 1, 2),
            Factor::CreditUtilization => (1, 2, 3),
            Factor::CreditMix => (3, 4, 5),
            Factor::NewCredit => (2, 3, 4),
            Factor::LengthOfHistory => (4, 5, 5),
            Factor::DebtToIncome => (5, 5, 5),
        };
        match grade {
            Grade::Bad => bad,
            Grade::Poor => poor,
            Grade::Fair => fair,
            _ => 5,
        }
    }
}

impl BehaviorProfile {
    pub fn grade(&self, factor: Factor) -> Grade {
        match factor {
            Factor::PaymentHistory => self.payment_consistency.grade,
            Factor::CreditUtilization => self.credit_utilization.grade,
            Factor::CreditMix => self.credit_diversity.grade,
            Factor::NewCredit => self.new_credit_inquiries.grade,
            Factor::LengthOfHistory => self.account_age.grade,
            Factor::DebtToIncome => self.debt_to_income.grade,
        }
    }
}

/// 300 + weighted component percentage x 6, clamped to [300, 900]
pub fn predict_score(profile: &BehaviorProfile) -> u32 {
    let weighted: f64 = Factor::SCORED
        .iter()
        .map(|f| profile.grade(*f).component_score() * f.weight())
        .sum();
    let raw = MIN_SCORE as f64 + weighted * (MAX_SCORE - MIN_SCORE) as f64 / 100.0;
    // weights are not exact in binary; keep 599.9999... from truncating to 599
    ((raw + 1e-9).trunc() as u32).clamp(MIN_SCORE, MAX_SCORE)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImprovementFactor {
    pub factor: Factor,
    pub label: String,
    pub current_grade: Grade,
    pub improvement_potential: u32,
    pub priority: u8,
}

/// Fair/poor/bad factors, most urgent first, then largest potential
pub fn improvement_factors(profile: &BehaviorProfile) -> Vec<ImprovementFactor> {
    let mut out: Vec<ImprovementFactor> = Factor::ALL
        .iter()
        .filter_map(|f| {
            let grade = profile.grade(*f);
            grade.needs_improvement().then(|| ImprovementFactor {
                factor: *f,
                label: f.label().to_string(),
                current_grade: grade,
                improvement_potential: f.improvement_potential(grade),
                priority: f.improvement_priority(grade),
            })
        })
        .collect();
    out.sort_by_key(|f| (f.priority, std::cmp::Reverse(f.improvement_potential)));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cibil::behavior::analyze_behavior;

    #[test]
    fn test_all_no_data_predicts_600() {
        let profile = analyze_behavior(&[]);
        assert_eq!(predict_score(&profile), 600);
    }

    #[test]
    fn test_prediction_bounds() {
        let mut p = analyze_behavior(&[]);
        p.payment_consistency.grade = Grade::Excellent;
        p.credit_utilization.grade = Grade::Excellent;
        p.credit_diversity.grade = Grade::Excellent;
        p.new_credit_inquiries.grade = Grade::Excellent;
        p.account_age.grade = Grade::Excellent;
        // 95% of the range
        assert_eq!(predict_score(&p), 870);

        p.payment_consistency.grade = Grade::Bad;
        p.credit_utilization.grade = Grade::Bad;
        p.credit_diversity.grade = Grade::Bad;
        p.new_credit_inquiries.grade = Grade::Bad;
        p.account_age.grade = Grade::Bad;
        assert_eq!(predict_score(&p), 450);
    }

    #[test]
    fn test_debt_to_income_does_not_move_score() {
        let mut p = analyze_behavior(&[]);
        let before = predict_score(&p);
        p.debt_to_income.grade = Grade::Bad;
        assert_eq!(predict_score(&p), before);
    }

    #[test]
    fn test_improvement_factor_order() {
        let mut p = analyze_behavior(&[]);
        p.credit_diversity.grade = Grade::Bad; // priority 3, potential 60
        p.credit_utilization.grade = Grade::Poor; // priority 2, potential 60
        p.payment_consistency.grade = Grade::Fair; // priority 2, potential 40
        p.account_age.grade = Grade::Good; // not listed

        let factors = improvement_factors(&p);
        let order: Vec<Factor> = factors.iter().map(|f| f.factor).collect();
        assert_eq!(
            order,
            vec![Factor::CreditUtilization, Factor::PaymentHistory, Factor::CreditMix]
        );
        assert_eq!(factors[0].label, "Credit Utilization");
    }
}
