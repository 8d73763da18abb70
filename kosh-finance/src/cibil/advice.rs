//! Static recommendation tables, improvement timelines and what-if simulation

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::behavior::BehaviorProfile;
use super::grade::Grade;
use super::score::{Factor, MAX_SCORE};

/// Months at which the improvement timeline is sampled
pub const CHECKPOINTS: [u32; 6] = [3, 6, 9, 12, 18, 24];
const DEFAULT_SIMULATION_MONTHS: u32 = 12;

/// A recommendation block, one per weak factor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub category: Factor,
    pub priority: String,
    pub recommendation: String,
    pub impact: String,
    pub timeline: String,
    pub specific_actions: Vec<String>,
}

fn rec(category: Factor, priority: &str, text: &str, impact: &str, timeline: &str, actions: &[&str]) -> Recommendation {
    Recommendation {
        category,
        priority: priority.to_string(),
        recommendation: text.to_string(),
        impact: impact.to_string(),
        timeline: timeline.to_string(),
        specific_actions: actions.iter().map(|a| a.to_string()).collect(),
    }
}

/// Static text for each factor that has a recommendation block
fn recommendation_for(factor: Factor) -> Option<Recommendation> {
    let r = match factor {
        Factor::PaymentHistory => rec(
            factor,
            "High",
            "Set up automatic payments for all EMIs and credit card bills",
            "Can improve score by 50-100 points over 6-12 months",
            "6-12 months",
            &[
                "Enable auto-debit for EMI payments",
                "Set up credit card autopay for full amount",
                "Pay any overdue amounts immediately",
                "Set payment reminders 3 days before due dates",
            ],
        ),
        Factor::CreditUtilization => rec(
            factor,
            "High",
            "Reduce credit card utilization below 30%",
            "Can improve score by 30-80 points over 3-6 months",
            "3-6 months",
            &[
                "Pay down existing credit card balances",
                "Request credit limit increases",
                "Split balances across multiple cards",
                "Pay twice monthly to keep balances low",
            ],
        ),
        Factor::CreditMix => rec(
            factor,
            "Medium",
            "Diversify your credit portfolio responsibly",
            "Can improve score by 20-40 points over 12-24 months",
            "12-24 months",
            &[
                "Consider a secured credit card if new to credit",
                "Add an installment loan if you only have credit cards",
                "Maintain different types of credit accounts",
                "Avoid opening too many accounts at once",
            ],
        ),
        Factor::NewCredit => rec(
            factor,
            "Medium",
            "Limit new credit applications",
            "Can improve score by 10-25 points over 6-12 months",
            "6-12 months",
            &[
                "Avoid applying for new credit for 6-12 months",
                "Research thoroughly before applying",
                "Space applications 6+ months apart",
                "Only apply for credit you actually need",
            ],
        ),
        Factor::LengthOfHistory | Factor::DebtToIncome => return None,
    };
    Some(r)
}

fn triggers_recommendation(factor: Factor, grade: Grade) -> bool {
    match factor {
        Factor::CreditUtilization => grade.needs_improvement(),
        _ => grade.is_poor_or_bad(),
    }
}

/// One block per factor graded poor or bad (utilization also at fair), in
/// payment, utilization, mix, new-credit order
pub fn recommendations(profile: &BehaviorProfile) -> Vec<Recommendation> {
    [Factor::PaymentHistory, Factor::CreditUtilization, Factor::CreditMix, Factor::NewCredit]
        .into_iter()
        .filter(|f| triggers_recommendation(*f, profile.grade(*f)))
        .filter_map(recommendation_for)
        .collect()
}

/// When a recommendation starts to show, how many points, and the note
fn timeline_effect(factor: Factor) -> Option<(u32, u32, &'static str)> {
    match factor {
        Factor::CreditUtilization => Some((3, 15, "Credit utilization improvements visible")),
        Factor::PaymentHistory => Some((6, 20, "Payment history improvements visible")),
        Factor::NewCredit => Some((12, 10, "Reduced inquiry impact")),
        Factor::CreditMix => Some((18, 15, "Credit mix benefits visible")),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub month: u32,
    pub projected_score: u32,
    pub improvements: Vec<String>,
    pub score_increase: u32,
}

/// Projected score at each checkpoint. Every active recommendation adds its
/// delta at every checkpoint from its trigger month on; the running score is
/// capped at 900 and checkpoints with nothing active are skipped.
pub fn improvement_timeline(start_score: u32, recs: &[Recommendation]) -> Vec<Milestone> {
    let mut projected = start_score;
    let mut out = Vec::new();

    for month in CHECKPOINTS {
        let mut improvements = Vec::new();
        let mut increase = 0;
        for r in recs {
            if let Some((from, delta, note)) = timeline_effect(r.category)
                && month >= from
            {
                improvements.push(note.to_string());
                increase += delta;
            }
        }
        if improvements.is_empty() {
            continue;
        }
        projected = (projected + increase).min(MAX_SCORE);
        out.push(Milestone {
            month,
            projected_score: projected,
            improvements,
            score_increase: increase,
        });
    }
    out
}

/// A behavior change to simulate
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioFlag {
    PayOffCreditCards,
    NeverMissPayments,
    AddCreditType,
    NoNewApplications,
}

impl ScenarioFlag {
    pub const ALL: [ScenarioFlag; 4] = [
        ScenarioFlag::PayOffCreditCards,
        ScenarioFlag::NeverMissPayments,
        ScenarioFlag::AddCreditType,
        ScenarioFlag::NoNewApplications,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScenarioFlag::PayOffCreditCards => "pay_off_credit_cards",
            ScenarioFlag::NeverMissPayments => "never_miss_payments",
            ScenarioFlag::AddCreditType => "add_credit_type",
            ScenarioFlag::NoNewApplications => "no_new_applications",
        }
    }

    /// (points, months, key factor)
    fn effect(&self) -> (u32, u32, &'static str) {
        match self {
            ScenarioFlag::PayOffCreditCards => (40, 3, "Credit utilization improvement"),
            ScenarioFlag::NeverMissPayments => (60, 6, "Perfect payment history"),
            ScenarioFlag::AddCreditType => (20, 12, "Improved credit mix"),
            ScenarioFlag::NoNewApplications => (15, 6, "Reduced credit inquiries"),
        }
    }
}

impl fmt::Display for ScenarioFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScenarioFlag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().replace('-', "_");
        ScenarioFlag::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| format!("unknown scenario {:?}", s))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationOutcome {
    pub current_score: u32,
    pub new_score: u32,
    pub score_change: u32,
    pub timeline_months: u32,
    /// "N months"
    pub timeline: String,
    pub key_factors: Vec<String>,
}

/// Apply fixed deltas per flag. Duplicate flags count once; the timeline is the
/// longest triggered one, or 12 months when nothing is triggered.
pub fn simulate(current_score: u32, flags: &[ScenarioFlag]) -> SimulationOutcome {
    let mut impact = 0;
    let mut months: Option<u32> = None;
    let mut key_factors = Vec::new();

    for flag in ScenarioFlag::ALL.into_iter().filter(|f| flags.contains(f)) {
        let (points, m, factor) = flag.effect();
        impact += points;
        months = Some(months.map_or(m, |cur| cur.max(m)));
        key_factors.push(factor.to_string());
    }

    let timeline_months = months.unwrap_or(DEFAULT_SIMULATION_MONTHS);
    let new_score = (current_score + impact).min(MAX_SCORE).max(current_score.min(MAX_SCORE));
    SimulationOutcome {
        current_score,
        new_score,
        score_change: new_score.saturating_sub(current_score),
        timeline_months,
        timeline: format!("{} months", timeline_months),
        key_factors,
    }
}

/// A named simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedSimulation {
    pub scenario: String,
    pub flags: Vec<ScenarioFlag>,
    pub outcome: SimulationOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestScenario {
    pub best_scenario: String,
    pub max_improvement: u32,
    pub recommendation: String,
    pub timeline: String,
}

/// Scenario with the highest projected score; the earliest wins a tie
pub fn best_scenario(runs: &[NamedSimulation]) -> Option<BestScenario> {
    let best = runs.iter().fold(None::<&NamedSimulation>, |best, r| match best {
        Some(b) if b.outcome.new_score >= r.outcome.new_score => Some(b),
        _ => Some(r),
    })?;
    Some(BestScenario {
        best_scenario: best.scenario.clone(),
        max_improvement: best.outcome.score_change,
        recommendation: format!("Focus on {} for maximum impact", best.scenario),
        timeline: best.outcome.timeline.clone(),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedAction {
    pub factor: Factor,
    pub action: String,
    pub priority: String,
    pub timeline: String,
    pub impact: String,
}

fn detailed_actions(factor: Factor) -> &'static [(&'static str, &'static str, &'static str, &'static str)] {
    match factor {
        Factor::PaymentHistory => &[
            ("Set up automatic EMI payments", "Critical", "Immediate", "High"),
            ("Pay all overdue amounts", "Critical", "Immediate", "High"),
        ],
        Factor::CreditUtilization => &[
            ("Pay down credit card balances to below 30%", "High", "1-3 months", "High"),
            ("Request credit limit increases", "Medium", "1 month", "Medium"),
        ],
        _ => &[],
    }
}

/// Concrete actions for scored factors whose component score is below 70
pub fn detailed_recommendations(profile: &BehaviorProfile) -> Vec<DetailedAction> {
    Factor::SCORED
        .iter()
        .filter(|f| profile.grade(**f).component_score() < 70.0)
        .flat_map(|f| {
            detailed_actions(*f).iter().map(move |(action, priority, timeline, impact)| DetailedAction {
                factor: *f,
                action: action.to_string(),
                priority: priority.to_string(),
                timeline: timeline.to_string(),
                impact: impact.to_string(),
            })
        })
        .collect()
}
