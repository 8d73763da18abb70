//! Transaction-derived credit score estimate

pub mod advice;
pub mod behavior;
pub mod grade;
pub mod score;

use chrono::{DateTime, Utc};
use kosh_core::Transaction;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use advice::{
    BestScenario, DetailedAction, Milestone, NamedSimulation, Recommendation, ScenarioFlag,
    SimulationOutcome, best_scenario, detailed_recommendations, improvement_timeline,
    recommendations, simulate,
};
pub use behavior::{BehaviorProfile, CreditType, analyze_behavior};
pub use grade::{Grade, ScoreBand};
pub use score::{Factor, ImprovementFactor, MAX_SCORE, MIN_SCORE, improvement_factors, predict_score};

/// One factor's contribution to the predicted score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreFactor {
    pub grade: Grade,
    pub weight: f64,
    pub component_score: f64,
}

/// Everything one analysis run produces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CibilAnalysisRecord {
    pub analyzed_at: DateTime<Utc>,
    pub transactions_analyzed: usize,
    pub current_score: Option<u32>,
    pub predicted_score: u32,
    pub score_band: ScoreBand,
    pub score_factors: BTreeMap<Factor, ScoreFactor>,
    pub behavior: BehaviorProfile,
    pub improvement_factors: Vec<ImprovementFactor>,
    pub recommendations: Vec<Recommendation>,
    pub detailed_recommendations: Vec<DetailedAction>,
    pub improvement_timeline: Vec<Milestone>,
}

pub fn score_factors(profile: &BehaviorProfile) -> BTreeMap<Factor, ScoreFactor> {
    Factor::ALL
        .iter()
        .map(|f| {
            let grade = profile.grade(*f);
            (
                *f,
                ScoreFactor {
                    grade,
                    weight: f.weight(),
                    component_score: grade.component_score(),
                },
            )
        })
        .collect()
}

/// Analyze, predict, recommend and project. The timeline starts from the
/// self-reported score when one is given, else from the prediction.
pub fn analyze_cibil(txns: &[Transaction], current_score: Option<u32>) -> CibilAnalysisRecord {
    let behavior = analyze_behavior(txns);
    let predicted_score = predict_score(&behavior);
    let recs = recommendations(&behavior);
    let start = current_score.unwrap_or(predicted_score).clamp(MIN_SCORE, MAX_SCORE);
    let timeline = improvement_timeline(start, &recs);

    tracing::info!(
        transactions = txns.len(),
        predicted_score,
        recommendations = recs.len(),
        "cibil analysis complete"
    );

    CibilAnalysisRecord {
        analyzed_at: Utc::now(),
        transactions_analyzed: txns.len(),
        current_score,
        predicted_score,
        score_band: ScoreBand::of(predicted_score),
        score_factors: score_factors(&behavior),
        improvement_factors: improvement_factors(&behavior),
        detailed_recommendations: detailed_recommendations(&behavior),
        recommendations: recs,
        improvement_timeline: timeline,
        behavior,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_history_is_neutral() {
        let record = analyze_cibil(&[], None);
        assert_eq!(record.predicted_score, 600);
        assert_eq!(record.score_band, ScoreBand::Poor);
        assert!(record.recommendations.is_empty());
        assert!(record.improvement_timeline.is_empty());
        assert!(
            record
                .score_factors
                .values()
                .all(|f| f.grade == Grade::NoData && f.component_score == 50.0)
        );
        assert_eq!(record.score_factors[&Factor::DebtToIncome].weight, 0.0);
    }

    #[test]
    fn test_record_serializes_factor_keys() {
        let record = analyze_cibil(&[], Some(710));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["current_score"], 710);
        assert!(json["score_factors"]["payment_history"].is_object());
        assert_eq!(json["score_band"], "Poor");
    }
}
