use serde::{Deserialize, Serialize};
use std::fmt;

/// Qualitative grade of one behavioral factor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grade {
    Excellent,
    Good,
    Fair,
    Poor,
    Bad,
    NoData,
}

impl Grade {
    /// 0-100 score fed into the weighted prediction. Missing data is neutral.
    pub fn component_score(&self) -> f64 {
        match self {
            Grade::Excellent => 95.0,
            Grade::Good => 80.0,
            Grade::Fair => 65.0,
            Grade::Poor => 45.0,
            Grade::Bad => 25.0,
            Grade::NoData => 50.0,
        }
    }

    /// Fair, poor and bad grades leave room for improvement
    pub fn needs_improvement(&self) -> bool {
        matches!(self, Grade::Fair | Grade::Poor | Grade::Bad)
    }

    pub fn is_poor_or_bad(&self) -> bool {
        matches!(self, Grade::Poor | Grade::Bad)
    }

    /// Higher is better: grade by descending thresholds
    /// `[excellent, good, fair, poor]` (inclusive lower bounds).
    pub fn at_least(value: f64, thresholds: [f64; 4]) -> Grade {
        let [e, g, f, p] = thresholds;
        if value >= e {
            Grade::Excellent
        } else if value >= g {
            Grade::Good
        } else if value >= f {
            Grade::Fair
        } else if value >= p {
            Grade::Poor
        } else {
            Grade::Bad
        }
    }

    /// Lower is better: grade by ascending thresholds
    /// `[excellent, good, fair, poor]` (inclusive upper bounds).
    pub fn at_most(value: f64, thresholds: [f64; 4]) -> Grade {
        let [e, g, f, p] = thresholds;
        if value <= e {
            Grade::Excellent
        } else if value <= g {
            Grade::Good
        } else if value <= f {
            Grade::Fair
        } else if value <= p {
            Grade::Poor
        } else {
            Grade::Bad
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::Excellent => "excellent",
            Grade::Good => "good",
            Grade::Fair => "fair",
            Grade::Poor => "poor",
            Grade::Bad => "bad",
            Grade::NoData => "no_data",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a 300-900 score sits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreBand {
    Excellent,
    Good,
    Fair,
    Poor,
    Bad,
}

impl ScoreBand {
    pub fn of(score: u32) -> Self {
        match score {
            s if s >= 750 => ScoreBand::Excellent,
            s if s >= 700 => ScoreBand::Good,
            s if s >= 650 => ScoreBand::Fair,
            s if s >= 600 => ScoreBand::Poor,
            _ => ScoreBand::Bad,
        }
    }

    pub fn range(&self) -> &'static str {
        match self {
            ScoreBand::Excellent => "750-900",
            ScoreBand::Good => "700-749",
            ScoreBand::Fair => "650-699",
            ScoreBand::Poor => "600-649",
            ScoreBand::Bad => "300-599",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ScoreBand::Excellent => "Excellent credit, best rates available",
            ScoreBand::Good => "Good credit, competitive rates",
            ScoreBand::Fair => "Fair credit, higher rates",
            ScoreBand::Poor => "Poor credit, limited options",
            ScoreBand::Bad => "Bad credit, very limited options",
        }
    }

    /// Rough share of borrowers scoring below this band
    pub fn percentile(&self) -> u8 {
        match self {
            ScoreBand::Excellent => 85,
            ScoreBand::Good => 65,
            ScoreBand::Fair => 45,
            ScoreBand::Poor => 25,
            ScoreBand::Bad => 10,
        }
    }
}
