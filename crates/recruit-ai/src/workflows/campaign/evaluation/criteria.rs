use serde::{Deserialize, Serialize};

pub(crate) const MAX_SCORE: u16 = 100;

/// AI feedback for one rubric category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub score: u16,
    #[serde(default)]
    pub feedback: String,
}

/// One line of a human scorecard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightedCriterion {
    pub name: String,
    pub score: u16,
    /// Percentage points. Weights across a scorecard are not required to sum to 100.
    pub weight: u16,
}

impl WeightedCriterion {
    pub fn new(name: impl Into<String>, score: u16, weight: u16) -> Self {
        Self {
            name: name.into(),
            score,
            weight,
        }
    }
}

/// `round(Σ score × weight / 100)` without normalizing by the total weight.
pub fn weighted_score(criteria: &[WeightedCriterion]) -> u16 {
    let total: u64 = criteria
        .iter()
        .map(|criterion| u64::from(criterion.score) * u64::from(criterion.weight))
        .sum();
    let rounded = (total + 50) / 100;
    u16::try_from(rounded).unwrap_or(u16::MAX)
}
