mod criteria;

pub use criteria::{weighted_score, CategoryScore, WeightedCriterion};

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::CampaignCandidate;
use super::status::CandidateStatus;
use criteria::MAX_SCORE;

/// Who produced an evaluation and the structured detail behind its score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EvaluationOrigin {
    Ai {
        #[serde(default)]
        criteria: BTreeMap<String, CategoryScore>,
    },
    Human {
        #[serde(default)]
        evaluator: Option<String>,
        #[serde(default)]
        criteria: Vec<WeightedCriterion>,
    },
}

/// One AI or human assessment of a candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationEntry {
    #[serde(flatten)]
    pub origin: EvaluationOrigin,
    pub score: u16,
    #[serde(default)]
    pub notes: String,
    pub timestamp: DateTime<Utc>,
}

impl EvaluationEntry {
    pub fn ai(
        score: u16,
        criteria: BTreeMap<String, CategoryScore>,
        notes: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, EvaluationError> {
        let entry = Self {
            origin: EvaluationOrigin::Ai { criteria },
            score,
            notes: notes.into(),
            timestamp,
        };
        entry.validate()?;
        Ok(entry)
    }

    /// Human scorecard; the overall score is the literal weighted sum of the criteria.
    pub fn human(
        evaluator: Option<String>,
        criteria: Vec<WeightedCriterion>,
        notes: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, EvaluationError> {
        let entry = Self {
            score: weighted_score(&criteria),
            origin: EvaluationOrigin::Human {
                evaluator,
                criteria,
            },
            notes: notes.into(),
            timestamp,
        };
        entry.validate()?;
        Ok(entry)
    }

    /// Human assessment given as a single score with no scorecard.
    pub fn human_scored(
        evaluator: Option<String>,
        score: u16,
        notes: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, EvaluationError> {
        let entry = Self {
            origin: EvaluationOrigin::Human {
                evaluator,
                criteria: Vec::new(),
            },
            score,
            notes: notes.into(),
            timestamp,
        };
        entry.validate()?;
        Ok(entry)
    }

    pub fn is_human(&self) -> bool {
        matches!(self.origin, EvaluationOrigin::Human { .. })
    }

    /// Explicit scores must sit in 0..=100. A computed human score is the weighted sum and is
    /// not bounded, so only a scorecard-free human score is range checked.
    pub fn validate(&self) -> Result<(), EvaluationError> {
        match &self.origin {
            EvaluationOrigin::Ai { criteria } => {
                check_range(None, self.score)?;
                for (category, detail) in criteria {
                    check_range(Some(category), detail.score)?;
                }
            }
            EvaluationOrigin::Human { criteria, .. } if criteria.is_empty() => {
                check_range(None, self.score)?;
            }
            EvaluationOrigin::Human { criteria, .. } => {
                for criterion in criteria {
                    check_range(Some(&criterion.name), criterion.score)?;
                }
                let expected = weighted_score(criteria);
                if self.score != expected {
                    return Err(EvaluationError::ScoreMismatch {
                        recorded: self.score,
                        expected,
                    });
                }
            }
        }
        Ok(())
    }
}

fn check_range(criterion: Option<&String>, score: u16) -> Result<(), EvaluationError> {
    if score > MAX_SCORE {
        return Err(EvaluationError::ScoreOutOfRange {
            criterion: criterion.cloned(),
            score,
        });
    }
    Ok(())
}

/// Folds an evaluation into the candidate.
///
/// The entry is prepended to the history and becomes the current score. The first human
/// entry after a form submission scores the form, and the first one after the interview
/// marks the interview as evaluated; later human entries only append.
pub fn record_evaluation(
    mut candidate: CampaignCandidate,
    entry: EvaluationEntry,
) -> Result<CampaignCandidate, EvaluationError> {
    entry.validate()?;

    if entry.is_human() {
        if candidate.form_submitted && !candidate.form_evaluated {
            candidate.form_score = Some(entry.score);
            candidate.form_evaluated = true;
        }
        if candidate.status == CandidateStatus::InterviewCompleted
            && !candidate.interview_evaluated
        {
            candidate.interview_evaluated = true;
        }
        candidate.append_review_note(&entry.notes);
    }

    candidate.current_score = Some(entry.score);
    candidate.evaluation_history.insert(0, entry);
    Ok(candidate)
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvaluationError {
    #[error("score {score} is outside 0..=100{}", criterion_suffix(.criterion))]
    ScoreOutOfRange {
        criterion: Option<String>,
        score: u16,
    },
    #[error("human score {recorded} does not match its scorecard ({expected})")]
    ScoreMismatch { recorded: u16, expected: u16 },
}

fn criterion_suffix(criterion: &Option<String>) -> String {
    criterion
        .as_ref()
        .map(|name| format!(" for '{name}'"))
        .unwrap_or_default()
}
