use chrono::{DateTime, Utc};

use super::domain::{Campaign, CampaignCandidate};
use super::steps::{ConditionOperator, ConditionalAction, StepCondition};

/// Reference point for delays, timeouts and `time_elapsed` conditions.
pub fn anchor(candidate: &CampaignCandidate, campaign: &Campaign) -> Option<DateTime<Utc>> {
    candidate.last_interaction.or(campaign.activated_at)
}

/// Whole days since the anchor; zero when neither the candidate nor the campaign has one.
pub fn days_since_anchor(
    candidate: &CampaignCandidate,
    campaign: &Campaign,
    now: DateTime<Utc>,
) -> i64 {
    anchor(candidate, campaign)
        .map(|at| (now - at).num_days())
        .unwrap_or(0)
}

/// Conjunction of `conditions`. An empty list always holds.
pub fn satisfied(
    conditions: &[StepCondition],
    candidate: &CampaignCandidate,
    campaign: &Campaign,
    now: DateTime<Utc>,
) -> bool {
    conditions
        .iter()
        .all(|condition| holds(condition, candidate, campaign, now))
}

/// First action in list order whose guard holds. Guardless actions never fire.
pub fn first_satisfied_action<'a, I>(
    actions: I,
    candidate: &CampaignCandidate,
    campaign: &Campaign,
    now: DateTime<Utc>,
) -> Option<&'a ConditionalAction>
where
    I: IntoIterator<Item = &'a ConditionalAction>,
{
    actions
        .into_iter()
        .find(|action| action.has_guard() && satisfied(&action.guard(), candidate, campaign, now))
}

fn holds(
    condition: &StepCondition,
    candidate: &CampaignCandidate,
    campaign: &Campaign,
    now: DateTime<Utc>,
) -> bool {
    match condition {
        StepCondition::Status { operator, value } => match operator {
            ConditionOperator::Equals => candidate.status == *value,
            ConditionOperator::NotEquals => candidate.status != *value,
            // statuses carry no numeric rank
            ConditionOperator::GreaterThan | ConditionOperator::LessThan => false,
        },
        StepCondition::FormScore { operator, value } => {
            operator.compare(candidate.form_score.unwrap_or(0), *value)
        }
        StepCondition::TimeElapsed { operator, value } => {
            operator.compare(days_since_anchor(candidate, campaign, now), *value)
        }
    }
}
