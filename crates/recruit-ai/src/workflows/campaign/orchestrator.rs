use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::debug;

use super::domain::{Campaign, CampaignCandidate, HistoryEntry, MetricDelta, MetricKey};
use super::repository::{Notifier, NotifierError};
use super::scheduler::{next_action, NextAction, WaitReason};
use super::status::{self, CandidateStatus, TransitionError};
use super::steps::{BranchAction, CampaignStep, StepId, StepKind, StepType};

/// Candidate after a status change plus the counter movements it implies.
#[derive(Debug, Clone, PartialEq)]
pub struct Transitioned {
    pub candidate: CampaignCandidate,
    pub deltas: Vec<MetricDelta>,
}

/// The only way a candidate's status changes, whether a recruiter or a step asks for it.
pub fn transition(
    mut candidate: CampaignCandidate,
    next: CandidateStatus,
    note: &str,
    now: DateTime<Utc>,
) -> Result<Transitioned, TransitionError> {
    status::validate(candidate.status, next, note)?;

    let previous = candidate.status;
    candidate.status = next;

    if next.is_final_decision() {
        candidate.final_decision_made = true;
    } else if next == CandidateStatus::UnderReview
        && matches!(previous, CandidateStatus::Rejected | CandidateStatus::Withdrawn)
    {
        candidate.final_decision_made = false;
    }

    candidate.history.insert(
        0,
        HistoryEntry {
            timestamp: now,
            status: next,
            note: note.trim().to_string(),
        },
    );

    let deltas = MetricKey::for_status(previous)
        .map(MetricDelta::decrement)
        .into_iter()
        .chain(MetricKey::for_status(next).map(MetricDelta::increment))
        .collect();

    Ok(Transitioned { candidate, deltas })
}

/// Observable consequence of a tick, in the order it happened.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum TickEffect {
    Delivered {
        step: StepId,
        step_type: StepType,
    },
    StatusChanged {
        from: CandidateStatus,
        to: CandidateStatus,
        note: String,
    },
    Metric(MetricDelta),
    Jumped {
        from: usize,
        to: usize,
    },
    /// The step was passed over because the candidate's status already moved beyond it.
    Skipped {
        step: StepId,
        step_type: StepType,
    },
}

/// Result of one candidate tick. Nothing has been persisted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    pub candidate: CampaignCandidate,
    pub effects: Vec<TickEffect>,
    pub waited: Option<WaitReason>,
}

impl TickOutcome {
    /// Only waits leave the candidate as it was; every other outcome must be committed.
    pub fn is_noop(&self) -> bool {
        self.waited.is_some()
    }

    pub fn metric_deltas(&self) -> Vec<MetricDelta> {
        self.effects
            .iter()
            .filter_map(|effect| match effect {
                TickEffect::Metric(delta) => Some(*delta),
                _ => None,
            })
            .collect()
    }

    pub fn status_changed(&self) -> bool {
        self.effects
            .iter()
            .any(|effect| matches!(effect, TickEffect::StatusChanged { .. }))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TickError {
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("step delivery failed: {0}")]
    Notifier(#[from] NotifierError),
    #[error("branch on step {index} points at a step that does not exist")]
    UnresolvedTarget { index: usize },
}

/// Advances one candidate by at most one step.
///
/// Delivery happens before any mutation, so a failed notifier leaves the candidate untouched
/// and the same step is attempted on the next tick.
pub fn tick<N>(
    campaign: &Campaign,
    candidate: &CampaignCandidate,
    now: DateTime<Utc>,
    notifier: &N,
) -> Result<TickOutcome, TickError>
where
    N: Notifier + ?Sized,
{
    match next_action(campaign, candidate, now) {
        NextAction::Wait { reason, retry_at } => {
            debug!(
                candidate_id = %candidate.id.0,
                reason = reason.label(),
                retry_at = ?retry_at,
                "candidate waiting"
            );
            Ok(TickOutcome {
                candidate: candidate.clone(),
                effects: Vec::new(),
                waited: Some(reason),
            })
        }
        NextAction::Execute { index, step } => {
            execute(candidate, &step, Some(index + 1), now, notifier)
        }
        NextAction::Branch {
            index,
            action: BranchAction::JumpTo(target),
        } => {
            let destination = campaign
                .resolve_target(target, index)
                .ok_or(TickError::UnresolvedTarget { index })?;
            let mut updated = candidate.clone();
            updated.current_step = destination;
            debug!(
                candidate_id = %candidate.id.0,
                from = index,
                to = destination,
                "candidate branched"
            );
            Ok(TickOutcome {
                candidate: updated,
                effects: vec![TickEffect::Jumped {
                    from: index,
                    to: destination,
                }],
                waited: None,
            })
        }
        NextAction::Branch {
            index,
            action: BranchAction::Run(kind),
        } => {
            let current = campaign
                .steps
                .get(index)
                .ok_or(TickError::UnresolvedTarget { index })?;
            let inline = CampaignStep {
                id: StepId(format!("{}:inline", current.id.0)),
                order: current.order,
                delay_days: 0,
                kind,
                conditions: Vec::new(),
                conditional_actions: Vec::new(),
            };
            execute(candidate, &inline, None, now, notifier)
        }
    }
}

fn execute<N>(
    candidate: &CampaignCandidate,
    step: &CampaignStep,
    advance_to: Option<usize>,
    now: DateTime<Utc>,
    notifier: &N,
) -> Result<TickOutcome, TickError>
where
    N: Notifier + ?Sized,
{
    let planned = match planned_transition(candidate, &step.kind, now)? {
        Plan::Keep => None,
        Plan::Move(target, note) => Some((target, note)),
        Plan::Superseded => {
            debug!(
                candidate_id = %candidate.id.0,
                step = %step.id.0,
                status = candidate.status.label(),
                "step superseded by candidate status"
            );
            let mut updated = candidate.clone();
            if let Some(next_step) = advance_to {
                updated.current_step = next_step;
            }
            return Ok(TickOutcome {
                candidate: updated,
                effects: vec![TickEffect::Skipped {
                    step: step.id.clone(),
                    step_type: step.step_type(),
                }],
                waited: None,
            });
        }
    };

    if step.kind.requires_delivery() {
        notifier.deliver(step, candidate)?;
    }

    let mut effects = Vec::new();
    let mut updated = candidate.clone();

    if step.kind.requires_delivery() {
        effects.push(TickEffect::Delivered {
            step: step.id.clone(),
            step_type: step.step_type(),
        });
    }
    if let Some(next_step) = advance_to {
        updated.current_step = next_step;
    }
    updated.last_interaction = Some(now);

    if let Some((target, note)) = planned {
        let from = updated.status;
        let transitioned = transition(updated, target, &note, now)?;
        updated = transitioned.candidate;
        effects.push(TickEffect::StatusChanged {
            from,
            to: target,
            note,
        });
        effects.extend(transitioned.deltas.into_iter().map(TickEffect::Metric));
    }

    if step.kind.is_outreach() {
        effects.push(TickEffect::Metric(MetricDelta::increment(MetricKey::Sent)));
    }

    debug!(
        candidate_id = %candidate.id.0,
        step = %step.id.0,
        step_type = %step.step_type(),
        "step executed"
    );

    Ok(TickOutcome {
        candidate: updated,
        effects,
        waited: None,
    })
}

/// What a step does to the candidate's status.
enum Plan {
    Keep,
    Move(CandidateStatus, String),
    Superseded,
}

/// Status change a step will apply, checked before anything is delivered.
fn planned_transition(
    candidate: &CampaignCandidate,
    kind: &StepKind,
    now: DateTime<Utc>,
) -> Result<Plan, TransitionError> {
    let Some(target) = kind.implied_status() else {
        return Ok(Plan::Keep);
    };
    if target == candidate.status {
        return Ok(Plan::Keep);
    }
    if !candidate.status.can_transition_to(target) {
        if kind.implied_status_is_soft() {
            return Ok(Plan::Keep);
        }
        if kind.is_superseded_by(candidate.status) {
            return Ok(Plan::Superseded);
        }
    }

    let note = automatic_note(kind, now);
    status::validate(candidate.status, target, &note)?;
    Ok(Plan::Move(target, note))
}

fn automatic_note(kind: &StepKind, now: DateTime<Utc>) -> String {
    match kind {
        StepKind::ScheduleInterview(config) => {
            let slot = now + Duration::days(i64::from(config.days_ahead));
            format!("Interview scheduled for {}", slot.format("%Y-%m-%d"))
        }
        StepKind::SendSelection(_) => "Selection message sent".to_string(),
        StepKind::SendRejection(_) => "Rejection message sent".to_string(),
        StepKind::ReviewRequired(config) => match &config.instructions {
            Some(instructions) if !instructions.trim().is_empty() => {
                format!("Review requested: {}", instructions.trim())
            }
            _ => "Review requested".to_string(),
        },
        StepKind::StatusChange(config) => match &config.note {
            Some(note) if !note.trim().is_empty() => note.trim().to_string(),
            _ => format!("Moved to {} by campaign step", config.target_status),
        },
        other => format!("Campaign step {}", other.step_type()),
    }
}
