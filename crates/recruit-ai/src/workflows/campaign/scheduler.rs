use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::conditions::{anchor, days_since_anchor, first_satisfied_action, satisfied};
use super::domain::{Campaign, CampaignCandidate};
use super::steps::{BranchAction, CampaignStep, ConditionalAction, StepKind};

/// What the engine should do for a candidate right now.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NextAction {
    Wait {
        reason: WaitReason,
        /// Earliest instant worth re-polling; `None` when only an external event helps.
        retry_at: Option<DateTime<Utc>>,
    },
    Execute {
        index: usize,
        step: CampaignStep,
    },
    /// A conditional action on step `index` replaces that step's effect.
    Branch {
        index: usize,
        action: BranchAction,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitReason {
    CandidateClosed,
    SequenceComplete,
    Delay,
    ConditionsUnmet,
    AwaitingStatus,
}

impl WaitReason {
    pub const fn label(self) -> &'static str {
        match self {
            Self::CandidateClosed => "candidate_closed",
            Self::SequenceComplete => "sequence_complete",
            Self::Delay => "delay",
            Self::ConditionsUnmet => "conditions_unmet",
            Self::AwaitingStatus => "awaiting_status",
        }
    }
}

/// Decides the candidate's next move without mutating anything.
pub fn next_action(
    campaign: &Campaign,
    candidate: &CampaignCandidate,
    now: DateTime<Utc>,
) -> NextAction {
    if candidate.is_withdrawn() {
        return wait(WaitReason::CandidateClosed, None);
    }

    resolve(campaign, candidate, candidate.current_step, now)
}

fn resolve(
    campaign: &Campaign,
    candidate: &CampaignCandidate,
    index: usize,
    now: DateTime<Utc>,
) -> NextAction {
    let Some(step) = campaign.steps.get(index) else {
        return wait(WaitReason::SequenceComplete, None);
    };

    let applicable = step
        .conditional_actions
        .iter()
        .filter(|action| is_applicable(campaign, candidate, index, action));
    if let Some(action) = first_satisfied_action(applicable, candidate, campaign, now) {
        return NextAction::Branch {
            index,
            action: action.action.clone(),
        };
    }

    let delay = Duration::days(i64::from(step.delay_days));
    if let Some(due) = anchor(candidate, campaign).map(|at| at + delay) {
        if now < due {
            return wait(WaitReason::Delay, Some(due));
        }
    }

    if !satisfied(&step.conditions, candidate, campaign, now) {
        return wait(WaitReason::ConditionsUnmet, Some(now + delay));
    }

    if let StepKind::WaitForStatus(config) = &step.kind {
        let reached = candidate.status == config.target_status;
        let timed_out =
            days_since_anchor(candidate, campaign, now) >= i64::from(config.timeout_days);

        if !reached && !timed_out {
            let retry_at = anchor(candidate, campaign)
                .map(|at| at + Duration::days(i64::from(config.timeout_days)));
            return wait(WaitReason::AwaitingStatus, retry_at);
        }

        // a resolved wait hands over to the step behind it
        if index + 1 < campaign.steps.len() {
            return resolve(campaign, candidate, index + 1, now);
        }
    }

    NextAction::Execute {
        index,
        step: step.clone(),
    }
}

/// Inline runs whose status already holds, or that the candidate has moved past, do not fire
/// again; jumps must land somewhere new.
fn is_applicable(
    campaign: &Campaign,
    candidate: &CampaignCandidate,
    index: usize,
    action: &ConditionalAction,
) -> bool {
    match &action.action {
        BranchAction::Run(kind) => {
            kind.implied_status() != Some(candidate.status)
                && !kind.is_superseded_by(candidate.status)
        }
        BranchAction::JumpTo(target) => campaign
            .resolve_target(*target, index)
            .is_some_and(|destination| destination != index),
    }
}

fn wait(reason: WaitReason, retry_at: Option<DateTime<Utc>>) -> NextAction {
    NextAction::Wait { reason, retry_at }
}
