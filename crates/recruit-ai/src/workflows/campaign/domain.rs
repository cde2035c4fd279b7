use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::evaluation::EvaluationEntry;
use super::status::CandidateStatus;
use super::steps::{BranchAction, CampaignStep, StepCondition, StepTarget};

/// Identifier wrapper for campaigns.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CampaignId(pub String);

/// Identifier wrapper for a candidate's membership in one campaign.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CandidateId(pub String);

/// Identifier of the global candidate profile shared across campaigns.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProfileId(pub String);

/// Snapshot of the global profile the campaign works from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub id: ProfileId,
    pub full_name: String,
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub linkedin_url: Option<String>,
}

/// One line of the candidate audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub status: CandidateStatus,
    pub note: String,
}

/// A candidate's progress through one campaign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignCandidate {
    pub id: CandidateId,
    pub profile: CandidateProfile,
    pub status: CandidateStatus,
    pub current_step: usize,
    #[serde(default)]
    pub cv_reviewed: bool,
    #[serde(default)]
    pub form_submitted: bool,
    #[serde(default)]
    pub form_evaluated: bool,
    #[serde(default)]
    pub interview_evaluated: bool,
    #[serde(default)]
    pub final_decision_made: bool,
    #[serde(default)]
    pub form_score: Option<u16>,
    #[serde(default)]
    pub current_score: Option<u16>,
    #[serde(default)]
    pub review_notes: String,
    #[serde(default)]
    pub last_interaction: Option<DateTime<Utc>>,
    pub attached_at: DateTime<Utc>,
    /// Newest first. Never truncated or reordered.
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    /// Newest first.
    #[serde(default)]
    pub evaluation_history: Vec<EvaluationEntry>,
    /// Optimistic concurrency token bumped by every commit.
    #[serde(default)]
    pub version: u64,
}

impl CampaignCandidate {
    pub fn attach(id: CandidateId, profile: CandidateProfile, now: DateTime<Utc>) -> Self {
        Self {
            id,
            profile,
            status: CandidateStatus::New,
            current_step: 0,
            cv_reviewed: false,
            form_submitted: false,
            form_evaluated: false,
            interview_evaluated: false,
            final_decision_made: false,
            form_score: None,
            current_score: None,
            review_notes: String::new(),
            last_interaction: None,
            attached_at: now,
            history: Vec::new(),
            evaluation_history: Vec::new(),
            version: 0,
        }
    }

    /// Withdrawn is the soft delete; everything else can still be ticked.
    pub fn is_withdrawn(&self) -> bool {
        self.status == CandidateStatus::Withdrawn
    }

    pub fn append_review_note(&mut self, note: &str) {
        let note = note.trim();
        if note.is_empty() {
            return;
        }
        if !self.review_notes.is_empty() {
            self.review_notes.push('\n');
        }
        self.review_notes.push_str(note);
    }

    pub fn latest_history(&self) -> Option<&HistoryEntry> {
        self.history.first()
    }
}

/// Campaign lifecycle; only active campaigns are ticked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignLifecycle {
    Draft,
    Active,
    Paused,
    Completed,
}

impl CampaignLifecycle {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Completed => "completed",
        }
    }

    pub fn can_move_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Draft, Self::Active)
                | (Self::Active, Self::Paused)
                | (Self::Paused, Self::Active)
                | (Self::Active, Self::Completed)
                | (Self::Paused, Self::Completed)
        )
    }
}

impl std::fmt::Display for CampaignLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Counters kept on the campaign document. Incremented, never derived on read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignMetrics {
    pub sent: i64,
    pub opened: i64,
    pub responded: i64,
    pub applied: i64,
    pub interviews_scheduled: i64,
    pub selected: i64,
    pub rejected: i64,
}

impl CampaignMetrics {
    pub fn apply(&mut self, delta: &MetricDelta) {
        let counter = match delta.metric {
            MetricKey::Sent => &mut self.sent,
            MetricKey::Opened => &mut self.opened,
            MetricKey::Responded => &mut self.responded,
            MetricKey::Applied => &mut self.applied,
            MetricKey::InterviewsScheduled => &mut self.interviews_scheduled,
            MetricKey::Selected => &mut self.selected,
            MetricKey::Rejected => &mut self.rejected,
        };
        *counter += delta.delta;
    }

    pub fn get(&self, metric: MetricKey) -> i64 {
        match metric {
            MetricKey::Sent => self.sent,
            MetricKey::Opened => self.opened,
            MetricKey::Responded => self.responded,
            MetricKey::Applied => self.applied,
            MetricKey::InterviewsScheduled => self.interviews_scheduled,
            MetricKey::Selected => self.selected,
            MetricKey::Rejected => self.rejected,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKey {
    Sent,
    Opened,
    Responded,
    Applied,
    InterviewsScheduled,
    Selected,
    Rejected,
}

impl MetricKey {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Opened => "opened",
            Self::Responded => "responded",
            Self::Applied => "applied",
            Self::InterviewsScheduled => "interviews_scheduled",
            Self::Selected => "selected",
            Self::Rejected => "rejected",
        }
    }

    /// Counter mirrored one-to-one by a candidate status.
    pub const fn for_status(status: CandidateStatus) -> Option<Self> {
        match status {
            CandidateStatus::InterviewScheduled => Some(Self::InterviewsScheduled),
            CandidateStatus::Selected => Some(Self::Selected),
            CandidateStatus::Rejected => Some(Self::Rejected),
            _ => None,
        }
    }
}

/// Event forwarded to the metrics sink and folded into the campaign counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricDelta {
    pub metric: MetricKey,
    pub delta: i64,
}

impl MetricDelta {
    pub const fn increment(metric: MetricKey) -> Self {
        Self { metric, delta: 1 }
    }

    pub const fn decrement(metric: MetricKey) -> Self {
        Self { metric, delta: -1 }
    }
}

/// Status-mirrored counter that no longer matches the candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricDrift {
    pub metric: MetricKey,
    pub recorded: i64,
    pub expected: i64,
}

/// A configured recruitment sequence and the candidates running through it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: CampaignId,
    pub name: String,
    pub status: CampaignLifecycle,
    /// Sorted by `order`.
    pub steps: Vec<CampaignStep>,
    #[serde(default)]
    pub candidates: Vec<CampaignCandidate>,
    #[serde(default)]
    pub metrics: CampaignMetrics,
    #[serde(default)]
    pub activated_at: Option<DateTime<Utc>>,
}

impl Campaign {
    /// Builds a draft campaign, sorting steps by order and validating their guards and targets.
    pub fn new(
        id: CampaignId,
        name: impl Into<String>,
        mut steps: Vec<CampaignStep>,
    ) -> Result<Self, CampaignError> {
        steps.sort_by_key(|step| step.order);
        validate_steps(&steps)?;

        Ok(Self {
            id,
            name: name.into(),
            status: CampaignLifecycle::Draft,
            steps,
            candidates: Vec::new(),
            metrics: CampaignMetrics::default(),
            activated_at: None,
        })
    }

    pub fn is_active(&self) -> bool {
        self.status == CampaignLifecycle::Active
    }

    pub fn candidate(&self, id: &CandidateId) -> Option<&CampaignCandidate> {
        self.candidates.iter().find(|candidate| &candidate.id == id)
    }

    /// Resolves a branch target to a step index. `Complete` maps to `steps.len()`.
    ///
    /// Kind targets prefer the first matching step after `from`, then any matching step.
    pub fn resolve_target(&self, target: StepTarget, from: usize) -> Option<usize> {
        match target {
            StepTarget::Order(order) => self.steps.iter().position(|step| step.order == order),
            StepTarget::Kind(kind) => self
                .steps
                .iter()
                .enumerate()
                .skip(from + 1)
                .find(|(_, step)| step.step_type() == kind)
                .map(|(index, _)| index)
                .or_else(|| self.steps.iter().position(|step| step.step_type() == kind)),
            StepTarget::Complete => Some(self.steps.len()),
        }
    }

    /// Counter values the status-mirrored metrics must hold given the candidates.
    pub fn expected_status_counts(&self) -> BTreeMap<MetricKey, i64> {
        let mut counts = BTreeMap::from([
            (MetricKey::InterviewsScheduled, 0),
            (MetricKey::Selected, 0),
            (MetricKey::Rejected, 0),
        ]);

        for candidate in &self.candidates {
            if let Some(metric) = MetricKey::for_status(candidate.status) {
                *counts.entry(metric).or_default() += 1;
            }
        }

        counts
    }

    /// Checksum of the status-mirrored counters against the candidate statuses.
    pub fn metric_drift(&self) -> Vec<MetricDrift> {
        self.expected_status_counts()
            .into_iter()
            .filter_map(|(metric, expected)| {
                let recorded = self.metrics.get(metric);
                (recorded != expected).then_some(MetricDrift {
                    metric,
                    recorded,
                    expected,
                })
            })
            .collect()
    }
}

fn validate_steps(steps: &[CampaignStep]) -> Result<(), CampaignError> {
    let mut orders = HashSet::new();
    for step in steps {
        if !orders.insert(step.order) {
            return Err(CampaignError::DuplicateStepOrder(step.order));
        }
    }

    for step in steps {
        validate_conditions(step.order, &step.conditions)?;

        for action in &step.conditional_actions {
            if !action.has_guard() {
                return Err(CampaignError::UnguardedAction { order: step.order });
            }
            validate_conditions(step.order, &action.conditions)?;

            match &action.action {
                BranchAction::JumpTo(StepTarget::Order(order)) => {
                    if !orders.contains(order) {
                        return Err(CampaignError::UnknownJumpTarget { order: step.order });
                    }
                }
                BranchAction::JumpTo(StepTarget::Kind(kind)) => {
                    if !steps.iter().any(|candidate| candidate.step_type() == *kind) {
                        return Err(CampaignError::UnknownJumpTarget { order: step.order });
                    }
                }
                BranchAction::JumpTo(StepTarget::Complete) => {}
                BranchAction::Run(kind) => {
                    if kind.implied_status().is_none() || kind.implied_status_is_soft() {
                        return Err(CampaignError::InlineActionWithoutStatus {
                            order: step.order,
                            step_type: kind.step_type(),
                        });
                    }
                }
            }
        }
    }

    Ok(())
}

fn validate_conditions(order: u32, conditions: &[StepCondition]) -> Result<(), CampaignError> {
    for condition in conditions {
        if let StepCondition::Status { operator, .. } = condition {
            if operator.is_ordering() {
                return Err(CampaignError::OrderedStatusComparison { order });
            }
        }
    }
    Ok(())
}

/// Campaign construction and lifecycle errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CampaignError {
    #[error("two steps share order {0}")]
    DuplicateStepOrder(u32),
    #[error("step {order}: statuses only support equals/not_equals comparisons")]
    OrderedStatusComparison { order: u32 },
    #[error("step {order}: conditional action has no guard")]
    UnguardedAction { order: u32 },
    #[error("step {order}: conditional action jumps to a step that does not exist")]
    UnknownJumpTarget { order: u32 },
    #[error("step {order}: inline {step_type} action does not drive a status change")]
    InlineActionWithoutStatus {
        order: u32,
        step_type: super::steps::StepType,
    },
    #[error("campaign cannot move from {from} to {to}")]
    InvalidLifecycle {
        from: CampaignLifecycle,
        to: CampaignLifecycle,
    },
}
