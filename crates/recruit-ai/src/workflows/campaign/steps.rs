use serde::{Deserialize, Serialize};

use super::status::CandidateStatus;

/// Identifier wrapper for campaign steps.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StepId(pub String);

/// One action template in a campaign's ordered sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignStep {
    pub id: StepId,
    pub order: u32,
    /// Days to hold the step after the candidate's last interaction.
    #[serde(default)]
    pub delay_days: u32,
    #[serde(flatten)]
    pub kind: StepKind,
    #[serde(default)]
    pub conditions: Vec<StepCondition>,
    #[serde(default)]
    pub conditional_actions: Vec<ConditionalAction>,
}

impl CampaignStep {
    pub fn new(id: impl Into<String>, order: u32, kind: StepKind) -> Self {
        Self {
            id: StepId(id.into()),
            order,
            delay_days: 0,
            kind,
            conditions: Vec::new(),
            conditional_actions: Vec::new(),
        }
    }

    pub fn with_delay(mut self, days: u32) -> Self {
        self.delay_days = days;
        self
    }

    pub fn with_condition(mut self, condition: StepCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn with_action(mut self, action: ConditionalAction) -> Self {
        self.conditional_actions.push(action);
        self
    }

    pub fn step_type(&self) -> StepType {
        self.kind.step_type()
    }
}

/// The eleven step kinds, each carrying its own config payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "config", rename_all = "snake_case")]
pub enum StepKind {
    LinkedinConnect(ConnectConfig),
    LinkedinMessage(MessageConfig),
    LinkedinReminder(MessageConfig),
    EmailMessage(EmailConfig),
    FormSubmission(FormConfig),
    ReviewRequired(ReviewConfig),
    ScheduleInterview(InterviewConfig),
    StatusChange(StatusChangeConfig),
    WaitForStatus(WaitForStatusConfig),
    SendSelection(MessageConfig),
    SendRejection(MessageConfig),
}

impl StepKind {
    pub const fn step_type(&self) -> StepType {
        match self {
            StepKind::LinkedinConnect(_) => StepType::LinkedinConnect,
            StepKind::LinkedinMessage(_) => StepType::LinkedinMessage,
            StepKind::LinkedinReminder(_) => StepType::LinkedinReminder,
            StepKind::EmailMessage(_) => StepType::EmailMessage,
            StepKind::FormSubmission(_) => StepType::FormSubmission,
            StepKind::ReviewRequired(_) => StepType::ReviewRequired,
            StepKind::ScheduleInterview(_) => StepType::ScheduleInterview,
            StepKind::StatusChange(_) => StepType::StatusChange,
            StepKind::WaitForStatus(_) => StepType::WaitForStatus,
            StepKind::SendSelection(_) => StepType::SendSelection,
            StepKind::SendRejection(_) => StepType::SendRejection,
        }
    }

    /// Whether executing the step goes through the notifier.
    pub const fn requires_delivery(&self) -> bool {
        !matches!(
            self,
            StepKind::ReviewRequired(_) | StepKind::StatusChange(_) | StepKind::WaitForStatus(_)
        )
    }

    /// Outreach touches counted in the campaign's `sent` metric.
    pub const fn is_outreach(&self) -> bool {
        matches!(
            self,
            StepKind::LinkedinConnect(_)
                | StepKind::LinkedinMessage(_)
                | StepKind::LinkedinReminder(_)
                | StepKind::EmailMessage(_)
                | StepKind::FormSubmission(_)
        )
    }

    /// Status the step drives the candidate toward when it executes.
    ///
    /// `review_required` only implies `under_review`; the orchestrator applies it when the
    /// table allows the move from the candidate's current status.
    pub const fn implied_status(&self) -> Option<CandidateStatus> {
        match self {
            StepKind::ScheduleInterview(_) => Some(CandidateStatus::InterviewScheduled),
            StepKind::SendSelection(_) => Some(CandidateStatus::Selected),
            StepKind::SendRejection(_) => Some(CandidateStatus::Rejected),
            StepKind::StatusChange(config) => Some(config.target_status),
            StepKind::ReviewRequired(_) => Some(CandidateStatus::UnderReview),
            _ => None,
        }
    }

    /// Soft implied statuses are skipped, not refused, when the table disallows them.
    pub const fn implied_status_is_soft(&self) -> bool {
        matches!(self, StepKind::ReviewRequired(_))
    }

    /// The candidate already went beyond the status this step would set, so running it now
    /// would only send stale outreach. Recruiter-authored `status_change` steps never qualify.
    pub fn is_superseded_by(&self, status: CandidateStatus) -> bool {
        if matches!(self, StepKind::StatusChange(_)) {
            return false;
        }
        self.implied_status()
            .is_some_and(|target| status.has_moved_past(target))
    }
}

/// Fieldless discriminant of [`StepKind`], used to name branch targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepType {
    LinkedinConnect,
    LinkedinMessage,
    LinkedinReminder,
    EmailMessage,
    FormSubmission,
    ReviewRequired,
    ScheduleInterview,
    StatusChange,
    WaitForStatus,
    SendSelection,
    SendRejection,
}

impl StepType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::LinkedinConnect => "linkedin_connect",
            Self::LinkedinMessage => "linkedin_message",
            Self::LinkedinReminder => "linkedin_reminder",
            Self::EmailMessage => "email_message",
            Self::FormSubmission => "form_submission",
            Self::ReviewRequired => "review_required",
            Self::ScheduleInterview => "schedule_interview",
            Self::StatusChange => "status_change",
            Self::WaitForStatus => "wait_for_status",
            Self::SendSelection => "send_selection",
            Self::SendRejection => "send_rejection",
        }
    }
}

impl std::fmt::Display for StepType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectConfig {
    #[serde(default)]
    pub note_template: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageConfig {
    pub template: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailConfig {
    pub subject: String,
    pub template: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormConfig {
    pub form_id: String,
    pub template: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewConfig {
    #[serde(default)]
    pub instructions: Option<String>,
}

/// Calendar parameters for an interview invite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterviewConfig {
    pub duration_minutes: u32,
    /// Days after execution the interview slot is proposed for.
    #[serde(default)]
    pub days_ahead: u32,
    #[serde(default)]
    pub calendar_id: Option<String>,
    pub template: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChangeConfig {
    pub target_status: CandidateStatus,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitForStatusConfig {
    pub target_status: CandidateStatus,
    pub timeout_days: u32,
}

/// Comparison applied by a [`StepCondition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
}

impl ConditionOperator {
    pub const fn is_ordering(self) -> bool {
        matches!(self, Self::GreaterThan | Self::LessThan)
    }

    pub fn compare<T: PartialOrd>(self, left: T, right: T) -> bool {
        match self {
            Self::Equals => left == right,
            Self::NotEquals => left != right,
            Self::GreaterThan => left > right,
            Self::LessThan => left < right,
        }
    }
}

/// Guard on a step or on a conditional action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepCondition {
    Status {
        operator: ConditionOperator,
        value: CandidateStatus,
    },
    FormScore {
        operator: ConditionOperator,
        value: u16,
    },
    TimeElapsed {
        operator: ConditionOperator,
        /// Whole days.
        value: i64,
    },
}

impl StepCondition {
    pub fn status_is(value: CandidateStatus) -> Self {
        Self::Status {
            operator: ConditionOperator::Equals,
            value,
        }
    }

    pub fn status_is_not(value: CandidateStatus) -> Self {
        Self::Status {
            operator: ConditionOperator::NotEquals,
            value,
        }
    }

    pub fn form_score(operator: ConditionOperator, value: u16) -> Self {
        Self::FormScore { operator, value }
    }

    pub fn days_elapsed(operator: ConditionOperator, value: i64) -> Self {
        Self::TimeElapsed { operator, value }
    }
}

/// Alternate effect fired instead of the step when its guard holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalAction {
    /// Shorthand one-condition equality guard on the candidate status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<CandidateStatus>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<StepCondition>,
    pub action: BranchAction,
}

impl ConditionalAction {
    pub fn on_status(status: CandidateStatus, action: BranchAction) -> Self {
        Self {
            status: Some(status),
            conditions: Vec::new(),
            action,
        }
    }

    pub fn when(conditions: Vec<StepCondition>, action: BranchAction) -> Self {
        Self {
            status: None,
            conditions,
            action,
        }
    }

    /// Full guard: the status shorthand followed by the explicit conditions.
    pub fn guard(&self) -> Vec<StepCondition> {
        self.status
            .map(StepCondition::status_is)
            .into_iter()
            .chain(self.conditions.iter().cloned())
            .collect()
    }

    pub fn has_guard(&self) -> bool {
        self.status.is_some() || !self.conditions.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchAction {
    /// Move the candidate's cursor to another step.
    JumpTo(StepTarget),
    /// Run a status-driving step in place of the current one.
    Run(StepKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepTarget {
    Order(u32),
    Kind(StepType),
    /// Past the last step; the sequence is finished for the candidate.
    Complete,
}
