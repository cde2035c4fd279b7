use serde::{Deserialize, Serialize};

use super::domain::CampaignCandidate;
use super::status::CandidateStatus;

/// Recruiter-facing follow-up computed from a candidate's flags and status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    ReviewCv,
    EvaluateForm,
    ScheduleInterview,
    CompleteInterview,
    EvaluateInterview,
    MakeFinalDecision,
}

impl TaskKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::ReviewCv => "Review CV",
            Self::EvaluateForm => "Evaluate form",
            Self::ScheduleInterview => "Schedule interview",
            Self::CompleteInterview => "Complete interview",
            Self::EvaluateInterview => "Evaluate interview",
            Self::MakeFinalDecision => "Make final decision",
        }
    }

    pub const fn priority(self) -> TaskPriority {
        match self {
            Self::EvaluateForm | Self::EvaluateInterview | Self::MakeFinalDecision => {
                TaskPriority::High
            }
            Self::ScheduleInterview | Self::CompleteInterview => TaskPriority::Medium,
            Self::ReviewCv => TaskPriority::Low,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateTask {
    pub kind: TaskKind,
    pub priority: TaskPriority,
    pub label: String,
}

impl From<TaskKind> for CandidateTask {
    fn from(kind: TaskKind) -> Self {
        Self {
            kind,
            priority: kind.priority(),
            label: kind.label().to_string(),
        }
    }
}

/// Outstanding work for a candidate, highest priority first. Nothing here is persisted.
pub fn derive_tasks(candidate: &CampaignCandidate) -> Vec<CandidateTask> {
    if candidate.is_withdrawn() || candidate.final_decision_made {
        return Vec::new();
    }

    let mut kinds = Vec::new();

    if !candidate.cv_reviewed {
        kinds.push(TaskKind::ReviewCv);
    }

    if candidate.form_submitted && !candidate.form_evaluated {
        kinds.push(TaskKind::EvaluateForm);
    }

    match candidate.status {
        CandidateStatus::FormSubmitted | CandidateStatus::UnderReview
            if candidate.form_evaluated =>
        {
            kinds.push(TaskKind::ScheduleInterview);
        }
        CandidateStatus::InterviewScheduled => kinds.push(TaskKind::CompleteInterview),
        CandidateStatus::InterviewCompleted if !candidate.interview_evaluated => {
            kinds.push(TaskKind::EvaluateInterview);
        }
        CandidateStatus::InterviewCompleted => kinds.push(TaskKind::MakeFinalDecision),
        _ => {}
    }

    let mut tasks: Vec<CandidateTask> = kinds.into_iter().map(CandidateTask::from).collect();
    tasks.sort_by(|left, right| right.priority.cmp(&left.priority));
    tasks
}
