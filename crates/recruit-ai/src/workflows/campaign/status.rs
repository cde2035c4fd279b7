use serde::{Deserialize, Serialize};

/// Pipeline stage of one candidate within one campaign.
///
/// Statuses are only ordered by the transition table; there is no numeric ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateStatus {
    New,
    FormSubmitted,
    UnderReview,
    InterviewScheduled,
    InterviewCompleted,
    Selected,
    Rejected,
    Withdrawn,
}

impl CandidateStatus {
    pub const fn ordered() -> [Self; 8] {
        [
            Self::New,
            Self::FormSubmitted,
            Self::UnderReview,
            Self::InterviewScheduled,
            Self::InterviewCompleted,
            Self::Selected,
            Self::Rejected,
            Self::Withdrawn,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::FormSubmitted => "form_submitted",
            Self::UnderReview => "under_review",
            Self::InterviewScheduled => "interview_scheduled",
            Self::InterviewCompleted => "interview_completed",
            Self::Selected => "selected",
            Self::Rejected => "rejected",
            Self::Withdrawn => "withdrawn",
        }
    }

    pub const fn is_final_decision(self) -> bool {
        matches!(self, Self::Selected | Self::Rejected)
    }

    /// Targets that refuse a blank explanation.
    pub const fn requires_note(self) -> bool {
        matches!(self, Self::Rejected | Self::Withdrawn)
    }

    pub fn can_transition_to(self, next: Self) -> bool {
        allowed_next_statuses(self).contains(&next)
    }

    /// True when `target` can no longer be reached by moving forward through the table.
    /// Reopening a rejected or withdrawn candidate is a recruiter decision and does not count.
    pub fn has_moved_past(self, target: Self) -> bool {
        if self == target {
            return false;
        }

        let mut seen = vec![self];
        let mut frontier = vec![self];
        while let Some(status) = frontier.pop() {
            if matches!(status, Self::Rejected | Self::Withdrawn) {
                continue;
            }
            for &next in allowed_next_statuses(status) {
                if next == target {
                    return false;
                }
                if !seen.contains(&next) {
                    seen.push(next);
                    frontier.push(next);
                }
            }
        }
        true
    }
}

impl std::fmt::Display for CandidateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Legal successors for `current`.
pub fn allowed_next_statuses(current: CandidateStatus) -> &'static [CandidateStatus] {
    use CandidateStatus::*;

    match current {
        New => &[UnderReview, Rejected, Withdrawn],
        FormSubmitted => &[UnderReview, InterviewScheduled, Rejected, Withdrawn],
        UnderReview => &[InterviewScheduled, Rejected, Withdrawn],
        InterviewScheduled => &[InterviewCompleted, Rejected, Withdrawn],
        InterviewCompleted => &[Selected, Rejected, Withdrawn],
        Selected => &[Withdrawn],
        Rejected => &[UnderReview],
        Withdrawn => &[UnderReview],
    }
}

/// Gate every status change passes through. The table is checked before the note.
pub fn validate(
    current: CandidateStatus,
    next: CandidateStatus,
    note: &str,
) -> Result<(), TransitionError> {
    if !current.can_transition_to(next) {
        return Err(TransitionError::InvalidTransition {
            from: current,
            to: next,
        });
    }

    if next.requires_note() && note.trim().is_empty() {
        return Err(TransitionError::MissingRequiredNote { to: next });
    }

    Ok(())
}

/// Rejected status change requests. Both are caller-correctable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("cannot move candidate from {from} to {to}")]
    InvalidTransition {
        from: CandidateStatus,
        to: CandidateStatus,
    },
    #[error("moving a candidate to {to} requires a note")]
    MissingRequiredNote { to: CandidateStatus },
}
