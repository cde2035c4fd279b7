use super::status::CandidateStatus;
use super::steps::{
    BranchAction, CampaignStep, ConditionOperator, ConditionalAction, ConnectConfig, FormConfig,
    InterviewConfig, MessageConfig, ReviewConfig, StepCondition, StepKind, StepTarget, StepType,
    WaitForStatusConfig,
};

/// Default outreach sequence used when a recruiter does not design one by hand.
#[derive(Debug)]
pub struct CampaignBlueprint {
    steps: Vec<CampaignStep>,
}

impl CampaignBlueprint {
    pub fn standard_outreach() -> Self {
        Self {
            steps: standard_outreach_steps(),
        }
    }

    pub fn steps(&self) -> &[CampaignStep] {
        &self.steps
    }

    pub fn into_steps(self) -> Vec<CampaignStep> {
        self.steps
    }
}

fn on_rejected_send_rejection() -> ConditionalAction {
    ConditionalAction::on_status(
        CandidateStatus::Rejected,
        BranchAction::JumpTo(StepTarget::Kind(StepType::SendRejection)),
    )
}

fn on_selected_send_selection() -> ConditionalAction {
    ConditionalAction::on_status(
        CandidateStatus::Selected,
        BranchAction::JumpTo(StepTarget::Kind(StepType::SendSelection)),
    )
}

fn message(template: &str) -> MessageConfig {
    MessageConfig {
        template: template.to_string(),
    }
}

fn standard_outreach_steps() -> Vec<CampaignStep> {
    vec![
        CampaignStep::new(
            "connect",
            0,
            StepKind::LinkedinConnect(ConnectConfig {
                note_template: Some(
                    "Hi {{first_name}}, I'm hiring for {{role}} and would love to connect."
                        .to_string(),
                ),
            }),
        )
        .with_action(on_rejected_send_rejection()),
        CampaignStep::new(
            "intro-message",
            1,
            StepKind::LinkedinMessage(message(
                "Thanks for connecting, {{first_name}}. Here is a short overview of the {{role}} role.",
            )),
        )
        .with_delay(1)
        .with_action(on_rejected_send_rejection()),
        CampaignStep::new(
            "reminder",
            2,
            StepKind::LinkedinReminder(message(
                "Following up in case the {{role}} role is of interest.",
            )),
        )
        .with_delay(3)
        .with_action(on_rejected_send_rejection())
        .with_action(ConditionalAction::when(
            vec![StepCondition::status_is_not(CandidateStatus::New)],
            BranchAction::JumpTo(StepTarget::Kind(StepType::FormSubmission)),
        )),
        CampaignStep::new(
            "application-form",
            3,
            StepKind::FormSubmission(FormConfig {
                form_id: "screening".to_string(),
                template: "Please complete this short screening form: {{form_link}}".to_string(),
            }),
        )
        .with_action(on_rejected_send_rejection()),
        CampaignStep::new(
            "review",
            4,
            StepKind::ReviewRequired(ReviewConfig {
                instructions: Some("Review CV and screening answers".to_string()),
            }),
        )
        .with_delay(2)
        .with_action(on_rejected_send_rejection()),
        CampaignStep::new(
            "schedule-interview",
            5,
            StepKind::ScheduleInterview(InterviewConfig {
                duration_minutes: 45,
                days_ahead: 3,
                calendar_id: None,
                template: "Let's talk! Pick a slot for a 45 minute interview: {{calendar_link}}"
                    .to_string(),
            }),
        )
        .with_condition(StepCondition::form_score(ConditionOperator::GreaterThan, 60))
        .with_action(on_rejected_send_rejection())
        .with_action(on_selected_send_selection()),
        CampaignStep::new(
            "await-interview",
            6,
            StepKind::WaitForStatus(WaitForStatusConfig {
                target_status: CandidateStatus::InterviewCompleted,
                timeout_days: 14,
            }),
        )
        .with_action(on_rejected_send_rejection())
        .with_action(on_selected_send_selection()),
        CampaignStep::new(
            "rejection",
            7,
            StepKind::SendRejection(message(
                "Thank you for your time, {{first_name}}. We decided to move forward with other candidates.",
            )),
        )
        .with_condition(StepCondition::status_is(CandidateStatus::Rejected))
        .with_action(on_selected_send_selection()),
        CampaignStep::new(
            "selection",
            8,
            StepKind::SendSelection(message(
                "Great news, {{first_name}}! We'd like to offer you the {{role}} position.",
            )),
        )
        .with_condition(StepCondition::status_is(CandidateStatus::Selected))
        .with_action(ConditionalAction::on_status(
            CandidateStatus::Rejected,
            BranchAction::JumpTo(StepTarget::Complete),
        )),
    ]
}
