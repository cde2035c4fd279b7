use super::common::*;

use crate::workflows::campaign::scheduler::{next_action, NextAction, WaitReason};
use crate::workflows::campaign::status::CandidateStatus;
use crate::workflows::campaign::steps::{
    BranchAction, ConditionOperator, ConditionalAction, StatusChangeConfig, StepCondition,
    StepKind, StepTarget, StepType,
};

#[test]
fn unmet_form_score_condition_waits() {
    let step = message_step(0).with_condition(StepCondition::form_score(
        ConditionOperator::GreaterThan,
        7,
    ));
    let campaign = active_campaign(vec![step]);
    let mut candidate = candidate("c");
    candidate.form_score = Some(5);

    match next_action(&campaign, &candidate, now()) {
        NextAction::Wait {
            reason: WaitReason::ConditionsUnmet,
            retry_at,
        } => assert_eq!(retry_at, Some(now())),
        other => panic!("expected conditions wait, got {other:?}"),
    }
}

#[test]
fn unmet_conditions_repoll_after_the_step_delay() {
    let step = message_step(0)
        .with_delay(2)
        .with_condition(StepCondition::status_is(CandidateStatus::UnderReview));
    let campaign = active_campaign(vec![step]);
    let candidate = candidate("c");

    match next_action(&campaign, &candidate, now()) {
        NextAction::Wait {
            reason: WaitReason::ConditionsUnmet,
            retry_at,
        } => assert_eq!(retry_at, Some(now() + days(2))),
        other => panic!("expected conditions wait, got {other:?}"),
    }
}

#[test]
fn timed_out_wait_for_status_executes_the_next_step() {
    let campaign = active_campaign(vec![
        wait_step(0, CandidateStatus::InterviewCompleted, 7),
        message_step(1),
    ]);
    let mut candidate = candidate("d");
    candidate.status = CandidateStatus::InterviewScheduled;
    candidate.last_interaction = Some(now() - days(8));

    match next_action(&campaign, &candidate, now()) {
        NextAction::Execute { index, step } => {
            assert_eq!(index, 1);
            assert_eq!(step.step_type(), StepType::LinkedinMessage);
        }
        other => panic!("expected execute of the next step, got {other:?}"),
    }
}

#[test]
fn wait_for_status_holds_until_timeout() {
    let campaign = active_campaign(vec![
        wait_step(0, CandidateStatus::InterviewCompleted, 7),
        message_step(1),
    ]);
    let mut candidate = candidate("d");
    candidate.status = CandidateStatus::InterviewScheduled;
    candidate.last_interaction = Some(now() - days(3));

    assert_eq!(
        next_action(&campaign, &candidate, now()),
        NextAction::Wait {
            reason: WaitReason::AwaitingStatus,
            retry_at: Some(now() + days(4)),
        }
    );
}

#[test]
fn reached_target_status_releases_the_wait() {
    let campaign = active_campaign(vec![
        wait_step(0, CandidateStatus::InterviewCompleted, 14),
        message_step(1),
    ]);
    let mut candidate = candidate("d");
    candidate.status = CandidateStatus::InterviewCompleted;
    candidate.last_interaction = Some(now());

    assert!(matches!(
        next_action(&campaign, &candidate, now()),
        NextAction::Execute { index: 1, .. }
    ));
}

#[test]
fn resolved_wait_at_the_end_executes_itself() {
    let campaign = active_campaign(vec![wait_step(0, CandidateStatus::InterviewCompleted, 1)]);
    let mut candidate = candidate("d");
    candidate.last_interaction = Some(now() - days(2));

    match next_action(&campaign, &candidate, now()) {
        NextAction::Execute { index, step } => {
            assert_eq!(index, 0);
            assert_eq!(step.step_type(), StepType::WaitForStatus);
        }
        other => panic!("expected pass-through execute, got {other:?}"),
    }
}

#[test]
fn delay_is_measured_from_last_interaction() {
    let campaign = active_campaign(vec![connect_step(0), message_step(1).with_delay(3)]);
    let mut candidate = candidate("e");
    candidate.current_step = 1;
    candidate.last_interaction = Some(now() - days(1));

    assert_eq!(
        next_action(&campaign, &candidate, now()),
        NextAction::Wait {
            reason: WaitReason::Delay,
            retry_at: Some(now() + days(2)),
        }
    );

    assert!(matches!(
        next_action(&campaign, &candidate, now() + days(2)),
        NextAction::Execute { index: 1, .. }
    ));
}

#[test]
fn delay_falls_back_to_campaign_activation() {
    let mut campaign = active_campaign(vec![message_step(0).with_delay(2)]);
    campaign.activated_at = Some(now() - days(1));

    assert!(matches!(
        next_action(&campaign, &candidate("f"), now()),
        NextAction::Wait {
            reason: WaitReason::Delay,
            ..
        }
    ));
}

#[test]
fn withdrawn_and_finished_candidates_wait() {
    let campaign = active_campaign(vec![connect_step(0)]);

    let mut withdrawn = candidate("g");
    withdrawn.status = CandidateStatus::Withdrawn;
    assert_eq!(
        next_action(&campaign, &withdrawn, now()),
        NextAction::Wait {
            reason: WaitReason::CandidateClosed,
            retry_at: None,
        }
    );

    let mut finished = candidate("h");
    finished.current_step = 1;
    assert_eq!(
        next_action(&campaign, &finished, now()),
        NextAction::Wait {
            reason: WaitReason::SequenceComplete,
            retry_at: None,
        }
    );
}

#[test]
fn conditional_actions_win_over_the_step_delay() {
    let review = message_step(0).with_delay(5).with_action(ConditionalAction::on_status(
        CandidateStatus::Rejected,
        BranchAction::JumpTo(StepTarget::Order(1)),
    ));
    let campaign = active_campaign(vec![review, message_step(1)]);
    let mut candidate = candidate("i");
    candidate.status = CandidateStatus::Rejected;
    candidate.last_interaction = Some(now());

    assert_eq!(
        next_action(&campaign, &candidate, now()),
        NextAction::Branch {
            index: 0,
            action: BranchAction::JumpTo(StepTarget::Order(1)),
        }
    );
}

#[test]
fn inline_runs_fire_once() {
    let escalate = BranchAction::Run(StepKind::StatusChange(StatusChangeConfig {
        target_status: CandidateStatus::UnderReview,
        note: Some("High form score".to_string()),
    }));
    let step = message_step(0).with_action(ConditionalAction::when(
        vec![StepCondition::form_score(ConditionOperator::GreaterThan, 50)],
        escalate.clone(),
    ));
    let campaign = active_campaign(vec![step]);
    let mut candidate = candidate("j");
    candidate.form_score = Some(70);

    assert_eq!(
        next_action(&campaign, &candidate, now()),
        NextAction::Branch {
            index: 0,
            action: escalate,
        }
    );

    candidate.status = CandidateStatus::UnderReview;
    assert!(matches!(
        next_action(&campaign, &candidate, now()),
        NextAction::Execute { index: 0, .. }
    ));
}

#[test]
fn jumps_onto_the_current_step_are_ignored() {
    let step = message_step(0).with_action(ConditionalAction::on_status(
        CandidateStatus::New,
        BranchAction::JumpTo(StepTarget::Order(0)),
    ));
    let campaign = active_campaign(vec![step]);

    assert!(matches!(
        next_action(&campaign, &candidate("k"), now()),
        NextAction::Execute { index: 0, .. }
    ));
}

#[test]
fn inline_runs_the_candidate_moved_past_do_not_fire() {
    let step = message_step(0).with_action(ConditionalAction::when(
        vec![StepCondition::form_score(ConditionOperator::LessThan, 30)],
        BranchAction::Run(StepKind::SendRejection(message("Not this time"))),
    ));
    let campaign = active_campaign(vec![step]);
    let mut candidate = candidate("s");
    candidate.status = CandidateStatus::Selected;
    candidate.form_score = Some(10);

    match next_action(&campaign, &candidate, now()) {
        NextAction::Execute { index, step } => {
            assert_eq!(index, 0);
            assert_eq!(step.step_type(), StepType::LinkedinMessage);
        }
        other => panic!("expected the message step, got {other:?}"),
    }
}
