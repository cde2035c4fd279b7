use std::sync::Arc;

use super::common::*;

use crate::config::EngineConfig;
use crate::workflows::campaign::domain::{
    CampaignError, CampaignId, CampaignLifecycle, CandidateId, MetricDelta, MetricKey,
};
use crate::workflows::campaign::evaluation::EvaluationEntry;
use crate::workflows::campaign::orchestrator::TickError;
use crate::workflows::campaign::repository::{RepositoryError, ScorerError};
use crate::workflows::campaign::service::{
    CampaignDraft, CampaignService, CampaignServiceError, Engagement,
};
use crate::workflows::campaign::status::CandidateStatus;
use crate::workflows::campaign::steps::{CampaignStep, ReviewConfig, StepKind};
use crate::workflows::campaign::tasks::TaskKind;

fn launch(harness: &Harness, steps: Vec<CampaignStep>) -> (CampaignId, CandidateId) {
    let campaign = harness
        .service
        .create_campaign(CampaignDraft {
            name: "Platform hiring".to_string(),
            steps,
        })
        .expect("campaign created");
    harness
        .service
        .set_lifecycle(&campaign.id, CampaignLifecycle::Active, now())
        .expect("campaign activated");
    let candidate = harness
        .service
        .attach_candidate(&campaign.id, profile("svc"), now())
        .expect("candidate attached");
    (campaign.id, candidate.id)
}

#[test]
fn create_campaign_rejects_duplicate_orders() {
    let harness = build_service();
    let error = harness
        .service
        .create_campaign(CampaignDraft {
            name: "Broken".to_string(),
            steps: vec![connect_step(1), message_step(1)],
        })
        .expect_err("duplicate orders");

    match error {
        CampaignServiceError::Campaign(CampaignError::DuplicateStepOrder(1)) => {}
        other => panic!("expected duplicate order error, got {other:?}"),
    }
}

#[test]
fn lifecycle_stamps_the_first_activation_only() {
    let harness = build_service();
    let campaign = harness
        .service
        .create_campaign(CampaignDraft {
            name: "Data team".to_string(),
            steps: vec![connect_step(0)],
        })
        .expect("campaign created");
    assert_eq!(campaign.status, CampaignLifecycle::Draft);
    assert_eq!(campaign.activated_at, None);

    let active = harness
        .service
        .set_lifecycle(&campaign.id, CampaignLifecycle::Active, now())
        .expect("activated");
    assert_eq!(active.activated_at, Some(now()));

    harness
        .service
        .set_lifecycle(&campaign.id, CampaignLifecycle::Paused, now() + days(1))
        .expect("paused");
    let resumed = harness
        .service
        .set_lifecycle(&campaign.id, CampaignLifecycle::Active, now() + days(2))
        .expect("resumed");
    assert_eq!(resumed.activated_at, Some(now()));

    harness
        .service
        .set_lifecycle(&campaign.id, CampaignLifecycle::Completed, now() + days(3))
        .expect("completed");
    let error = harness
        .service
        .set_lifecycle(&campaign.id, CampaignLifecycle::Active, now() + days(4))
        .expect_err("completed campaigns stay completed");
    match error {
        CampaignServiceError::Campaign(CampaignError::InvalidLifecycle { from, to }) => {
            assert_eq!(from, CampaignLifecycle::Completed);
            assert_eq!(to, CampaignLifecycle::Active);
        }
        other => panic!("expected lifecycle error, got {other:?}"),
    }

    let error = harness
        .service
        .attach_candidate(&campaign.id, profile("late"), now() + days(4))
        .expect_err("completed campaigns take no candidates");
    assert!(matches!(
        error,
        CampaignServiceError::CampaignNotActive {
            status: CampaignLifecycle::Completed
        }
    ));
}

#[test]
fn paused_campaigns_are_not_ticked() {
    let harness = build_service();
    let (campaign_id, candidate_id) = launch(&harness, vec![connect_step(0)]);
    harness
        .service
        .set_lifecycle(&campaign_id, CampaignLifecycle::Paused, now())
        .expect("paused");

    let error = harness
        .service
        .tick_candidate(&campaign_id, &candidate_id, now())
        .expect_err("paused campaign");
    assert!(matches!(
        error,
        CampaignServiceError::CampaignNotActive {
            status: CampaignLifecycle::Paused
        }
    ));

    let summary = harness
        .service
        .run_campaign(&campaign_id, now())
        .expect("run succeeds");
    assert!(summary.skipped);
    assert_eq!(summary.advanced, 0);
    assert!(harness.notifier.deliveries().is_empty());
}

#[test]
fn tick_commits_the_candidate_and_publishes_metrics() {
    let harness = build_service();
    let (campaign_id, candidate_id) = launch(&harness, vec![connect_step(0), message_step(1)]);

    let outcome = harness
        .service
        .tick_candidate(&campaign_id, &candidate_id, now())
        .expect("tick succeeds");
    assert_eq!(outcome.candidate.version, 1);
    assert_eq!(outcome.candidate.current_step, 1);

    let stored = harness
        .repository
        .stored_candidate(&campaign_id, &candidate_id)
        .expect("candidate stored");
    assert_eq!(stored, outcome.candidate);
    assert_eq!(harness.repository.stored_campaign(&campaign_id).metrics.sent, 1);
    assert_eq!(
        harness.sink.events(),
        vec![(campaign_id, MetricDelta::increment(MetricKey::Sent))]
    );
}

#[test]
fn failed_delivery_is_retried_on_the_next_tick() {
    let harness = build_service_with(
        MemoryRepository::default(),
        RecordingNotifier::failing(),
        EngineConfig::default(),
    );
    let (campaign_id, candidate_id) = launch(&harness, vec![connect_step(0)]);
    let before = harness
        .repository
        .stored_candidate(&campaign_id, &candidate_id)
        .expect("candidate stored");

    let error = harness
        .service
        .tick_candidate(&campaign_id, &candidate_id, now())
        .expect_err("delivery fails");
    assert!(matches!(
        error,
        CampaignServiceError::Tick(TickError::Notifier(_))
    ));
    assert_eq!(
        harness
            .repository
            .stored_candidate(&campaign_id, &candidate_id)
            .expect("candidate stored"),
        before
    );
    assert!(harness.sink.events().is_empty());

    harness.notifier.set_failing(false);
    let outcome = harness
        .service
        .tick_candidate(&campaign_id, &candidate_id, now())
        .expect("tick succeeds");
    assert_eq!(outcome.candidate.current_step, 1);
    assert_eq!(harness.notifier.deliveries().len(), 1);
}

#[test]
fn version_conflicts_are_retried_with_fresh_state() {
    let harness = build_service_with(
        MemoryRepository::with_conflicts(1),
        RecordingNotifier::default(),
        EngineConfig::default(),
    );
    let (campaign_id, candidate_id) = launch(&harness, vec![connect_step(0)]);

    let candidate = harness
        .service
        .transition_status(
            &campaign_id,
            &candidate_id,
            CandidateStatus::UnderReview,
            "",
            now(),
        )
        .expect("retried transition succeeds");

    assert_eq!(candidate.status, CandidateStatus::UnderReview);
    assert_eq!(candidate.version, 2);
    assert_eq!(candidate.history.len(), 1);
}

#[test]
fn exhausted_retries_surface_the_conflict() {
    let engine = EngineConfig {
        max_conflict_retries: 0,
        ..EngineConfig::default()
    };
    let harness = build_service_with(
        MemoryRepository::with_conflicts(1),
        RecordingNotifier::default(),
        engine,
    );
    let (campaign_id, candidate_id) = launch(&harness, vec![connect_step(0)]);

    let error = harness
        .service
        .transition_status(
            &campaign_id,
            &candidate_id,
            CandidateStatus::UnderReview,
            "",
            now(),
        )
        .expect_err("conflict surfaces");
    match error {
        CampaignServiceError::Repository(RepositoryError::VersionConflict { expected, found }) => {
            assert_eq!(expected, 0);
            assert_eq!(found, 1);
        }
        other => panic!("expected version conflict, got {other:?}"),
    }
    assert!(harness.sink.events().is_empty());
}

#[test]
fn scorer_results_become_the_current_score() {
    let harness = build_service();
    let (campaign_id, candidate_id) = launch(&harness, vec![connect_step(0)]);

    let candidate = harness
        .service
        .score_candidate(&campaign_id, &candidate_id)
        .expect("scored");
    assert_eq!(candidate.current_score, Some(72));
    assert_eq!(candidate.evaluation_history.len(), 1);
    assert!(!candidate.evaluation_history[0].is_human());
}

#[test]
fn scorer_outages_leave_the_candidate_alone() {
    let repository = Arc::new(MemoryRepository::default());
    let service = CampaignService::new(
        repository.clone(),
        Arc::new(RecordingNotifier::default()),
        Arc::new(StaticScorer { unavailable: true }),
        Arc::new(RecordingSink::default()),
        EngineConfig::default(),
    );
    let campaign = service
        .create_campaign(CampaignDraft {
            name: "Infra".to_string(),
            steps: vec![connect_step(0)],
        })
        .expect("campaign created");
    let candidate = service
        .attach_candidate(&campaign.id, profile("ai"), now())
        .expect("candidate attached");

    let error = service
        .score_candidate(&campaign.id, &candidate.id)
        .expect_err("scorer unavailable");
    assert!(matches!(
        error,
        CampaignServiceError::Scorer(ScorerError::Unavailable(_))
    ));
    let stored = repository
        .stored_candidate(&campaign.id, &candidate.id)
        .expect("candidate stored");
    assert!(stored.evaluation_history.is_empty());
    assert_eq!(stored.version, 0);
}

#[test]
fn submitting_a_form_counts_one_application() {
    let harness = build_service();
    let (campaign_id, candidate_id) = launch(&harness, vec![connect_step(0)]);

    let first = harness
        .service
        .submit_form(&campaign_id, &candidate_id, now())
        .expect("form submitted");
    let second = harness
        .service
        .submit_form(&campaign_id, &candidate_id, now() + days(1))
        .expect("resubmission accepted");

    assert!(first.form_submitted);
    assert_eq!(first.status, CandidateStatus::New);
    assert_eq!(second.version, first.version);
    assert_eq!(second.last_interaction, Some(now()));
    assert_eq!(harness.repository.stored_campaign(&campaign_id).metrics.applied, 1);

    let tasks = harness
        .service
        .candidate_tasks(&campaign_id, &candidate_id)
        .expect("tasks derived");
    let kinds: Vec<TaskKind> = tasks.iter().map(|task| task.kind).collect();
    assert_eq!(kinds, vec![TaskKind::EvaluateForm, TaskKind::ReviewCv]);
}

#[test]
fn engagement_moves_counters_and_only_responses_reset_the_clock() {
    let harness = build_service();
    let (campaign_id, candidate_id) = launch(&harness, vec![connect_step(0)]);

    let opened = harness
        .service
        .record_engagement(&campaign_id, &candidate_id, Engagement::Opened, now())
        .expect("open recorded");
    assert_eq!(opened.last_interaction, None);

    let responded = harness
        .service
        .record_engagement(
            &campaign_id,
            &candidate_id,
            Engagement::Responded,
            now() + days(1),
        )
        .expect("response recorded");
    assert_eq!(responded.last_interaction, Some(now() + days(1)));

    let metrics = harness.repository.stored_campaign(&campaign_id).metrics;
    assert_eq!(metrics.opened, 1);
    assert_eq!(metrics.responded, 1);
}

#[test]
fn cv_review_notes_accumulate() {
    let harness = build_service();
    let (campaign_id, candidate_id) = launch(&harness, vec![connect_step(0)]);

    harness
        .service
        .mark_cv_reviewed(&campaign_id, &candidate_id, "Strong Rust background")
        .expect("reviewed");
    let candidate = harness
        .service
        .record_evaluation(
            &campaign_id,
            &candidate_id,
            EvaluationEntry::human_scored(Some("dana".to_string()), 68, "Good call", now())
                .expect("valid entry"),
        )
        .expect("evaluation recorded");

    assert!(candidate.cv_reviewed);
    assert_eq!(candidate.review_notes, "Strong Rust background\nGood call");
    assert_eq!(candidate.current_score, Some(68));
}

#[test]
fn run_campaign_counts_advanced_and_waiting_candidates() {
    let harness = build_service();
    let (campaign_id, _) = launch(&harness, vec![connect_step(0), message_step(1).with_delay(2)]);
    harness
        .service
        .attach_candidate(&campaign_id, profile("second"), now())
        .expect("candidate attached");

    let first = harness
        .service
        .run_campaign(&campaign_id, now())
        .expect("run succeeds");
    assert_eq!(first.advanced, 2);
    assert_eq!(first.waiting, 0);

    let second = harness
        .service
        .run_campaign(&campaign_id, now() + days(1))
        .expect("run succeeds");
    assert_eq!(second.advanced, 0);
    assert_eq!(second.waiting, 2);
    assert!(second.failures.is_empty());

    let summaries = harness
        .service
        .run_active_campaigns(now() + days(2))
        .expect("run succeeds");
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].advanced, 2);
}

#[test]
fn report_counters_match_candidate_statuses() {
    let harness = build_service();
    let (campaign_id, candidate_id) = launch(&harness, vec![connect_step(0)]);
    let other = harness
        .service
        .attach_candidate(&campaign_id, profile("other"), now())
        .expect("candidate attached");

    for (next, note) in [
        (CandidateStatus::UnderReview, ""),
        (CandidateStatus::InterviewScheduled, ""),
        (CandidateStatus::InterviewCompleted, ""),
        (CandidateStatus::Selected, "great fit"),
    ] {
        harness
            .service
            .transition_status(&campaign_id, &candidate_id, next, note, now())
            .expect("transition");
    }
    harness
        .service
        .transition_status(
            &campaign_id,
            &other.id,
            CandidateStatus::Rejected,
            "missing visa",
            now(),
        )
        .expect("transition");

    let report = harness
        .service
        .campaign_report(&campaign_id)
        .expect("report built");
    assert!(report.is_consistent());
    assert_eq!(report.count_for(CandidateStatus::Selected), 1);
    assert_eq!(report.count_for(CandidateStatus::Rejected), 1);
    assert_eq!(report.count_for(CandidateStatus::New), 0);
    assert_eq!(report.campaign.metrics.interviews_scheduled, 0);
    assert_eq!(report.campaign.candidates, 2);
}

#[test]
fn unknown_candidates_are_not_found() {
    let harness = build_service();
    let (campaign_id, _) = launch(&harness, vec![connect_step(0)]);

    let error = harness
        .service
        .tick_candidate(&campaign_id, &CandidateId("cand-missing".to_string()), now())
        .expect_err("missing candidate");
    assert!(matches!(
        error,
        CampaignServiceError::Repository(RepositoryError::NotFound)
    ));
}

#[test]
fn cursor_only_steps_are_committed() {
    let harness = build_service();
    let review = CampaignStep::new(
        "review",
        0,
        StepKind::ReviewRequired(ReviewConfig::default()),
    );
    let (campaign_id, candidate_id) = launch(&harness, vec![review, message_step(1)]);
    harness
        .service
        .transition_status(
            &campaign_id,
            &candidate_id,
            CandidateStatus::UnderReview,
            "Referred by the hiring manager",
            now(),
        )
        .expect("moved under review");

    let outcome = harness
        .service
        .tick_candidate(&campaign_id, &candidate_id, now())
        .expect("tick succeeds");
    assert!(!outcome.is_noop());

    let stored = harness
        .repository
        .stored_candidate(&campaign_id, &candidate_id)
        .expect("candidate stored");
    assert_eq!(stored.current_step, 1);
    assert_eq!(stored.history.len(), 1);
    assert!(harness.notifier.deliveries().is_empty());
}
