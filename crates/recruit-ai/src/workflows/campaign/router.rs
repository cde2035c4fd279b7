use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use super::domain::{
    CampaignError, CampaignId, CampaignLifecycle, CandidateId, CandidateProfile,
};
use super::evaluation::EvaluationEntry;
use super::orchestrator::TickError;
use super::repository::{
    CampaignRepository, CampaignView, MetricsSink, Notifier, RepositoryError, Scorer, ScorerError,
};
use super::service::{CampaignDraft, CampaignService, CampaignServiceError, Engagement};
use super::status::{CandidateStatus, TransitionError};

type SharedService<R, N, S, M> = Arc<CampaignService<R, N, S, M>>;

#[derive(Debug, Deserialize)]
pub struct LifecycleRequest {
    pub status: CampaignLifecycle,
}

#[derive(Debug, Deserialize)]
pub struct StatusChangeRequest {
    pub status: CandidateStatus,
    #[serde(default)]
    pub note: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CvReviewRequest {
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Deserialize)]
pub struct EngagementRequest {
    pub engagement: Engagement,
}

/// Router builder exposing campaign management and candidate progression endpoints.
pub fn campaign_router<R, N, S, M>(service: SharedService<R, N, S, M>) -> Router
where
    R: CampaignRepository + 'static,
    N: Notifier + 'static,
    S: Scorer + 'static,
    M: MetricsSink + 'static,
{
    Router::new()
        .route("/api/v1/campaigns", post(create_handler::<R, N, S, M>))
        .route(
            "/api/v1/campaigns/:campaign_id",
            get(campaign_handler::<R, N, S, M>),
        )
        .route(
            "/api/v1/campaigns/:campaign_id/lifecycle",
            post(lifecycle_handler::<R, N, S, M>),
        )
        .route(
            "/api/v1/campaigns/:campaign_id/run",
            post(run_handler::<R, N, S, M>),
        )
        .route(
            "/api/v1/campaigns/:campaign_id/report",
            get(report_handler::<R, N, S, M>),
        )
        .route(
            "/api/v1/campaigns/:campaign_id/candidates",
            post(attach_handler::<R, N, S, M>),
        )
        .route(
            "/api/v1/campaigns/:campaign_id/candidates/:candidate_id",
            get(candidate_handler::<R, N, S, M>),
        )
        .route(
            "/api/v1/campaigns/:campaign_id/candidates/:candidate_id/tick",
            post(tick_handler::<R, N, S, M>),
        )
        .route(
            "/api/v1/campaigns/:campaign_id/candidates/:candidate_id/status",
            post(status_handler::<R, N, S, M>),
        )
        .route(
            "/api/v1/campaigns/:campaign_id/candidates/:candidate_id/evaluations",
            post(evaluation_handler::<R, N, S, M>),
        )
        .route(
            "/api/v1/campaigns/:campaign_id/candidates/:candidate_id/score",
            post(score_handler::<R, N, S, M>),
        )
        .route(
            "/api/v1/campaigns/:campaign_id/candidates/:candidate_id/form",
            post(form_handler::<R, N, S, M>),
        )
        .route(
            "/api/v1/campaigns/:campaign_id/candidates/:candidate_id/cv-review",
            post(cv_review_handler::<R, N, S, M>),
        )
        .route(
            "/api/v1/campaigns/:campaign_id/candidates/:candidate_id/engagement",
            post(engagement_handler::<R, N, S, M>),
        )
        .route(
            "/api/v1/campaigns/:campaign_id/candidates/:candidate_id/tasks",
            get(tasks_handler::<R, N, S, M>),
        )
        .with_state(service)
}

pub(crate) async fn create_handler<R, N, S, M>(
    State(service): State<SharedService<R, N, S, M>>,
    axum::Json(draft): axum::Json<CampaignDraft>,
) -> Response
where
    R: CampaignRepository + 'static,
    N: Notifier + 'static,
    S: Scorer + 'static,
    M: MetricsSink + 'static,
{
    match service.create_campaign(draft) {
        Ok(campaign) => (StatusCode::CREATED, axum::Json(campaign)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn campaign_handler<R, N, S, M>(
    State(service): State<SharedService<R, N, S, M>>,
    Path(campaign_id): Path<String>,
) -> Response
where
    R: CampaignRepository + 'static,
    N: Notifier + 'static,
    S: Scorer + 'static,
    M: MetricsSink + 'static,
{
    let id = CampaignId(campaign_id);
    let result = service
        .campaign(&id)
        .and_then(|campaign| Ok((service.candidates(&id)?.len(), campaign)));
    match result {
        Ok((candidates, campaign)) => {
            let view = CampaignView::new(&campaign, candidates);
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn lifecycle_handler<R, N, S, M>(
    State(service): State<SharedService<R, N, S, M>>,
    Path(campaign_id): Path<String>,
    axum::Json(request): axum::Json<LifecycleRequest>,
) -> Response
where
    R: CampaignRepository + 'static,
    N: Notifier + 'static,
    S: Scorer + 'static,
    M: MetricsSink + 'static,
{
    match service.set_lifecycle(&CampaignId(campaign_id), request.status, Utc::now()) {
        Ok(campaign) => (StatusCode::OK, axum::Json(campaign)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn run_handler<R, N, S, M>(
    State(service): State<SharedService<R, N, S, M>>,
    Path(campaign_id): Path<String>,
) -> Response
where
    R: CampaignRepository + 'static,
    N: Notifier + 'static,
    S: Scorer + 'static,
    M: MetricsSink + 'static,
{
    match service.run_campaign(&CampaignId(campaign_id), Utc::now()) {
        Ok(summary) => (StatusCode::OK, axum::Json(summary)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn report_handler<R, N, S, M>(
    State(service): State<SharedService<R, N, S, M>>,
    Path(campaign_id): Path<String>,
) -> Response
where
    R: CampaignRepository + 'static,
    N: Notifier + 'static,
    S: Scorer + 'static,
    M: MetricsSink + 'static,
{
    match service.campaign_report(&CampaignId(campaign_id)) {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn attach_handler<R, N, S, M>(
    State(service): State<SharedService<R, N, S, M>>,
    Path(campaign_id): Path<String>,
    axum::Json(profile): axum::Json<CandidateProfile>,
) -> Response
where
    R: CampaignRepository + 'static,
    N: Notifier + 'static,
    S: Scorer + 'static,
    M: MetricsSink + 'static,
{
    match service.attach_candidate(&CampaignId(campaign_id), profile, Utc::now()) {
        Ok(candidate) => (StatusCode::CREATED, axum::Json(candidate)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn candidate_handler<R, N, S, M>(
    State(service): State<SharedService<R, N, S, M>>,
    Path((campaign_id, candidate_id)): Path<(String, String)>,
) -> Response
where
    R: CampaignRepository + 'static,
    N: Notifier + 'static,
    S: Scorer + 'static,
    M: MetricsSink + 'static,
{
    match service.candidate(&CampaignId(campaign_id), &CandidateId(candidate_id)) {
        Ok(candidate) => (StatusCode::OK, axum::Json(candidate)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn tick_handler<R, N, S, M>(
    State(service): State<SharedService<R, N, S, M>>,
    Path((campaign_id, candidate_id)): Path<(String, String)>,
) -> Response
where
    R: CampaignRepository + 'static,
    N: Notifier + 'static,
    S: Scorer + 'static,
    M: MetricsSink + 'static,
{
    match service.tick_candidate(
        &CampaignId(campaign_id),
        &CandidateId(candidate_id),
        Utc::now(),
    ) {
        Ok(outcome) => {
            let payload = json!({
                "candidate": outcome.candidate,
                "effects": outcome.effects,
                "waiting": outcome.waited.map(|reason| reason.label()),
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn status_handler<R, N, S, M>(
    State(service): State<SharedService<R, N, S, M>>,
    Path((campaign_id, candidate_id)): Path<(String, String)>,
    axum::Json(request): axum::Json<StatusChangeRequest>,
) -> Response
where
    R: CampaignRepository + 'static,
    N: Notifier + 'static,
    S: Scorer + 'static,
    M: MetricsSink + 'static,
{
    match service.transition_status(
        &CampaignId(campaign_id),
        &CandidateId(candidate_id),
        request.status,
        &request.note,
        Utc::now(),
    ) {
        Ok(candidate) => (StatusCode::OK, axum::Json(candidate)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn evaluation_handler<R, N, S, M>(
    State(service): State<SharedService<R, N, S, M>>,
    Path((campaign_id, candidate_id)): Path<(String, String)>,
    axum::Json(entry): axum::Json<EvaluationEntry>,
) -> Response
where
    R: CampaignRepository + 'static,
    N: Notifier + 'static,
    S: Scorer + 'static,
    M: MetricsSink + 'static,
{
    match service.record_evaluation(&CampaignId(campaign_id), &CandidateId(candidate_id), entry) {
        Ok(candidate) => (StatusCode::OK, axum::Json(candidate)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn score_handler<R, N, S, M>(
    State(service): State<SharedService<R, N, S, M>>,
    Path((campaign_id, candidate_id)): Path<(String, String)>,
) -> Response
where
    R: CampaignRepository + 'static,
    N: Notifier + 'static,
    S: Scorer + 'static,
    M: MetricsSink + 'static,
{
    match service.score_candidate(&CampaignId(campaign_id), &CandidateId(candidate_id)) {
        Ok(candidate) => (StatusCode::OK, axum::Json(candidate)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn form_handler<R, N, S, M>(
    State(service): State<SharedService<R, N, S, M>>,
    Path((campaign_id, candidate_id)): Path<(String, String)>,
) -> Response
where
    R: CampaignRepository + 'static,
    N: Notifier + 'static,
    S: Scorer + 'static,
    M: MetricsSink + 'static,
{
    match service.submit_form(
        &CampaignId(campaign_id),
        &CandidateId(candidate_id),
        Utc::now(),
    ) {
        Ok(candidate) => (StatusCode::OK, axum::Json(candidate)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn cv_review_handler<R, N, S, M>(
    State(service): State<SharedService<R, N, S, M>>,
    Path((campaign_id, candidate_id)): Path<(String, String)>,
    axum::Json(request): axum::Json<CvReviewRequest>,
) -> Response
where
    R: CampaignRepository + 'static,
    N: Notifier + 'static,
    S: Scorer + 'static,
    M: MetricsSink + 'static,
{
    match service.mark_cv_reviewed(
        &CampaignId(campaign_id),
        &CandidateId(candidate_id),
        &request.notes,
    ) {
        Ok(candidate) => (StatusCode::OK, axum::Json(candidate)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn engagement_handler<R, N, S, M>(
    State(service): State<SharedService<R, N, S, M>>,
    Path((campaign_id, candidate_id)): Path<(String, String)>,
    axum::Json(request): axum::Json<EngagementRequest>,
) -> Response
where
    R: CampaignRepository + 'static,
    N: Notifier + 'static,
    S: Scorer + 'static,
    M: MetricsSink + 'static,
{
    match service.record_engagement(
        &CampaignId(campaign_id),
        &CandidateId(candidate_id),
        request.engagement,
        Utc::now(),
    ) {
        Ok(candidate) => (StatusCode::OK, axum::Json(candidate)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn tasks_handler<R, N, S, M>(
    State(service): State<SharedService<R, N, S, M>>,
    Path((campaign_id, candidate_id)): Path<(String, String)>,
) -> Response
where
    R: CampaignRepository + 'static,
    N: Notifier + 'static,
    S: Scorer + 'static,
    M: MetricsSink + 'static,
{
    match service.candidate_tasks(&CampaignId(campaign_id), &CandidateId(candidate_id)) {
        Ok(tasks) => (StatusCode::OK, axum::Json(tasks)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) fn error_status(error: &CampaignServiceError) -> StatusCode {
    match error {
        CampaignServiceError::Campaign(CampaignError::InvalidLifecycle { .. }) => {
            StatusCode::CONFLICT
        }
        CampaignServiceError::Campaign(_) | CampaignServiceError::Evaluation(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        CampaignServiceError::Transition(error)
        | CampaignServiceError::Tick(TickError::Transition(error)) => transition_status(error),
        CampaignServiceError::Tick(TickError::Notifier(_)) => StatusCode::BAD_GATEWAY,
        CampaignServiceError::Tick(TickError::UnresolvedTarget { .. }) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        CampaignServiceError::Scorer(ScorerError::Unavailable(_)) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        CampaignServiceError::Scorer(ScorerError::InvalidResponse(_)) => StatusCode::BAD_GATEWAY,
        CampaignServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        CampaignServiceError::Repository(
            RepositoryError::Conflict | RepositoryError::VersionConflict { .. },
        ) => StatusCode::CONFLICT,
        CampaignServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        CampaignServiceError::CampaignNotActive { .. } => StatusCode::CONFLICT,
    }
}

fn transition_status(error: &TransitionError) -> StatusCode {
    match error {
        TransitionError::InvalidTransition { .. } => StatusCode::CONFLICT,
        TransitionError::MissingRequiredNote { .. } => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn error_response(error: CampaignServiceError) -> Response {
    let status = error_status(&error);
    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
