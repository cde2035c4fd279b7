use crate::infra::{ApiService, AppState};
use axum::extract::Path;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use chrono::Utc;
use recruit_ai::error::AppError;
use recruit_ai::workflows::campaign::{
    campaign_router, CampaignBlueprint, CampaignId, CampaignServiceError, CandidateId,
    RepositoryError,
};
use recruit_ai::workflows::roster::RosterImporter;
use serde::Serialize;
use serde_json::json;
use std::io::Cursor;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub(crate) struct RosterImportResponse {
    pub(crate) campaign_id: CampaignId,
    pub(crate) attached: Vec<CandidateId>,
    pub(crate) skipped: usize,
}

pub(crate) fn with_campaign_routes(service: Arc<ApiService>) -> axum::Router {
    campaign_router(service.clone())
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/blueprints/standard",
            axum::routing::get(blueprint_endpoint),
        )
        .route(
            "/api/v1/campaigns/:campaign_id/roster",
            axum::routing::post(roster_import_endpoint),
        )
        .layer(Extension(service))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn blueprint_endpoint() -> impl IntoResponse {
    Json(CampaignBlueprint::standard_outreach().into_steps())
}

/// Attaches every profile of a CSV roster; profiles already in the campaign are skipped.
pub(crate) async fn roster_import_endpoint(
    Extension(service): Extension<Arc<ApiService>>,
    Path(campaign_id): Path<String>,
    body: String,
) -> Result<(StatusCode, Json<RosterImportResponse>), AppError> {
    let campaign_id = CampaignId(campaign_id);
    let profiles = RosterImporter::from_reader(Cursor::new(body.into_bytes()))?;

    let now = Utc::now();
    let mut attached = Vec::new();
    let mut skipped = 0;
    for profile in profiles {
        match service.attach_candidate(&campaign_id, profile, now) {
            Ok(candidate) => attached.push(candidate.id),
            Err(CampaignServiceError::Repository(RepositoryError::Conflict)) => skipped += 1,
            Err(err) => return Err(err.into()),
        }
    }

    Ok((
        StatusCode::CREATED,
        Json(RosterImportResponse {
            campaign_id,
            attached,
            skipped,
        }),
    ))
}
