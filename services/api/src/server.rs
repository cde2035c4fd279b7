use crate::cli::ServeArgs;
use crate::infra::{build_service, ApiService, AppState};
use crate::routes::with_campaign_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use chrono::Utc;
use recruit_ai::config::AppConfig;
use recruit_ai::error::AppError;
use recruit_ai::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(secs) = args.tick_interval_secs.take() {
        config.engine.tick_interval_secs = secs.max(1);
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let service = Arc::new(build_service(config.engine));
    let ticker = tokio::spawn(run_ticker(service.clone(), config.engine.tick_interval()));

    let app = with_campaign_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        tick_interval_secs = config.engine.tick_interval_secs,
        "campaign engine ready"
    );

    let served = axum::serve(listener, app).await;
    ticker.abort();
    served?;
    Ok(())
}

/// Ticks every active campaign on a fixed interval. Runs happen on the blocking pool since the
/// engine's collaborators are synchronous.
async fn run_ticker(service: Arc<ApiService>, period: Duration) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        interval.tick().await;
        let service = service.clone();
        let run = tokio::task::spawn_blocking(move || service.run_active_campaigns(Utc::now()));

        match run.await {
            Ok(Ok(summaries)) => {
                for summary in summaries {
                    let campaign_id = summary
                        .campaign_id
                        .as_ref()
                        .map(|id| id.0.as_str())
                        .unwrap_or_default();
                    for failure in &summary.failures {
                        warn!(
                            campaign_id,
                            candidate_id = %failure.candidate_id.0,
                            error = %failure.error,
                            "candidate tick failed"
                        );
                    }
                    if summary.advanced > 0 || !summary.failures.is_empty() {
                        info!(
                            campaign_id,
                            advanced = summary.advanced,
                            waiting = summary.waiting,
                            failed = summary.failures.len(),
                            "campaign run finished"
                        );
                    }
                }
            }
            Ok(Err(err)) => warn!(error = %err, "campaign run aborted"),
            Err(err) => warn!(error = %err, "campaign ticker task panicked"),
        }
    }
}
