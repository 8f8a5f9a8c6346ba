use crate::cli::{load_artifacts, ServeArgs};
use crate::routes::{with_service_routes, AppState};
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;
use vet_triage::config::AppConfig;
use vet_triage::error::AppError;
use vet_triage::telemetry;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let artifacts = Arc::new(load_artifacts(&config.triage)?);
    info!(
        grave_terms = artifacts.vocabulary().grave_terms().len(),
        common_terms = artifacts.vocabulary().common_terms().len(),
        "triage artifacts ready"
    );

    let app = with_service_routes(artifacts)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "veterinary triage service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
