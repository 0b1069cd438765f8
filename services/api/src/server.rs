use crate::cli::ServeArgs;
use crate::infra::{estimation_service, AppState};
use crate::routes::with_estimation_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use rom_estimator::config::AppConfig;
use rom_estimator::error::AppError;
use rom_estimator::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

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
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let service = Arc::new(estimation_service(
        &config.storage,
        args.overrides_dir.take(),
    ));
    let platforms = service.catalog().platforms().count();

    let app = with_estimation_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, platforms, "rom estimator ready");

    axum::serve(listener, app).await?;
    Ok(())
}
