use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_pricing_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use dairy_price::config::AppConfig;
use dairy_price::error::AppError;
use dairy_price::pricing::InferencePipeline;
use dairy_price::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let pipeline = Arc::new(InferencePipeline::load(&config.artifacts, &config.report)?);
    if let Some(reason) = pipeline.predictor().unavailable_reason() {
        warn!(%reason, "serving without a price model; readiness will report unavailable");
    }

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        pipeline: pipeline.clone(),
    };

    let app = with_pricing_routes(pipeline)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "dairy price service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
