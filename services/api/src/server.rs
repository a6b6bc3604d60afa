use crate::cli::ServeArgs;
use crate::infra::{load_directory, AppState};
use crate::routes::with_presence_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use shiftgate::config::AppConfig;
use shiftgate::error::AppError;
use shiftgate::telemetry;
use shiftgate::workflows::clock::{InMemoryAttendanceSink, SystemClock};
use shiftgate::workflows::face::FaceValidationPipeline;
use shiftgate::workflows::PresenceService;
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

    let directory = Arc::new(load_directory(args.locations.as_deref())?);
    let pipeline = FaceValidationPipeline::new(config.face.thresholds()?);
    let presence = Arc::new(PresenceService::new(
        directory,
        Arc::new(InMemoryAttendanceSink::new()),
        Arc::new(SystemClock),
        pipeline,
    ));

    let app = with_presence_routes(presence)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        geolocation_timeout_secs = config.clock.geolocation_timeout.as_secs(),
        "shiftgate presence service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
