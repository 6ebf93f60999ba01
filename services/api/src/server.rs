use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_quiz_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use sleep_quiz::config::AppConfig;
use sleep_quiz::error::AppError;
use sleep_quiz::quiz::QuizDefinition;
use sleep_quiz::telemetry;
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

    let definition = Arc::new(QuizDefinition::for_variant(config.quiz.variant));
    let quiz_title = definition.title().to_string();

    let app = with_quiz_routes(definition)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, quiz = %quiz_title, "sleep quiz service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
