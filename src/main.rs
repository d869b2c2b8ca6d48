// Main entry point - Dependency injection and server setup
use std::{net::SocketAddr, sync::Arc};

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use diagram_telemetry::application::chart_service::ChartService;
use diagram_telemetry::application::expression_engine::ExpressionEngine;
use diagram_telemetry::application::live_service::LiveService;
use diagram_telemetry::infrastructure::config::load_app_config;
use diagram_telemetry::infrastructure::evalexpr_evaluator::EvalexprEvaluator;
use diagram_telemetry::infrastructure::json_repository::JsonFileRepository;
use diagram_telemetry::presentation::app_state::AppState;
use diagram_telemetry::presentation::handlers::{
    get_chart, get_readings, health_check, push_update, validate_expression,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = load_app_config()?;

    // Initialize tracing; RUST_LOG takes precedence over the configured level
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .init();

    // Create repository and evaluator (infrastructure layer)
    let repository = Arc::new(JsonFileRepository::new(config.data.dir.clone()));
    let engine = ExpressionEngine::new(Arc::new(EvalexprEvaluator::new()));

    // Create services (application layer)
    let chart_service = ChartService::new(repository.clone(), engine.clone());
    let live_service = LiveService::new(repository, engine);

    let state = Arc::new(AppState {
        chart_service,
        live_service,
    });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/buildings/:id/readings", get(get_readings))
        .route("/buildings/:id/chart", get(get_chart))
        .route("/buildings/:id/expressions/validate", post(validate_expression))
        .route("/buildings/:id/updates", post(push_update))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr: SocketAddr = config.server.bind_address.parse()?;
    tracing::info!(
        "Starting diagram-telemetry on {} (data: {})",
        addr,
        config.data.dir.display()
    );

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
