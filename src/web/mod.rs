use axum::{
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::path::PathBuf;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::{AppConfig, TaskService};

pub mod handlers;
pub mod responses;

pub use handlers::{
    check_device, get_status, health_check, place_order, start_search, task_events_ws,
    OrderRequest, SearchRequest,
};
pub use responses::*;

#[derive(Clone)]
pub struct AppState {
    pub service: TaskService,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(service: TaskService, config: AppConfig) -> Self {
        Self { service, config }
    }
}

pub fn create_router(state: AppState) -> Router {
    let web_dir = PathBuf::from(&state.config.server.web_dir);

    Router::new()
        // Health check
        .route("/health", get(health_check))

        // Task API
        .route("/search", post(start_search))
        .route("/order", post(place_order))
        .route("/status/:task_id", get(get_status))
        .route("/check-device", get(check_device))
        .route("/ws/:task_id", get(task_events_ws))

        // Web UI
        .route_service("/", ServeFile::new(web_dir.join("index.html")))
        .nest_service("/static", ServeDir::new(&web_dir))

        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                    .on_response(DefaultOnResponse::new().level(Level::INFO)))
                .layer(CompressionLayer::new())
                .layer(CorsLayer::permissive())
        )
        .with_state(state)
}

pub async fn serve(
    config: AppConfig,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(
        format!("{}:{}", config.server.host, config.server.port)
    ).await?;

    tracing::info!(
        "Server starting on {}:{}",
        config.server.host,
        config.server.port
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
