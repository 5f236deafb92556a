pub(crate) mod generate;
pub(crate) mod graph;
pub(crate) mod health;
pub(crate) mod metrics;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::app::AppState;

pub(crate) fn router(state: AppState) -> Router {
    Router::new()
        .route("/health/ready", get(health::ready))
        .route("/health/live", get(health::live))
        .route("/metrics", get(metrics::exporter))
        .route("/generate", post(generate::generate))
        .route("/v1/pipeline/graph", get(graph::mermaid))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
