//! HTTP API server for the order service.
//!
//! Exposes the order use cases and search as REST endpoints, with
//! structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, patch};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::Config;
pub use error::ApiError;
pub use state::{AppState, Backends, StartupError, connect, create_in_memory_state, create_state};

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::system::metrics))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::system::health))
        .route(
            "/orders",
            get(routes::orders::list).post(routes::orders::create),
        )
        .route("/orders/search", get(routes::orders::search))
        .route(
            "/orders/{id}",
            get(routes::orders::get).patch(routes::orders::update_items),
        )
        .route("/orders/{id}/confirm", patch(routes::orders::confirm))
        .route("/orders/{id}/process", patch(routes::orders::process))
        .route("/orders/{id}/ship", patch(routes::orders::ship))
        .route("/orders/{id}/deliver", patch(routes::orders::deliver))
        .route("/orders/{id}/cancel", patch(routes::orders::cancel))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
