//! HTTP API for issuing and printing invoices.
//!
//! Exposes the issue and print operations over REST, with structured
//! logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use saga::{InvoiceIssuer, PrintCoordinator};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::invoices::{AppState, SharedInventory, SharedStore};

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/invoices",
            post(routes::invoices::create).get(routes::invoices::list),
        )
        .route("/invoices/{id}", get(routes::invoices::get))
        .route("/invoices/{id}/print", post(routes::invoices::print))
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

/// Creates the application state over the given store and ledger client.
pub fn create_default_state(store: SharedStore, inventory: SharedInventory) -> Arc<AppState> {
    Arc::new(AppState {
        issuer: InvoiceIssuer::new(store.clone(), inventory.clone()),
        coordinator: PrintCoordinator::new(store, inventory),
    })
}
