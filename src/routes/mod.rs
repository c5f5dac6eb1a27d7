//! HTTP route handlers for the storefront API.
//!
//! - `health`: liveness, readiness, metrics and version endpoints
//! - `products`: product catalog, served by the document store by default
//! - `todos`: todo list, served by the relational store by default

use axum::{
    routing::{get, put},
    Router,
};

use crate::metrics::Metrics;
use crate::state::AppState;
use crate::store::{StoreError, StoreResult};

pub mod health;
pub mod products;
pub mod todos;

/// Builds the API router. Layers (tracing, body limit, CORS) are added by the caller.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health::healthz))
        .route("/readyz", get(health::readyz))
        .route("/metrics", get(health::metrics))
        .route("/metrics/prometheus", get(health::metrics_prometheus))
        .route("/version", get(health::version))
        .route("/todos", get(todos::list_todos).post(todos::create_todo))
        .route("/todos/{id}", get(todos::get_todo).patch(todos::update_todo))
        .route("/products", get(products::list_products).post(products::create_product))
        .route("/products/{id}", put(products::update_product).get(products::get_product))
        .with_state(state)
}

/// Counts backend failures on the way out of a storage call.
pub(crate) trait Tracked {
    fn tracked(self, metrics: &Metrics) -> Self;
}

impl<T> Tracked for StoreResult<T> {
    fn tracked(self, metrics: &Metrics) -> Self {
        if let Err(e) = &self {
            if !matches!(e, StoreError::NotFound | StoreError::InvalidFilter(_)) {
                metrics.inc_storage_errors();
            }
        }
        self
    }
}
