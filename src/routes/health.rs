use std::time::Duration;

use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::store::StoreResult;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};

const READY_TIMEOUT: Duration = Duration::from_secs(5);

// Health check endpoint - lightweight, touches no backend
pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn check_store(name: &str, ping: impl std::future::Future<Output = StoreResult<()>>) -> Result<(), String> {
    match tokio::time::timeout(READY_TIMEOUT, ping).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(format!("{}: {}", name, e)),
        Err(_) => Err(format!("{}: timeout", name)),
    }
}

// Readiness: pings both stores with timeout protection
pub async fn readyz(State(state): State<AppState>) -> AppResult<&'static str> {
    let (todos, products) =
        tokio::join!(check_store("todos", state.todos.ping()), check_store("products", state.products.ping()));
    todos.and(products).map_err(|reason| AppError::ServiceUnavailable(format!("not ready: {}", reason)))?;
    Ok("ready")
}

// Metrics endpoint: returns JSON snapshot
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.metrics.get_snapshot())
}

// Prometheus-compatible text exposition format
pub async fn metrics_prometheus(State(state): State<AppState>) -> impl IntoResponse {
    let m = state.metrics.get_snapshot();
    let body = format!(
        "# HELP storefront_lists_served List requests served\n# TYPE storefront_lists_served counter\nstorefront_lists_served {}\n\
# HELP storefront_lookups_served Single-record lookups served\n# TYPE storefront_lookups_served counter\nstorefront_lookups_served {}\n\
# HELP storefront_records_created Records created\n# TYPE storefront_records_created counter\nstorefront_records_created {}\n\
# HELP storefront_records_saved Records updated\n# TYPE storefront_records_saved counter\nstorefront_records_saved {}\n\
# HELP storefront_storage_errors Storage backend failures\n# TYPE storefront_storage_errors counter\nstorefront_storage_errors {}\n\
# HELP storefront_uptime_seconds Uptime seconds\n# TYPE storefront_uptime_seconds gauge\nstorefront_uptime_seconds {}\n",
        m.lists_served, m.lookups_served, m.records_created, m.records_saved, m.storage_errors, m.uptime_seconds,
    );
    ([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body)
}

// Version/Build info endpoint (JSON)
pub async fn version(State(state): State<AppState>) -> impl IntoResponse {
    let body = serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "package": {
            "description": env!("CARGO_PKG_DESCRIPTION"),
            "license": env!("CARGO_PKG_LICENSE"),
        },
        "storage": {
            "todos": format!("{:?}", state.config.storage.todos).to_lowercase(),
            "products": format!("{:?}", state.config.storage.products).to_lowercase(),
        },
        "build": {
            "profile": if cfg!(debug_assertions) { "debug" } else { "release" },
            "os": std::env::consts::OS,
            "arch": std::env::consts::ARCH,
        }
    });
    (StatusCode::OK, Json(body))
}
