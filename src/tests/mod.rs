//! Integration and unit tests for the storefront backend.
//!
//! ## Test Modules
//!
//! - **filter_tests**: filter construction, validation and in-memory matching
//! - **memory_store_tests**: the in-memory backend against the storage contract
//! - **sql_store_tests**: the SQLite backend against the storage contract
//! - **document_store_tests**: the SurrealDB backend against the storage contract
//! - **todos_api_tests**: `/todos` endpoints
//! - **products_api_tests**: `/products` endpoints
//! - **health_api_tests**: health, readiness, metrics and version endpoints
//! - **error_tests**: error mapping and the JSON error envelope
//! - **config_tests**: configuration loading and validation
//! - **db_tests**: SQLite bootstrap and backend selection

pub mod memory_store_tests;
pub mod todos_api_tests;

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request},
    response::Response,
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

use crate::config::{AppConfig, ProductBackend, TodoBackend};
use crate::models::{Product, Todo};
use crate::state::AppState;
use crate::store::{DocumentStore, Storer};

/// Defaults with both resources in memory, so no test touches the filesystem.
pub(crate) fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.storage.todos = TodoBackend::Memory;
    config.storage.products = ProductBackend::Memory;
    config.database.url = "sqlite::memory:".to_string();
    config.database.max_connections = 1;
    config
}

pub(crate) fn test_app(
    todos: Arc<dyn Storer<Todo>>,
    products: Arc<dyn Storer<Product>>,
) -> (Router, AppState) {
    let state = AppState::new(todos, products, test_config());
    (crate::routes::router(state.clone()), state)
}

/// A fresh in-memory SQLite database with the schema applied.
pub(crate) async fn sqlite_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new().max_connections(1).connect("sqlite::memory:").await.unwrap();
    crate::db::init_db(&pool).await.unwrap();
    pool
}

/// A fresh embedded SurrealDB instance.
pub(crate) async fn document_store() -> DocumentStore {
    DocumentStore::connect("mem://", "test", "test").await.unwrap()
}

pub(crate) fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub(crate) fn json_request(method: Method, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub(crate) async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub(crate) async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}
