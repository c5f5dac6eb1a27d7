use std::sync::Arc;

use crate::config::AppConfig;
use crate::metrics::Metrics;
use crate::models::{Product, Todo};
use crate::store::Storer;

/// The shared application state.
///
/// Built once at startup and cloned into every handler. The stores are trait
/// objects, so handlers never learn which backend serves a resource.
#[derive(Clone)]
pub struct AppState {
    /// Storage for todos (relational by default).
    pub todos: Arc<dyn Storer<Todo>>,
    /// Storage for products (document store by default).
    pub products: Arc<dyn Storer<Product>>,
    pub config: Arc<AppConfig>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(
        todos: Arc<dyn Storer<Todo>>,
        products: Arc<dyn Storer<Product>>,
        config: AppConfig,
    ) -> Self {
        Self { todos, products, config: Arc::new(config), metrics: Metrics::new() }
    }
}
