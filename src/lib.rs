//! # Storefront Backend Library
//!
//! A small REST backend serving **todos** and **products**. Each resource is
//! persisted through the [`store::Storer`] contract, so the same handlers run
//! unchanged against a relational store (SQLite), a document store
//! (SurrealDB), or an in-memory store.
//!
//! ## Architecture
//!
//! - **Axum**: HTTP server and routing
//! - **SQLx**: relational storage on SQLite
//! - **SurrealDB**: schema-less document storage
//! - **Tokio**: async runtime
//!
//! ## Core Components
//!
//! - [`config`]: layered configuration (embedded defaults, files, environment)
//! - [`db`]: backend bootstrap and relational schema
//! - [`error`]: HTTP error type and JSON error envelope
//! - [`extract`]: request extractors that reject with the error envelope
//! - [`metrics`]: request and storage counters
//! - [`models`]: the `Todo` and `Product` entities
//! - [`routes`]: HTTP handlers and the router
//! - [`state`]: shared application state
//! - [`store`]: the storage contract and its backends
//! - [`types`]: request and response bodies

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod metrics;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;
pub mod types;

#[cfg(test)]
mod tests;
