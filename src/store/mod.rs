//! Storage abstraction shared by every backend.
//!
//! Controllers talk to a [`Storer`] and never learn which backend is behind it.
//! Three implementations exist:
//!
//! - [`SqlStore`]: relational rows in SQLite via `sqlx`
//! - [`DocumentStore`]: schema-less documents in SurrealDB
//! - [`MemoryStore`]: process-local records, used by tests and demos
//!
//! Entities opt into the contract through [`Identifiable`] (compile-time access
//! to the identifier) and [`Entity`] (collection name and filterable fields).

use std::{fmt, time::Duration};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

pub mod document;
pub mod memory;
pub mod sql;

pub use document::DocumentStore;
pub use memory::{GeneratedId, MemoryStore};
pub use sql::{Record, SqlStore};

/// Name of the identifier field in every entity's serialized form.
pub const ID_FIELD: &str = "id";

/// Errors surfaced by storage backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No record matched a single-record lookup.
    #[error("record not found")]
    NotFound,
    /// The backend did not answer within the operation deadline.
    #[error("operation timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    /// The filter references a field the entity does not expose.
    #[error("invalid filter: {0}")]
    InvalidFilter(String),
    #[error("{0}")]
    Sql(#[from] sqlx::Error),
    #[error("{0}")]
    Document(#[from] surrealdb::Error),
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),
    /// Backend-specific failure without a richer type.
    #[error("{0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Compile-time access to an entity's identifier.
///
/// An identifier is unset until the backend assigns one on create.
pub trait Identifiable {
    /// Every backend returns records in ascending identifier order.
    type Id: Clone + Ord + fmt::Debug + fmt::Display + Send + Sync + 'static;

    fn id(&self) -> Option<&Self::Id>;

    fn set_id(&mut self, id: Self::Id);
}

/// A storable record.
pub trait Entity:
    Identifiable + Serialize + DeserializeOwned + Clone + Send + Sync + Unpin + 'static
{
    /// Table or collection holding the records.
    const COLLECTION: &'static str;
    /// Fields that may appear in a [`Filter`], besides [`ID_FIELD`].
    const FIELDS: &'static [&'static str];
}

/// The storage contract every backend implements.
#[async_trait]
pub trait Storer<E: Entity>: Send + Sync {
    /// All records matching `filter`. No match is an empty vector, never an error.
    async fn find(&self, filter: &Filter) -> StoreResult<Vec<E>>;

    /// The first record matching `filter`, or [`StoreError::NotFound`].
    async fn first(&self, filter: &Filter) -> StoreResult<E>;

    /// Persists `value` and writes the backend-assigned identifier back into it.
    async fn create(&self, value: &mut E) -> StoreResult<()>;

    /// Updates the record keyed by `value`'s identifier.
    ///
    /// A value whose identifier is unset was never created; the call returns
    /// `Ok(())` without writing. Missing records are not created.
    async fn save(&self, value: &mut E) -> StoreResult<()>;

    /// Number of records matching `filter`, ignoring its limit.
    async fn count(&self, filter: &Filter) -> StoreResult<u64>;

    /// Checks that the backend is reachable.
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

/// A scalar used in filter conditions and relational bindings.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Text(String),
    Bool(bool),
    Timestamp(chrono::DateTime<chrono::Utc>),
    Null,
}

impl Value {
    /// JSON form, as the value appears inside a serialized entity.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Int(v) => serde_json::Value::from(*v),
            Value::Text(v) => serde_json::Value::from(v.as_str()),
            Value::Bool(v) => serde_json::Value::from(*v),
            Value::Timestamp(v) => serde_json::to_value(v).unwrap_or(serde_json::Value::Null),
            Value::Null => serde_json::Value::Null,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<chrono::DateTime<chrono::Utc>> for Value {
    fn from(v: chrono::DateTime<chrono::Utc>) -> Self {
        Value::Timestamp(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// One predicate of a [`Filter`].
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Field equals the value exactly.
    Eq { field: String, value: Value },
    /// Field contains the needle, ignoring case.
    Contains { field: String, needle: String },
}

impl Condition {
    pub fn field(&self) -> &str {
        match self {
            Condition::Eq { field, .. } | Condition::Contains { field, .. } => field,
        }
    }
}

/// Backend-agnostic query: a conjunction of conditions plus an optional limit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
    limit: Option<u64>,
}

impl Filter {
    /// Matches every record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Matches the record with the given identifier.
    pub fn by_id(id: impl Into<Value>) -> Self {
        Self::new().eq(ID_FIELD, id)
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Eq { field: field.into(), value: value.into() });
        self
    }

    pub fn contains(mut self, field: impl Into<String>, needle: impl Into<String>) -> Self {
        self.conditions.push(Condition::Contains { field: field.into(), needle: needle.into() });
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn max_results(&self) -> Option<u64> {
        self.limit
    }

    /// True when any condition is a [`Condition::Contains`].
    pub fn has_text_search(&self) -> bool {
        self.conditions.iter().any(|c| matches!(c, Condition::Contains { .. }))
    }

    /// Rejects conditions on fields `E` does not expose.
    ///
    /// Backends interpolate field names into queries, so this runs before any
    /// statement is built.
    pub fn validate<E: Entity>(&self) -> StoreResult<()> {
        for condition in &self.conditions {
            let field = condition.field();
            if field != ID_FIELD && !E::FIELDS.contains(&field) {
                return Err(StoreError::InvalidFilter(format!(
                    "unknown field '{}' for {}",
                    field,
                    E::COLLECTION
                )));
            }
        }
        Ok(())
    }

    /// Evaluates the conditions against a serialized entity.
    pub fn matches(&self, doc: &serde_json::Value) -> bool {
        self.conditions.iter().all(|condition| match condition {
            Condition::Eq { field, value } => doc.get(field) == Some(&value.to_json()),
            Condition::Contains { field, needle } => doc
                .get(field)
                .and_then(|v| v.as_str())
                .map(|s| contains_folded(s, needle))
                .unwrap_or(false),
        })
    }
}

/// Case-insensitive substring test with full Unicode case folding, the same
/// folding SurrealDB's `string::lowercase` applies.
pub fn contains_folded(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
