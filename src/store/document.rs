//! SurrealDB-backed [`Storer`].
//!
//! Records live in a schema-less collection named after [`Entity::COLLECTION`].
//! The SurrealDB record key is the entity identifier: it is generated by the
//! database on create and projected back as a plain string on every read.
//!
//! Documents follow an omit-empty rule: the identifier and any empty scalar
//! (`""`, `0`, `false`, `null`) are dropped before a write. On save this turns
//! the update into a merge where empty fields keep their stored value.

use std::{future::Future, time::Duration};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use surrealdb::{engine::any::Any, Surreal};

use super::{Condition, Entity, Filter, Storer, StoreError, StoreResult, Value, ID_FIELD};
use crate::models::DocumentId;

/// Deadline applied to every backend call.
pub const OPERATION_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct DocumentStore {
    db: Surreal<Any>,
}

#[derive(Deserialize)]
struct CountRow {
    count: u64,
}

impl DocumentStore {
    pub fn new(db: Surreal<Any>) -> Self {
        Self { db }
    }

    /// Connects to `url` (`mem://`, `surrealkv://path`, `ws://host:port`, ...)
    /// and selects the namespace and database.
    pub async fn connect(url: &str, namespace: &str, database: &str) -> StoreResult<Self> {
        let db = surrealdb::engine::any::connect(url.to_string()).await?;
        db.use_ns(namespace).use_db(database).await?;
        tracing::info!(url, namespace, database, "document store connected");
        Ok(Self::new(db))
    }
}

/// Runs `op` under [`OPERATION_TIMEOUT`]; expiry drops the in-flight call.
pub(crate) async fn bounded<T>(op: impl Future<Output = StoreResult<T>>) -> StoreResult<T> {
    match tokio::time::timeout(OPERATION_TIMEOUT, op).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(OPERATION_TIMEOUT)),
    }
}

/// A SurrealQL statement and the parameters it references.
struct Statement {
    text: String,
    params: Vec<(String, JsonValue)>,
}

impl Statement {
    fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), params: Vec::new() }
    }

    fn push(&mut self, sql: &str) -> &mut Self {
        self.text.push_str(sql);
        self
    }

    fn bind(&mut self, value: Value) -> String {
        self.bind_json(value.to_json())
    }

    /// Registers a parameter and returns its `$name` placeholder.
    fn bind_json(&mut self, value: JsonValue) -> String {
        let name = format!("p{}", self.params.len());
        let placeholder = format!("${}", name);
        self.params.push((name, value));
        placeholder
    }

    fn push_where(&mut self, filter: &Filter) {
        for (i, condition) in filter.conditions().iter().enumerate() {
            self.push(if i == 0 { " WHERE " } else { " AND " });
            match condition {
                Condition::Eq { field, value } if field == ID_FIELD => {
                    let p = self.bind(value.clone());
                    self.push(&format!("id = type::thing($collection, {})", p));
                }
                Condition::Eq { field, value } => {
                    let p = self.bind(value.clone());
                    self.push(&format!("{} = {}", field, p));
                }
                Condition::Contains { field, needle } => {
                    let p = self.bind(Value::Text(needle.clone()));
                    self.push(&format!(
                        "string::contains(string::lowercase({}), string::lowercase({}))",
                        field, p
                    ));
                }
            }
        }
    }
}

fn select<E: Entity>(filter: &Filter, limit: Option<u64>) -> Statement {
    let mut fields = vec![format!("record::id(id) AS {}", ID_FIELD)];
    fields.extend(E::FIELDS.iter().map(|f| f.to_string()));
    let mut stmt = Statement::new(format!("SELECT {} FROM type::table($collection)", fields.join(", ")));
    stmt.push_where(filter);
    stmt.push(&format!(" ORDER BY {}", ID_FIELD));
    if let Some(limit) = limit {
        let p = stmt.bind(Value::Int(i64::try_from(limit).unwrap_or(i64::MAX)));
        stmt.push(&format!(" LIMIT {}", p));
    }
    stmt
}

fn is_empty(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => true,
        JsonValue::Bool(b) => !b,
        JsonValue::Number(n) => n.as_f64() == Some(0.0),
        JsonValue::String(s) => s.is_empty(),
        JsonValue::Array(a) => a.is_empty(),
        JsonValue::Object(o) => o.is_empty(),
    }
}

/// The document written for `value`: no identifier, no empty fields.
pub(crate) fn storable<E: Serialize>(value: &E) -> StoreResult<JsonValue> {
    let mut doc = serde_json::to_value(value)?;
    if let Some(fields) = doc.as_object_mut() {
        fields.remove(ID_FIELD);
        fields.retain(|_, v| !is_empty(v));
    }
    Ok(doc)
}

impl DocumentStore {
    async fn run(&self, collection: &'static str, stmt: Statement) -> StoreResult<surrealdb::Response> {
        let mut query = self.db.query(stmt.text).bind(("collection", collection));
        for param in stmt.params {
            query = query.bind(param);
        }
        Ok(query.await?)
    }
}

#[async_trait]
impl<E> Storer<E> for DocumentStore
where
    E: Entity<Id = DocumentId>,
{
    async fn find(&self, filter: &Filter) -> StoreResult<Vec<E>> {
        filter.validate::<E>()?;
        let stmt = select::<E>(filter, filter.max_results());
        bounded(async {
            let mut response = self.run(E::COLLECTION, stmt).await?;
            let rows: Vec<E> = response.take(0)?;
            Ok(rows)
        })
        .await
    }

    async fn first(&self, filter: &Filter) -> StoreResult<E> {
        filter.validate::<E>()?;
        let stmt = select::<E>(filter, Some(1));
        bounded(async {
            let mut response = self.run(E::COLLECTION, stmt).await?;
            let row: Option<E> = response.take(0)?;
            row.ok_or(StoreError::NotFound)
        })
        .await
    }

    async fn create(&self, value: &mut E) -> StoreResult<()> {
        let doc = storable(&*value)?;
        let mut stmt = Statement::new("LET $created = CREATE ONLY type::table($collection) CONTENT ");
        let p = stmt.bind_json(doc);
        stmt.push(&format!("{}; RETURN record::id($created.id);", p));

        let key: Option<String> = bounded(async {
            let mut response = self.run(E::COLLECTION, stmt).await?;
            Ok(response.take(1)?)
        })
        .await?;

        let key = key.ok_or_else(|| StoreError::Backend("create returned no record key".into()))?;
        let id: DocumentId = key
            .parse()
            .map_err(|e| StoreError::Backend(format!("unexpected record key '{}': {}", key, e)))?;
        tracing::debug!(collection = E::COLLECTION, %id, "document created");
        value.set_id(id);
        Ok(())
    }

    async fn save(&self, value: &mut E) -> StoreResult<()> {
        let Some(id) = value.id().cloned() else {
            tracing::warn!(collection = E::COLLECTION, "save skipped: document has no id");
            return Ok(());
        };
        let doc = storable(&*value)?;
        let mut stmt = Statement::new("UPDATE type::thing($collection, ");
        let key = stmt.bind(Value::Text(id.to_string()));
        let p = stmt.bind_json(doc);
        stmt.push(&format!("{}) MERGE {} RETURN NONE", key, p));

        bounded(async {
            self.run(E::COLLECTION, stmt).await?.check()?;
            Ok(())
        })
        .await?;
        tracing::debug!(collection = E::COLLECTION, %id, "document updated");
        Ok(())
    }

    async fn count(&self, filter: &Filter) -> StoreResult<u64> {
        filter.validate::<E>()?;
        let mut stmt = Statement::new("SELECT count() FROM type::table($collection)");
        stmt.push_where(filter);
        stmt.push(" GROUP ALL");
        bounded(async {
            let mut response = self.run(E::COLLECTION, stmt).await?;
            let row: Option<CountRow> = response.take(0)?;
            Ok(row.map(|r| r.count).unwrap_or(0))
        })
        .await
    }

    async fn ping(&self) -> StoreResult<()> {
        bounded(async { Ok(self.db.health().await?) }).await
    }
}
