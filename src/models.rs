use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::{Entity, GeneratedId, Identifiable, Record, Value};

/// A todo item, stored as a row in the `todos` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Todo {
    pub id: Option<i64>,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Todo {
    pub fn new(title: impl Into<String>) -> Self {
        Self { id: None, title: title.into(), completed: false, created_at: None, updated_at: None }
    }
}

impl Identifiable for Todo {
    type Id = i64;

    fn id(&self) -> Option<&i64> {
        self.id.as_ref()
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }
}

impl Entity for Todo {
    const COLLECTION: &'static str = "todos";
    const FIELDS: &'static [&'static str] = &["title", "completed"];
}

impl Record for Todo {
    const COLUMNS: &'static [&'static str] = &["title", "completed", "created_at", "updated_at"];

    fn values(&self) -> Vec<Value> {
        vec![
            self.title.clone().into(),
            self.completed.into(),
            self.created_at.into(),
            self.updated_at.into(),
        ]
    }

    fn touch(&mut self, now: DateTime<Utc>, created: bool) {
        if created || self.created_at.is_none() {
            self.created_at = Some(now);
        }
        self.updated_at = Some(now);
    }
}

/// Error returned when a string is not a valid [`DocumentId`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("document ids are 1-{} characters of [A-Za-z0-9_]", DocumentId::MAX_LEN)]
pub struct InvalidDocumentId;

/// Record key assigned by the document store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentId(String);

impl DocumentId {
    pub const MAX_LEN: usize = 64;

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for DocumentId {
    type Err = InvalidDocumentId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let valid = !s.is_empty()
            && s.len() <= Self::MAX_LEN
            && s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_');
        if valid {
            Ok(Self(s.to_string()))
        } else {
            Err(InvalidDocumentId)
        }
    }
}

impl TryFrom<String> for DocumentId {
    type Error = InvalidDocumentId;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<DocumentId> for String {
    fn from(id: DocumentId) -> Self {
        id.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<DocumentId> for Value {
    fn from(id: DocumentId) -> Self {
        Value::Text(id.0)
    }
}

impl GeneratedId for DocumentId {
    fn generate(_sequence: u64) -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }
}

/// A catalog product, stored as a document in the `products` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<DocumentId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub price: i64,
    #[serde(default)]
    pub description: String,
}

impl Product {
    pub fn new(name: impl Into<String>, price: i64, description: impl Into<String>) -> Self {
        Self { id: None, name: name.into(), price, description: description.into() }
    }
}

impl Identifiable for Product {
    type Id = DocumentId;

    fn id(&self) -> Option<&DocumentId> {
        self.id.as_ref()
    }

    fn set_id(&mut self, id: DocumentId) {
        self.id = Some(id);
    }
}

impl Entity for Product {
    const COLLECTION: &'static str = "products";
    const FIELDS: &'static [&'static str] = &["name", "price", "description"];
}
