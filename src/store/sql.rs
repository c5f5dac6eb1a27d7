use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, FromRow, QueryBuilder, Sqlite, SqlitePool};

use super::{Condition, Entity, Filter, Storer, StoreError, StoreResult, Value, ID_FIELD};

/// An entity stored as a row with an integer primary key named `id`.
pub trait Record: Entity<Id = i64> + for<'r> FromRow<'r, SqliteRow> {
    /// Non-identifier columns, in the order [`Record::values`] yields them.
    const COLUMNS: &'static [&'static str];

    fn values(&self) -> Vec<Value>;

    /// Stamps bookkeeping columns before a write. `created` is true on insert.
    fn touch(&mut self, _now: DateTime<Utc>, _created: bool) {}
}

/// Relational [`Storer`] over a SQLite pool.
///
/// Driver errors pass through untouched. A lookup with no row is
/// [`StoreError::NotFound`].
#[derive(Clone)]
pub struct SqlStore {
    pool: SqlitePool,
}

impl SqlStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn push_value(qb: &mut QueryBuilder<'_, Sqlite>, value: Value) {
    match value {
        Value::Int(v) => {
            qb.push_bind(v);
        }
        Value::Text(v) => {
            qb.push_bind(v);
        }
        Value::Bool(v) => {
            qb.push_bind(v);
        }
        Value::Timestamp(v) => {
            qb.push_bind(v);
        }
        Value::Null => {
            qb.push_bind(Option::<String>::None);
        }
    }
}

/// Pushes the equality conditions. Substring conditions are checked on the
/// decoded rows instead, since SQLite's `lower()` folds ASCII letters only.
fn push_where(qb: &mut QueryBuilder<'_, Sqlite>, filter: &Filter) {
    let mut first = true;
    for condition in filter.conditions() {
        if let Condition::Eq { field, value } = condition {
            qb.push(if first { " WHERE " } else { " AND " });
            first = false;
            qb.push(field.as_str()).push(" = ");
            push_value(qb, value.clone());
        }
    }
}

fn select<E: Record>(filter: &Filter, limit: Option<u64>) -> QueryBuilder<'static, Sqlite> {
    let mut qb = QueryBuilder::new("SELECT ");
    qb.push(ID_FIELD);
    for column in E::COLUMNS {
        qb.push(", ").push(*column);
    }
    qb.push(" FROM ").push(E::COLLECTION);
    push_where(&mut qb, filter);
    qb.push(" ORDER BY ").push(ID_FIELD);
    if let Some(limit) = limit {
        qb.push(" LIMIT ");
        qb.push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
    }
    qb
}

impl SqlStore {
    async fn fetch<E: Record>(&self, filter: &Filter, limit: Option<u64>) -> StoreResult<Vec<E>> {
        filter.validate::<E>()?;
        if !filter.has_text_search() {
            let mut qb = select::<E>(filter, limit);
            return Ok(qb.build_query_as::<E>().fetch_all(&self.pool).await?);
        }

        // The limit applies after the substring match.
        let mut qb = select::<E>(filter, None);
        let mut rows = Vec::new();
        for row in qb.build_query_as::<E>().fetch_all(&self.pool).await? {
            if filter.matches(&serde_json::to_value(&row)?) {
                rows.push(row);
            }
        }
        if let Some(limit) = limit {
            rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        }
        Ok(rows)
    }
}

#[async_trait]
impl<E: Record> Storer<E> for SqlStore {
    async fn find(&self, filter: &Filter) -> StoreResult<Vec<E>> {
        self.fetch(filter, filter.max_results()).await
    }

    async fn first(&self, filter: &Filter) -> StoreResult<E> {
        self.fetch(filter, Some(1)).await?.into_iter().next().ok_or(StoreError::NotFound)
    }

    async fn create(&self, value: &mut E) -> StoreResult<()> {
        value.touch(Utc::now(), true);

        let mut qb = QueryBuilder::<Sqlite>::new("INSERT INTO ");
        qb.push(E::COLLECTION).push(" (").push(E::COLUMNS.join(", ")).push(") VALUES (");
        for (i, v) in value.values().into_iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            push_value(&mut qb, v);
        }
        qb.push(")");

        let result = qb.build().execute(&self.pool).await?;
        value.set_id(result.last_insert_rowid());
        tracing::debug!(table = E::COLLECTION, id = result.last_insert_rowid(), "row inserted");
        Ok(())
    }

    async fn save(&self, value: &mut E) -> StoreResult<()> {
        let Some(id) = value.id().copied() else {
            tracing::warn!(table = E::COLLECTION, "save skipped: record has no id");
            return Ok(());
        };
        value.touch(Utc::now(), false);

        let mut qb = QueryBuilder::<Sqlite>::new("UPDATE ");
        qb.push(E::COLLECTION).push(" SET ");
        for (i, (column, v)) in E::COLUMNS.iter().zip(value.values()).enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            qb.push(*column).push(" = ");
            push_value(&mut qb, v);
        }
        qb.push(" WHERE ").push(ID_FIELD).push(" = ");
        qb.push_bind(id);

        let result = qb.build().execute(&self.pool).await?;
        tracing::debug!(table = E::COLLECTION, id, rows = result.rows_affected(), "row updated");
        Ok(())
    }

    async fn count(&self, filter: &Filter) -> StoreResult<u64> {
        filter.validate::<E>()?;
        if filter.has_text_search() {
            let rows: Vec<E> = self.fetch(filter, None).await?;
            return Ok(rows.len() as u64);
        }
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM ");
        qb.push(E::COLLECTION);
        push_where(&mut qb, filter);
        let total: i64 = qb.build_query_scalar::<i64>().fetch_one(&self.pool).await?;
        Ok(total.max(0) as u64)
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
