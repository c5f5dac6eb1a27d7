//! In-memory [`Storer`] for tests and throwaway deployments.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{Entity, Filter, Storer, StoreError, StoreResult};

/// Identifier types the in-memory store can mint on its own.
pub trait GeneratedId: Sized {
    /// Builds the identifier for the `sequence`-th created record (1-based).
    fn generate(sequence: u64) -> Self;
}

impl GeneratedId for i64 {
    fn generate(sequence: u64) -> Self {
        i64::try_from(sequence).unwrap_or(i64::MAX)
    }
}

type Fault = Arc<dyn Fn() -> StoreError + Send + Sync>;

/// Records kept behind an async lock and returned in identifier order.
///
/// A store built with [`MemoryStore::failing`] returns the injected error from
/// every operation, which lets handler tests drive their error paths.
pub struct MemoryStore<E> {
    records: RwLock<Vec<E>>,
    sequence: AtomicU64,
    writes: AtomicU64,
    fault: Option<Fault>,
}

impl<E> Default for MemoryStore<E> {
    fn default() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            sequence: AtomicU64::new(0),
            writes: AtomicU64::new(0),
            fault: None,
        }
    }
}

impl<E: Entity> MemoryStore<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store. Records should already carry identifiers.
    pub fn with_records(records: Vec<E>) -> Self {
        let sequence = AtomicU64::new(records.len() as u64);
        Self { records: RwLock::new(records), sequence, ..Self::default() }
    }

    /// Every operation fails with the error built by `fault`.
    pub fn failing(fault: impl Fn() -> StoreError + Send + Sync + 'static) -> Self {
        Self { fault: Some(Arc::new(fault)), ..Self::default() }
    }

    /// Number of writes (creates and effective saves) performed so far.
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    fn check_fault(&self) -> StoreResult<()> {
        match &self.fault {
            Some(fault) => Err(fault()),
            None => Ok(()),
        }
    }

    async fn matching(&self, filter: &Filter) -> StoreResult<Vec<E>> {
        self.check_fault()?;
        filter.validate::<E>()?;
        let records = self.records.read().await;
        let mut out = Vec::new();
        for record in records.iter() {
            if filter.matches(&serde_json::to_value(record)?) {
                out.push(record.clone());
            }
        }
        out.sort_by(|a, b| a.id().cmp(&b.id()));
        Ok(out)
    }
}

#[async_trait]
impl<E> Storer<E> for MemoryStore<E>
where
    E: Entity,
    E::Id: GeneratedId,
{
    async fn find(&self, filter: &Filter) -> StoreResult<Vec<E>> {
        let mut found = self.matching(filter).await?;
        if let Some(limit) = filter.max_results() {
            found.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        }
        Ok(found)
    }

    async fn first(&self, filter: &Filter) -> StoreResult<E> {
        self.matching(filter).await?.into_iter().next().ok_or(StoreError::NotFound)
    }

    async fn create(&self, value: &mut E) -> StoreResult<()> {
        self.check_fault()?;
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        value.set_id(E::Id::generate(sequence));
        self.records.write().await.push(value.clone());
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn save(&self, value: &mut E) -> StoreResult<()> {
        self.check_fault()?;
        let Some(id) = value.id().cloned() else {
            tracing::warn!(collection = E::COLLECTION, "save skipped: record has no id");
            return Ok(());
        };
        let mut records = self.records.write().await;
        if let Some(slot) = records.iter_mut().find(|r| r.id() == Some(&id)) {
            *slot = value.clone();
            self.writes.fetch_add(1, Ordering::Relaxed);
        }
        Ok(())
    }

    async fn count(&self, filter: &Filter) -> StoreResult<u64> {
        Ok(self.matching(filter).await?.len() as u64)
    }

    async fn ping(&self) -> StoreResult<()> {
        self.check_fault()
    }
}
