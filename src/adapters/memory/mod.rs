//! In-memory adapters for tests and embedding without a database.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::errors::{RepoError, RepoResult};
use crate::domain::models::{GroupKey, RecordId, StoredRecord};
use crate::domain::ports::{IdAllocator, RecordStore};

/// HashMap-backed record store.
///
/// Counts its queries so tests can assert cache-hit behavior, and can be
/// switched into a failing mode to exercise store-error propagation.
#[derive(Default)]
pub struct InMemoryRecordStore {
    rows: RwLock<HashMap<RecordId, StoredRecord>>,
    group_fetches: AtomicU64,
    record_fetches: AtomicU64,
    fail: AtomicBool,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate the store.
    pub async fn seed(&self, records: impl IntoIterator<Item = StoredRecord>) {
        let mut rows = self.rows.write().await;
        for record in records {
            rows.insert(record.id, record);
        }
    }

    /// Make every subsequent operation fail with a storage error.
    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::Release);
    }

    /// How many group queries have been issued.
    pub fn group_fetches(&self) -> u64 {
        self.group_fetches.load(Ordering::Acquire)
    }

    /// How many single-record fetches have been issued.
    pub fn record_fetches(&self) -> u64 {
        self.record_fetches.load(Ordering::Acquire)
    }

    /// Direct read of a stored row, bypassing the port.
    pub async fn row(&self, id: RecordId) -> Option<StoredRecord> {
        self.rows.read().await.get(&id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }

    fn check_failing(&self) -> RepoResult<()> {
        if self.fail.load(Ordering::Acquire) {
            return Err(RepoError::Storage("injected store failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn get_record(&self, id: RecordId) -> RepoResult<Option<StoredRecord>> {
        self.check_failing()?;
        self.record_fetches.fetch_add(1, Ordering::AcqRel);
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn add_record(&self, record: &StoredRecord) -> RepoResult<()> {
        self.check_failing()?;
        let mut rows = self.rows.write().await;
        if rows.contains_key(&record.id) {
            return Err(RepoError::Storage(format!(
                "duplicate row for id {}",
                record.id
            )));
        }
        rows.insert(record.id, record.clone());
        Ok(())
    }

    async fn delete_record(&self, id: RecordId) -> RepoResult<bool> {
        self.check_failing()?;
        Ok(self.rows.write().await.remove(&id).is_some())
    }

    async fn records_by_group(&self, group: &GroupKey) -> RepoResult<Vec<StoredRecord>> {
        self.check_failing()?;
        self.group_fetches.fetch_add(1, Ordering::AcqRel);
        let rows = self.rows.read().await;
        let mut matching: Vec<StoredRecord> = rows
            .values()
            .filter(|r| r.group == *group)
            .cloned()
            .collect();
        matching.sort_by_key(|r| r.position);
        Ok(matching)
    }

    async fn update_title(&self, id: RecordId, title: &str) -> RepoResult<bool> {
        self.check_failing()?;
        let mut rows = self.rows.write().await;
        if let Some(row) = rows.get_mut(&id) {
            row.title = title.to_string();
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn update_description(&self, id: RecordId, description: &str) -> RepoResult<bool> {
        self.check_failing()?;
        let mut rows = self.rows.write().await;
        if let Some(row) = rows.get_mut(&id) {
            row.description = description.to_string();
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn update_group(&self, id: RecordId, group: &GroupKey) -> RepoResult<bool> {
        self.check_failing()?;
        let mut rows = self.rows.write().await;
        if let Some(row) = rows.get_mut(&id) {
            row.group = *group;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn update_position(&self, id: RecordId, position: u32) -> RepoResult<bool> {
        self.check_failing()?;
        let mut rows = self.rows.write().await;
        if let Some(row) = rows.get_mut(&id) {
            row.position = position;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn update_completed(&self, id: RecordId, completed: bool) -> RepoResult<bool> {
        self.check_failing()?;
        let mut rows = self.rows.write().await;
        if let Some(row) = rows.get_mut(&id) {
            row.completed = completed;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

/// Monotonic in-process id allocator starting from a given first id.
pub struct SequentialIdAllocator {
    next: AtomicI64,
}

impl SequentialIdAllocator {
    pub fn starting_at(first: i64) -> Self {
        Self {
            next: AtomicI64::new(first),
        }
    }
}

#[async_trait]
impl IdAllocator for SequentialIdAllocator {
    async fn next_id(&self) -> RepoResult<RecordId> {
        Ok(RecordId(self.next.fetch_add(1, Ordering::AcqRel)))
    }
}
