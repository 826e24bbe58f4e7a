//! Persistence port for records.

use async_trait::async_trait;

use crate::domain::errors::RepoResult;
use crate::domain::models::{GroupKey, RecordId, StoredRecord};

/// Contract the repository consumes for durable record storage.
///
/// Update and delete operations are idempotent and report through their
/// boolean whether a row was actually touched. The adapter's own failure and
/// latency behavior governs; the repository neither retries nor times out.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch one record by id, `None` when the store has no such row.
    async fn get_record(&self, id: RecordId) -> RepoResult<Option<StoredRecord>>;

    /// Insert a new record row.
    async fn add_record(&self, record: &StoredRecord) -> RepoResult<()>;

    /// Delete by id; true if a row existed.
    async fn delete_record(&self, id: RecordId) -> RepoResult<bool>;

    /// All records belonging to `group`, ordered by position.
    async fn records_by_group(&self, group: &GroupKey) -> RepoResult<Vec<StoredRecord>>;

    async fn update_title(&self, id: RecordId, title: &str) -> RepoResult<bool>;

    async fn update_description(&self, id: RecordId, description: &str) -> RepoResult<bool>;

    async fn update_group(&self, id: RecordId, group: &GroupKey) -> RepoResult<bool>;

    async fn update_position(&self, id: RecordId, position: u32) -> RepoResult<bool>;

    async fn update_completed(&self, id: RecordId, completed: bool) -> RepoResult<bool>;
}
