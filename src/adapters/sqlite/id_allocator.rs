//! SQLite-backed unique id allocation.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::domain::errors::RepoResult;
use crate::domain::models::RecordId;
use crate::domain::ports::IdAllocator;

/// Allocates ids from a single-row counter table.
///
/// The counter is bumped and read in one statement, so concurrent allocators
/// sharing the database never hand out the same id, and the last issued id
/// survives restarts.
#[derive(Clone)]
pub struct SqliteIdAllocator {
    pool: SqlitePool,
}

impl SqliteIdAllocator {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdAllocator for SqliteIdAllocator {
    async fn next_id(&self) -> RepoResult<RecordId> {
        let id: i64 = sqlx::query_scalar(
            "UPDATE id_counter SET last_id = last_id + 1 WHERE slot = 0 RETURNING last_id",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(RecordId(id))
    }
}
