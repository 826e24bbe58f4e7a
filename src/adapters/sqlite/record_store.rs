//! SQLite implementation of the [`RecordStore`] port.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::domain::errors::{RepoError, RepoResult};
use crate::domain::models::{GroupKey, RecordId, StoredRecord};
use crate::domain::ports::RecordStore;

/// SQLite-backed record store. The group key is persisted in its two-part
/// `KIND|date` encoding.
#[derive(Clone)]
pub struct SqliteRecordStore {
    pool: SqlitePool,
}

impl SqliteRecordStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct RecordRow {
    id: i64,
    title: String,
    description: String,
    group_key: String,
    position: i64,
    completed: bool,
}

impl TryFrom<RecordRow> for StoredRecord {
    type Error = RepoError;

    fn try_from(row: RecordRow) -> Result<Self, Self::Error> {
        let group = GroupKey::decode(&row.group_key)?;
        let position = u32::try_from(row.position).map_err(|_| {
            RepoError::InvalidArgument(format!(
                "negative position {} stored for record {}",
                row.position, row.id
            ))
        })?;
        Ok(StoredRecord {
            id: RecordId(row.id),
            title: row.title,
            description: row.description,
            group,
            position,
            completed: row.completed,
        })
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn get_record(&self, id: RecordId) -> RepoResult<Option<StoredRecord>> {
        let row: Option<RecordRow> = sqlx::query_as("SELECT * FROM records WHERE id = ?")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;
        row.map(TryInto::try_into).transpose()
    }

    async fn add_record(&self, record: &StoredRecord) -> RepoResult<()> {
        sqlx::query(
            "INSERT INTO records (id, title, description, group_key, position, completed)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(record.id.0)
        .bind(&record.title)
        .bind(&record.description)
        .bind(record.group.encode())
        .bind(i64::from(record.position))
        .bind(record.completed)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_record(&self, id: RecordId) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM records WHERE id = ?")
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn records_by_group(&self, group: &GroupKey) -> RepoResult<Vec<StoredRecord>> {
        let rows: Vec<RecordRow> =
            sqlx::query_as("SELECT * FROM records WHERE group_key = ? ORDER BY position")
                .bind(group.encode())
                .fetch_all(&self.pool)
                .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn update_title(&self, id: RecordId, title: &str) -> RepoResult<bool> {
        let result = sqlx::query("UPDATE records SET title = ? WHERE id = ?")
            .bind(title)
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_description(&self, id: RecordId, description: &str) -> RepoResult<bool> {
        let result = sqlx::query("UPDATE records SET description = ? WHERE id = ?")
            .bind(description)
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_group(&self, id: RecordId, group: &GroupKey) -> RepoResult<bool> {
        let result = sqlx::query("UPDATE records SET group_key = ? WHERE id = ?")
            .bind(group.encode())
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_position(&self, id: RecordId, position: u32) -> RepoResult<bool> {
        let result = sqlx::query("UPDATE records SET position = ? WHERE id = ?")
            .bind(i64::from(position))
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_completed(&self, id: RecordId, completed: bool) -> RepoResult<bool> {
        let result = sqlx::query("UPDATE records SET completed = ? WHERE id = ?")
            .bind(completed)
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
