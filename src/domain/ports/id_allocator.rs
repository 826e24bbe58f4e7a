//! Unique id allocation port.

use async_trait::async_trait;

use crate::domain::errors::RepoResult;
use crate::domain::models::RecordId;

/// Hands out record ids.
///
/// Issued ids are durable across process restarts, monotonically
/// non-decreasing, and never repeat.
#[async_trait]
pub trait IdAllocator: Send + Sync {
    async fn next_id(&self) -> RepoResult<RecordId>;
}
