//! todo-cache — observable in-memory repository for todo records.
//!
//! This crate is the cache layer between a consumer (typically a UI) and a
//! persistent store of todo records. It keeps a per-id record cache and a
//! per-group list cache consistent with the backing store, fans out
//! field-level changes to any number of subscribers, implements stable
//! group reordering, and reclaims entries nobody observes anymore.
//!
//! # Architecture
//!
//! The crate follows a hexagonal layout:
//!
//! - **Domain** (`domain`): observable primitives, the `Record` and
//!   `GroupKey` models, per-group `RecordList`s, and the `RecordStore` /
//!   `IdAllocator` ports.
//! - **Services** (`services`): the `Repository` orchestrator and the
//!   background `ReclaimDaemon`.
//! - **Adapters** (`adapters`): a SQLite implementation of the ports via
//!   sqlx, and in-memory implementations for tests and embedding.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use todo_cache::adapters::sqlite::{self, SqliteIdAllocator, SqliteRecordStore};
//! use todo_cache::{GroupKey, ReclaimDaemon, Repository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = sqlite::initialize_database("sqlite:todos.db").await?;
//!     let repository = Arc::new(Repository::new(
//!         Arc::new(SqliteRecordStore::new(pool.clone())),
//!         Arc::new(SqliteIdAllocator::new(pool)),
//!     ));
//!     let reclaim = ReclaimDaemon::with_defaults(repository.clone()).spawn();
//!
//!     let inbox = repository.get_records(GroupKey::no_group()).await?;
//!     let record = repository
//!         .create_record("water the plants", "", GroupKey::no_group(), inbox.len() as u32, false)
//!         .await?;
//!     let mut titles = record.title().subscribe();
//!     repository.edit_title(record.id(), "water the plants twice").await?;
//!     assert!(titles.try_recv().is_some());
//!
//!     reclaim.stop();
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod domain;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{RepoError, RepoResult};
pub use domain::models::{
    GroupKey, GroupKind, Record, RecordId, RecordList, RecordPatch, StoredRecord,
};
pub use domain::observable::{
    CollectionError, EventStream, EventSubscription, FieldChange, ObservableCollection,
    ObservableField,
};
pub use domain::ports::{IdAllocator, RecordStore};
pub use services::reclaim::{ReclaimConfig, ReclaimDaemon, ReclaimHandle, ReclaimStatus};
pub use services::repository::{CacheStats, GroupLoadContext, HookHandle, Repository, SweepReport};
