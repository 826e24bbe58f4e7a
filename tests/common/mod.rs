//! Shared test fixtures.

#![allow(dead_code)]

use std::sync::{Arc, Once};

use todo_cache::adapters::memory::{InMemoryRecordStore, SequentialIdAllocator};
use todo_cache::{GroupKey, RecordId, Repository, StoredRecord};

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub fn stored(id: i64, title: &str, group: GroupKey, position: u32) -> StoredRecord {
    StoredRecord {
        id: RecordId(id),
        title: title.to_string(),
        description: format!("notes for {title}"),
        group,
        position,
        completed: false,
    }
}

/// A repository over an in-memory store pre-seeded with two ungrouped
/// records (ids 1 and 2, positions 0 and 1). Fresh ids start at 3.
pub async fn seeded_repository() -> (Arc<InMemoryRecordStore>, Arc<Repository>) {
    init_tracing();
    let store = Arc::new(InMemoryRecordStore::new());
    store
        .seed([
            stored(1, "water the plants", GroupKey::no_group(), 0),
            stored(2, "file the taxes", GroupKey::no_group(), 1),
        ])
        .await;
    let repository = Arc::new(Repository::new(
        store.clone(),
        Arc::new(SequentialIdAllocator::starting_at(3)),
    ));
    (store, repository)
}
