//! Persistence round trips through the SQLite adapters.

mod common;

use std::sync::Arc;

use chrono::NaiveDate;
use sqlx::SqlitePool;
use todo_cache::adapters::sqlite::{
    create_migrated_test_pool, initialize_database, SqliteIdAllocator, SqliteRecordStore,
};
use todo_cache::{
    GroupKey, IdAllocator, RecordId, RecordStore, RepoError, Repository, StoredRecord,
};

fn day(s: &str) -> NaiveDate {
    s.parse().expect("test date")
}

fn new_repository(pool: &SqlitePool) -> Arc<Repository> {
    Arc::new(Repository::new(
        Arc::new(SqliteRecordStore::new(pool.clone())),
        Arc::new(SqliteIdAllocator::new(pool.clone())),
    ))
}

async fn seed(pool: &SqlitePool, title: &str, group: GroupKey, position: u32) -> RecordId {
    let store = SqliteRecordStore::new(pool.clone());
    let ids = SqliteIdAllocator::new(pool.clone());
    let id = ids.next_id().await.expect("allocate");
    store
        .add_record(&StoredRecord {
            id,
            title: title.to_string(),
            description: format!("notes for {title}"),
            group,
            position,
            completed: false,
        })
        .await
        .expect("seed");
    id
}

#[tokio::test]
async fn loads_seeded_rows() {
    common::init_tracing();
    let pool = create_migrated_test_pool().await.expect("pool");
    seed(&pool, "water the plants", GroupKey::no_group(), 0).await;
    let second = seed(&pool, "file the taxes", GroupKey::no_group(), 1).await;

    let repository = new_repository(&pool);
    let list = repository
        .get_records(GroupKey::no_group())
        .await
        .expect("load");

    assert_eq!(list.len(), 2);
    let record = list.get(second).expect("member");
    assert_eq!(record.title().get(), "file the taxes");
    assert_eq!(record.description().get(), "notes for file the taxes");
}

#[tokio::test]
async fn delete_is_visible_to_a_fresh_repository() {
    let pool = create_migrated_test_pool().await.expect("pool");
    let first = seed(&pool, "water the plants", GroupKey::no_group(), 0).await;
    seed(&pool, "file the taxes", GroupKey::no_group(), 1).await;

    new_repository(&pool)
        .delete_record(first)
        .await
        .expect("delete");

    let list = new_repository(&pool)
        .get_records(GroupKey::no_group())
        .await
        .expect("reload");
    assert_eq!(list.len(), 1);
    assert!(!list.contains(first));
}

#[tokio::test]
async fn create_is_visible_to_a_fresh_repository() {
    let pool = create_migrated_test_pool().await.expect("pool");
    seed(&pool, "water the plants", GroupKey::no_group(), 0).await;

    let created = new_repository(&pool)
        .create_record("sweep the porch", "", GroupKey::no_group(), 1, false)
        .await
        .expect("create");

    let list = new_repository(&pool)
        .get_records(GroupKey::no_group())
        .await
        .expect("reload");
    assert_eq!(list.len(), 2);
    assert!(list.contains(created.id()));
}

#[tokio::test]
async fn edits_round_trip_through_the_store() {
    let pool = create_migrated_test_pool().await.expect("pool");
    let id = seed(&pool, "water the plants", GroupKey::no_group(), 0).await;
    let moved_to = GroupKey::fixed(day("2026-08-10"));

    let repository = new_repository(&pool);
    repository
        .edit_title(id, "water the garden")
        .await
        .expect("title");
    repository
        .edit_description(id, "front beds first")
        .await
        .expect("description");
    repository.edit_group(id, moved_to).await.expect("group");
    repository.update_position(id, 0).await.expect("position");
    repository.edit_completed(id, true).await.expect("completed");

    let list = new_repository(&pool)
        .get_records(moved_to)
        .await
        .expect("reload");
    let record = list.get(id).expect("member");
    assert_eq!(record.title().get(), "water the garden");
    assert_eq!(record.description().get(), "front beds first");
    assert_eq!(record.group().get(), moved_to);
    assert_eq!(record.position().get(), 0);
    assert!(record.completed().get());
}

#[tokio::test]
async fn group_move_and_reorder_survive_a_reload() {
    let pool = create_migrated_test_pool().await.expect("pool");
    let a = seed(&pool, "water the plants", GroupKey::no_group(), 0).await;
    let b = seed(&pool, "file the taxes", GroupKey::no_group(), 1).await;
    let fixed = GroupKey::fixed(day("2026-08-10"));

    let repository = new_repository(&pool);
    let c = repository
        .create_record("sharpen the saw", "", GroupKey::no_group(), 2, false)
        .await
        .expect("create")
        .id();
    let d = repository
        .create_record("oil the hinges", "", GroupKey::no_group(), 3, false)
        .await
        .expect("create")
        .id();
    repository.edit_group(c, fixed).await.expect("move");
    repository.update_position(d, 0).await.expect("reorder");

    let fresh = new_repository(&pool);
    let ungrouped = fresh
        .get_records(GroupKey::no_group())
        .await
        .expect("reload");
    let pinned = fresh.get_records(fixed).await.expect("reload");

    assert_eq!(ungrouped.len(), 3);
    assert_eq!(pinned.len(), 1);
    assert!(pinned.contains(c));
    assert_eq!(ungrouped.get(d).expect("member").position().get(), 0);
    assert_eq!(ungrouped.get(a).expect("member").position().get(), 1);
    assert_eq!(ungrouped.get(b).expect("member").position().get(), 2);
}

#[tokio::test]
async fn allocated_ids_stay_monotonic_across_allocators() {
    let pool = create_migrated_test_pool().await.expect("pool");

    let first = SqliteIdAllocator::new(pool.clone());
    assert_eq!(first.next_id().await.expect("id"), RecordId(1));
    assert_eq!(first.next_id().await.expect("id"), RecordId(2));

    // A new allocator over the same database continues the sequence.
    let second = SqliteIdAllocator::new(pool.clone());
    assert_eq!(second.next_id().await.expect("id"), RecordId(3));
}

#[tokio::test]
async fn corrupt_group_encodings_are_rejected() {
    let pool = create_migrated_test_pool().await.expect("pool");
    sqlx::query(
        "INSERT INTO records (id, title, description, group_key, position, completed)
         VALUES (1, 'stale row', '', 'SOMEDAY|', 0, 0)",
    )
    .execute(&pool)
    .await
    .expect("raw insert");

    let store = SqliteRecordStore::new(pool.clone());
    let err = store.get_record(RecordId(1)).await.expect_err("corrupt");
    assert!(matches!(err, RepoError::InvalidArgument(_)));
}

#[tokio::test]
async fn file_backed_database_persists_across_pools() {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = format!("sqlite:{}", dir.path().join("todos.db").display());

    let pool = initialize_database(&url).await.expect("open");
    let id = seed(&pool, "water the plants", GroupKey::no_group(), 0).await;
    pool.close().await;

    let reopened = initialize_database(&url).await.expect("reopen");
    let list = new_repository(&reopened)
        .get_records(GroupKey::no_group())
        .await
        .expect("reload");
    assert!(list.contains(id));
}
