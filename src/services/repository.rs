//! The repository orchestrating the record and list caches.
//!
//! All cache state lives behind one async mutex: every operation — creation,
//! hydration, edits, reordering, and the reclaim sweep — runs start to finish
//! under that lock, so callers never observe a torn intermediate state and
//! the sweep cannot race an in-flight load. Store calls are awaited while the
//! lock is held; on a store failure the cache may run ahead of the store (no
//! rollback is performed).

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex as StdMutex, Weak};

use tokio::sync::Mutex;

use crate::domain::errors::{RepoError, RepoResult};
use crate::domain::models::{GroupKey, Record, RecordId, RecordList};
use crate::domain::observable::{EventStream, EventSubscription};
use crate::domain::ports::{IdAllocator, RecordStore};

/// Mutable cache state guarded by the repository lock.
struct CacheState {
    records: HashMap<RecordId, Arc<Record>>,
    lists: HashMap<GroupKey, Arc<RecordList>>,
    /// Records flagged unobserved by the previous sweep.
    idle_records: HashSet<RecordId>,
    /// Lists flagged unobserved by the previous sweep.
    idle_lists: HashSet<GroupKey>,
}

impl CacheState {
    fn new() -> Self {
        Self {
            records: HashMap::new(),
            lists: HashMap::new(),
            idle_records: HashSet::new(),
            idle_lists: HashSet::new(),
        }
    }
}

type GroupLoadedHook = Box<dyn Fn(&mut GroupLoadContext<'_>) + Send + Sync>;

struct HookRegistry {
    next_id: u64,
    entries: Vec<(u64, GroupLoadedHook)>,
}

/// Registration token for a group-loaded hook. Dropping it removes the hook.
pub struct HookHandle {
    registry: Weak<StdMutex<HookRegistry>>,
    id: u64,
}

impl Drop for HookHandle {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            if let Ok(mut registry) = registry.lock() {
                registry.entries.retain(|(id, _)| *id != self.id);
            }
        }
    }
}

/// Passed to group-loaded hooks while a list is being populated.
///
/// Appending through the context keeps the per-id cache and the list in
/// step, so a record added here is the same instance later returned by
/// [`Repository::get_record`].
pub struct GroupLoadContext<'a> {
    group: GroupKey,
    list: &'a RecordList,
    records: &'a mut HashMap<RecordId, Arc<Record>>,
}

impl GroupLoadContext<'_> {
    /// The group whose list was just populated.
    pub fn group(&self) -> GroupKey {
        self.group
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.list.contains(id)
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Append a record to the list being built. An already-cached instance
    /// for the same id wins over the one passed in.
    pub fn append(&mut self, record: Record) -> RepoResult<Arc<Record>> {
        let id = record.id();
        let record = self
            .records
            .entry(id)
            .or_insert_with(|| Arc::new(record))
            .clone();
        self.list.add(id, record.clone())?;
        Ok(record)
    }
}

/// Counts from one reclaim sweep.
#[derive(Debug, Clone, Copy, Default)]
pub struct SweepReport {
    pub evicted_records: usize,
    pub evicted_lists: usize,
}

/// Current cache occupancy.
#[derive(Debug, Clone, Copy)]
pub struct CacheStats {
    pub cached_records: usize,
    pub cached_lists: usize,
}

/// In-memory repository of observable records, backed by a [`RecordStore`].
///
/// Records and per-group lists hydrate lazily from the store and stay cached
/// until the reclaim sweep finds them unobserved twice in a row. At any
/// instant there is a single live instance per record id: edits made through
/// any path are visible through every other path.
pub struct Repository {
    store: Arc<dyn RecordStore>,
    ids: Arc<dyn IdAllocator>,
    state: Mutex<CacheState>,
    hooks: Arc<StdMutex<HookRegistry>>,
    record_created: EventStream<RecordId>,
}

impl Repository {
    pub fn new(store: Arc<dyn RecordStore>, ids: Arc<dyn IdAllocator>) -> Self {
        Self {
            store,
            ids,
            state: Mutex::new(CacheState::new()),
            hooks: Arc::new(StdMutex::new(HookRegistry {
                next_id: 0,
                entries: Vec::new(),
            })),
            record_created: EventStream::new(),
        }
    }

    /// Register a hook fired synchronously whenever a group's list has just
    /// been hydrated from the store, before `get_records` returns. The hook
    /// may append further records into the fresh list through the context.
    ///
    /// The hook stays active for as long as the returned handle lives.
    pub fn on_group_loaded<F>(&self, hook: F) -> HookHandle
    where
        F: Fn(&mut GroupLoadContext<'_>) + Send + Sync + 'static,
    {
        let mut registry = self.hooks.lock().expect("hook registry poisoned");
        let id = registry.next_id;
        registry.next_id += 1;
        registry.entries.push((id, Box::new(hook)));
        HookHandle {
            registry: Arc::downgrade(&self.hooks),
            id,
        }
    }

    /// Stream of ids of records created through [`Repository::create_record`].
    pub fn subscribe_created(&self) -> EventSubscription<RecordId> {
        self.record_created.subscribe()
    }

    /// Allocate an id, cache the new record, and persist it.
    ///
    /// The group's list is only appended to when it is already cached — a
    /// list is never hydrated just to receive the new entry.
    pub async fn create_record(
        &self,
        title: impl Into<String>,
        description: impl Into<String>,
        group: GroupKey,
        position: u32,
        completed: bool,
    ) -> RepoResult<Arc<Record>> {
        let id = self.ids.next_id().await?;
        let record = Arc::new(
            Record::new(id, title, group)
                .with_description(description)
                .with_position(position)
                .with_completed(completed),
        );
        let stored = record.to_stored();

        {
            let mut state = self.state.lock().await;
            if state.records.contains_key(&id) {
                return Err(RepoError::AlreadyExists(id));
            }
            state.records.insert(id, record.clone());
            if let Some(list) = state.lists.get(&group) {
                list.add(id, record.clone())?;
            }
            self.store.add_record(&stored).await?;
        }

        self.record_created.publish(id);
        Ok(record)
    }

    /// Return the cached list for `group`, hydrating it from the store on
    /// first access. A cached list is returned without any store call.
    pub async fn get_records(&self, group: GroupKey) -> RepoResult<Arc<RecordList>> {
        let mut state = self.state.lock().await;
        self.load_list_locked(&mut state, group).await
    }

    /// Return the cached record for `id`, hydrating from the store on a miss.
    pub async fn get_record(&self, id: RecordId) -> RepoResult<Arc<Record>> {
        let mut state = self.state.lock().await;
        self.load_record_locked(&mut state, id).await
    }

    /// Remove a record from the caches and the store.
    ///
    /// Fails with `NotFound` only when the id is unknown to both.
    pub async fn delete_record(&self, id: RecordId) -> RepoResult<()> {
        let mut state = self.state.lock().await;
        let cached = state.records.remove(&id);
        if let Some(record) = cached.as_ref() {
            let group = record.group().get();
            if let Some(list) = state.lists.get(&group) {
                if list.contains(id) {
                    list.remove(id)?;
                }
            }
        }
        let existed = self.store.delete_record(id).await?;
        if cached.is_none() && !existed {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    /// Set the title on the cached record (if cached) and persist it.
    pub async fn edit_title(&self, id: RecordId, title: impl Into<String>) -> RepoResult<()> {
        let title = title.into();
        let state = self.state.lock().await;
        if let Some(record) = state.records.get(&id) {
            record.set_title(title.clone());
        }
        let updated = self.store.update_title(id, &title).await?;
        if !updated {
            tracing::debug!(%id, "title edit touched no stored row");
        }
        Ok(())
    }

    /// Set the description on the cached record (if cached) and persist it.
    pub async fn edit_description(
        &self,
        id: RecordId,
        description: impl Into<String>,
    ) -> RepoResult<()> {
        let description = description.into();
        let state = self.state.lock().await;
        if let Some(record) = state.records.get(&id) {
            record.set_description(description.clone());
        }
        let updated = self.store.update_description(id, &description).await?;
        if !updated {
            tracing::debug!(%id, "description edit touched no stored row");
        }
        Ok(())
    }

    /// Set the completion flag on the cached record (if cached) and persist it.
    pub async fn edit_completed(&self, id: RecordId, completed: bool) -> RepoResult<()> {
        let state = self.state.lock().await;
        if let Some(record) = state.records.get(&id) {
            record.set_completed(completed);
        }
        let updated = self.store.update_completed(id, completed).await?;
        if !updated {
            tracing::debug!(%id, "completion edit touched no stored row");
        }
        Ok(())
    }

    /// Move a record to another group, keeping any cached lists in step.
    ///
    /// The old group's cached list emits one remove event, the new group's
    /// cached list one add event; uncached lists are left alone.
    pub async fn edit_group(&self, id: RecordId, new_group: GroupKey) -> RepoResult<()> {
        let mut state = self.state.lock().await;
        let record = self.load_record_locked(&mut state, id).await?;

        let old_group = record.group().get();
        if let Some(list) = state.lists.get(&old_group) {
            if list.contains(id) {
                list.remove(id)?;
            }
        }
        record.set_group(new_group);
        if let Some(list) = state.lists.get(&new_group) {
            if !list.contains(id) {
                list.add(id, record.clone())?;
            }
        }
        self.store.update_group(id, &new_group).await?;
        Ok(())
    }

    /// Move a record to `new_position` within its group and renumber the
    /// whole group to a dense 0..n ordering.
    ///
    /// The group's list is hydrated if needed. Every shifted record has its
    /// position field rewritten and persisted; the list's positions-changed
    /// stream fires exactly once, after all writes. `new_position` past the
    /// end of the group fails with `InvalidArgument`.
    pub async fn update_position(&self, id: RecordId, new_position: u32) -> RepoResult<()> {
        let mut state = self.state.lock().await;
        let record = self.load_record_locked(&mut state, id).await?;
        let group = record.group().get();
        let list = self.load_list_locked(&mut state, group).await?;

        let mut ordered: Vec<Arc<Record>> = list.items().into_values().collect();
        ordered.sort_by_key(|r| r.position().get());

        if new_position as usize >= ordered.len() {
            return Err(RepoError::InvalidArgument(format!(
                "position {new_position} out of range for a group of {}",
                ordered.len()
            )));
        }
        let index = ordered
            .iter()
            .position(|r| r.id() == id)
            .ok_or(RepoError::NotFound(id))?;
        let target = ordered.remove(index);
        ordered.insert(new_position as usize, target);

        for (index, record) in ordered.iter().enumerate() {
            let position = index as u32;
            if record.position().get() != position {
                record.set_position(position);
                self.store.update_position(record.id(), position).await?;
            }
        }
        list.notify_positions_changed();
        Ok(())
    }

    /// Evict cache entries that were unobserved for two consecutive sweeps.
    ///
    /// Cache-only: the store is never touched. Lists go first; a record is
    /// kept while its group's list is still cached, since evicting it would
    /// split the single live instance per id on the next lookup.
    pub(crate) async fn run_sweep(&self) -> SweepReport {
        let mut state = self.state.lock().await;

        let unobserved_lists: HashSet<GroupKey> = state
            .lists
            .iter()
            .filter(|(_, list)| !list.has_observers())
            .map(|(group, _)| *group)
            .collect();
        let evict_lists: Vec<GroupKey> = unobserved_lists
            .intersection(&state.idle_lists)
            .copied()
            .collect();
        for group in &evict_lists {
            state.lists.remove(group);
        }

        let unobserved_records: HashSet<RecordId> = state
            .records
            .iter()
            .filter(|(_, record)| !record.has_observers())
            .map(|(id, _)| *id)
            .collect();
        let evict_records: Vec<RecordId> = unobserved_records
            .intersection(&state.idle_records)
            .copied()
            .filter(|id| {
                state
                    .records
                    .get(id)
                    .is_some_and(|record| !state.lists.contains_key(&record.group().get()))
            })
            .collect();
        for id in &evict_records {
            state.records.remove(id);
        }

        state.idle_lists = unobserved_lists;
        state.idle_records = unobserved_records;

        if !evict_lists.is_empty() || !evict_records.is_empty() {
            tracing::debug!(
                lists = evict_lists.len(),
                records = evict_records.len(),
                "evicted unobserved cache entries"
            );
        }
        SweepReport {
            evicted_records: evict_records.len(),
            evicted_lists: evict_lists.len(),
        }
    }

    /// Current cache occupancy.
    pub async fn stats(&self) -> CacheStats {
        let state = self.state.lock().await;
        CacheStats {
            cached_records: state.records.len(),
            cached_lists: state.lists.len(),
        }
    }

    async fn load_record_locked(
        &self,
        state: &mut CacheState,
        id: RecordId,
    ) -> RepoResult<Arc<Record>> {
        if let Some(record) = state.records.get(&id) {
            return Ok(record.clone());
        }
        let stored = self
            .store
            .get_record(id)
            .await?
            .ok_or(RepoError::NotFound(id))?;
        let record = Arc::new(Record::from_stored(&stored));
        state.records.insert(id, record.clone());
        Ok(record)
    }

    async fn load_list_locked(
        &self,
        state: &mut CacheState,
        group: GroupKey,
    ) -> RepoResult<Arc<RecordList>> {
        if let Some(list) = state.lists.get(&group) {
            return Ok(list.clone());
        }

        let rows = self.store.records_by_group(&group).await?;
        let list = Arc::new(RecordList::new(group));
        for row in rows {
            // First writer wins: an instance already cached for this id is
            // reused over the freshly fetched row.
            let record = state
                .records
                .entry(row.id)
                .or_insert_with(|| Arc::new(Record::from_stored(&row)))
                .clone();
            list.add(row.id, record)?;
        }
        state.lists.insert(group, list.clone());
        tracing::debug!(%group, records = list.len(), "hydrated group list");

        let hooks = self.hooks.lock().expect("hook registry poisoned");
        if !hooks.entries.is_empty() {
            let mut ctx = GroupLoadContext {
                group,
                list: &list,
                records: &mut state.records,
            };
            for (_, hook) in &hooks.entries {
                hook(&mut ctx);
            }
        }

        Ok(list)
    }
}
