//! Observable list of the records belonging to one group.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::errors::RepoResult;
use crate::domain::models::{GroupKey, Record, RecordId};
use crate::domain::observable::{EventStream, EventSubscription, ObservableCollection};

/// The records of a single [`GroupKey`], with add/remove streams plus a
/// dedicated positions-changed stream fired after bulk reorders.
pub struct RecordList {
    group: GroupKey,
    records: ObservableCollection<RecordId, Arc<Record>>,
    positions_changed: EventStream<()>,
}

impl RecordList {
    pub fn new(group: GroupKey) -> Self {
        Self {
            group,
            records: ObservableCollection::new(),
            positions_changed: EventStream::new(),
        }
    }

    pub fn group(&self) -> GroupKey {
        self.group
    }

    pub fn add(&self, id: RecordId, record: Arc<Record>) -> RepoResult<()> {
        self.records.add(id, record)?;
        Ok(())
    }

    pub fn remove(&self, id: RecordId) -> RepoResult<Arc<Record>> {
        Ok(self.records.remove(id)?)
    }

    pub fn get(&self, id: RecordId) -> RepoResult<Arc<Record>> {
        Ok(self.records.get(id)?)
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.records.contains_key(id)
    }

    /// Snapshot of the current membership.
    pub fn items(&self) -> HashMap<RecordId, Arc<Record>> {
        self.records.items()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn subscribe_added(&self) -> EventSubscription<RecordId> {
        self.records.subscribe_added()
    }

    pub fn subscribe_removed(&self) -> EventSubscription<RecordId> {
        self.records.subscribe_removed()
    }

    pub fn subscribe_positions_changed(&self) -> EventSubscription<()> {
        self.positions_changed.subscribe()
    }

    /// Announce that the relative ordering of this group was recomputed.
    pub fn notify_positions_changed(&self) {
        self.positions_changed.publish(());
    }

    /// True iff the base collection has observers or the positions stream
    /// has a subscriber.
    pub fn has_observers(&self) -> bool {
        self.records.has_observers() || self.positions_changed.has_subscribers()
    }
}
