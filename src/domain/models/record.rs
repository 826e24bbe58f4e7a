//! The mutable, observable record entity.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::models::GroupKey;
use crate::domain::observable::ObservableField;

/// Primary key of a record. Allocated once at creation, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId(pub i64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A todo record with independently observable fields.
///
/// Every mutable field can be watched on its own: a subscriber receives each
/// transition the field goes through, in write order, for as long as its
/// subscription lives. The id is fixed for the lifetime of the record.
#[derive(Debug)]
pub struct Record {
    id: RecordId,
    title: ObservableField<String>,
    description: ObservableField<String>,
    group: ObservableField<GroupKey>,
    position: ObservableField<u32>,
    completed: ObservableField<bool>,
}

impl Record {
    /// Create a record with an empty description at position 0, not completed.
    pub fn new(id: RecordId, title: impl Into<String>, group: GroupKey) -> Self {
        Self {
            id,
            title: ObservableField::new(title.into()),
            description: ObservableField::new(String::new()),
            group: ObservableField::new(group),
            position: ObservableField::new(0),
            completed: ObservableField::new(false),
        }
    }

    pub fn with_description(self, description: impl Into<String>) -> Self {
        self.description.set(description.into());
        self
    }

    pub fn with_position(self, position: u32) -> Self {
        self.position.set(position);
        self
    }

    pub fn with_completed(self, completed: bool) -> Self {
        self.completed.set(completed);
        self
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn title(&self) -> &ObservableField<String> {
        &self.title
    }

    pub fn description(&self) -> &ObservableField<String> {
        &self.description
    }

    pub fn group(&self) -> &ObservableField<GroupKey> {
        &self.group
    }

    pub fn position(&self) -> &ObservableField<u32> {
        &self.position
    }

    pub fn completed(&self) -> &ObservableField<bool> {
        &self.completed
    }

    pub fn set_title(&self, title: impl Into<String>) {
        self.title.set(title.into());
    }

    pub fn set_description(&self, description: impl Into<String>) {
        self.description.set(description.into());
    }

    pub fn set_group(&self, group: GroupKey) {
        self.group.set(group);
    }

    pub fn set_position(&self, position: u32) {
        self.position.set(position);
    }

    pub fn set_completed(&self, completed: bool) {
        self.completed.set(completed);
    }

    /// True iff any field currently has a live subscriber.
    pub fn has_observers(&self) -> bool {
        self.title.has_subscribers()
            || self.description.has_subscribers()
            || self.group.has_subscribers()
            || self.position.has_subscribers()
            || self.completed.has_subscribers()
    }

    /// Independent copy with the same values and no subscribers.
    pub fn copy(&self) -> Record {
        self.copy_with(RecordPatch::default())
    }

    /// Independent copy, overriding any field the patch carries. Copies never
    /// inherit subscribers.
    pub fn copy_with(&self, patch: RecordPatch) -> Record {
        Record {
            id: patch.id.unwrap_or(self.id),
            title: ObservableField::new(patch.title.unwrap_or_else(|| self.title.get())),
            description: ObservableField::new(
                patch.description.unwrap_or_else(|| self.description.get()),
            ),
            group: ObservableField::new(patch.group.unwrap_or_else(|| self.group.get())),
            position: ObservableField::new(patch.position.unwrap_or_else(|| self.position.get())),
            completed: ObservableField::new(patch.completed.unwrap_or_else(|| self.completed.get())),
        }
    }

    /// Plain snapshot of the current field values, as the store ports see it.
    pub fn to_stored(&self) -> StoredRecord {
        StoredRecord {
            id: self.id,
            title: self.title.get(),
            description: self.description.get(),
            group: self.group.get(),
            position: self.position.get(),
            completed: self.completed.get(),
        }
    }

    /// Rebuild a live record from a stored row.
    pub fn from_stored(stored: &StoredRecord) -> Record {
        Record::new(stored.id, stored.title.clone(), stored.group)
            .with_description(stored.description.clone())
            .with_position(stored.position)
            .with_completed(stored.completed)
    }
}

/// Field overrides for [`Record::copy_with`].
#[derive(Debug, Default, Clone)]
pub struct RecordPatch {
    pub id: Option<RecordId>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub group: Option<GroupKey>,
    pub position: Option<u32>,
    pub completed: Option<bool>,
}

/// The persisted shape of a record — what the store adapter reads and writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: RecordId,
    pub title: String,
    pub description: String,
    pub group: GroupKey,
    pub position: u32,
    pub completed: bool,
}
