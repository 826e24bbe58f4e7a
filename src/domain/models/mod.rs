//! Domain models: grouping keys, records, and per-group record lists.

pub mod group_key;
pub mod record;
pub mod record_list;

pub use group_key::{GroupKey, GroupKind};
pub use record::{Record, RecordId, RecordPatch, StoredRecord};
pub use record_list::RecordList;
