//! Port trait definitions (hexagonal architecture).
//!
//! These async traits are the contracts adapters implement so the domain
//! stays independent of any concrete storage:
//! - [`RecordStore`]: durable record persistence
//! - [`IdAllocator`]: process-wide unique id allocation

pub mod id_allocator;
pub mod record_store;

pub use id_allocator::IdAllocator;
pub use record_store::RecordStore;
