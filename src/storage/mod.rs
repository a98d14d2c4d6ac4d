//! Storage traits and the in-memory reference backend.
//!
//! The traits define the abstract interface the ticker and trigger engine
//! depend on. Database-backed implementations live outside this crate.

mod memory;
mod traits;

pub use memory::{InMemoryStores, InMemorySubscriptionStore, InMemoryTrackStore};
pub use traits::{StorageError, SubscriptionStore, TrackPage, TrackStore, UpdateOutcome};
