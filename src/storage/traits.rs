//! Abstract storage traits for tracks and webhook subscriptions.
//!
//! These traits define the contract that storage backends must implement.
//! The in-memory backend in this crate is the reference implementation; a
//! database-backed store only has to honour the same ordering and atomicity
//! guarantees.

use thiserror::Error;

use crate::time::Timestamp;
use crate::track::{Track, TrackId, TrackMetadata};
use crate::webhook::subscription::{Subscription, SubscriptionId};

/// Errors that can occur during storage operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Subscription not found.
    #[error("Subscription not found: {0}")]
    SubscriptionNotFound(SubscriptionId),

    /// Key already exists.
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// Backend error.
    #[error("Storage backend error: {0}")]
    BackendError(String),

    /// Connection failed.
    #[error("Connection error: {0}")]
    ConnectionError(String),
}

/// Outcome of a versioned subscription update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The update was applied; carries the stored record.
    Applied(Subscription),
    /// Another writer changed the record first; carries its current version.
    VersionMismatch {
        /// Version found in the store.
        current: u64,
    },
    /// The subscription no longer exists.
    Missing,
}

/// A bounded slice of the track set plus the newest timestamp, read together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackPage {
    /// Matching tracks, ascending by `ingested_at`.
    pub tracks: Vec<Track>,
    /// Newest timestamp in the whole store at read time; `None` when empty.
    pub latest: Option<Timestamp>,
}

/// Storage trait for track records.
///
/// # Ordering
/// The store owns the ingestion clock. `append` assigns `ingested_at` while
/// holding its write lock, strictly greater than every timestamp already
/// stored, so commit order and timestamp order always agree.
pub trait TrackStore: Send + Sync {
    /// Commit a new track. `observed_at` is the caller's wall clock; the
    /// stored timestamp is `max(observed_at, latest + 1)`.
    fn append(&self, metadata: TrackMetadata, observed_at: Timestamp) -> Result<Track, StorageError>;

    /// Get a track by ID.
    fn get(&self, id: TrackId) -> Result<Option<Track>, StorageError>;

    /// All tracks, ascending by `ingested_at`.
    fn all_ordered(&self) -> Result<Vec<Track>, StorageError>;

    /// At most `limit` tracks ingested strictly after `after` (or from the
    /// oldest track when `after` is `None`), with the store's newest timestamp
    /// taken from the same read.
    fn page_after(&self, after: Option<Timestamp>, limit: usize) -> Result<TrackPage, StorageError>;

    /// The most recently ingested track.
    fn latest(&self) -> Result<Option<Track>, StorageError>;

    /// Number of stored tracks.
    fn count(&self) -> Result<usize, StorageError>;

    /// Delete every track, returning how many were removed.
    fn purge(&self) -> Result<usize, StorageError>;
}

/// Storage trait for webhook subscriptions.
///
/// # Atomicity
/// - `decrement_all` applies to every subscription or to none.
/// - `reset_if_version` only writes when the stored version equals
///   `expected_version`, and bumps the version when it does.
pub trait SubscriptionStore: Send + Sync {
    /// Insert a new subscription. Returns error if ID already exists.
    fn insert(&self, subscription: Subscription) -> Result<(), StorageError>;

    /// Get a subscription by ID.
    fn get(&self, id: SubscriptionId) -> Result<Option<Subscription>, StorageError>;

    /// All subscriptions, in no particular order.
    fn list(&self) -> Result<Vec<Subscription>, StorageError>;

    /// Delete a subscription, returning the removed record.
    fn delete(&self, id: SubscriptionId) -> Result<Subscription, StorageError>;

    /// Decrement every countdown by one and return the post-decrement records.
    fn decrement_all(&self) -> Result<Vec<Subscription>, StorageError>;

    /// Refill the countdown and advance `last_seen` to `latest` if the record
    /// is still at `expected_version`.
    fn reset_if_version(
        &self,
        id: SubscriptionId,
        expected_version: u64,
        latest: Timestamp,
    ) -> Result<UpdateOutcome, StorageError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compile-time test: ensure traits are object-safe
    fn _assert_track_store_object_safe(_: &dyn TrackStore) {}
    fn _assert_subscription_store_object_safe(_: &dyn SubscriptionStore) {}

    #[test]
    fn test_storage_error_display() {
        let err = StorageError::SubscriptionNotFound(SubscriptionId::new());
        assert!(err.to_string().contains("Subscription not found"));

        let err = StorageError::BackendError("connection refused".to_string());
        assert!(err.to_string().contains("connection refused"));
    }
}
