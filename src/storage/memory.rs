//! In-memory storage backend.
//!
//! This module provides thread-safe in-memory implementations of the storage traits.
//! It is intended for embedded usage, tests, and as a reference implementation.

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::RwLock;

use crate::storage::traits::{StorageError, SubscriptionStore, TrackPage, TrackStore, UpdateOutcome};
use crate::time::Timestamp;
use crate::track::{Track, TrackId, TrackMetadata};
use crate::webhook::subscription::{Subscription, SubscriptionId};

fn lock_err(context: &'static str) -> StorageError {
    StorageError::BackendError(format!("poisoned lock: {context}"))
}

#[derive(Debug, Default)]
struct TrackState {
    by_time: BTreeMap<Timestamp, Track>,
    by_id: HashMap<TrackId, Timestamp>,
}

/// Thread-safe in-memory track store.
///
/// Tracks are indexed by their ingestion timestamp, which the store assigns
/// strictly increasing, so iteration order is ingestion order.
#[derive(Debug, Default)]
pub struct InMemoryTrackStore {
    state: RwLock<TrackState>,
}

impl InMemoryTrackStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TrackStore for InMemoryTrackStore {
    fn append(&self, metadata: TrackMetadata, observed_at: Timestamp) -> Result<Track, StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("track.append"))?;

        let ingested_at = match state.by_time.keys().next_back() {
            Some(latest) if *latest >= observed_at => latest.checked_next().ok_or_else(|| {
                StorageError::BackendError(format!("ingestion clock exhausted after {latest}"))
            })?,
            _ => observed_at,
        };

        let id = TrackId::new();
        if state.by_id.contains_key(&id) {
            return Err(StorageError::DuplicateKey(id.to_string()));
        }

        let track = Track::new(id, ingested_at, metadata);
        state.by_id.insert(id, ingested_at);
        state.by_time.insert(ingested_at, track.clone());
        Ok(track)
    }

    fn get(&self, id: TrackId) -> Result<Option<Track>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("track.get"))?;
        Ok(state
            .by_id
            .get(&id)
            .and_then(|ts| state.by_time.get(ts))
            .cloned())
    }

    fn all_ordered(&self) -> Result<Vec<Track>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("track.all_ordered"))?;
        Ok(state.by_time.values().cloned().collect())
    }

    fn page_after(&self, after: Option<Timestamp>, limit: usize) -> Result<TrackPage, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("track.page_after"))?;
        let lower = after.map_or(Bound::Unbounded, Bound::Excluded);
        Ok(TrackPage {
            tracks: state
                .by_time
                .range((lower, Bound::Unbounded))
                .take(limit)
                .map(|(_, track)| track.clone())
                .collect(),
            latest: state.by_time.keys().next_back().copied(),
        })
    }

    fn latest(&self) -> Result<Option<Track>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("track.latest"))?;
        Ok(state.by_time.values().next_back().cloned())
    }

    fn count(&self) -> Result<usize, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("track.count"))?;
        Ok(state.by_time.len())
    }

    fn purge(&self) -> Result<usize, StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("track.purge"))?;
        let removed = state.by_time.len();
        state.by_time.clear();
        state.by_id.clear();
        Ok(removed)
    }
}

/// Thread-safe in-memory subscription store.
#[derive(Debug, Default)]
pub struct InMemorySubscriptionStore {
    state: RwLock<HashMap<SubscriptionId, Subscription>>,
}

impl InMemorySubscriptionStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SubscriptionStore for InMemorySubscriptionStore {
    fn insert(&self, subscription: Subscription) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("subscription.insert"))?;
        if state.contains_key(&subscription.id) {
            return Err(StorageError::DuplicateKey(subscription.id.to_string()));
        }
        state.insert(subscription.id, subscription);
        Ok(())
    }

    fn get(&self, id: SubscriptionId) -> Result<Option<Subscription>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("subscription.get"))?;
        Ok(state.get(&id).cloned())
    }

    fn list(&self) -> Result<Vec<Subscription>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("subscription.list"))?;
        Ok(state.values().cloned().collect())
    }

    fn delete(&self, id: SubscriptionId) -> Result<Subscription, StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("subscription.delete"))?;
        state.remove(&id).ok_or(StorageError::SubscriptionNotFound(id))
    }

    fn decrement_all(&self) -> Result<Vec<Subscription>, StorageError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| lock_err("subscription.decrement_all"))?;
        Ok(state
            .values_mut()
            .map(|sub| {
                sub.decrement();
                sub.clone()
            })
            .collect())
    }

    fn reset_if_version(
        &self,
        id: SubscriptionId,
        expected_version: u64,
        latest: Timestamp,
    ) -> Result<UpdateOutcome, StorageError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| lock_err("subscription.reset_if_version"))?;
        let Some(sub) = state.get_mut(&id) else {
            return Ok(UpdateOutcome::Missing);
        };
        if sub.version != expected_version {
            return Ok(UpdateOutcome::VersionMismatch {
                current: sub.version,
            });
        }

        sub.reset(latest);
        Ok(UpdateOutcome::Applied(sub.clone()))
    }
}

/// Convenience bundle of in-memory stores.
#[derive(Debug, Default)]
pub struct InMemoryStores {
    /// Track store.
    pub tracks: InMemoryTrackStore,
    /// Subscription store.
    pub subscriptions: InMemorySubscriptionStore,
}

impl InMemoryStores {
    /// Create a new bundle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn track_append_assigns_strictly_increasing_timestamps() {
        let store = InMemoryTrackStore::new();
        let t = Timestamp::from_millis(1_000);

        let a = store.append(TrackMetadata::from_url("a"), t).unwrap();
        // Same millisecond and a clock that stepped backwards both get bumped.
        let b = store.append(TrackMetadata::from_url("b"), t).unwrap();
        let c = store.append(TrackMetadata::from_url("c"), Timestamp::from_millis(500)).unwrap();
        let d = store.append(TrackMetadata::from_url("d"), Timestamp::from_millis(5_000)).unwrap();

        assert_eq!(a.ingested_at, Timestamp::from_millis(1_000));
        assert_eq!(b.ingested_at, Timestamp::from_millis(1_001));
        assert_eq!(c.ingested_at, Timestamp::from_millis(1_002));
        assert_eq!(d.ingested_at, Timestamp::from_millis(5_000));

        let ordered: Vec<_> = store.all_ordered().unwrap().into_iter().map(|t| t.id).collect();
        assert_eq!(ordered, vec![a.id, b.id, c.id, d.id]);
        assert_eq!(store.latest().unwrap().unwrap().id, d.id);
    }

    #[test]
    fn track_append_refuses_to_reuse_the_last_timestamp() {
        let store = InMemoryTrackStore::new();
        let a = store
            .append(TrackMetadata::from_url("a"), Timestamp::from_millis(i64::MAX))
            .unwrap();

        let err = store.append(TrackMetadata::from_url("b"), Timestamp::from_millis(5)).unwrap_err();
        assert!(matches!(err, StorageError::BackendError(msg) if msg.contains("exhausted")));

        assert_eq!(store.count().unwrap(), 1);
        assert_eq!(store.get(a.id).unwrap().unwrap(), a);
        assert_eq!(store.latest().unwrap().unwrap().id, a.id);
    }

    #[test]
    fn page_after_is_bounded_and_exclusive() {
        let store = InMemoryTrackStore::new();
        let tracks: Vec<_> = [10, 20, 30, 40]
            .into_iter()
            .map(|ms| store.append(TrackMetadata::from_url("t"), Timestamp::from_millis(ms)).unwrap())
            .collect();

        let page = store.page_after(None, 2).unwrap();
        assert_eq!(page.tracks, tracks[..2]);
        assert_eq!(page.latest, Some(Timestamp::from_millis(40)));

        let page = store.page_after(Some(Timestamp::from_millis(20)), 5).unwrap();
        assert_eq!(page.tracks, tracks[2..]);

        let page = store.page_after(Some(Timestamp::from_millis(40)), 5).unwrap();
        assert!(page.tracks.is_empty());
        assert_eq!(page.latest, Some(Timestamp::from_millis(40)));

        assert_eq!(InMemoryTrackStore::new().page_after(None, 5).unwrap(), TrackPage::default());
    }

    #[test]
    fn track_get_count_and_purge() {
        let store = InMemoryTrackStore::new();
        assert!(store.latest().unwrap().is_none());
        assert_eq!(store.count().unwrap(), 0);

        let a = store.append(TrackMetadata::from_url("a"), Timestamp::from_millis(1)).unwrap();
        store.append(TrackMetadata::from_url("b"), Timestamp::from_millis(2)).unwrap();

        assert_eq!(store.get(a.id).unwrap().unwrap(), a);
        assert!(store.get(TrackId::new()).unwrap().is_none());
        assert_eq!(store.count().unwrap(), 2);

        assert_eq!(store.purge().unwrap(), 2);
        assert_eq!(store.count().unwrap(), 0);
        assert!(store.get(a.id).unwrap().is_none());
        assert_eq!(store.purge().unwrap(), 0);
    }

    #[test]
    fn subscription_insert_get_delete() {
        let store = InMemorySubscriptionStore::new();
        let sub = Subscription::new("http://hook", 2, Timestamp::from_millis(1)).unwrap();
        let id = sub.id;

        store.insert(sub.clone()).unwrap();
        assert!(matches!(store.insert(sub.clone()), Err(StorageError::DuplicateKey(_))));
        assert_eq!(store.get(id).unwrap().unwrap(), sub);
        assert_eq!(store.list().unwrap().len(), 1);

        assert_eq!(store.delete(id).unwrap(), sub);
        assert!(store.get(id).unwrap().is_none());
        assert_eq!(store.delete(id), Err(StorageError::SubscriptionNotFound(id)));
    }

    #[test]
    fn decrement_all_touches_every_subscription() {
        let store = InMemorySubscriptionStore::new();
        let a = Subscription::new("http://a", 1, Timestamp::from_millis(1)).unwrap();
        let b = Subscription::new("http://b", 3, Timestamp::from_millis(1)).unwrap();
        store.insert(a.clone()).unwrap();
        store.insert(b.clone()).unwrap();

        let after = store.decrement_all().unwrap();
        assert_eq!(after.len(), 2);
        assert_eq!(store.get(a.id).unwrap().unwrap().countdown, 0);
        assert_eq!(store.get(b.id).unwrap().unwrap().countdown, 2);
        assert!(after.iter().all(|s| s.version == 1));
    }

    #[test]
    fn reset_if_version_is_compare_and_swap() {
        let store = InMemorySubscriptionStore::new();
        let sub = Subscription::new("http://a", 2, Timestamp::from_millis(10)).unwrap();
        let id = sub.id;
        store.insert(sub).unwrap();

        let snapshot = store.decrement_all().unwrap().remove(0);
        store.decrement_all().unwrap();

        // Stale version loses.
        let outcome = store
            .reset_if_version(id, snapshot.version, Timestamp::from_millis(99))
            .unwrap();
        assert_eq!(outcome, UpdateOutcome::VersionMismatch { current: 2 });
        assert_eq!(store.get(id).unwrap().unwrap().countdown, 0);

        // Current version wins and bumps the version.
        let outcome = store.reset_if_version(id, 2, Timestamp::from_millis(99)).unwrap();
        let UpdateOutcome::Applied(stored) = outcome else {
            panic!("expected applied update");
        };
        assert_eq!(stored.countdown, 2);
        assert_eq!(stored.last_seen, Timestamp::from_millis(99));
        assert_eq!(stored.version, 3);

        store.delete(id).unwrap();
        assert_eq!(
            store.reset_if_version(id, 3, Timestamp::from_millis(100)).unwrap(),
            UpdateOutcome::Missing
        );
    }
}
