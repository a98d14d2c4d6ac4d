//! Track service: the ingestion entrypoint.
//!
//! `TrackService` wires the stores, the ticker, the subscription registry and
//! the trigger engine together. `ingest` commits a track and then runs the
//! trigger engine for that one event.

use std::sync::Arc;

use crate::config::TickerConfig;
use crate::error::TickerResult;
use crate::storage::{InMemorySubscriptionStore, InMemoryTrackStore, StorageError, SubscriptionStore, TrackStore};
use crate::ticker::TickerEngine;
use crate::time::Timestamp;
use crate::track::{Track, TrackId, TrackMetadata};
use crate::webhook::{
    DeliveryDispatcher, Notifier, Subscription, SubscriptionId, SubscriptionRegistry, TriggerEngine,
    TriggerReport,
};

/// Result of ingesting one track.
///
/// The track is stored whenever a receipt exists. `trigger` carries the
/// notification layer's outcome separately so a failed trigger never hides
/// a successful commit.
#[derive(Debug)]
pub struct IngestReceipt {
    /// The committed track.
    pub track: Track,
    /// What the trigger engine did for this event.
    pub trigger: TickerResult<TriggerReport>,
}

/// Composition root for the ticker and webhook subsystems.
#[derive(Clone)]
pub struct TrackService {
    tracks: Arc<dyn TrackStore>,
    ticker: TickerEngine,
    registry: SubscriptionRegistry,
    triggers: TriggerEngine,
}

impl std::fmt::Debug for TrackService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackService")
            .field("ticker", &self.ticker)
            .field("triggers", &self.triggers)
            .finish_non_exhaustive()
    }
}

impl TrackService {
    /// Create a service over the given stores and notifier.
    ///
    /// # Errors
    ///
    /// Validation errors for a zero page cap; an internal error if the
    /// delivery worker cannot start.
    pub fn new(
        tracks: Arc<dyn TrackStore>,
        subscriptions: Arc<dyn SubscriptionStore>,
        notifier: Arc<dyn Notifier>,
        config: &TickerConfig,
    ) -> TickerResult<Self> {
        let ticker = TickerEngine::new(Arc::clone(&tracks), config.page_cap)?;
        let dispatcher = Arc::new(DeliveryDispatcher::new(notifier, config.delivery_queue_capacity)?);
        let registry = SubscriptionRegistry::new(Arc::clone(&subscriptions));
        let triggers = TriggerEngine::new(ticker.clone(), subscriptions, dispatcher);

        tracing::debug!(
            page_cap = config.page_cap,
            delivery_queue_capacity = config.delivery_queue_capacity,
            "track service started"
        );

        Ok(Self {
            tracks,
            ticker,
            registry,
            triggers,
        })
    }

    /// Create a service backed by fresh in-memory stores.
    ///
    /// # Errors
    ///
    /// Same as [`TrackService::new`].
    pub fn in_memory(notifier: Arc<dyn Notifier>, config: &TickerConfig) -> TickerResult<Self> {
        Self::new(
            Arc::new(InMemoryTrackStore::new()),
            Arc::new(InMemorySubscriptionStore::new()),
            notifier,
            config,
        )
    }

    /// Commit a track, then run the trigger engine once for it.
    ///
    /// # Errors
    ///
    /// Only a failed commit is an error. Trigger failures are reported in
    /// [`IngestReceipt::trigger`].
    pub fn ingest(&self, metadata: TrackMetadata) -> Result<IngestReceipt, StorageError> {
        let track = self.tracks.append(metadata, Timestamp::now())?;
        tracing::info!(track = %track.id, ingested_at = %track.ingested_at, "track ingested");

        let trigger = self.triggers.on_track_ingested();
        if let Err(err) = &trigger {
            tracing::warn!(track = %track.id, error = %err, "track stored but webhook triggering failed");
        }
        Ok(IngestReceipt { track, trigger })
    }

    /// Register a webhook that reports tracks ingested from now on.
    ///
    /// The baseline is the later of the newest stored track and the previous
    /// millisecond, so a track committed in the same millisecond as the
    /// registration is still reported.
    ///
    /// # Errors
    ///
    /// Validation errors for a blank URL or zero threshold; store failures.
    pub fn register_webhook(&self, target_url: &str, threshold: u32) -> TickerResult<Subscription> {
        let now = Timestamp::now();
        let previous_ms = Timestamp::from_millis(now.as_millis().saturating_sub(1));
        let baseline = match self.ticker.latest_timestamp()? {
            Some(latest) => latest.max(previous_ms),
            None => previous_ms,
        };
        self.registry.register_after(target_url, threshold, baseline)
    }

    /// Remove a webhook, returning the removed record.
    ///
    /// # Errors
    ///
    /// `StorageError::SubscriptionNotFound` for an unknown id.
    pub fn unregister_webhook(&self, id: SubscriptionId) -> Result<Subscription, StorageError> {
        self.registry.unregister(id)
    }

    /// Get a reference to the ticker.
    pub fn ticker(&self) -> &TickerEngine {
        &self.ticker
    }

    /// Get a reference to the subscription registry.
    pub fn registry(&self) -> &SubscriptionRegistry {
        &self.registry
    }

    /// Get a reference to the trigger engine.
    pub fn trigger_engine(&self) -> &TriggerEngine {
        &self.triggers
    }

    /// Look up a track.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn track(&self, id: TrackId) -> Result<Option<Track>, StorageError> {
        self.tracks.get(id)
    }

    /// All track ids in ingestion order.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn track_ids(&self) -> Result<Vec<TrackId>, StorageError> {
        Ok(self.tracks.all_ordered()?.into_iter().map(|t| t.id).collect())
    }

    /// Number of stored tracks.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn track_count(&self) -> Result<usize, StorageError> {
        self.tracks.count()
    }

    /// Administrative purge of every track. Subscriptions are untouched.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn purge_tracks(&self) -> Result<usize, StorageError> {
        let removed = self.tracks.purge()?;
        tracing::warn!(removed, "all tracks purged");
        Ok(removed)
    }

    /// Stop accepting notifications and wait for queued deliveries to finish.
    pub fn shutdown(&self) {
        self.triggers.dispatcher().shutdown();
    }
}
