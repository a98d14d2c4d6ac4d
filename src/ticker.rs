//! Ticker: paginated views over tracks ordered by ingestion time.
//!
//! The ticker answers two questions: "what are the oldest tracks" and "what
//! arrived after timestamp T". Both answers are capped at the configured page
//! size and carry the timestamp of the newest track in the whole store, so a
//! client can tell whether more pages remain.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::storage::{StorageError, TrackPage, TrackStore};
use crate::time::Timestamp;
use crate::track::{Track, TrackId};

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

/// One page of the ticker.
///
/// When no track matched, `ids` is empty and `start`/`stop` are
/// `Timestamp::ZERO`; check [`TickerWindow::is_empty`] before indexing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerWindow {
    /// Newest track in the whole store, independent of the page cap.
    #[serde(rename = "t_latest")]
    pub latest: Timestamp,
    /// Timestamp of the first id in this page.
    #[serde(rename = "t_start")]
    pub start: Timestamp,
    /// Timestamp of the last id in this page.
    #[serde(rename = "t_stop")]
    pub stop: Timestamp,
    /// Track ids, ascending by ingestion time.
    #[serde(rename = "tracks")]
    pub ids: Vec<TrackId>,
    /// Wall-clock cost of computing the page.
    #[serde(rename = "processing", with = "duration_ms")]
    pub processing: Duration,
}

impl TickerWindow {
    /// True when the page holds no ids.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Number of ids in the page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    fn from_page(latest: Timestamp, page: &[Track], started: Instant) -> Self {
        let (start, stop) = match (page.first(), page.last()) {
            (Some(first), Some(last)) => (first.ingested_at, last.ingested_at),
            _ => (Timestamp::ZERO, Timestamp::ZERO),
        };
        Self {
            latest,
            start,
            stop,
            ids: page.iter().map(|t| t.id).collect(),
            processing: started.elapsed(),
        }
    }
}

/// Computes ticker windows over a [`TrackStore`].
#[derive(Clone)]
pub struct TickerEngine {
    tracks: Arc<dyn TrackStore>,
    page_cap: usize,
}

impl std::fmt::Debug for TickerEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickerEngine")
            .field("page_cap", &self.page_cap)
            .finish_non_exhaustive()
    }
}

impl TickerEngine {
    /// Create a ticker with the given page size.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::PageCapNotPositive` when `page_cap` is zero.
    pub fn new(tracks: Arc<dyn TrackStore>, page_cap: usize) -> Result<Self, ValidationError> {
        if page_cap == 0 {
            return Err(ValidationError::PageCapNotPositive { value: 0 });
        }
        Ok(Self { tracks, page_cap })
    }

    /// Configured page size.
    #[must_use]
    pub const fn page_cap(&self) -> usize {
        self.page_cap
    }

    /// The underlying track store.
    #[must_use]
    pub fn track_store(&self) -> &Arc<dyn TrackStore> {
        &self.tracks
    }

    /// Timestamp of the newest track, or `None` when the store is empty.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn latest_timestamp(&self) -> Result<Option<Timestamp>, StorageError> {
        Ok(self.tracks.latest()?.map(|t| t.ingested_at))
    }

    /// The oldest `page_cap` tracks. `None` when the store is empty.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn window_from_start(&self) -> Result<Option<TickerWindow>, StorageError> {
        self.window(None)
    }

    /// Up to `page_cap` tracks ingested strictly after `after`. `None` when
    /// the store is empty.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn window_after(&self, after: Timestamp) -> Result<Option<TickerWindow>, StorageError> {
        self.window(Some(after))
    }

    fn window(&self, after: Option<Timestamp>) -> Result<Option<TickerWindow>, StorageError> {
        let started = Instant::now();
        let TrackPage { mut tracks, latest } = self.tracks.page_after(after, self.page_cap)?;
        let Some(latest) = latest else {
            return Ok(None);
        };

        if !tracks.windows(2).all(|w| w[0].ingested_at <= w[1].ingested_at) {
            tracing::warn!(
                count = tracks.len(),
                "track store returned a page out of ingestion order; sorting it"
            );
            tracks.sort_by_key(|t| t.ingested_at);
        }
        Ok(Some(TickerWindow::from_page(latest, &tracks, started)))
    }
}
