//! Track records.
//!
//! A track is one uploaded IGC flight. The core only cares about its identity
//! and the instant the store committed it; the descriptive metadata is carried
//! through untouched.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::time::Timestamp;

/// Globally unique track identifier.
///
/// # Examples
///
/// ```
/// use paraglider_ticker::TrackId;
///
/// let id = TrackId::new();
/// assert!(!id.is_nil());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(Uuid);

impl TrackId {
    /// Creates a new random track ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a track ID from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Returns true if this is a nil (all zeros) UUID.
    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for TrackId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl From<Uuid> for TrackId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Descriptive metadata parsed from the IGC file before ingestion.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackMetadata {
    #[serde(rename = "H_date")]
    pub h_date: String,
    pub pilot: String,
    pub glider: String,
    pub glider_id: String,
    /// Total distance in kilometres, computed upstream.
    pub track_length: f64,
    pub track_url: String,
}

impl TrackMetadata {
    /// Metadata carrying only the source URL.
    #[must_use]
    pub fn from_url(track_url: impl Into<String>) -> Self {
        Self {
            track_url: track_url.into(),
            ..Self::default()
        }
    }
}

/// A stored track. Immutable once committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Identifier assigned at ingestion.
    pub id: TrackId,
    /// Commit instant assigned by the store.
    #[serde(rename = "timestamp")]
    pub ingested_at: Timestamp,
    /// Descriptive metadata.
    #[serde(flatten)]
    pub metadata: TrackMetadata,
}

impl Track {
    /// Creates a track record. Stores call this while holding their write lock.
    #[must_use]
    pub fn new(id: TrackId, ingested_at: Timestamp, metadata: TrackMetadata) -> Self {
        Self {
            id,
            ingested_at,
            metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn track_id_displays_as_compact_hex() {
        let id = TrackId::from_uuid(Uuid::nil());
        assert_eq!(id.to_string(), "0".repeat(32));
    }

    #[test]
    fn track_json_uses_wire_field_names() {
        let track = Track::new(
            TrackId::new(),
            Timestamp::from_millis(7),
            TrackMetadata {
                h_date: "2016-02-19".to_string(),
                pilot: "Miguel Angel Gordillo".to_string(),
                glider: "RV8".to_string(),
                glider_id: "EC-XLL".to_string(),
                track_length: 443.25,
                track_url: "http://skypolaris.org/wp-content/uploads/IGS%20Files/Madrid%20to%20Jerez.igc".to_string(),
            },
        );

        let value = serde_json::to_value(&track).unwrap();
        assert_eq!(value["timestamp"], 7);
        assert_eq!(value["H_date"], "2016-02-19");
        assert_eq!(value["glider_id"], "EC-XLL");

        let back: Track = serde_json::from_value(value).unwrap();
        assert_eq!(back, track);
    }
}
