//! Ingestion timestamps.
//!
//! Tracks are keyed by the wall-clock millisecond at which the store
//! committed them. The value is a plain Unix-epoch millisecond count so it
//! round-trips through JSON exactly as the ticker API reports it.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Milliseconds since the Unix epoch.
///
/// `Timestamp::ZERO` doubles as the "unset" value of the `start`/`stop`
/// fields in an empty ticker window. It is never produced for a real track.
///
/// # Examples
///
/// ```
/// use paraglider_ticker::Timestamp;
///
/// let t = Timestamp::from_millis(1_540_000_000_000);
/// assert!(t > Timestamp::ZERO);
/// assert_eq!(t.checked_next().unwrap().as_millis(), 1_540_000_000_001);
/// assert!(Timestamp::from_millis(i64::MAX).checked_next().is_none());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// The zero value.
    pub const ZERO: Self = Self(0);

    /// Wraps a raw millisecond count.
    #[must_use]
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Current wall-clock time.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now().timestamp_millis())
    }

    /// Raw millisecond count.
    #[must_use]
    pub const fn as_millis(self) -> i64 {
        self.0
    }

    /// The immediately following millisecond, or `None` at `i64::MAX`.
    #[must_use]
    pub const fn checked_next(self) -> Option<Self> {
        match self.0.checked_add(1) {
            Some(millis) => Some(Self(millis)),
            None => None,
        }
    }

    /// Returns true for the zero value.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Converts to a UTC datetime, if the value is in chrono's range.
    #[must_use]
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.0).single()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Timestamp {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(Self)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt.timestamp_millis())
    }
}
