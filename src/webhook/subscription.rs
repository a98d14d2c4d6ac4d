//! Webhook subscription records.
//!
//! A subscription counts ingestion events down from its threshold. When the
//! count reaches zero the trigger engine notifies the target and resets the
//! record. Every mutation bumps `version` so updates can be applied with a
//! compare-and-swap.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::time::Timestamp;

/// Unique identifier for a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    /// Create a new random subscription id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// A registered webhook.
///
/// Serializes as the registration view (`id`, `webhookURL`,
/// `minTriggerValue`). The countdown state is store-owned and has no wire
/// form, so records are never rebuilt from JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subscription {
    /// Identifier assigned at registration.
    pub id: SubscriptionId,
    /// Delivery endpoint.
    #[serde(rename = "webhookURL")]
    pub target_url: String,
    /// Ingestion events per notification.
    #[serde(rename = "minTriggerValue")]
    pub threshold: u32,
    /// Events remaining until the next trigger. Goes negative while a ready
    /// subscription has nothing new to report.
    #[serde(skip)]
    pub countdown: i64,
    /// Newest track timestamp covered by the last notification.
    #[serde(skip)]
    pub last_seen: Timestamp,
    /// Registration time.
    #[serde(skip)]
    pub created_at: Timestamp,
    /// Mutation counter for compare-and-swap updates.
    #[serde(skip)]
    pub version: u64,
}

impl Subscription {
    /// Builds a fresh subscription with a full countdown.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyTargetUrl` for a blank URL and
    /// `ValidationError::ThresholdNotPositive` for a zero threshold.
    pub fn new(
        target_url: impl Into<String>,
        threshold: u32,
        created_at: Timestamp,
    ) -> Result<Self, ValidationError> {
        let target_url = target_url.into().trim().to_string();
        if target_url.is_empty() {
            return Err(ValidationError::EmptyTargetUrl);
        }
        if threshold == 0 {
            return Err(ValidationError::ThresholdNotPositive { value: 0 });
        }

        Ok(Self {
            id: SubscriptionId::new(),
            target_url,
            threshold,
            countdown: i64::from(threshold),
            last_seen: created_at,
            created_at,
            version: 0,
        })
    }

    /// Parses a threshold given as a signed value (e.g. from a JSON body).
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::ThresholdNotPositive` when `value < 1` or it
    /// does not fit a `u32`.
    pub fn threshold_from_i64(value: i64) -> Result<u32, ValidationError> {
        if value < 1 {
            return Err(ValidationError::ThresholdNotPositive { value });
        }
        u32::try_from(value).map_err(|_| ValidationError::ThresholdNotPositive { value })
    }

    /// True once the countdown has run out.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.countdown <= 0
    }

    /// Applies one ingestion event.
    pub fn decrement(&mut self) {
        self.countdown -= 1;
        self.version += 1;
    }

    /// Resets after a trigger. `last_seen` never moves backwards.
    pub fn reset(&mut self, latest: Timestamp) {
        self.countdown = i64::from(self.threshold);
        self.last_seen = self.last_seen.max(latest);
        self.version += 1;
    }
}
