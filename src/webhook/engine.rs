//! Trigger engine: decides when a webhook fires.
//!
//! Every ingestion event decrements all countdowns in one atomic store call.
//! Each subscription that reaches zero gets the ticker window of tracks newer
//! than its `last_seen`. The engine then resets it with a compare-and-swap
//! against the version it read. Only the event that wins the swap composes
//! and enqueues the notification, so two racing events can never notify the
//! same subscription about the same tracks.

use std::sync::Arc;

use crate::error::{ExecutionError, TickerError, TickerResult};
use crate::storage::{StorageError, SubscriptionStore, UpdateOutcome};
use crate::ticker::{TickerEngine, TickerWindow};

use super::compose::compose;
use super::dispatcher::{Delivery, DeliveryDispatcher};
use super::subscription::{Subscription, SubscriptionId};

/// A notification produced by one ingestion event.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq)]
pub struct FiredNotification {
    pub subscription_id: SubscriptionId,
    pub target_url: String,
    pub window: TickerWindow,
    pub message: String,
    /// False if the delivery queue dropped it.
    pub queued: bool,
}

/// What one ingestion event did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriggerReport {
    /// Subscriptions whose countdown was at or below zero.
    pub ready: usize,
    /// Notifications composed and handed to the dispatcher.
    pub fired: Vec<FiredNotification>,
    /// Ready subscriptions with no new tracks; they stay ready.
    pub nothing_new: usize,
    /// Ready subscriptions another event reset first.
    pub lost_races: usize,
}

enum FireOutcome {
    Fired(FiredNotification),
    NothingNew,
    LostRace,
    Gone,
}

/// Drives subscription countdowns from ingestion events.
#[derive(Clone)]
pub struct TriggerEngine {
    ticker: TickerEngine,
    subscriptions: Arc<dyn SubscriptionStore>,
    dispatcher: Arc<DeliveryDispatcher>,
}

impl std::fmt::Debug for TriggerEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriggerEngine")
            .field("ticker", &self.ticker)
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

impl TriggerEngine {
    /// Create an engine over the given ticker, store and dispatcher.
    #[must_use]
    pub fn new(
        ticker: TickerEngine,
        subscriptions: Arc<dyn SubscriptionStore>,
        dispatcher: Arc<DeliveryDispatcher>,
    ) -> Self {
        Self {
            ticker,
            subscriptions,
            dispatcher,
        }
    }

    /// Get a reference to the delivery dispatcher.
    pub fn dispatcher(&self) -> &Arc<DeliveryDispatcher> {
        &self.dispatcher
    }

    /// Process one committed track.
    ///
    /// Call exactly once per stored track, after the store commit.
    ///
    /// # Errors
    ///
    /// - `ExecutionError::Storage` if the decrement failed; no countdown changed.
    /// - `ExecutionError::TriggerAborted` if a window or reset failed part-way;
    ///   `fired` counts the notifications already enqueued by this event.
    pub fn on_track_ingested(&self) -> TickerResult<TriggerReport> {
        let snapshots = self.subscriptions.decrement_all().map_err(|e| {
            TickerError::from(ExecutionError::Storage {
                message: e.to_string(),
            })
        })?;

        let ready: Vec<Subscription> = snapshots.into_iter().filter(Subscription::is_ready).collect();
        let mut report = TriggerReport {
            ready: ready.len(),
            ..TriggerReport::default()
        };

        for subscription in &ready {
            match self.try_fire(subscription) {
                Ok(FireOutcome::Fired(notification)) => report.fired.push(notification),
                Ok(FireOutcome::NothingNew) => report.nothing_new += 1,
                Ok(FireOutcome::LostRace) => report.lost_races += 1,
                Ok(FireOutcome::Gone) => {}
                Err(err) => {
                    tracing::error!(
                        subscription = %subscription.id,
                        fired = report.fired.len(),
                        error = %err,
                        "trigger processing aborted"
                    );
                    return Err(ExecutionError::TriggerAborted {
                        fired: report.fired.len(),
                        reason: err.to_string(),
                    }
                    .into());
                }
            }
        }

        if !report.fired.is_empty() {
            tracing::info!(
                ready = report.ready,
                fired = report.fired.len(),
                lost_races = report.lost_races,
                "webhooks triggered"
            );
        }
        Ok(report)
    }

    fn try_fire(&self, subscription: &Subscription) -> Result<FireOutcome, StorageError> {
        let window = match self.ticker.window_after(subscription.last_seen)? {
            Some(window) if !window.is_empty() => window,
            _ => {
                tracing::debug!(
                    subscription = %subscription.id,
                    countdown = subscription.countdown,
                    "subscription ready but no new tracks"
                );
                return Ok(FireOutcome::NothingNew);
            }
        };

        let outcome = self
            .subscriptions
            .reset_if_version(subscription.id, subscription.version, window.latest)?;
        match outcome {
            UpdateOutcome::Applied(_) => {}
            UpdateOutcome::VersionMismatch { current } => {
                tracing::debug!(
                    subscription = %subscription.id,
                    read_version = subscription.version,
                    current,
                    "subscription changed concurrently; leaving trigger to newer event"
                );
                return Ok(FireOutcome::LostRace);
            }
            UpdateOutcome::Missing => return Ok(FireOutcome::Gone),
        }

        let message = compose(&window);
        let queued = self.dispatcher.enqueue(Delivery {
            subscription_id: subscription.id,
            target_url: subscription.target_url.clone(),
            message: message.clone(),
        });

        Ok(FireOutcome::Fired(FiredNotification {
            subscription_id: subscription.id,
            target_url: subscription.target_url.clone(),
            window,
            message,
            queued,
        }))
    }
}
