//! Webhook delivery worker.
//!
//! The trigger engine hands composed notifications to a bounded channel and
//! never waits for the outbound call. A dedicated worker thread drains the
//! channel and calls the [`Notifier`]. Failed deliveries are counted and
//! logged, never retried.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use crate::error::{DeliveryError, TickerError, TickerResult};

use super::subscription::SubscriptionId;

/// Outbound side of a webhook: one-shot delivery of a message.
pub trait Notifier: Send + Sync {
    /// Deliver `message` to `target_url`.
    ///
    /// # Errors
    ///
    /// Returns `DeliveryError` when the endpoint could not be reached or
    /// rejected the message.
    fn deliver(&self, target_url: &str, message: &str) -> Result<(), DeliveryError>;
}

/// A notification waiting to be sent.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub subscription_id: SubscriptionId,
    pub target_url: String,
    pub message: String,
}

#[derive(Debug, Default)]
struct Counters {
    delivered: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
}

/// Owns the delivery worker thread.
pub struct DeliveryDispatcher {
    tx: RwLock<Option<Sender<Delivery>>>,
    counters: Arc<Counters>,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for DeliveryDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliveryDispatcher")
            .field("delivered", &self.delivered())
            .field("failed", &self.failed())
            .field("dropped", &self.dropped())
            .finish_non_exhaustive()
    }
}

impl DeliveryDispatcher {
    /// Spawn the worker with a queue of `queue_capacity` pending deliveries.
    ///
    /// # Errors
    ///
    /// Returns an internal error if the worker thread cannot be spawned.
    pub fn new(notifier: Arc<dyn Notifier>, queue_capacity: usize) -> TickerResult<Self> {
        let (tx, rx) = bounded::<Delivery>(queue_capacity.max(1));
        let counters = Arc::new(Counters::default());

        let thread_counters = Arc::clone(&counters);
        let join = thread::Builder::new()
            .name("paraglider-webhook-delivery".to_string())
            .spawn(move || worker_loop(notifier.as_ref(), &thread_counters, &rx))
            .map_err(|e| TickerError::internal(format!("failed to spawn delivery worker: {e}")))?;

        Ok(Self {
            tx: RwLock::new(Some(tx)),
            counters,
            join: Mutex::new(Some(join)),
        })
    }

    /// Non-blocking enqueue. Returns false if the notification was dropped
    /// because the queue is full or the dispatcher has shut down.
    pub fn enqueue(&self, delivery: Delivery) -> bool {
        let Ok(guard) = self.tx.read() else {
            self.counters.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        };
        let Some(tx) = guard.as_ref() else {
            self.counters.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        };

        match tx.try_send(delivery) {
            Ok(()) => true,
            Err(TrySendError::Full(d) | TrySendError::Disconnected(d)) => {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    subscription = %d.subscription_id,
                    target = %d.target_url,
                    "delivery queue unavailable; notification dropped"
                );
                false
            }
        }
    }

    /// Close the queue, let the worker drain what is already queued, and
    /// wait for it to exit. Later enqueues are dropped. Idempotent.
    pub fn shutdown(&self) {
        if let Ok(mut guard) = self.tx.write() {
            guard.take();
        }
        let handle = self.join.lock().ok().and_then(|mut guard| guard.take());
        if let Some(handle) = handle {
            if handle.join().is_err() {
                tracing::error!("delivery worker panicked");
            }
        }
    }

    /// Notifications the notifier accepted.
    #[must_use]
    pub fn delivered(&self) -> u64 {
        self.counters.delivered.load(Ordering::Relaxed)
    }

    /// Notifications the notifier rejected.
    #[must_use]
    pub fn failed(&self) -> u64 {
        self.counters.failed.load(Ordering::Relaxed)
    }

    /// Notifications dropped before reaching the notifier.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.counters.dropped.load(Ordering::Relaxed)
    }
}

impl Drop for DeliveryDispatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(notifier: &dyn Notifier, counters: &Counters, rx: &Receiver<Delivery>) {
    // Ends once every sender is gone and the queue is drained.
    for delivery in rx {
        match notifier.deliver(&delivery.target_url, &delivery.message) {
            Ok(()) => {
                counters.delivered.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(
                    subscription = %delivery.subscription_id,
                    target = %delivery.target_url,
                    "webhook delivered"
                );
            }
            Err(err) => {
                counters.failed.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    subscription = %delivery.subscription_id,
                    error = %err,
                    "webhook delivery failed; notification is not retried"
                );
            }
        }
    }
}
