//! WEBHOOK subsystem: subscriptions, triggering and delivery.
//!
//! Subscriptions count ingestion events down from a threshold. The trigger
//! engine fires a subscription when its count runs out and there is at least
//! one track it has not been told about. Delivery runs on a separate worker
//! so a slow endpoint never stalls ingestion.

/// Notification message text.
pub mod compose;
/// Delivery worker and the `Notifier` seam.
pub mod dispatcher;
/// Countdown state machine driven by ingestion events.
pub mod engine;
/// HTTP notifier.
#[cfg(feature = "http")]
pub mod http;
/// Registration CRUD.
pub mod registry;
/// Subscription record and identifier types.
pub mod subscription;

pub use compose::compose;
pub use dispatcher::{Delivery, DeliveryDispatcher, Notifier};
pub use engine::{FiredNotification, TriggerEngine, TriggerReport};
#[cfg(feature = "http")]
pub use http::HttpNotifier;
pub use registry::SubscriptionRegistry;
pub use subscription::{Subscription, SubscriptionId};
