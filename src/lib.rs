//! # Paraglider Ticker
//!
//! Ingestion-ordered feed of paragliding tracks, plus webhooks that are told
//! about new tracks in batches.
//!
//! ## Core Concepts
//!
//! - **Track**: A stored flight record, stamped with a unique ingestion timestamp
//! - **Ticker window**: A page of at most `page_cap` track ids in ingestion order
//! - **Subscription**: A webhook that fires after every `threshold` ingestion events
//! - **Trigger engine**: Decrements, fires and resets subscriptions on each ingest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use paraglider_ticker::{HttpNotifier, TickerConfig, TrackMetadata, TrackService};
//!
//! let config = TickerConfig::from_env()?;
//! let notifier = Arc::new(HttpNotifier::new(config.delivery_timeout)?);
//! let service = TrackService::in_memory(notifier, &config)?;
//!
//! service.register_webhook("https://example.com/hook", 2)?;
//! let receipt = service.ingest(TrackMetadata::from_url("http://tracks/1.igc"))?;
//!
//! let page = service.ticker().window_from_start()?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Core types
pub mod config;
pub mod error;
pub mod time;
pub mod track;

// Storage, ticker and notification
pub mod service;
pub mod storage;
pub mod ticker;
pub mod webhook;

// Re-export primary types at crate root for convenience
pub use config::TickerConfig;
pub use error::{DeliveryError, ExecutionError, TickerError, TickerResult, ValidationError};
pub use service::{IngestReceipt, TrackService};
pub use storage::{
    InMemoryStores, InMemorySubscriptionStore, InMemoryTrackStore, StorageError, SubscriptionStore,
    TrackPage, TrackStore, UpdateOutcome,
};
pub use ticker::{TickerEngine, TickerWindow};
pub use time::Timestamp;
pub use track::{Track, TrackId, TrackMetadata};
pub use webhook::{
    compose, Delivery, DeliveryDispatcher, FiredNotification, Notifier, Subscription,
    SubscriptionId, SubscriptionRegistry, TriggerEngine, TriggerReport,
};

#[cfg(feature = "http")]
pub use webhook::HttpNotifier;
