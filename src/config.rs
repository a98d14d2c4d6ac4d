//! Service configuration.
//!
//! Settings come from the environment. Unset keys fall back to the defaults
//! (`N_TICKER_PAGE` defaults to 5).

use std::time::Duration;

use crate::error::ValidationError;

/// Page size of the ticker.
pub const ENV_PAGE_CAP: &str = "N_TICKER_PAGE";
/// Capacity of the outbound delivery queue.
pub const ENV_DELIVERY_QUEUE: &str = "TICKER_DELIVERY_QUEUE";
/// Per-request timeout for HTTP delivery, in milliseconds.
pub const ENV_DELIVERY_TIMEOUT_MS: &str = "TICKER_DELIVERY_TIMEOUT_MS";

/// Runtime settings for the ticker and delivery worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickerConfig {
    /// Max track ids per ticker page.
    pub page_cap: usize,
    /// Max queued notifications before new ones are dropped.
    pub delivery_queue_capacity: usize,
    /// Timeout for one outbound delivery.
    pub delivery_timeout: Duration,
}

impl Default for TickerConfig {
    fn default() -> Self {
        Self {
            page_cap: 5,
            delivery_queue_capacity: 1024,
            delivery_timeout: Duration::from_secs(10),
        }
    }
}

impl TickerConfig {
    /// Read configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for unparsable or non-positive values.
    pub fn from_env() -> Result<Self, ValidationError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup. Unset and blank
    /// keys fall back to the defaults.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for unparsable or non-positive values.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let page_cap = match get(ENV_PAGE_CAP) {
            None => defaults.page_cap,
            Some(raw) => {
                let value = parse_i64(ENV_PAGE_CAP, &raw)?;
                positive_usize(value).ok_or(ValidationError::PageCapNotPositive { value })?
            }
        };

        let delivery_queue_capacity = match get(ENV_DELIVERY_QUEUE) {
            None => defaults.delivery_queue_capacity,
            Some(raw) => {
                let value = parse_i64(ENV_DELIVERY_QUEUE, &raw)?;
                positive_usize(value).ok_or_else(|| ValidationError::InvalidSetting {
                    key: ENV_DELIVERY_QUEUE.to_string(),
                    reason: format!("must be positive, got {value}"),
                })?
            }
        };

        let delivery_timeout = match get(ENV_DELIVERY_TIMEOUT_MS) {
            None => defaults.delivery_timeout,
            Some(raw) => {
                let value = parse_i64(ENV_DELIVERY_TIMEOUT_MS, &raw)?;
                let millis = u64::try_from(value).ok().filter(|&ms| ms > 0).ok_or_else(|| {
                    ValidationError::InvalidSetting {
                        key: ENV_DELIVERY_TIMEOUT_MS.to_string(),
                        reason: format!("must be positive, got {value}"),
                    }
                })?;
                Duration::from_millis(millis)
            }
        };

        Ok(Self {
            page_cap,
            delivery_queue_capacity,
            delivery_timeout,
        })
    }
}

fn parse_i64(key: &str, raw: &str) -> Result<i64, ValidationError> {
    raw.parse::<i64>().map_err(|e| ValidationError::InvalidSetting {
        key: key.to_string(),
        reason: format!("'{raw}' is not an integer: {e}"),
    })
}

fn positive_usize(value: i64) -> Option<usize> {
    usize::try_from(value).ok().filter(|&v| v > 0)
}
