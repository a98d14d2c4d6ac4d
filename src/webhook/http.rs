//! HTTP notifier.
//!
//! Posts `{"content": "<message>"}` to the target URL, the body shape chat
//! webhooks (Discord, Slack-compatible gateways) accept.

use std::time::Duration;

use serde::Serialize;

use crate::error::{DeliveryError, TickerError, TickerResult};

use super::dispatcher::Notifier;

#[derive(Debug, Serialize)]
struct WebhookBody<'a> {
    content: &'a str,
}

/// Blocking HTTP notifier. Runs on the delivery worker thread.
#[derive(Debug, Clone)]
pub struct HttpNotifier {
    client: reqwest::blocking::Client,
}

impl HttpNotifier {
    /// Build a notifier whose requests time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an internal error if the HTTP client cannot be constructed.
    pub fn new(timeout: Duration) -> TickerResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TickerError::internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl Notifier for HttpNotifier {
    fn deliver(&self, target_url: &str, message: &str) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(target_url)
            .json(&WebhookBody { content: message })
            .send()
            .map_err(|e| DeliveryError::RequestFailed {
                target: target_url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(DeliveryError::Rejected {
                target: target_url.to_string(),
                status: status.as_u16(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_matches_webhook_format() {
        let json = serde_json::to_string(&WebhookBody { content: "2 new tracks" }).unwrap();
        assert_eq!(json, r#"{"content":"2 new tracks"}"#);
    }

    #[test]
    fn unreachable_endpoint_is_request_failure() {
        let notifier = HttpNotifier::new(Duration::from_millis(200)).unwrap();
        let err = notifier.deliver("http://127.0.0.1:9/hook", "hi").unwrap_err();
        assert!(matches!(err, DeliveryError::RequestFailed { .. }));
    }
}
