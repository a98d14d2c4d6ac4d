//! Notification text.

use crate::ticker::TickerWindow;

/// Renders a ticker window as the one-line message sent to a webhook.
///
/// ```
/// use std::time::Duration;
/// use paraglider_ticker::{compose, TickerWindow, Timestamp, TrackId};
///
/// let id = TrackId::new();
/// let window = TickerWindow {
///     latest: Timestamp::from_millis(50),
///     start: Timestamp::from_millis(50),
///     stop: Timestamp::from_millis(50),
///     ids: vec![id],
///     processing: Duration::from_micros(1_500),
/// };
/// assert_eq!(
///     compose(&window),
///     format!("latest timestamp: 50, 1 new track is: {id}. (processing: 1.50ms)")
/// );
/// ```
#[must_use]
pub fn compose(window: &TickerWindow) -> String {
    let count = window.ids.len();
    let (noun, verb) = if count == 1 { ("track", "is") } else { ("tracks", "are") };

    let ids = window
        .ids
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "latest timestamp: {}, {count} new {noun} {verb}: {ids}. (processing: {:.2}ms)",
        window.latest,
        window.processing.as_secs_f64() * 1_000.0,
    )
}
