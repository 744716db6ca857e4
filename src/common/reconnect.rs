//! Exponential backoff for relay reconnection.

use std::time::Duration;

use backon::BackoffBuilder;

/// Initial delay before reconnecting a relay.
const MIN_DELAY: Duration = Duration::from_secs(5);
/// Upper bound for the delay between reconnection attempts.
const MAX_DELAY: Duration = Duration::from_secs(5 * 60);

/// Create an exponential backoff iterator for relay reconnection.
/// 5s initial, 5min max, factor 2, with jitter, unlimited retries.
pub fn relay_backoff() -> impl Iterator<Item = Duration> {
    backon::ExponentialBuilder::default()
        .with_min_delay(MIN_DELAY)
        .with_max_delay(MAX_DELAY)
        .with_factor(2.0)
        .with_jitter()
        .without_max_times()
        .build()
}

/// Fallback delay when the backoff iterator is exhausted.
pub fn max_delay() -> Duration {
    MAX_DELAY
}
