//! Time utilities.
//!
//! This module provides timer futures that integrate with the
//! [`Runtime`](crate::Runtime) timer queue. The scheduler's default clock
//! uses them to wait for the earliest outstanding `wait` deadline.

mod sleep;

use std::time::{Duration, Instant};

#[doc(inline)]
pub use sleep::{Sleep, sleep, sleep_until};

/// Roughly thirty years. Stands in for deadlines `Instant` cannot hold.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Returns `start + duration`, saturating to a far-future instant when the
/// sum overflows.
pub(crate) fn deadline(start: Instant, duration: Duration) -> Instant {
    start
        .checked_add(duration)
        .or_else(|| start.checked_add(FAR_FUTURE))
        .unwrap_or(start)
}
