use crate::time;

use std::cell::Cell;
use std::future::{Future, ready};
use std::pin::Pin;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// A boxed future returned by [`Clock::sleep_until`].
pub type Delay = Pin<Box<dyn Future<Output = ()>>>;

/// The time source of a [`Scheduler`](super::Scheduler).
///
/// `now` timestamps `wait` requests and decides when waiting threads are
/// due. `sleep_until` is used by [`Scheduler::drive`](super::Scheduler::drive)
/// when every thread is waiting.
pub trait Clock {
    /// Returns the current instant. Must be monotonic.
    fn now(&self) -> Instant;

    /// Returns a future that completes once `now() >= deadline`.
    fn sleep_until(&self, deadline: Instant) -> Delay;
}

/// The monotonic system clock.
///
/// Sleeping registers a timer with the current [`Runtime`](crate::Runtime).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep_until(&self, deadline: Instant) -> Delay {
        Box::pin(time::sleep_until(deadline))
    }
}

/// A virtual clock that only moves when told to.
///
/// Clones share the same time. Sleeping jumps straight to the deadline,
/// so a scheduler driven by a `ManualClock` never blocks.
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
/// use strand::scheduler::{Clock, ManualClock};
///
/// let clock = ManualClock::new();
/// let start = clock.now();
///
/// clock.advance(Duration::from_millis(100));
/// assert_eq!(clock.now() - start, Duration::from_millis(100));
/// ```
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<Instant>>,
}

impl ManualClock {
    /// Creates a clock frozen at the current instant.
    pub fn new() -> Self {
        Self {
            now: Rc::new(Cell::new(Instant::now())),
        }
    }

    /// Moves the clock forward by `duration`.
    pub fn advance(&self, duration: Duration) {
        self.now.set(self.now.get() + duration);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }

    fn sleep_until(&self, deadline: Instant) -> Delay {
        if deadline > self.now.get() {
            self.now.set(deadline);
        }

        Box::pin(ready(()))
    }
}
