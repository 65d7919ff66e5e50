use crate::runtime::context::CURRENT_TIMERS;
use crate::runtime::timer::TimerEntry;

use std::cell::Cell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};
use std::time::{Duration, Instant};

/// Creates a future that completes after the given duration.
///
/// Durations too large to represent as an `Instant` sleep for a
/// practically unbounded time instead of overflowing.
///
/// # Panics
///
/// Panics if polled outside of a [`Runtime`](crate::Runtime).
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
///
/// strand::Runtime::new().block_on(async {
///     strand::time::sleep(Duration::from_millis(10)).await;
/// });
/// ```
pub fn sleep(duration: Duration) -> Sleep {
    sleep_until(super::deadline(Instant::now(), duration))
}

/// Creates a future that completes once `deadline` is reached.
///
/// # Panics
///
/// Panics if polled outside of a [`Runtime`](crate::Runtime).
pub fn sleep_until(deadline: Instant) -> Sleep {
    Sleep {
        deadline,
        registered: None,
        cancelled: Rc::new(Cell::new(false)),
    }
}

/// A future that completes once a specific deadline is reached.
///
/// `Sleep` registers a timer with the current runtime on first poll.
/// Dropping it before completion cancels the timer.
pub struct Sleep {
    /// Absolute point in time when the sleep completes.
    deadline: Instant,

    /// Waker the current timer registration will wake.
    registered: Option<Waker>,

    /// Cancellation flag of the current registration.
    cancelled: Rc<Cell<bool>>,
}

impl Sleep {
    /// Returns the instant at which this sleep completes.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }
}

impl Future for Sleep {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        if Instant::now() >= this.deadline {
            return Poll::Ready(());
        }

        let stale = this
            .registered
            .as_ref()
            .is_none_or(|waker| !waker.will_wake(cx.waker()));

        if stale {
            // Retire the registration made for a different task.
            this.cancelled.set(true);
            this.cancelled = Rc::new(Cell::new(false));
            this.registered = Some(cx.waker().clone());

            CURRENT_TIMERS.with(|cell| {
                let binding = cell.borrow();
                let timers = binding.as_ref().expect("Sleep polled outside of runtime");

                timers.push(TimerEntry {
                    deadline: this.deadline,
                    waker: cx.waker().clone(),
                    cancelled: this.cancelled.clone(),
                });
            });
        }

        Poll::Pending
    }
}

impl Drop for Sleep {
    /// Cancels the timer if the sleep is dropped before completion.
    fn drop(&mut self) {
        self.cancelled.set(true);
    }
}
