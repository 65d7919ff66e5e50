use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::rc::Rc;
use std::task::Waker;
use std::time::Instant;

use tracing::trace;

/// An entry in the runtime timer queue.
///
/// `TimerEntry` represents a scheduled wake-up at a specific deadline.
/// The entry may be cancelled before it fires.
pub(crate) struct TimerEntry {
    /// The time at which the timer should fire.
    pub(crate) deadline: Instant,

    /// Waker to notify when the deadline is reached.
    pub(crate) waker: Waker,

    /// Cancellation flag shared with the associated sleep future.
    pub(crate) cancelled: Rc<Cell<bool>>,
}

impl Eq for TimerEntry {}

impl PartialEq for TimerEntry {
    fn eq(&self, other: &Self) -> bool {
        self.deadline.eq(&other.deadline)
    }
}

impl Ord for TimerEntry {
    /// Reversed so that `BinaryHeap<TimerEntry>` pops the earliest
    /// deadline first.
    fn cmp(&self, other: &Self) -> Ordering {
        other.deadline.cmp(&self.deadline)
    }
}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Min-heap of pending timers, shared between a runtime and the sleep
/// futures polled on it.
#[derive(Clone, Default)]
pub(crate) struct TimerQueue {
    heap: Rc<RefCell<BinaryHeap<TimerEntry>>>,
}

impl TimerQueue {
    /// Schedules a wake-up.
    pub(crate) fn push(&self, entry: TimerEntry) {
        self.heap.borrow_mut().push(entry);
    }

    /// Wakes every timer whose deadline is at or before `now`.
    ///
    /// Returns the earliest deadline still pending, if any.
    pub(crate) fn fire_expired(&self, now: Instant) -> Option<Instant> {
        let mut due = Vec::new();

        let next = {
            let mut heap = self.heap.borrow_mut();

            while let Some(entry) = heap.peek() {
                if entry.cancelled.get() {
                    heap.pop();
                    continue;
                }

                if entry.deadline > now {
                    break;
                }

                due.extend(heap.pop());
            }

            heap.peek().map(|entry| entry.deadline)
        };

        for entry in due {
            trace!(deadline = ?entry.deadline, "timer fired");
            entry.waker.wake();
        }

        next
    }
}
