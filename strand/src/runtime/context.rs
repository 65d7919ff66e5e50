use super::timer::TimerQueue;

use std::cell::RefCell;

thread_local! {
    /// Thread-local handle to the timer queue of the runtime currently
    /// blocking this thread.
    ///
    /// This is set when entering the runtime context and allows timer
    /// futures to register themselves without explicit parameter passing.
    pub(crate) static CURRENT_TIMERS: RefCell<Option<TimerQueue>> = const { RefCell::new(None) };
}

/// Enters the runtime execution context for the current thread.
///
/// The timer queue is installed for the duration of `f` and the previous
/// context is restored afterwards, so runtimes may nest.
pub(crate) fn enter_context<R>(timers: TimerQueue, f: impl FnOnce() -> R) -> R {
    CURRENT_TIMERS.with(|cell| {
        let previous = cell.replace(Some(timers));

        let out = f();

        cell.replace(previous);

        out
    })
}
