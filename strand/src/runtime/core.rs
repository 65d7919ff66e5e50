use super::context::enter_context;
use super::timer::TimerQueue;
use super::waker::{Notify, make_waker};

use std::future::Future;
use std::pin::pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::thread;
use std::time::Instant;

/// A single-threaded runtime.
///
/// `Runtime` drives one root future on the calling thread. Coroutines,
/// schedulers and timer futures are all `!Send`: everything they touch
/// lives on the thread that runs [`block_on`](Self::block_on).
///
/// The runtime is responsible for:
/// - polling the root future whenever it is woken,
/// - firing expired timers registered by [`sleep`](crate::time::sleep),
/// - parking the thread while there is nothing to do.
pub struct Runtime {
    /// Timers registered by futures polled on this runtime.
    timers: TimerQueue,
}

impl Runtime {
    /// Creates a new runtime.
    pub fn new() -> Self {
        Self {
            timers: TimerQueue::default(),
        }
    }

    /// Runs a future to completion, blocking the current thread.
    ///
    /// This method is the synchronous entry point of the crate (e.g. in
    /// `main` or tests). The future does not need to be `Send` or
    /// `'static`.
    ///
    /// If the future stays pending with no timer and no outstanding
    /// waker, the thread parks forever.
    ///
    /// # Examples
    ///
    /// ```rust
    /// let runtime = strand::Runtime::new();
    ///
    /// let result = runtime.block_on(async { 42 });
    /// assert_eq!(result, 42);
    /// ```
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        let notify = Arc::new(Notify::current());
        let waker = make_waker(notify.clone());
        let mut cx = Context::from_waker(&waker);

        let mut future = pin!(future);

        enter_context(self.timers.clone(), || {
            loop {
                if let Poll::Ready(output) = future.as_mut().poll(&mut cx) {
                    return output;
                }

                let next = self.timers.fire_expired(Instant::now());

                // A wake-up arrived while polling or firing timers.
                if notify.take() {
                    continue;
                }

                match next {
                    Some(deadline) => {
                        thread::park_timeout(deadline.saturating_duration_since(Instant::now()))
                    }
                    None => thread::park(),
                }

                notify.take();
            }
        })
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}
