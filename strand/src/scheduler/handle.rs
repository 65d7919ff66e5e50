use super::core::{Placement, Shared};
use super::error::SchedulerError;
use super::thread::{Request, Thread, ThreadCoroutine, ThreadId};
use crate::coroutine::CoroutineError;

use std::future::Future;
use std::rc::{Rc, Weak};
use std::time::Duration;

/// Body-facing handle to a [`Scheduler`](super::Scheduler).
///
/// Thread bodies use a handle to suspend themselves, to sleep on the
/// scheduler's clock, and to spawn more threads. `suspend`, `wait` and
/// `run` act on whichever thread is currently executing, so they may be
/// called from helpers nested arbitrarily deep inside a body.
///
/// A handle does not keep its scheduler alive; once the scheduler is
/// dropped every operation fails with [`SchedulerError::Closed`].
pub struct Handle<T, R> {
    shared: Weak<Shared<T, R>>,
}

impl<T: 'static, R: 'static> Handle<T, R> {
    pub(crate) fn new(shared: Weak<Shared<T, R>>) -> Self {
        Self { shared }
    }

    fn upgrade(&self) -> Result<Rc<Shared<T, R>>, SchedulerError> {
        self.shared.upgrade().ok_or(SchedulerError::Closed)
    }

    /// Appends a new thread running `body(args)` to the end of the queue.
    pub fn spawn<F, Fut>(&self, body: F, args: T) -> Result<ThreadId, SchedulerError>
    where
        F: FnMut(T) -> Fut + 'static,
        Fut: Future<Output = anyhow::Result<R>> + 'static,
    {
        Ok(self.upgrade()?.insert(Thread::new(body, args), Placement::Back))
    }

    /// Suspends the current thread until every other runnable thread had
    /// a turn.
    ///
    /// The thread is moved to the back of the queue and resumed with
    /// `args`, which this call returns.
    ///
    /// # Errors
    ///
    /// Fails with [`SchedulerError::Coroutine`] when called outside of a
    /// thread of this scheduler's signature.
    pub async fn suspend(&self, args: T) -> Result<T, SchedulerError> {
        self.upgrade()?;

        let inward = ThreadCoroutine::<T, R>::yield_current(Request::Suspend(args))?;

        Ok(inward.await.args)
    }

    /// Suspends the current thread for at least `duration`.
    ///
    /// The thread is moved to the front of the queue and skipped until the
    /// duration has elapsed on the scheduler's clock. Returns the time that
    /// actually elapsed together with `args`.
    ///
    /// A duration too large for the clock, such as `Duration::MAX`, parks
    /// the thread for a practically unbounded time.
    ///
    /// # Errors
    ///
    /// Fails with [`SchedulerError::Coroutine`] when called outside of a
    /// thread of this scheduler's signature.
    pub async fn wait(&self, duration: Duration, args: T) -> Result<(Duration, T), SchedulerError> {
        self.upgrade()?;

        let inward = ThreadCoroutine::<T, R>::yield_current(Request::Wait(duration, args))?;
        let resumption = inward.await;

        Ok((resumption.elapsed.unwrap_or_default(), resumption.args))
    }

    /// Spawns `body(args)` at the front of the queue and suspends the
    /// current thread, so the new thread runs to its first suspension
    /// point before the caller continues.
    ///
    /// The caller is resumed with `T::default()`, which is discarded.
    ///
    /// # Errors
    ///
    /// Fails with [`SchedulerError::Coroutine`] when called outside of a
    /// thread of this scheduler's signature. Nothing is spawned in that
    /// case.
    pub async fn run<F, Fut>(&self, body: F, args: T) -> Result<ThreadId, SchedulerError>
    where
        T: Default,
        F: FnMut(T) -> Fut + 'static,
        Fut: Future<Output = anyhow::Result<R>> + 'static,
    {
        if ThreadCoroutine::<T, R>::current().is_none() {
            return Err(CoroutineError::NoRunning.into());
        }

        let id = self
            .upgrade()?
            .insert(Thread::new(body, args), Placement::Front);

        self.suspend(T::default()).await?;

        Ok(id)
    }
}

impl<T, R> Clone for Handle<T, R> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}
