use super::ThreadId;
use crate::coroutine::CoroutineError;

use thiserror::Error;

/// Errors raised by scheduler operations.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// A driven thread failed. The thread is dead and has been dropped.
    #[error("thread {thread} failed: {source}")]
    Thread {
        thread: ThreadId,
        #[source]
        source: CoroutineError,
    },

    /// The scheduler behind a [`Handle`](super::Handle) has been dropped.
    #[error("scheduler has been dropped")]
    Closed,

    /// A body-facing operation was called from an illegal state, e.g.
    /// outside of any scheduler thread.
    #[error(transparent)]
    Coroutine(#[from] CoroutineError),
}
