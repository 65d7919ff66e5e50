use crate::coroutine::{Coroutine, Outward};
use crate::utils::Key;

use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};

/// Identifier of a thread owned by a [`Scheduler`](super::Scheduler).
///
/// Identifiers stay unique for the lifetime of the scheduler: the
/// identifier of a finished thread never refers to a later one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ThreadId(pub(crate) Key);

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0.index())
    }
}

/// Scheduling phase of a thread.
///
/// The phase mirrors the last action taken by the thread and decides how
/// the scheduler drives it next. Dead threads have no phase: they are
/// dropped from the scheduler as soon as their body finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Spawned, not yet started.
    New,

    /// Currently being driven by `select`, or stopped mid-step because
    /// the `select` driving it was dropped. Such a thread continues from
    /// where it stopped on the next pass.
    Running,

    /// Asked to be rescheduled after the other runnable threads.
    Suspend,

    /// Asked to be resumed once `until` has passed.
    Wait {
        /// When the thread suspended itself.
        since: Instant,
        /// Earliest instant at which it may be resumed.
        until: Instant,
    },
}

/// What a thread body hands to the scheduler when it suspends.
pub(crate) enum Request<T> {
    Suspend(T),
    Wait(Duration, T),
}

/// What the scheduler hands back to a suspended body.
pub(crate) struct Resumption<T> {
    /// Real time spent waiting, for threads resumed from `Wait`.
    pub(crate) elapsed: Option<Duration>,
    pub(crate) args: T,
}

/// The coroutine signature shared by every scheduler thread.
pub(crate) type ThreadCoroutine<T, R> = Coroutine<T, Resumption<T>, Request<T>, R>;

/// The future driving one step of a thread.
pub(crate) type ThreadOutward<T, R> = Outward<T, Resumption<T>, Request<T>, R>;

/// Phase of a thread together with the arguments of its next drive.
pub(crate) enum State<T, R> {
    New(T),
    Running,
    /// A step whose `select` was dropped before the thread suspended.
    Interrupted(ThreadOutward<T, R>),
    Suspend(T),
    Wait { since: Instant, until: Instant, args: T },
}

impl<T, R> State<T, R> {
    pub(crate) fn phase(&self) -> Phase {
        match self {
            State::New(_) => Phase::New,
            State::Running | State::Interrupted(_) => Phase::Running,
            State::Suspend(_) => Phase::Suspend,
            State::Wait { since, until, .. } => Phase::Wait {
                since: *since,
                until: *until,
            },
        }
    }
}

/// Bookkeeping record pairing a coroutine with its scheduling state.
pub(crate) struct Thread<T, R> {
    pub(crate) coroutine: ThreadCoroutine<T, R>,
    pub(crate) state: State<T, R>,
}

impl<T: 'static, R: 'static> Thread<T, R> {
    /// Creates a thread in the `New` phase that will start `body(args)`.
    pub(crate) fn new<F, Fut>(body: F, args: T) -> Self
    where
        F: FnMut(T) -> Fut + 'static,
        Fut: Future<Output = anyhow::Result<R>> + 'static,
    {
        Self {
            coroutine: Coroutine::new(body),
            state: State::New(args),
        }
    }
}
