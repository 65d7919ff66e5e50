use super::builder::SchedulerBuilder;
use super::clock::Clock;
use super::error::SchedulerError;
use super::handle::Handle;
use super::thread::{Phase, Request, Resumption, State, Thread, ThreadId, ThreadOutward};
use crate::coroutine::{CoroutineError, Status, Step};
use crate::time;
use crate::utils::Slab;

use std::cell::RefCell;
use std::collections::VecDeque;
use std::future::Future;
use std::mem;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, ready};
use std::time::Instant;

use tracing::{debug, warn};

/// Outcome of one [`Scheduler::select`] pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection<R> {
    /// A thread was driven to its next suspension point.
    Advanced,

    /// A thread was driven and its body returned `value`.
    Finished { thread: ThreadId, value: R },

    /// Every remaining thread is waiting; the earliest is due at `until`.
    Idle { until: Instant },

    /// No threads are left.
    Exhausted,
}

/// Where a new thread enters the run queue.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Placement {
    Front,
    Back,
}

/// How a picked thread is handed control.
enum Drive<T, R> {
    Start(T),
    Resume(Resumption<T>),
    Continue(ThreadOutward<T, R>),
}

/// Result of scanning the run queue.
enum Pick<T, R> {
    Drive(ThreadId, ThreadOutward<T, R>),
    Idle(Instant),
    Empty,
}

/// State shared by the scheduler and its handles.
pub(crate) struct Shared<T, R> {
    /// Every live thread, keyed by its identifier.
    threads: RefCell<Slab<Thread<T, R>>>,

    /// Run order. Threads currently being driven are not in the queue.
    queue: RefCell<VecDeque<ThreadId>>,

    clock: Box<dyn Clock>,
}

impl<T: 'static, R: 'static> Shared<T, R> {
    /// Adds a thread to the table and the run queue.
    pub(crate) fn insert(&self, thread: Thread<T, R>, placement: Placement) -> ThreadId {
        let id = ThreadId(self.threads.borrow_mut().insert(thread));

        let mut queue = self.queue.borrow_mut();
        match placement {
            Placement::Front => queue.push_front(id),
            Placement::Back => queue.push_back(id),
        }

        debug!(thread = %id, ?placement, queued = queue.len(), "thread spawned");
        id
    }

    /// Removes a thread from the table and the run queue.
    ///
    /// The record is returned so that the caller drops it once every borrow
    /// is released: dropping a body may run arbitrary destructors.
    fn remove(&self, id: ThreadId) -> Option<Thread<T, R>> {
        self.queue.borrow_mut().retain(|queued| *queued != id);
        self.threads.borrow_mut().remove(id.0)
    }

    /// Puts a thread whose step was cut short back at the front of the
    /// queue, keeping the step's future so the body continues where it
    /// stopped.
    fn interrupt(&self, id: ThreadId, outward: ThreadOutward<T, R>) {
        let mut threads = self.threads.borrow_mut();

        // Abandoned while it was being driven.
        let Some(thread) = threads.get_mut(id.0) else {
            return;
        };

        thread.state = State::Interrupted(outward);
        self.queue.borrow_mut().push_front(id);

        debug!(thread = %id, "thread interrupted");
    }
}

/// One in-flight step of a picked thread.
///
/// Dropping it before the step completes hands the thread back to the
/// scheduler instead of losing it.
struct InFlight<'a, T: 'static, R: 'static> {
    shared: &'a Shared<T, R>,
    id: ThreadId,
    outward: Option<ThreadOutward<T, R>>,
}

impl<T: 'static, R: 'static> Future for InFlight<'_, T, R> {
    type Output = Result<Step<Request<T>, R>, CoroutineError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        let Some(outward) = this.outward.as_mut() else {
            panic!("thread step polled after completion");
        };

        let step = ready!(Pin::new(outward).poll(cx));
        this.outward = None;

        Poll::Ready(step)
    }
}

impl<T: 'static, R: 'static> Drop for InFlight<'_, T, R> {
    fn drop(&mut self) {
        let Some(outward) = self.outward.take() else {
            return;
        };

        // The body panicked while being polled; its step can never finish.
        if std::thread::panicking() {
            drop(self.shared.remove(self.id));
            return;
        }

        self.shared.interrupt(self.id, outward);
    }
}

/// A single-threaded cooperative scheduler.
///
/// `Scheduler` owns an ordered queue of threads, each wrapping a
/// [`Coroutine`](crate::Coroutine). Every call to [`select`](Self::select)
/// advances at most one thread by one suspension step:
///
/// - `New` threads are started, `Suspend` threads are resumed with the
///   payload they suspended with,
/// - `Wait` threads are resumed once their deadline has passed, receiving
///   the real time they spent waiting,
/// - threads that suspend go to the back of the queue, threads that wait
///   go to the front.
///
/// Thread bodies talk to the scheduler through a [`Handle`].
///
/// `T` is the payload type passed around by `spawn`, `suspend` and `wait`;
/// `R` is the result type of thread bodies.
///
/// # Examples
///
/// ```rust
/// use strand::scheduler::Scheduler;
///
/// let scheduler = Scheduler::<u32, u32>::new();
/// let handle = scheduler.handle();
///
/// scheduler.spawn(
///     move |n| {
///         let handle = handle.clone();
///         async move {
///             let n = handle.suspend(n + 1).await?;
///             anyhow::Ok(n * 10)
///         }
///     },
///     1,
/// );
///
/// let results = strand::Runtime::new().block_on(scheduler.drive()).unwrap();
/// assert_eq!(results, vec![20]);
/// ```
pub struct Scheduler<T, R> {
    shared: Rc<Shared<T, R>>,
}

impl<T: 'static, R: 'static> Scheduler<T, R> {
    /// Creates a scheduler with the default configuration.
    pub fn new() -> Self {
        SchedulerBuilder::new().build()
    }

    /// Returns a builder to configure a scheduler.
    pub fn builder() -> SchedulerBuilder {
        SchedulerBuilder::new()
    }

    pub(crate) fn from_parts(clock: Box<dyn Clock>, capacity: usize) -> Self {
        Self {
            shared: Rc::new(Shared {
                threads: RefCell::new(Slab::with_capacity(capacity)),
                queue: RefCell::new(VecDeque::with_capacity(capacity)),
                clock,
            }),
        }
    }

    /// Appends a new thread running `body(args)` to the end of the queue.
    ///
    /// The body does not run until a later [`select`](Self::select)
    /// reaches it.
    pub fn spawn<F, Fut>(&self, body: F, args: T) -> ThreadId
    where
        F: FnMut(T) -> Fut + 'static,
        Fut: Future<Output = anyhow::Result<R>> + 'static,
    {
        self.shared.insert(Thread::new(body, args), Placement::Back)
    }

    /// Returns a handle for thread bodies to suspend, wait and spawn.
    ///
    /// Handles do not keep the scheduler alive.
    pub fn handle(&self) -> Handle<T, R> {
        Handle::new(Rc::downgrade(&self.shared))
    }

    /// Returns the number of live threads.
    pub fn len(&self) -> usize {
        self.shared.threads.borrow().len()
    }

    /// Returns `true` if no threads are left.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the phase of a thread, or `None` once it is dead.
    pub fn phase(&self, id: ThreadId) -> Option<Phase> {
        self.shared
            .threads
            .borrow()
            .get(id.0)
            .map(|thread| thread.state.phase())
    }

    /// Drops a thread without running it any further.
    ///
    /// Returns `false` if the thread was already gone.
    pub fn abandon(&self, id: ThreadId) -> bool {
        let removed = self.shared.remove(id);

        if removed.is_some() {
            debug!(thread = %id, "thread abandoned");
        }

        removed.is_some()
    }

    /// Performs one scheduling pass.
    ///
    /// The queue is scanned in order and the first runnable thread is
    /// driven until it suspends, waits or finishes. Waiting threads whose
    /// deadline has not passed are skipped.
    ///
    /// The returned future may be dropped before it completes. A thread
    /// interrupted that way is put back at the front of the queue and the
    /// next pass continues its body where it stopped.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Thread`] if the driven thread's body
    /// fails. The thread is dropped; the scheduler itself stays usable.
    pub async fn select(&self) -> Result<Selection<R>, SchedulerError> {
        let now = self.shared.clock.now();

        let (id, outward) = match self.pick(now)? {
            Pick::Drive(id, outward) => (id, outward),
            Pick::Idle(until) => return Ok(Selection::Idle { until }),
            Pick::Empty => return Ok(Selection::Exhausted),
        };

        let step = InFlight {
            shared: &self.shared,
            id,
            outward: Some(outward),
        }
        .await;

        self.settle(id, step)
    }

    /// Runs every thread to completion.
    ///
    /// Repeatedly calls [`select`](Self::select), sleeping on the
    /// scheduler's clock whenever every thread is waiting. Returns the
    /// results of the thread bodies in completion order.
    ///
    /// # Errors
    ///
    /// Stops at the first failing thread. The remaining threads are left
    /// in place and can be driven by calling `drive` again.
    pub async fn drive(&self) -> Result<Vec<R>, SchedulerError> {
        let mut finished = Vec::new();

        loop {
            match self.select().await? {
                Selection::Advanced => {}
                Selection::Finished { value, .. } => finished.push(value),
                Selection::Idle { until } => {
                    debug!(?until, "all threads waiting");
                    self.shared.clock.sleep_until(until).await;
                }
                Selection::Exhausted => return Ok(finished),
            }
        }
    }

    /// Finds the next runnable thread and hands control to it.
    fn pick(&self, now: Instant) -> Result<Pick<T, R>, SchedulerError> {
        let (id, coroutine, drive) = {
            let mut queue = self.shared.queue.borrow_mut();
            let mut threads = self.shared.threads.borrow_mut();

            let mut shortest: Option<Instant> = None;
            let mut found = None;

            for position in 0..queue.len() {
                let id = queue[position];

                let Some(thread) = threads.get_mut(id.0) else {
                    continue;
                };

                let drive = match mem::replace(&mut thread.state, State::Running) {
                    State::Running => continue,
                    State::Wait { since, until, args } if now < until => {
                        thread.state = State::Wait { since, until, args };
                        shortest = Some(shortest.map_or(until, |s| s.min(until)));
                        continue;
                    }
                    State::Interrupted(outward) => Drive::Continue(outward),
                    State::New(args) => Drive::Start(args),
                    State::Suspend(args) => Drive::Resume(Resumption {
                        elapsed: None,
                        args,
                    }),
                    State::Wait { since, args, .. } => Drive::Resume(Resumption {
                        elapsed: Some(now.saturating_duration_since(since)),
                        args,
                    }),
                };

                found = Some((position, id, thread.coroutine.clone(), drive));
                break;
            }

            let Some((position, id, coroutine, drive)) = found else {
                return Ok(match shortest {
                    Some(until) => Pick::Idle(until),
                    None => Pick::Empty,
                });
            };

            queue.remove(position);
            debug!(thread = %id, position, "driving thread");

            (id, coroutine, drive)
        };

        // Borrows are released: starting a thread runs its body callable,
        // which may spawn more threads.
        let outward = match drive {
            Drive::Start(args) => coroutine.start(args),
            Drive::Resume(resumption) => coroutine.resume(resumption),
            Drive::Continue(outward) => Ok(outward),
        };

        match outward {
            Ok(outward) => Ok(Pick::Drive(id, outward)),
            Err(source) => {
                drop(self.shared.remove(id));

                Err(self.failed(id, source))
            }
        }
    }

    /// Reclassifies a thread after it was driven one step.
    fn settle(
        &self,
        id: ThreadId,
        step: Result<Step<Request<T>, R>, CoroutineError>,
    ) -> Result<Selection<R>, SchedulerError> {
        let request = match step {
            Ok(Step::Yielded(request)) => request,
            Ok(Step::Complete(value)) => {
                drop(self.shared.remove(id));
                debug!(thread = %id, "thread finished");

                return Ok(Selection::Finished { thread: id, value });
            }
            Err(source) => {
                drop(self.shared.remove(id));

                return Err(self.failed(id, source));
            }
        };

        let mut threads = self.shared.threads.borrow_mut();

        // Abandoned while it was being driven.
        let Some(thread) = threads.get_mut(id.0) else {
            return Ok(Selection::Advanced);
        };

        // The body yielded, then returned without waiting to be resumed.
        if thread.coroutine.status() == Status::Dead {
            drop(threads);
            drop(self.shared.remove(id));

            debug!(thread = %id, "thread finished after yielding");
            return Ok(Selection::Advanced);
        }

        match request {
            Request::Suspend(args) => {
                thread.state = State::Suspend(args);
                self.shared.queue.borrow_mut().push_back(id);

                debug!(thread = %id, "thread suspended");
            }
            Request::Wait(duration, args) => {
                let since = self.shared.clock.now();
                let until = time::deadline(since, duration);

                thread.state = State::Wait { since, until, args };
                self.shared.queue.borrow_mut().push_front(id);

                debug!(thread = %id, ?duration, "thread waiting");
            }
        }

        Ok(Selection::Advanced)
    }

    fn failed(&self, id: ThreadId, source: CoroutineError) -> SchedulerError {
        warn!(thread = %id, error = %source, "thread failed");
        SchedulerError::Thread { thread: id, source }
    }
}

impl<T: 'static, R: 'static> Default for Scheduler<T, R> {
    fn default() -> Self {
        Self::new()
    }
}

