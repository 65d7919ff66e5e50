use super::context;
use super::error::CoroutineError;
use super::state::Status;
use crate::signal::{Resolver, Signal, oneshot};

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::convert::Infallible;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};

use tracing::{trace, warn};

/// The boxed future produced by one invocation of a coroutine body.
type BodyFuture<R> = Pin<Box<dyn Future<Output = anyhow::Result<R>>>>;

/// The type-erased body callable.
type Body<A, R> = Box<dyn FnMut(A) -> BodyFuture<R>>;

/// Source of process-unique coroutine identifiers.
static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// What a coroutine handed back to its driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step<Y, R> {
    /// The body yielded a value and is now suspended.
    Yielded(Y),

    /// The body returned. The coroutine is dead.
    Complete(R),
}

impl<Y, R> Step<Y, R> {
    /// Returns `true` if the body ran to completion.
    pub fn is_done(&self) -> bool {
        matches!(self, Step::Complete(_))
    }

    /// Returns the yielded value, if any.
    pub fn yielded(self) -> Option<Y> {
        match self {
            Step::Yielded(value) => Some(value),
            Step::Complete(_) => None,
        }
    }

    /// Returns the final result, if any.
    pub fn complete(self) -> Option<R> {
        match self {
            Step::Yielded(_) => None,
            Step::Complete(value) => Some(value),
        }
    }
}

/// State shared by every handle to the same coroutine.
struct Shared<A, I, Y, R> {
    id: u64,

    /// The user-supplied body, invoked once per start.
    body: RefCell<Body<A, R>>,

    /// The in-flight body, present between start and completion.
    ///
    /// Taken out while it is being polled so that the body can call back
    /// into its own coroutine.
    future: RefCell<Option<BodyFuture<R>>>,

    status: Cell<Status>,

    /// Driver-facing handoff: carries the next yield or the completion.
    outward: RefCell<Option<Resolver<Step<Y, R>, CoroutineError>>>,

    /// Body-facing handoff: carries the next resumption input.
    inward: RefCell<Option<Resolver<I, Infallible>>>,

    /// Bumped on reset; handoffs from an older generation are inert.
    generation: Cell<u64>,
}

impl<A: 'static, I: 'static, Y: 'static, R: 'static> Shared<A, I, Y, R> {
    /// Moves to `Running` and installs a fresh outward handoff.
    fn run(&self, op: &'static str) -> Signal<Step<Y, R>, CoroutineError> {
        let from = self.status.replace(Status::Running);
        trace!(coroutine = self.id, %from, to = %Status::Running, op, "coroutine transition");

        let (resolver, signal) = oneshot();
        *self.outward.borrow_mut() = Some(resolver);

        signal
    }

    /// Polls the body once inside its execution context.
    fn drive(this: &Rc<Self>, generation: u64, cx: &mut Context<'_>) {
        if this.generation.get() != generation {
            return;
        }

        let Some(mut future) = this.future.borrow_mut().take() else {
            return;
        };

        let poll = {
            let _entered = context::enter(this.clone());
            future.as_mut().poll(cx)
        };

        // The body reset its own coroutine while it was being polled.
        if this.generation.get() != generation {
            return;
        }

        match poll {
            Poll::Pending => *this.future.borrow_mut() = Some(future),
            Poll::Ready(result) => this.finish(result),
        }
    }

    /// Marks the coroutine dead and settles the pending outward handoff.
    fn finish(&self, result: anyhow::Result<R>) {
        let from = self.status.replace(Status::Dead);
        trace!(coroutine = self.id, %from, to = %Status::Dead, "coroutine transition");

        let outward = self.outward.borrow_mut().take();
        self.inward.borrow_mut().take();

        match (outward, result) {
            (Some(outward), Ok(value)) => {
                outward.resolve(Step::Complete(value));
            }
            (Some(outward), Err(error)) => {
                outward.reject(CoroutineError::Body(error));
            }
            (None, Ok(_)) => {}
            (None, Err(error)) => {
                warn!(coroutine = self.id, %error, "coroutine body failed after its last yield");
            }
        }
    }
}

/// A cooperative, user-level coroutine.
///
/// A `Coroutine` wraps an asynchronous body and lets the body suspend
/// itself at arbitrary points with [`yield_`](Self::yield_) (or the
/// context-free [`yield_current`](Self::yield_current)), handing a value to
/// whoever drives it with [`start`](Self::start) and
/// [`resume`](Self::resume).
///
/// Type parameters:
/// - `A`: arguments passed to the body on start,
/// - `I`: input delivered to the body on every resume,
/// - `Y`: values the body yields,
/// - `R`: the body's final result.
///
/// Handles are cheap to clone; clones refer to the same coroutine and
/// never duplicate its execution state.
///
/// # Examples
///
/// ```rust
/// use strand::{Coroutine, Runtime, Status, Step};
///
/// let rt = Runtime::new();
///
/// rt.block_on(async {
///     let co = Coroutine::<u32, u32, u32, u32>::new(|first| async move {
///         let second = Coroutine::<u32, u32, u32, u32>::yield_current(first * 2)?.await;
///         anyhow::Ok(first + second)
///     });
///
///     assert_eq!(co.start(5)?.await?, Step::Yielded(10));
///     assert_eq!(co.status(), Status::Suspended);
///
///     assert_eq!(co.resume(1)?.await?, Step::Complete(6));
///     assert_eq!(co.status(), Status::Dead);
///     Ok::<_, strand::CoroutineError>(())
/// })
/// .unwrap();
/// ```
pub struct Coroutine<A, I, Y, R> {
    shared: Rc<Shared<A, I, Y, R>>,
}

impl<A: 'static, I: 'static, Y: 'static, R: 'static> Coroutine<A, I, Y, R> {
    /// Creates an uncalled coroutine around `body`.
    ///
    /// The body is not invoked until [`start`](Self::start).
    pub fn new<F, Fut>(mut body: F) -> Self
    where
        F: FnMut(A) -> Fut + 'static,
        Fut: Future<Output = anyhow::Result<R>> + 'static,
    {
        let body: Body<A, R> = Box::new(move |args| -> BodyFuture<R> { Box::pin(body(args)) });

        Self {
            shared: Rc::new(Shared {
                id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
                body: RefCell::new(body),
                future: RefCell::new(None),
                status: Cell::new(Status::Uncalled),
                outward: RefCell::new(None),
                inward: RefCell::new(None),
                generation: Cell::new(0),
            }),
        }
    }

    /// Starts the body with `args`.
    ///
    /// Returns the outward future, which drives the body until it yields
    /// or completes. Nothing runs until that future is polled.
    ///
    /// # Errors
    ///
    /// - [`CoroutineError::DeadStart`] if the coroutine has finished,
    /// - [`CoroutineError::MultiStart`] if it is running or suspended.
    pub fn start(&self, args: A) -> Result<Outward<A, I, Y, R>, CoroutineError> {
        match self.status() {
            Status::Dead => return Err(CoroutineError::DeadStart),
            Status::Running | Status::Suspended => return Err(CoroutineError::MultiStart),
            Status::Uncalled => {}
        }

        let signal = self.shared.run("start");

        let future = {
            let mut body = self.shared.body.borrow_mut();
            body(args)
        };
        *self.shared.future.borrow_mut() = Some(future);

        Ok(self.outward(signal))
    }

    /// Resumes a suspended body, delivering `input` as the result of the
    /// `yield_` it is parked on.
    ///
    /// # Errors
    ///
    /// - [`CoroutineError::DeadResume`] if the coroutine has finished,
    /// - [`CoroutineError::UncalledResume`] if it was never started,
    /// - [`CoroutineError::MultiResume`] if it is already running.
    pub fn resume(&self, input: I) -> Result<Outward<A, I, Y, R>, CoroutineError> {
        match self.status() {
            Status::Dead => return Err(CoroutineError::DeadResume),
            Status::Uncalled => return Err(CoroutineError::UncalledResume),
            Status::Running => return Err(CoroutineError::MultiResume),
            Status::Suspended => {}
        }

        let signal = self.shared.run("resume");

        let inward = self.shared.inward.borrow_mut().take();
        if let Some(inward) = inward {
            inward.resolve(input);
        }

        Ok(self.outward(signal))
    }

    /// Suspends the running body, handing `value` to the driver.
    ///
    /// The body must await the returned future; it completes with the
    /// input of the next [`resume`](Self::resume).
    ///
    /// # Errors
    ///
    /// - [`CoroutineError::DeadYield`] if the coroutine has finished,
    /// - [`CoroutineError::UncalledYield`] if it was never started,
    /// - [`CoroutineError::MultiYield`] if it is already suspended.
    pub fn yield_(&self, value: Y) -> Result<Inward<I>, CoroutineError> {
        match self.status() {
            Status::Dead => return Err(CoroutineError::DeadYield),
            Status::Uncalled => return Err(CoroutineError::UncalledYield),
            Status::Suspended => return Err(CoroutineError::MultiYield),
            Status::Running => {}
        }

        let from = self.shared.status.replace(Status::Suspended);
        trace!(coroutine = self.id(), %from, to = %Status::Suspended, op = "yield", "coroutine transition");

        let (resolver, signal) = oneshot();
        *self.shared.inward.borrow_mut() = Some(resolver);

        let outward = self.shared.outward.borrow_mut().take();
        if let Some(outward) = outward {
            outward.resolve(Step::Yielded(value));
        }

        Ok(Inward { signal })
    }

    /// Yields from whichever coroutine is currently executing.
    ///
    /// This lets helper functions deep inside a body suspend it without
    /// holding its handle.
    ///
    /// The executing coroutine is the one whose body is being polled right
    /// now. A body that has already yielded in the current poll is still
    /// the executing one, so a second `yield_current` before awaiting the
    /// first [`Inward`] fails with [`CoroutineError::MultiYield`] instead
    /// of reaching the coroutine that drives it.
    ///
    /// # Errors
    ///
    /// - [`CoroutineError::NoRunning`] if no coroutine body is executing,
    /// - [`CoroutineError::SignatureMismatch`] if the executing coroutine
    ///   has different type parameters,
    /// - any error of [`yield_`](Self::yield_).
    pub fn yield_current(value: Y) -> Result<Inward<I>, CoroutineError> {
        Self::current_checked()?.yield_(value)
    }

    /// Returns the currently executing coroutine if it has this signature.
    pub fn current() -> Option<Self> {
        Self::current_checked().ok()
    }

    fn current_checked() -> Result<Self, CoroutineError> {
        let top = context::current().ok_or(CoroutineError::NoRunning)?;
        let shared = top
            .downcast::<Shared<A, I, Y, R>>()
            .map_err(|_| CoroutineError::SignatureMismatch)?;

        Ok(Self { shared })
    }

    /// Returns the coroutine to `Uncalled`.
    ///
    /// A suspended body is dropped together with both handoffs, and any
    /// previous completion is forgotten. Outward futures handed out before
    /// the reset never complete.
    ///
    /// # Errors
    ///
    /// Returns [`CoroutineError::ResetRunning`] if the coroutine is running.
    pub fn reset(&self) -> Result<(), CoroutineError> {
        if self.status() == Status::Running {
            return Err(CoroutineError::ResetRunning);
        }

        self.shared.generation.set(self.shared.generation.get() + 1);

        let future = self.shared.future.borrow_mut().take();
        let outward = self.shared.outward.borrow_mut().take();
        let inward = self.shared.inward.borrow_mut().take();

        let from = self.shared.status.replace(Status::Uncalled);
        trace!(coroutine = self.id(), %from, to = %Status::Uncalled, op = "reset", "coroutine transition");

        // Dropped after every borrow is released: destructors of the body's
        // locals may call back into this coroutine.
        drop((future, outward, inward));

        Ok(())
    }

    /// Returns the current lifecycle stage.
    pub fn status(&self) -> Status {
        self.shared.status.get()
    }

    /// Returns a process-unique identifier for this coroutine.
    pub fn id(&self) -> u64 {
        self.shared.id
    }

    /// Returns `true` if this coroutine's body is the one executing.
    pub fn is_current(&self) -> bool {
        let this: Rc<dyn Any> = self.shared.clone();
        context::is_current(&this)
    }

    fn outward(&self, signal: Signal<Step<Y, R>, CoroutineError>) -> Outward<A, I, Y, R> {
        Outward {
            shared: self.shared.clone(),
            signal,
            generation: self.shared.generation.get(),
        }
    }
}

impl<A, I, Y, R> Clone for Coroutine<A, I, Y, R> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<A, I, Y, R> fmt::Debug for Coroutine<A, I, Y, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coroutine")
            .field("id", &self.shared.id)
            .field("status", &self.shared.status.get())
            .finish()
    }
}

/// Future returned by [`Coroutine::start`] and [`Coroutine::resume`].
///
/// Polling it runs the body until the body yields (resolving to
/// [`Step::Yielded`]), returns ([`Step::Complete`]) or fails
/// ([`CoroutineError::Body`]).
pub struct Outward<A, I, Y, R> {
    shared: Rc<Shared<A, I, Y, R>>,
    signal: Signal<Step<Y, R>, CoroutineError>,

    /// Coroutine generation this handoff belongs to.
    generation: u64,
}

impl<A: 'static, I: 'static, Y: 'static, R: 'static> Future for Outward<A, I, Y, R> {
    type Output = Result<Step<Y, R>, CoroutineError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        if !this.signal.is_settled() {
            Shared::drive(&this.shared, this.generation, cx);
        }

        Pin::new(&mut this.signal).poll(cx)
    }
}

/// Future returned by [`Coroutine::yield_`], awaited by the body.
///
/// Completes with the input of the resume that wakes the body up.
pub struct Inward<I> {
    signal: Signal<I, Infallible>,
}

impl<I> Future for Inward<I> {
    type Output = I;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<I> {
        match Pin::new(&mut self.get_mut().signal).poll(cx) {
            Poll::Ready(Ok(input)) => Poll::Ready(input),
            Poll::Ready(Err(never)) => match never {},
            Poll::Pending => Poll::Pending,
        }
    }
}
