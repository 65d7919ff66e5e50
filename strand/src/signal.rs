//! Single-resolution handoff cells.
//!
//! A one-shot signal connects exactly one producer ([`Resolver`]) with
//! exactly one consumer ([`Signal`]). The first call to
//! [`Resolver::resolve`] or [`Resolver::reject`] fixes the outcome forever;
//! later calls are ignored. Signals are never re-armed: every handoff
//! allocates a fresh pair.
//!
//! # Examples
//!
//! ```rust
//! use strand::signal::oneshot;
//!
//! let rt = strand::Runtime::new();
//! let (resolver, signal) = oneshot::<u32, ()>();
//!
//! assert!(resolver.resolve(7));
//! assert!(!resolver.reject(()));
//! assert_eq!(rt.block_on(signal), Ok(7));
//! ```

use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

/// Creates a connected resolver/signal pair.
pub fn oneshot<T, E>() -> (Resolver<T, E>, Signal<T, E>) {
    let cell = Rc::new(RefCell::new(Cell {
        state: State::Pending,
        waker: None,
    }));

    (Resolver { cell: cell.clone() }, Signal { cell })
}

/// Lifecycle of the shared cell.
enum State<T, E> {
    /// Nobody has settled the signal yet.
    Pending,

    /// Settled, waiting for the consumer to take the outcome.
    Settled(Result<T, E>),

    /// The consumer has taken the outcome.
    Consumed,
}

/// Shared storage between the two halves.
struct Cell<T, E> {
    state: State<T, E>,

    /// Waker of the consumer's last poll.
    waker: Option<Waker>,
}

/// The producing half of a one-shot signal.
pub struct Resolver<T, E> {
    cell: Rc<RefCell<Cell<T, E>>>,
}

impl<T, E> Resolver<T, E> {
    /// Settles the signal with a value.
    ///
    /// Returns `true` if this call settled the signal, `false` if it had
    /// already been settled.
    pub fn resolve(&self, value: T) -> bool {
        self.settle(Ok(value))
    }

    /// Settles the signal with an error.
    ///
    /// Returns `true` if this call settled the signal, `false` if it had
    /// already been settled.
    pub fn reject(&self, error: E) -> bool {
        self.settle(Err(error))
    }

    /// Returns `true` once the signal has been resolved or rejected.
    pub fn is_settled(&self) -> bool {
        !matches!(self.cell.borrow().state, State::Pending)
    }

    fn settle(&self, outcome: Result<T, E>) -> bool {
        let waker = {
            let mut cell = self.cell.borrow_mut();

            if !matches!(cell.state, State::Pending) {
                return false;
            }

            cell.state = State::Settled(outcome);
            cell.waker.take()
        };

        // Woken outside the borrow: the consumer may be polled re-entrantly.
        if let Some(waker) = waker {
            waker.wake();
        }

        true
    }
}

impl<T, E> fmt::Debug for Resolver<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("settled", &self.is_settled())
            .finish()
    }
}

/// The consuming half of a one-shot signal.
///
/// `Signal` is a future that completes with the outcome passed to the
/// matching [`Resolver`]. If the resolver is dropped without settling,
/// the signal stays pending forever.
pub struct Signal<T, E> {
    cell: Rc<RefCell<Cell<T, E>>>,
}

impl<T, E> Signal<T, E> {
    /// Returns `true` if an outcome is available or has been consumed.
    pub fn is_settled(&self) -> bool {
        !matches!(self.cell.borrow().state, State::Pending)
    }
}

impl<T, E> Future for Signal<T, E> {
    type Output = Result<T, E>;

    /// Polls the signal.
    ///
    /// # Panics
    ///
    /// Panics if polled again after returning `Poll::Ready`.
    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut cell = self.cell.borrow_mut();

        match std::mem::replace(&mut cell.state, State::Consumed) {
            State::Settled(outcome) => Poll::Ready(outcome),
            State::Pending => {
                cell.state = State::Pending;
                cell.waker = Some(cx.waker().clone());
                Poll::Pending
            }
            State::Consumed => panic!("signal polled after completion"),
        }
    }
}

impl<T, E> fmt::Debug for Signal<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("settled", &self.is_settled())
            .finish()
    }
}
