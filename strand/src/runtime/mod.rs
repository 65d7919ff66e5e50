//! Core runtime components.
//!
//! This module contains the single-threaded executor used to drive
//! coroutines and schedulers from synchronous code.
//!
//! It is responsible for:
//! - blocking the calling thread on a root future,
//! - managing the timer queue behind [`sleep`](crate::time::sleep),
//! - providing the thread-local runtime context timer futures rely on.

mod core;
mod waker;

pub(crate) mod context;
pub(crate) mod timer;

pub use self::core::Runtime;
