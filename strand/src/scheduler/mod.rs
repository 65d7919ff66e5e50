//! A minimal single-threaded scheduler for coroutines.
//!
//! This module drives a pool of coroutine-backed threads to completion,
//! honoring both immediate-reschedule (`suspend`) and timed-delay (`wait`)
//! requests made by their bodies.
//!
//! It includes:
//! - the [`Scheduler`] and its `select`/`drive` loop,
//! - the body-facing [`Handle`],
//! - injectable time sources ([`Clock`], [`SystemClock`], [`ManualClock`]),
//! - the [`SchedulerBuilder`] configuration entry point.

mod builder;
mod clock;
mod core;
mod error;
mod handle;
mod thread;

pub use self::core::{Scheduler, Selection};
pub use builder::SchedulerBuilder;
pub use clock::{Clock, Delay, ManualClock, SystemClock};
pub use error::SchedulerError;
pub use handle::Handle;
pub use thread::{Phase, ThreadId};
