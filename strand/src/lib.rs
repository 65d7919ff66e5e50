//! # Strand
//!
//! **Strand** provides cooperative, user-level coroutines and a minimal
//! single-threaded scheduler that drives a pool of them to completion.
//!
//! A [`Coroutine`] wraps an ordinary async body. The body suspends itself
//! at points of its own choosing by yielding a value; whoever drives the
//! coroutine receives that value and later resumes the body with an input.
//! Every handoff goes through a pair of one-shot signals, so the body never
//! needs a generator language feature.
//!
//! On top of that, the [`Scheduler`] runs many coroutine-backed threads
//! round-robin, honoring two kinds of requests made from inside a body:
//!
//! - **suspend**: reschedule after the other runnable threads,
//! - **wait**: sleep for a duration on the scheduler's clock.
//!
//! Everything runs on one OS thread. The crate ships its own small
//! [`Runtime`] to block on the scheduler, along with timer futures in
//! [`time`] and the `#[strand::main]` / `#[strand::test]` attributes.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use strand::Scheduler;
//!
//! #[strand::main]
//! async fn main() -> anyhow::Result<()> {
//!     let scheduler = Scheduler::<u64, u64>::new();
//!     let handle = scheduler.handle();
//!
//!     scheduler.spawn(
//!         move |ms| {
//!             let handle = handle.clone();
//!             async move {
//!                 let (elapsed, ms) = handle.wait(Duration::from_millis(ms), ms).await?;
//!                 println!("woke up after {elapsed:?}");
//!                 anyhow::Ok(ms)
//!             }
//!         },
//!         100,
//!     );
//!
//!     let results = scheduler.drive().await?;
//!     assert_eq!(results, vec![100]);
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`coroutine`]: the coroutine state machine and its errors
//! - [`scheduler`]: the round-robin scheduler, its handle and clocks
//! - [`signal`]: one-shot handoff cells
//! - [`time`]: sleep futures

mod runtime;
mod utils;

pub mod coroutine;
pub mod scheduler;
pub mod signal;
pub mod time;

pub use coroutine::{Coroutine, CoroutineError, Status, Step};
pub use runtime::Runtime;
pub use scheduler::Scheduler;

pub use strand_macros::*;
