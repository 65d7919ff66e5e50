//! Cooperative coroutines.
//!
//! This module defines the coroutine state machine and its
//! continuation-handoff protocol.
//!
//! It includes:
//! - the [`Coroutine`] handle and its start/resume/yield/reset operations,
//! - the [`Outward`] and [`Inward`] futures carrying control across the
//!   driver/body boundary,
//! - the thread-local execution stack that lets a body find and suspend
//!   itself without holding its own handle,
//! - the [`CoroutineError`] taxonomy.

mod core;
mod error;
mod state;

pub(crate) mod context;

pub use self::core::{Coroutine, Inward, Outward, Step};
pub use context::depth;
pub use error::CoroutineError;
pub use state::Status;
