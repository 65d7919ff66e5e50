//! Utilities for memory-efficient data structures.
//!
//! This module provides low-level utilities used internally by the crate.
//! In particular, it exposes a [`Slab`] used as the scheduler's thread
//! table: fast indexed storage with reuse of freed slots.

mod slab;

pub(crate) use slab::{Key, Slab};
