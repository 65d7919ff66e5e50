use thiserror::Error;

/// Errors raised by coroutine operations.
///
/// Protocol violations (every variant except [`Body`](Self::Body)) are
/// returned synchronously by the offending call and leave the coroutine
/// untouched. Body failures arrive through the pending
/// [`Outward`](super::Outward) future, after which the coroutine is dead.
#[derive(Debug, Error)]
pub enum CoroutineError {
    #[error("cannot start a dead coroutine")]
    DeadStart,

    #[error("cannot start a coroutine that is already running or suspended")]
    MultiStart,

    #[error("cannot resume a dead coroutine")]
    DeadResume,

    #[error("cannot resume a coroutine that has not been started")]
    UncalledResume,

    #[error("cannot resume a coroutine that is already running")]
    MultiResume,

    #[error("cannot yield from a dead coroutine")]
    DeadYield,

    #[error("cannot yield from a coroutine that has not been started")]
    UncalledYield,

    #[error("cannot yield from a coroutine that is already suspended")]
    MultiYield,

    #[error("no coroutine is currently running")]
    NoRunning,

    #[error("the running coroutine does not have the requested signature")]
    SignatureMismatch,

    #[error("cannot reset a running coroutine")]
    ResetRunning,

    #[error(transparent)]
    Body(anyhow::Error),
}

impl CoroutineError {
    /// Returns `true` for errors caused by calling an operation from an
    /// illegal state, as opposed to a failure of the body itself.
    pub fn is_protocol(&self) -> bool {
        !matches!(self, CoroutineError::Body(_))
    }
}
