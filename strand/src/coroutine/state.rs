use std::fmt;

/// Lifecycle stage of a [`Coroutine`](super::Coroutine).
///
/// A coroutine is created `Uncalled`, becomes `Running` on
/// [`start`](super::Coroutine::start), toggles between `Running` and
/// `Suspended` on every yield/resume pair, and ends `Dead` once its body
/// returns or fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// Constructed (or reset) but not yet started.
    Uncalled,

    /// The body owns control, or will as soon as the driver polls it.
    ///
    /// At most one driver may observe this state at a time.
    Running,

    /// The body is parked at a yield point, waiting for a resume.
    Suspended,

    /// The body has completed, successfully or not. Terminal until reset.
    Dead,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Status::Uncalled => "uncalled",
            Status::Running => "running",
            Status::Suspended => "suspended",
            Status::Dead => "dead",
        })
    }
}
