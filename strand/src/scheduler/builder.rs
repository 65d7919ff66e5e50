use super::Scheduler;
use super::clock::{Clock, SystemClock};

/// Builder for configuring and creating a scheduler.
///
/// `SchedulerBuilder` allows customizing scheduler parameters before
/// constructing it: the time source and the initial size of the thread
/// table.
///
/// # Examples
///
/// ```rust
/// use strand::scheduler::{ManualClock, Scheduler, SchedulerBuilder};
///
/// let scheduler: Scheduler<(), ()> = SchedulerBuilder::new()
///     .clock(ManualClock::new())
///     .capacity(64)
///     .build();
///
/// assert!(scheduler.is_empty());
/// ```
pub struct SchedulerBuilder {
    /// Time source for `wait` bookkeeping and idle sleeping.
    clock: Box<dyn Clock>,

    /// Number of threads the table holds before growing.
    capacity: usize,
}

impl SchedulerBuilder {
    /// Creates a new `SchedulerBuilder` with default configuration.
    ///
    /// By default the scheduler uses the [`SystemClock`] and room for
    /// 16 threads.
    pub fn new() -> Self {
        Self {
            clock: Box::new(SystemClock),
            capacity: 16,
        }
    }

    /// Sets the time source.
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Sets the number of threads the scheduler holds before growing.
    pub fn capacity(mut self, n: usize) -> Self {
        self.capacity = n;
        self
    }

    /// Builds the scheduler with the configured options.
    pub fn build<T: 'static, R: 'static>(self) -> Scheduler<T, R> {
        Scheduler::from_parts(self.clock, self.capacity)
    }
}

impl Default for SchedulerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
