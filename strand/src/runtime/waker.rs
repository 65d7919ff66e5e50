use std::mem;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{RawWaker, RawWakerVTable, Waker};
use std::thread::{self, Thread};

/// Wake-up target of a [`Runtime`](super::Runtime) blocked in `block_on`.
///
/// Waking sets the `notified` flag and unparks the blocked thread, so a
/// wake-up that races with parking is never lost.
pub(crate) struct Notify {
    /// The thread running `block_on`.
    thread: Thread,

    /// Set by wakers, cleared by the runtime before re-polling.
    notified: AtomicBool,
}

impl Notify {
    /// Creates a notifier targeting the current thread.
    pub(crate) fn current() -> Self {
        Self {
            thread: thread::current(),
            notified: AtomicBool::new(false),
        }
    }

    /// Clears the notification flag, returning whether it was set.
    pub(crate) fn take(&self) -> bool {
        self.notified.swap(false, Ordering::AcqRel)
    }

    fn notify(&self) {
        self.notified.store(true, Ordering::Release);
        self.thread.unpark();
    }
}

static VTABLE: RawWakerVTable = RawWakerVTable::new(clone_raw, wake_raw, wake_by_ref_raw, drop_raw);

/// Creates a [`Waker`] that notifies `notify` when woken.
///
/// # Safety
///
/// The pointer stored inside the `RawWaker` originates from
/// `Arc::into_raw` and every vtable function below preserves the
/// reference count of that `Arc`.
pub(crate) fn make_waker(notify: Arc<Notify>) -> Waker {
    unsafe { Waker::from_raw(RawWaker::new(Arc::into_raw(notify) as *const (), &VTABLE)) }
}

/// Clones the raw waker, incrementing the reference count.
fn clone_raw(ptr: *const ()) -> RawWaker {
    let arc = unsafe { Arc::<Notify>::from_raw(ptr as *const Notify) };
    let cloned = arc.clone();
    mem::forget(arc);

    RawWaker::new(Arc::into_raw(cloned) as *const (), &VTABLE)
}

/// Wakes the blocked thread and consumes the waker.
fn wake_raw(ptr: *const ()) {
    let arc = unsafe { Arc::<Notify>::from_raw(ptr as *const Notify) };
    arc.notify();
}

/// Wakes the blocked thread without consuming the waker.
fn wake_by_ref_raw(ptr: *const ()) {
    let arc = unsafe { Arc::<Notify>::from_raw(ptr as *const Notify) };
    arc.notify();
    mem::forget(arc);
}

/// Drops the raw waker, decrementing the reference count.
fn drop_raw(ptr: *const ()) {
    unsafe { drop(Arc::<Notify>::from_raw(ptr as *const Notify)) };
}
