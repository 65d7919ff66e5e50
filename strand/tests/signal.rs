use strand::signal::oneshot;

use std::future::Future;
use std::pin::pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::task::{Context, Poll, Wake, Waker};

struct CountingWaker(AtomicUsize);

impl Wake for CountingWaker {
    fn wake(self: Arc<Self>) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn first_settlement_wins() {
    let (resolver, signal) = oneshot::<&str, &str>();

    assert!(!resolver.is_settled());
    assert!(resolver.reject("first"));
    assert!(!resolver.resolve("second"));
    assert!(!resolver.reject("third"));
    assert!(signal.is_settled());

    let result = strand::Runtime::new().block_on(signal);
    assert_eq!(result, Err("first"));
}

#[test]
fn settling_wakes_the_waiting_consumer() {
    let counter = Arc::new(CountingWaker(AtomicUsize::new(0)));
    let waker = Waker::from(counter.clone());
    let mut cx = Context::from_waker(&waker);

    let (resolver, signal) = oneshot::<u32, ()>();
    let mut signal = pin!(signal);

    assert!(signal.as_mut().poll(&mut cx).is_pending());
    assert_eq!(counter.0.load(Ordering::SeqCst), 0);

    resolver.resolve(3);
    assert_eq!(counter.0.load(Ordering::SeqCst), 1);
    assert_eq!(signal.as_mut().poll(&mut cx), Poll::Ready(Ok(3)));
}

#[test]
fn dropped_resolver_leaves_the_signal_pending() {
    let mut cx = Context::from_waker(Waker::noop());

    let (resolver, signal) = oneshot::<u32, ()>();
    let mut signal = pin!(signal);

    drop(resolver);
    assert!(signal.as_mut().poll(&mut cx).is_pending());
    assert!(!signal.is_settled());
}

#[test]
#[should_panic(expected = "signal polled after completion")]
fn polling_after_completion_panics() {
    let mut cx = Context::from_waker(Waker::noop());

    let (resolver, signal) = oneshot::<u32, ()>();
    let mut signal = pin!(signal);

    resolver.resolve(1);
    let _ = signal.as_mut().poll(&mut cx);
    let _ = signal.as_mut().poll(&mut cx);
}
