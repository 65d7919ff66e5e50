use strand::time::{sleep, sleep_until};

use std::future::{Future, poll_fn};
use std::pin::pin;
use std::task::{Context, Poll, Waker};
use std::time::{Duration, Instant};

#[strand::test]
async fn sleep_waits_at_least_the_duration() {
    let start = Instant::now();
    sleep(Duration::from_millis(30)).await;

    assert!(start.elapsed() >= Duration::from_millis(30));
}

#[strand::test]
async fn sleep_until_the_past_is_ready() {
    let start = Instant::now();
    sleep_until(start).await;

    assert!(start.elapsed() < Duration::from_millis(30));
}

#[strand::test]
async fn dropped_sleep_does_not_hold_the_runtime() {
    let mut long = Box::pin(sleep(Duration::from_secs(60)));
    let deadline = long.deadline();

    poll_fn(|cx| {
        assert!(long.as_mut().poll(cx).is_pending());
        Poll::Ready(())
    })
    .await;
    drop(long);

    let start = Instant::now();
    sleep(Duration::from_millis(10)).await;

    assert!(start.elapsed() < deadline - start);
}

#[strand::test]
async fn tests_may_return_results() -> anyhow::Result<()> {
    sleep(Duration::from_millis(1)).await;
    Ok(())
}

#[test]
#[should_panic(expected = "Sleep polled outside of runtime")]
fn sleep_outside_runtime_panics() {
    let mut cx = Context::from_waker(Waker::noop());
    let mut sleep = pin!(sleep(Duration::from_secs(1)));

    let _ = sleep.as_mut().poll(&mut cx);
}

#[test]
fn oversized_sleep_saturates_its_deadline() {
    let now = Instant::now();
    let sleep = sleep(Duration::MAX);

    assert!(sleep.deadline() > now + Duration::from_secs(86_400 * 365));
}
