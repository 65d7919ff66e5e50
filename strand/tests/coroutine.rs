use strand::coroutine::depth;
use strand::{Coroutine, CoroutineError, Status, Step};

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

type Co = Coroutine<u32, u32, u32, u32>;

fn doubler() -> Co {
    Co::new(|first| async move {
        let second = Co::yield_current(first * 2)?.await;
        anyhow::Ok(first + second)
    })
}

#[strand::test]
async fn round_trip_reports_every_status() {
    let co = doubler();
    assert_eq!(co.status(), Status::Uncalled);

    let outward = co.start(5).unwrap();
    assert_eq!(co.status(), Status::Running);

    let step = outward.await.unwrap();
    assert!(!step.is_done());
    assert_eq!(step.yielded(), Some(10));
    assert_eq!(co.status(), Status::Suspended);

    let outward = co.resume(1).unwrap();
    assert_eq!(co.status(), Status::Running);

    let step = outward.await.unwrap();
    assert!(step.is_done());
    assert_eq!(step.complete(), Some(6));
    assert_eq!(co.status(), Status::Dead);
}

#[strand::test]
async fn second_static_yield_in_one_poll_hits_the_same_coroutine() {
    let rejected = Rc::new(Cell::new(false));

    let co = {
        let rejected = rejected.clone();
        Co::new(move |n| {
            let rejected = rejected.clone();
            async move {
                let _first = Co::yield_current(n)?;
                let second = Co::yield_current(n + 1);
                rejected.set(matches!(second, Err(CoroutineError::MultiYield)));
                anyhow::Ok(n)
            }
        })
    };

    assert_eq!(co.start(1).unwrap().await.unwrap(), Step::Yielded(1));
    assert!(rejected.get());
    assert_eq!(co.status(), Status::Dead);
}

#[strand::test]
async fn start_is_legal_exactly_once() {
    let co = doubler();

    let outward = co.start(1).unwrap();
    assert!(matches!(co.start(1), Err(CoroutineError::MultiStart)));
    assert_eq!(outward.await.unwrap(), Step::Yielded(2));

    assert!(matches!(co.start(1), Err(CoroutineError::MultiStart)));
    assert_eq!(co.status(), Status::Suspended);

    co.resume(0).unwrap().await.unwrap();
    assert!(matches!(co.start(1), Err(CoroutineError::DeadStart)));
    assert_eq!(co.status(), Status::Dead);
}

#[strand::test]
async fn resume_errors_match_status() {
    let co = doubler();
    assert!(matches!(co.resume(0), Err(CoroutineError::UncalledResume)));
    assert_eq!(co.status(), Status::Uncalled);

    let outward = co.start(3).unwrap();
    assert!(matches!(co.resume(0), Err(CoroutineError::MultiResume)));
    outward.await.unwrap();

    co.resume(0).unwrap().await.unwrap();
    assert!(matches!(co.resume(0), Err(CoroutineError::DeadResume)));
}

#[strand::test]
async fn yield_errors_match_status() {
    let co = doubler();
    assert!(matches!(co.yield_(1), Err(CoroutineError::UncalledYield)));

    co.start(3).unwrap().await.unwrap();
    assert!(matches!(co.yield_(1), Err(CoroutineError::MultiYield)));
    assert_eq!(co.status(), Status::Suspended);

    co.resume(0).unwrap().await.unwrap();
    assert!(matches!(co.yield_(1), Err(CoroutineError::DeadYield)));
}

#[test]
fn static_yield_without_running_coroutine_fails() {
    assert!(matches!(Co::yield_current(1), Err(CoroutineError::NoRunning)));
    assert!(Co::current().is_none());
    assert_eq!(depth(), 0);
}

#[strand::test]
async fn static_yield_checks_the_signature() {
    let co = Coroutine::<(), (), (), bool>::new(|()| async move {
        let mismatch = Coroutine::<u8, u8, u8, u8>::yield_current(0);
        anyhow::Ok(matches!(mismatch, Err(CoroutineError::SignatureMismatch)))
    });

    assert_eq!(co.start(()).unwrap().await.unwrap(), Step::Complete(true));
}

#[strand::test]
async fn failure_on_start_kills_the_coroutine() {
    let co = Co::new(|_| async move { Err(anyhow::anyhow!("boom")) });

    let result = co.start(0).unwrap().await;
    assert!(matches!(&result, Err(CoroutineError::Body(e)) if e.to_string() == "boom"));
    assert!(!result.unwrap_err().is_protocol());
    assert_eq!(co.status(), Status::Dead);
}

#[strand::test]
async fn failure_after_resume_kills_the_coroutine() {
    let co = Co::new(|first| async move {
        let second = Co::yield_current(first)?.await;
        anyhow::ensure!(second != 0, "division by zero");
        anyhow::Ok(first / second)
    });

    assert_eq!(co.start(8).unwrap().await.unwrap(), Step::Yielded(8));

    let result = co.resume(0).unwrap().await;
    assert!(matches!(result, Err(CoroutineError::Body(_))));
    assert_eq!(co.status(), Status::Dead);
}

#[strand::test]
async fn nested_coroutines_yield_to_their_own_driver() {
    let outer = Co::new(|n| async move {
        let inner = Co::new(|n| async move {
            assert_eq!(depth(), 2);
            let m = Co::yield_current(n + 1)?.await;
            anyhow::Ok(m)
        });

        assert_eq!(depth(), 1);
        let step = inner.start(n).unwrap().await?;
        assert_eq!(step, Step::Yielded(n + 1));
        assert_eq!(depth(), 1);

        let back = Co::yield_current(n + 10)?.await;
        let step = inner.resume(back).unwrap().await?;
        anyhow::Ok(step.complete().unwrap_or_default())
    });

    assert_eq!(outer.start(1).unwrap().await.unwrap(), Step::Yielded(11));
    assert_eq!(depth(), 0);
    assert_eq!(outer.resume(42).unwrap().await.unwrap(), Step::Complete(42));
}

#[strand::test]
async fn current_is_the_executing_coroutine() {
    let seen = Rc::new(Cell::new(0));

    let co = {
        let seen = seen.clone();
        Co::new(move |n| {
            let seen = seen.clone();
            async move {
                let current = Co::current().unwrap();
                assert!(current.is_current());
                seen.set(current.id());
                anyhow::Ok(n)
            }
        })
    };

    co.start(0).unwrap().await.unwrap();
    assert_eq!(seen.get(), co.id());
    assert!(!co.is_current());
}

#[strand::test]
async fn body_may_await_timers_between_yields() {
    let co = Co::new(|n| async move {
        strand::time::sleep(Duration::from_millis(10)).await;
        let m = Co::yield_current(n)?.await;
        strand::time::sleep(Duration::from_millis(10)).await;
        anyhow::Ok(m)
    });

    let start = Instant::now();
    assert_eq!(co.start(1).unwrap().await.unwrap(), Step::Yielded(1));
    assert_eq!(co.resume(2).unwrap().await.unwrap(), Step::Complete(2));
    assert!(start.elapsed() >= Duration::from_millis(20));
}

#[strand::test]
async fn reset_allows_a_fresh_start() {
    let calls = Rc::new(Cell::new(0));

    let co = {
        let calls = calls.clone();
        Co::new(move |n| {
            calls.set(calls.get() + 1);
            async move {
                let m = Co::yield_current(n)?.await;
                anyhow::Ok(m)
            }
        })
    };

    co.start(1).unwrap().await.unwrap();
    co.reset().unwrap();
    assert_eq!(co.status(), Status::Uncalled);
    assert!(matches!(co.resume(0), Err(CoroutineError::UncalledResume)));

    assert_eq!(co.start(2).unwrap().await.unwrap(), Step::Yielded(2));
    assert_eq!(co.resume(3).unwrap().await.unwrap(), Step::Complete(3));
    assert_eq!(calls.get(), 2);

    co.reset().unwrap();
    assert_eq!(co.start(4).unwrap().await.unwrap(), Step::Yielded(4));
    assert_eq!(calls.get(), 3);
}

#[test]
fn reset_while_running_fails() {
    let co = doubler();

    let _outward = co.start(1).unwrap();
    assert!(matches!(co.reset(), Err(CoroutineError::ResetRunning)));
    assert_eq!(co.status(), Status::Running);
}

#[test]
fn clones_share_state() {
    let co = doubler();
    let other = co.clone();

    let _outward = co.start(1).unwrap();
    assert_eq!(other.status(), Status::Running);
    assert_eq!(other.id(), co.id());
}
