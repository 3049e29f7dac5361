//! End-to-end pipeline scenarios composing combinators the way application code
//! would, rather than unit-testing a single module in isolation.

use stagecraft::combinators::{collect, concurrent, eventual, flat_map, iterate, map, range, then};
use stagecraft::error::{Cons, EmptySet};
use stagecraft::event_loop::EventLoop;
use stagecraft::interrupt::Interrupt;
use stagecraft::promise::promisify;
use stagecraft::Error;
use futures::FutureExt;
use std::time::Duration;

#[tokio::test]
async fn iterate_map_collect() {
    let pipeline = iterate::<_, EmptySet, _>(vec![1, 2, 3]);
    let pipeline = map(pipeline, |x| x + 1);
    let out: Vec<i32> = collect(pipeline).await.unwrap();
    assert_eq!(out, vec![2, 3, 4]);
}

#[tokio::test]
async fn range_map_collect() {
    let pipeline = range::<EmptySet>(0, 5, 1);
    let pipeline = map(pipeline, |x| x * x);
    let out: Vec<i64> = collect(pipeline).await.unwrap();
    assert_eq!(out, vec![0, 1, 4, 9, 16]);
}

#[tokio::test]
async fn flat_map_flattens_in_arrival_order() {
    let pipeline = iterate::<_, EmptySet, _>(vec![1i64, 2]);
    let pipeline = flat_map(pipeline, |x| range::<EmptySet>(0, x, 1));
    let out: Vec<i64> = collect(pipeline).await.unwrap();
    assert_eq!(out, vec![0, 0, 1]);
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct RuntimeError(String);

#[tokio::test]
async fn just_then_raise_rejects_via_promisify() {
    type Errors = Cons<RuntimeError, EmptySet>;
    let start: Result<i32, Error<Errors>> = Ok(42);
    let pipeline = then(async { start }, |_x| async {
        Err::<i32, Error<Errors>>(Error::raised(RuntimeError("e".into())))
    });
    let promise = promisify::<i32, Errors, _>(pipeline);
    let error = promise.await.unwrap_err();
    assert_eq!(error.downcast_ref::<RuntimeError>().unwrap().0, "e");
}

#[test]
fn timer_then_just_waits_for_clock_advance() {
    let mut loop_ = EventLoop::new();
    loop_.clock().pause();
    let clock = loop_.clock();
    let timer = loop_.timer(Duration::from_millis(10));
    let pipeline = then(timer.map(|()| Ok::<&str, Error<EmptySet>>("ok")), |v| async move { Ok(v) });

    std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(5));
        clock.advance(Duration::from_millis(10));
    });

    let out = loop_.run_until(pipeline);
    assert_eq!(out.unwrap(), "ok");
}

#[derive(Debug, thiserror::Error)]
#[error("boom")]
struct FiberError;

#[tokio::test]
async fn concurrent_failure_triggers_sibling_interrupt() {
    type Errors = Cons<FiberError, EmptySet>;
    let upstream = iterate::<_, Errors, _>(vec![0u32, 1]);
    let interrupt = Interrupt::new();
    let sibling_saw_stop = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
    let sibling_saw_stop_check = sibling_saw_stop.clone();

    let fan_out = concurrent(upstream, interrupt, move |fiber_id, fiber_interrupt| {
        let sibling_saw_stop = sibling_saw_stop.clone();
        async move {
            if fiber_id == 1 {
                Err::<(), _>(Error::raised(FiberError))
            } else {
                let (tx, rx) = tokio::sync::oneshot::channel::<()>();
                fiber_interrupt.install(move || {
                    let _ = tx.send(());
                });
                let _ = rx.await;
                sibling_saw_stop.store(true, std::sync::atomic::Ordering::SeqCst);
                Err::<(), _>(Error::stopped())
            }
        }
    });

    futures::pin_mut!(fan_out);
    let mut saw_failure = false;
    while let Some(result) = futures::StreamExt::next(&mut fan_out).await {
        if let Err(e) = result {
            if e.downcast_ref::<FiberError>().is_some() {
                saw_failure = true;
            }
        }
    }
    assert!(saw_failure);
    assert!(sibling_saw_stop_check.load(std::sync::atomic::Ordering::SeqCst));
}

#[tokio::test]
async fn pre_start_interrupt_prevents_start() {
    let interrupt = Interrupt::new();
    interrupt.trigger();
    let started = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
    let started_check = started.clone();

    let pipeline = eventual::<i32, EmptySet, _>(interrupt, move |sink, interrupt| {
        if interrupt.is_triggered() {
            sink.stop();
        } else {
            started.store(true, std::sync::atomic::Ordering::SeqCst);
            sink.start(1);
        }
    });

    let result = pipeline.await;
    assert!(result.unwrap_err().is_stopped());
    assert!(!started_check.load(std::sync::atomic::Ordering::SeqCst));
}
