//! Integration tests for dual-async on native platforms.
//!
//! These tests exercise the helpers together, the way a dual-mode wrapper
//! uses them: validate once, then bridge or offload per call.

use dual_async::bridge::await_blocking;
use dual_async::error::{AwaitError, ValidationError};
use dual_async::executor::{asyncify, asyncify_named, ExecutorRef};
use dual_async::flags::ReservedFlags;
use dual_async::runtime::{current_event_loop, get_event_loop};
use dual_async::signature::{validate_wrapped_fn, Candidate, FnSignature};
use std::rc::Rc;
use std::time::{Duration, Instant};

#[dual_async::signature]
fn f(a: u32, b: u32) -> u32 {
    a + b
}

#[dual_async::signature]
fn g(sync: bool) -> bool {
    sync
}

#[dual_async::signature]
fn unpack((left, right): (u8, u8), _: u8, &scale: &u8) -> u8 {
    (left + right) * scale
}

#[dual_async::signature]
fn ping() {}

struct Counter;

impl Counter {
    #[dual_async::signature]
    fn bump(&self, by: u32) -> u32 {
        by + 1
    }
}

#[test]
fn test_signature_macro_captures_params() {
    assert_eq!(f_signature(), FnSignature::from_params("f", ["a", "b"]));
    assert_eq!(
        unpack_signature().params(),
        &["left".to_string(), "right".to_string(), "scale".to_string()]
    );
    assert!(ping_signature().params().is_empty());
    assert_eq!(Counter::bump_signature().params(), &["self", "by"]);

    // The annotated functions stay callable as written.
    assert_eq!(f(1, 2), 3);
    assert!(g(true));
    assert_eq!(unpack((1, 2), 0, &2), 6);
    assert_eq!(Counter.bump(1), 2);
    ping();
}

#[test]
fn test_disjoint_names_validate() {
    let flags = ReservedFlags::default();
    for candidate in [f_signature(), unpack_signature(), ping_signature()] {
        assert!(validate_wrapped_fn(&Candidate::from(candidate), &flags).is_ok());
    }
}

#[test]
fn test_reserved_name_is_a_naming_conflict() {
    let err = validate_wrapped_fn(&g_signature().into(), &ReservedFlags::default()).unwrap_err();

    assert!(matches!(err, ValidationError::ReservedFlag { .. }));
    let message = err.to_string();
    assert!(message.contains("fn g(sync)"));
    assert!(message.contains("{asynchronous, sync}"));
}

#[test]
fn test_bridge_yield_now_returns_unit() {
    let () = await_blocking(tokio::task::yield_now()).unwrap();
}

#[test]
fn test_bridge_matches_direct_async_execution() {
    async fn compute(seed: u64) -> u64 {
        let mut acc = seed;
        for i in 0..10 {
            tokio::task::yield_now().await;
            acc = acc.wrapping_mul(31).wrapping_add(i);
        }
        acc
    }

    for seed in [0, 1, 7, u64::MAX] {
        let direct = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(compute(seed));
        let bridged = await_blocking(compute(seed)).unwrap();
        assert_eq!(bridged, direct);
    }
}

#[test]
fn test_bridge_in_fresh_thread_creates_loop() {
    let created = std::thread::spawn(|| {
        let before = current_event_loop().is_ok();
        await_blocking(async {}).unwrap();
        (before, current_event_loop().is_ok())
    })
    .join()
    .unwrap();

    assert_eq!(created, (false, true));
}

#[test]
fn test_bridge_reuses_thread_loop() {
    await_blocking(async {}).unwrap();
    let first = get_event_loop().unwrap();
    await_blocking(async {}).unwrap();
    let second = get_event_loop().unwrap();
    assert!(Rc::ptr_eq(&first, &second));
}

#[dual_async::test]
async fn test_bridge_inside_running_loop_points_at_flags() {
    let err = await_blocking(async { 1 }).unwrap_err();

    match &err {
        AwaitError::LoopAlreadyRunning { hint, .. } => {
            assert!(hint.contains("sync"));
            assert!(hint.contains("asynchronous"));
        }
        other => panic!("expected LoopAlreadyRunning, got {:?}", other),
    }
    assert!(err.to_string().contains("already running"));
}

#[dual_async::test]
async fn test_asyncified_sleep_does_not_block_loop() {
    let sleep = asyncify_named("sleep", std::thread::sleep, ExecutorRef::Default);

    assert_eq!(sleep(Duration::from_millis(0)).await, Ok(()));

    let sleeper = async {
        sleep(Duration::from_millis(50)).await.unwrap();
        Instant::now()
    };
    let ticker = async {
        for _ in 0..3 {
            tokio::task::yield_now().await;
        }
        Instant::now()
    };

    let (slept_at, ticked_at) = futures::join!(sleeper, ticker);
    assert!(ticked_at < slept_at);
}

#[dual_async::test]
async fn test_concurrent_calls_run_independently() {
    let sleep = asyncify(std::thread::sleep, ExecutorRef::Default);

    let start = Instant::now();
    let results = futures::future::join_all(
        (0..4).map(|_| sleep(Duration::from_millis(100))),
    )
    .await;
    let elapsed = start.elapsed();

    assert!(results.iter().all(Result::is_ok));
    assert!(elapsed < Duration::from_millis(350));
}

#[dual_async::test]
async fn test_asyncified_matches_direct_call() {
    fn checked_div((a, b): (i32, i32)) -> Option<i32> {
        a.checked_div(b)
    }

    let wrapped = asyncify(checked_div, ExecutorRef::Default);
    for pair in [(10, 2), (7, 0), (i32::MIN, -1)] {
        assert_eq!(wrapped(pair).await, Ok(checked_div(pair)));
    }
}

#[dual_async::test]
async fn test_offloaded_job_can_make_sync_calls() {
    let doubled = |x: u32| await_blocking(async move { x * 2 }).map_err(|err| err.to_string());

    let on_loop_pool = asyncify(doubled, ExecutorRef::Default);
    let on_thread_pool = asyncify(
        doubled,
        ExecutorRef::pool(futures::executor::ThreadPool::new().unwrap()),
    );

    assert_eq!(on_loop_pool(4).await, Ok(Ok(8)));
    assert_eq!(on_thread_pool(4).await, Ok(Ok(8)));
}

#[test]
fn test_asyncified_on_tokio_multi_thread_pool() {
    let pool = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .build()
        .unwrap();

    let len = asyncify(
        |s: String| s.len(),
        ExecutorRef::pool(pool.handle().clone()),
    );

    assert_eq!(await_blocking(len("dual".to_string())).unwrap(), Ok(4));
}
