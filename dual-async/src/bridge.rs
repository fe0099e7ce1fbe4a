//! Synchronous bridge: run a future to completion on the thread's event loop.
//!
//! This is the sync half of a dual-mode call. The calling thread is blocked
//! for the full duration of the future; no timeout is applied here.
//!
//! # Failure handling
//!
//! - Called from inside a running loop, or from a thread a foreign Tokio
//!   runtime is driving: [`AwaitError::LoopAlreadyRunning`], whose hint points
//!   at the reserved async-mode flags. Worker threads running an offloaded job
//!   are not driven by their pool's runtime and get a loop of their own.
//! - The loop was closed between acquisition and use: a fresh loop is
//!   installed through the same recovery path as
//!   [`get_event_loop`](crate::runtime::get_event_loop) and the run is retried
//!   once.
//! - Anything else propagates unchanged.

use std::future::Future;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::error::{AwaitError, LoopError};
use crate::flags::ReservedFlags;
use crate::runtime::{self, EventLoop, LoopConfig};

/// Blocks until `future` completes on this thread's event loop.
///
/// # Examples
///
/// ```rust
/// use dual_async::bridge::await_blocking;
///
/// let value = await_blocking(async { 6 * 7 }).unwrap();
/// assert_eq!(value, 42);
/// ```
pub fn await_blocking<F>(future: F) -> Result<F::Output, AwaitError>
where
    F: Future,
{
    await_blocking_with(&ReservedFlags::default(), &LoopConfig::default(), future)
}

/// Like [`await_blocking`], with the reserved flags used in the remediation
/// hint and the settings for any loop created along the way.
pub fn await_blocking_with<F>(
    flags: &ReservedFlags,
    config: &LoopConfig,
    future: F,
) -> Result<F::Output, AwaitError>
where
    F: Future,
{
    let event_loop = runtime::get_event_loop_with(config)?;
    await_on(event_loop, flags, config, future)
}

/// Drives `future` on a specific loop, recovering once if that loop is gone.
pub fn await_on<F>(
    event_loop: Rc<EventLoop>,
    flags: &ReservedFlags,
    config: &LoopConfig,
    future: F,
) -> Result<F::Output, AwaitError>
where
    F: Future,
{
    match event_loop.check_runnable() {
        Ok(()) => drive(&event_loop, flags, future),
        Err(LoopError::NoCurrentLoop { thread }) => {
            debug!(%thread, "event loop closed before use; retrying on a fresh loop");
            let event_loop = runtime::recover_event_loop(config)?;
            drive(&event_loop, flags, future)
        }
        Err(err) => Err(escalate(err, flags)),
    }
}

fn drive<F>(event_loop: &EventLoop, flags: &ReservedFlags, future: F) -> Result<F::Output, AwaitError>
where
    F: Future,
{
    event_loop
        .run_until_complete(future)
        .map_err(|err| escalate(err, flags))
}

fn escalate(err: LoopError, flags: &ReservedFlags) -> AwaitError {
    match err {
        LoopError::AlreadyRunning => {
            warn!("synchronous call attempted inside a running event loop");
            AwaitError::LoopAlreadyRunning {
                message: err.to_string(),
                hint: running_loop_hint(flags),
            }
        }
        other => AwaitError::Loop(other),
    }
}

/// Remediation text attached to [`AwaitError::LoopAlreadyRunning`].
pub fn running_loop_hint(flags: &ReservedFlags) -> String {
    format!(
        "You may want to make this an async call by setting one of the following flags: {}",
        flags
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{current_event_loop, get_event_loop, new_event_loop};

    #[test]
    fn test_returns_future_output() {
        assert_eq!(await_blocking(async { "done" }).unwrap(), "done");
        assert_eq!(await_blocking(tokio::task::yield_now()).unwrap(), ());
    }

    #[test]
    fn test_creates_loop_in_fresh_thread() {
        let result = std::thread::spawn(|| {
            assert!(current_event_loop().is_err());
            let value = await_blocking(async { 7 }).unwrap();
            (value, current_event_loop().is_ok())
        })
        .join()
        .unwrap();

        assert_eq!(result, (7, true));
    }

    #[test]
    fn test_nested_call_reports_flags_hint() {
        let nested = await_blocking(async { await_blocking(async { 1 }) }).unwrap();

        match nested {
            Err(AwaitError::LoopAlreadyRunning { message, hint }) => {
                assert_eq!(message, "This event loop is already running");
                assert!(hint.contains("sync"));
                assert!(hint.contains("asynchronous"));
            }
            other => panic!("expected LoopAlreadyRunning, got {:?}", other),
        }
    }

    #[test]
    fn test_error_display_combines_message_and_hint() {
        let nested = await_blocking(async { await_blocking(async {}) }).unwrap();
        let message = nested.unwrap_err().to_string();
        assert!(message.starts_with("This event loop is already running. "));
        assert!(message.contains("{asynchronous, sync}"));
    }

    #[test]
    fn test_custom_flags_in_hint() {
        let flags = ReservedFlags::new(["blocking"], ["deferred"]);
        let config = LoopConfig::default();
        let nested = await_blocking(async {
            await_blocking_with(&flags, &config, async {})
        })
        .unwrap();

        match nested {
            Err(AwaitError::LoopAlreadyRunning { hint, .. }) => {
                assert!(hint.contains("{blocking, deferred}"));
            }
            other => panic!("expected LoopAlreadyRunning, got {:?}", other),
        }
    }

    #[test]
    fn test_closed_loop_is_retried_on_fresh_loop() {
        let stale = get_event_loop().unwrap();
        stale.close();

        let value = await_on(
            Rc::clone(&stale),
            &ReservedFlags::default(),
            &LoopConfig::default(),
            async { 5 },
        )
        .unwrap();
        assert_eq!(value, 5);

        let current = current_event_loop().unwrap();
        assert!(!Rc::ptr_eq(&stale, &current));
    }

    #[test]
    fn test_unregistered_loop_can_be_driven() {
        let event_loop = Rc::new(new_event_loop().unwrap());
        let value = await_on(
            event_loop,
            &ReservedFlags::default(),
            &LoopConfig::default(),
            async { 9 },
        )
        .unwrap();
        assert_eq!(value, 9);
    }

    #[test]
    fn test_build_failure_propagates() {
        std::thread::spawn(|| {
            let config = LoopConfig::default().with_max_blocking_threads(0);
            let err = await_blocking_with(&ReservedFlags::default(), &config, async {})
                .unwrap_err();
            assert!(matches!(err, AwaitError::Loop(LoopError::Build(_))));
        })
        .join()
        .unwrap();
    }

    #[test]
    fn test_inside_foreign_runtime_is_rejected() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let nested = runtime.block_on(async { await_blocking(async { 1 }) });
        assert!(matches!(nested, Err(AwaitError::LoopAlreadyRunning { .. })));
    }
}
