//! Offloading blocking functions to a worker pool.
//!
//! [`asyncify`] turns a plain blocking function into one that returns a
//! future. Awaiting that future submits the call to a worker pool and
//! suspends until the pool reports back, so the event loop keeps running
//! other tasks in the meantime.
//!
//! # Worker pools
//!
//! Anything implementing [`Executor`] can run the jobs:
//! - `tokio::runtime::Handle`: the runtime's blocking pool (`spawn_blocking`)
//! - `futures::executor::ThreadPool`
//! - [`ExecutorRef::Default`]: the blocking pool of whichever runtime polls
//!   the call, else that of this thread's event loop
//! - [`ExecutorRef::Loop`]: the same, with the settings for a loop built on
//!   demand
//!
//! A job's worker thread may itself make sync-mode calls: it gets an event
//! loop of its own even when the pool left a Tokio context entered there.
//!
//! # Errors and panics
//!
//! The function's return value passes through untouched, including any
//! `Result` it returns. A panic inside the job is resumed on the awaiting
//! task. The only error added here is [`ExecutorError::Cancelled`], for a
//! pool that drops the job without running it.

use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::channel::oneshot;
use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::runtime::Handle;
use tracing::{debug, debug_span, warn, Instrument};

use crate::error::ExecutorError;
use crate::runtime::{self, LoopConfig, OffloadedJob};

/// A unit of blocking work handed to a worker pool.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// A pool that runs blocking jobs off the event loop's thread.
#[cfg_attr(test, mockall::automock)]
pub trait Executor: Send + Sync {
    fn execute(&self, job: Job);
}

impl Executor for Handle {
    fn execute(&self, job: Job) {
        // Results travel through the job's own channel.
        drop(self.spawn_blocking(job));
    }
}

impl Executor for futures::executor::ThreadPool {
    fn execute(&self, job: Job) {
        self.spawn_ok(async move { job() });
    }
}

impl<E> Executor for Arc<E>
where
    E: Executor + ?Sized,
{
    fn execute(&self, job: Job) {
        (**self).execute(job)
    }
}

/// Which worker pool an asyncified function submits to.
#[derive(Clone, Default)]
pub enum ExecutorRef {
    /// Blocking pool of the runtime polling the call, else that of this
    /// thread's event loop built with default settings
    #[default]
    Default,
    /// Like `Default`, building any missing event loop from the config
    Loop(LoopConfig),
    Pool(Arc<dyn Executor>),
}

impl ExecutorRef {
    pub fn pool(executor: impl Executor + 'static) -> Self {
        ExecutorRef::Pool(Arc::new(executor))
    }
}

impl fmt::Debug for ExecutorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutorRef::Default => f.write_str("ExecutorRef::Default"),
            ExecutorRef::Loop(config) => f.debug_tuple("ExecutorRef::Loop").field(config).finish(),
            ExecutorRef::Pool(_) => f.write_str("ExecutorRef::Pool(Executor { ... })"),
        }
    }
}

impl Executor for ExecutorRef {
    fn execute(&self, job: Job) {
        match self {
            ExecutorRef::Pool(executor) => executor.execute(job),
            ExecutorRef::Default => execute_on_loop(job, &LoopConfig::default()),
            ExecutorRef::Loop(config) => execute_on_loop(job, config),
        }
    }
}

fn execute_on_loop(job: Job, config: &LoopConfig) {
    if let Ok(handle) = Handle::try_current() {
        return handle.execute(job);
    }

    match runtime::get_event_loop_with(config) {
        Ok(event_loop) => event_loop.handle().execute(job),
        Err(err) => warn!(error = %err, "no event loop for the default executor; dropping job"),
    }
}

/// Future returned by an asyncified function.
pub struct Asyncified<T> {
    name: Arc<str>,
    inner: BoxFuture<'static, Result<T, ExecutorError>>,
}

impl<T> Asyncified<T> {
    /// Name of the wrapped function.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<T> fmt::Debug for Asyncified<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Asyncified")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<T> Future for Asyncified<T> {
    type Output = Result<T, ExecutorError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.poll_unpin(cx)
    }
}

/// Wraps a blocking function so each call returns an awaitable
/// [`Asyncified`] future.
///
/// Multiple arguments are passed as a tuple. The job is submitted when the
/// future is first polled, not when the wrapper is called.
///
/// # Examples
///
/// ```rust
/// use dual_async::bridge::await_blocking;
/// use dual_async::executor::{asyncify, ExecutorRef};
///
/// let add = asyncify(|(a, b): (u32, u32)| a + b, ExecutorRef::Default);
/// assert_eq!(await_blocking(add((2, 3))).unwrap(), Ok(5));
/// ```
pub fn asyncify<F, A, T>(
    func: F,
    executor: ExecutorRef,
) -> impl Fn(A) -> Asyncified<T> + Clone + Send + Sync + 'static
where
    F: Fn(A) -> T + Send + Sync + 'static,
    A: Send + 'static,
    T: Send + 'static,
{
    asyncify_named(std::any::type_name::<F>(), func, executor)
}

/// Like [`asyncify`], keeping `name` as the wrapped function's identity for
/// [`Asyncified::name`] and tracing spans.
pub fn asyncify_named<F, A, T>(
    name: impl Into<Arc<str>>,
    func: F,
    executor: ExecutorRef,
) -> impl Fn(A) -> Asyncified<T> + Clone + Send + Sync + 'static
where
    F: Fn(A) -> T + Send + Sync + 'static,
    A: Send + 'static,
    T: Send + 'static,
{
    let name: Arc<str> = name.into();
    let func = Arc::new(func);

    move |args: A| {
        let span = debug_span!("asyncify", function = %name);
        let inner = run_in_executor(
            Arc::clone(&name),
            Arc::clone(&func),
            executor.clone(),
            args,
        )
        .instrument(span)
        .boxed();

        Asyncified {
            name: Arc::clone(&name),
            inner,
        }
    }
}

async fn run_in_executor<F, A, T>(
    name: Arc<str>,
    func: Arc<F>,
    executor: ExecutorRef,
    args: A,
) -> Result<T, ExecutorError>
where
    F: Fn(A) -> T + Send + Sync + 'static,
    A: Send + 'static,
    T: Send + 'static,
{
    let (tx, rx) = oneshot::channel();

    debug!("submitting blocking call to worker pool");
    executor.execute(Box::new(move || {
        let _offloaded = OffloadedJob::enter();
        let outcome = panic::catch_unwind(AssertUnwindSafe(move || (*func)(args)));
        // Nobody is listening if the awaiting future was dropped.
        let _ = tx.send(outcome);
    }));

    match rx.await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(payload)) => panic::resume_unwind(payload),
        Err(oneshot::Canceled) => Err(ExecutorError::Cancelled {
            name: name.to_string(),
        }),
    }
}
