//! Dual-mode functions.
//!
//! A [`DualFunction`] wraps an async function (or a blocking one, through the
//! worker pool) once, validating its signature against the reserved flags, and
//! then lets every call choose how it runs:
//!
//! - sync mode blocks the caller on the thread's event loop and returns
//!   [`Outcome::Ready`]
//! - async mode returns [`Outcome::Deferred`] for the caller to await
//!
//! ```
//! use dual_async::flags::Mode;
//! use dual_async::signature::FnSignature;
//! use dual_runtime::config::DualConfig;
//! use dual_runtime::dual::{CallFlags, DualFunction};
//!
//! let add = DualFunction::new(
//!     FnSignature::from_params("add", ["a", "b"]),
//!     DualConfig::default(),
//!     |(a, b): (u32, u32)| async move { a + b },
//! )
//! .unwrap();
//!
//! let outcome = add.call((2, 3), &CallFlags::sync()).unwrap();
//! assert_eq!(outcome.into_ready(), Some(5));
//!
//! let deferred = add.call((2, 3), &CallFlags::asynchronous()).unwrap();
//! assert!(!deferred.is_ready());
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use dual_async::bridge;
use dual_async::error::ExecutorError;
use dual_async::executor::{asyncify_named, ExecutorRef};
use dual_async::flags::{Mode, ASYNC_FLAG, SYNC_FLAG};
use dual_async::signature::{validate_wrapped_fn, Candidate};
use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::debug;

use crate::config::DualConfig;
use crate::error::Result;

/// Result of a dual-mode call.
pub enum Outcome<T> {
    /// Sync mode: the call already ran to completion
    Ready(T),
    /// Async mode: the caller awaits the computation
    Deferred(BoxFuture<'static, T>),
}

impl<T> Outcome<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, Outcome::Ready(_))
    }

    pub fn into_ready(self) -> Option<T> {
        match self {
            Outcome::Ready(value) => Some(value),
            Outcome::Deferred(_) => None,
        }
    }

    pub fn into_deferred(self) -> Option<BoxFuture<'static, T>> {
        match self {
            Outcome::Ready(_) => None,
            Outcome::Deferred(future) => Some(future),
        }
    }

    /// Produces the value regardless of mode.
    pub async fn resolve(self) -> T {
        match self {
            Outcome::Ready(value) => value,
            Outcome::Deferred(future) => future.await,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Outcome<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Ready(value) => f.debug_tuple("Ready").field(value).finish(),
            Outcome::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

/// Keyword flags passed alongside a call's arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallFlags {
    flags: Vec<(String, bool)>,
}

impl CallFlags {
    pub fn new() -> Self {
        Self::default()
    }

    /// `sync = true` with the default flag names.
    pub fn sync() -> Self {
        Self::new().with(SYNC_FLAG, true)
    }

    /// `asynchronous = true` with the default flag names.
    pub fn asynchronous() -> Self {
        Self::new().with(ASYNC_FLAG, true)
    }

    pub fn with(mut self, name: impl Into<String>, value: bool) -> Self {
        self.flags.push((name.into(), value));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.flags.iter().map(|(name, value)| (name.as_str(), *value))
    }
}

type CallFn<A, T> = dyn Fn(A) -> BoxFuture<'static, T> + Send + Sync;

/// A function callable in either sync or async mode.
pub struct DualFunction<A, T> {
    candidate: Candidate,
    config: DualConfig,
    func: Arc<CallFn<A, T>>,
}

impl<A, T> Clone for DualFunction<A, T> {
    fn clone(&self) -> Self {
        Self {
            candidate: self.candidate.clone(),
            config: self.config.clone(),
            func: Arc::clone(&self.func),
        }
    }
}

impl<A, T> fmt::Debug for DualFunction<A, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DualFunction")
            .field("candidate", &self.candidate)
            .field("default_mode", &self.config.default_mode)
            .finish_non_exhaustive()
    }
}

impl<A, T> DualFunction<A, T>
where
    A: Send + 'static,
    T: Send + 'static,
{
    /// Wraps an async function after validating `candidate`.
    ///
    /// # Errors
    ///
    /// Fails with a validation error when `candidate` is not callable or
    /// declares a parameter named like a reserved flag.
    pub fn new<F, Fut>(candidate: impl Into<Candidate>, config: DualConfig, func: F) -> Result<Self>
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        let candidate = candidate.into();
        validate_wrapped_fn(&candidate, &config.reserved_flags)?;

        debug!(
            function = candidate.name(),
            default_mode = ?config.default_mode,
            "wrapped dual-mode function"
        );

        Ok(Self {
            candidate,
            config,
            func: Arc::new(move |args| func(args).boxed()),
        })
    }

    pub fn name(&self) -> &str {
        self.candidate.name()
    }

    pub fn candidate(&self) -> &Candidate {
        &self.candidate
    }

    pub fn config(&self) -> &DualConfig {
        &self.config
    }

    /// The mode a call with `flags` runs in.
    pub fn mode_for(&self, flags: &CallFlags) -> Result<Mode> {
        let requested = self.config.reserved_flags.resolve(flags.iter())?;
        Ok(requested.unwrap_or(self.config.default_mode))
    }

    /// Calls the function in the mode selected by `flags`.
    ///
    /// # Errors
    ///
    /// - A flag error when more than one reserved flag is passed
    /// - In sync mode, an await error when called from inside a running loop
    pub fn call(&self, args: A, flags: &CallFlags) -> Result<Outcome<T>> {
        match self.mode_for(flags)? {
            Mode::Sync => self.call_sync(args).map(Outcome::Ready),
            Mode::Async => Ok(Outcome::Deferred(self.call_async(args))),
        }
    }

    pub fn call_sync(&self, args: A) -> Result<T> {
        debug!(function = self.name(), "sync call");
        let future = (self.func)(args);
        let value = bridge::await_blocking_with(
            &self.config.reserved_flags,
            &self.config.loop_config,
            future,
        )?;
        Ok(value)
    }

    pub fn call_async(&self, args: A) -> BoxFuture<'static, T> {
        (self.func)(args)
    }
}

impl<A, T> DualFunction<A, std::result::Result<T, ExecutorError>>
where
    A: Send + 'static,
    T: Send + 'static,
{
    /// Wraps a blocking function; calls run it on the configured worker pool.
    ///
    /// With the default pool, any event loop built to host the job uses
    /// `config.loop_config`.
    pub fn from_blocking<F>(candidate: impl Into<Candidate>, config: DualConfig, func: F) -> Result<Self>
    where
        F: Fn(A) -> T + Send + Sync + 'static,
    {
        let candidate = candidate.into();
        let executor = match &config.executor {
            ExecutorRef::Default => ExecutorRef::Loop(config.loop_config.clone()),
            other => other.clone(),
        };
        let asyncified = asyncify_named(candidate.name(), func, executor);
        Self::new(candidate, config, asyncified)
    }
}
