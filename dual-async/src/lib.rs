//! Dual-mode calling helpers.
//!
//! This crate lets the same function be invoked either synchronously (blocking
//! until a result is produced) or asynchronously (returning a future), with the
//! mode picked per call by a reserved flag.
//!
//! # Architecture
//!
//! Every thread owns at most one live [`EventLoop`](runtime::EventLoop), a Tokio
//! current-thread runtime registered in a thread-local slot. The helpers below
//! are independent and only share that registry:
//!
//! - `runtime`: the loop accessor ([`get_event_loop`]), create-if-absent
//! - `signature`: wrap-time validation of parameter names against reserved flags
//! - `bridge`: drives a future to completion on the thread's loop (sync mode)
//! - `executor`: turns a blocking function into an awaitable one (async mode)
//! - `flags`: the reserved flag names and mode resolution
//!
//! # Examples
//!
//! ```rust
//! use dual_async::bridge::await_blocking;
//! use dual_async::executor::{asyncify, ExecutorRef};
//!
//! let double = asyncify(|x: u32| x * 2, ExecutorRef::Default);
//! let value = await_blocking(double(21)).unwrap().unwrap();
//! assert_eq!(value, 42);
//! ```

// Lets the proc macros refer to `::dual_async` from inside this crate too.
extern crate self as dual_async;

// Re-export the async entry-point/test macros so downstream crates never need
// direct Tokio dependencies.
pub use dual_async_macros::{main, signature, test};

pub mod bridge;
pub mod error;
pub mod executor;
pub mod flags;
pub mod runtime;
pub mod signature;

pub use bridge::await_blocking;
pub use error::{Error, Result};
pub use executor::asyncify;
pub use flags::{Mode, ReservedFlags};
pub use runtime::get_event_loop;
pub use signature::validate_wrapped_fn;
