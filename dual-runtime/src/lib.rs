//! # Dual Runtime
//!
//! Ambient infrastructure and the call surface for dual-mode functions:
//! - Configuration (reserved flags, default mode, worker pool, loop settings)
//! - Logging and tracing infrastructure
//! - [`DualFunction`](dual::DualFunction), which validates a function once and
//!   then runs each call synchronously or asynchronously as its flags request
//!
//! ## Overview
//!
//! The helpers themselves live in `dual-async`. This crate wires them together
//! the way an application uses them and establishes the logging conventions
//! shared by the workspace.

pub mod config;
pub mod dual;
pub mod error;
pub mod logging;

pub use config::DualConfig;
pub use dual::{CallFlags, DualFunction, Outcome};
pub use error::{Error, Result};
