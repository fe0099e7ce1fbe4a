//! Workspace facade crate.
//!
//! Re-exports the dual-mode helpers from `dual-async` and, with the default
//! `runtime` feature, the configuration, logging and `DualFunction` surface
//! from `dual-runtime`. Host applications can depend on `dual-mode-workspace`
//! alone instead of wiring each crate individually.

pub use dual_async::*;

#[cfg(feature = "runtime")]
pub use dual_runtime::{config, dual, logging, CallFlags, DualConfig, DualFunction, Outcome};
