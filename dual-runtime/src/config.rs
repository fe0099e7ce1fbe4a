//! # Dual-Mode Configuration
//!
//! Provides configuration for dual-mode functions.
//!
//! ## Overview
//!
//! A `DualConfig` is built with [`DualConfigBuilder`] and shared by every
//! [`DualFunction`](crate::dual::DualFunction) created from it. The builder
//! validates fail-fast so a misconfigured flag set or loop is reported at
//! startup rather than on the first call.
//!
//! ## Settings (all optional, with defaults)
//!
//! - `reserved_flags` - names that select the mode per call (`sync`, `asynchronous`)
//! - `default_mode` - mode used when a call passes no flag (`Sync`)
//! - `executor` - worker pool for wrapped blocking functions (`ExecutorRef::Default`)
//! - `loop_config` - settings for event loops created on demand
//!
//! ## Usage
//!
//! ```
//! use dual_async::flags::{Mode, ReservedFlags};
//! use dual_runtime::config::DualConfig;
//!
//! let config = DualConfig::builder()
//!     .default_mode(Mode::Async)
//!     .reserved_flags(ReservedFlags::new(["blocking"], ["deferred"]))
//!     .build()
//!     .expect("valid config");
//! assert_eq!(config.default_mode, Mode::Async);
//! ```
//!
//! ## Error Handling
//!
//! ```should_panic
//! use dual_async::flags::ReservedFlags;
//! use dual_runtime::config::DualConfig;
//!
//! // A name cannot be both affirmative and negative
//! let config = DualConfig::builder()
//!     .reserved_flags(ReservedFlags::new(["sync"], ["sync"]))
//!     .build()
//!     .expect("Should fail - ambiguous flag");
//! ```

use crate::error::{Error, Result};
use dual_async::executor::ExecutorRef;
use dual_async::flags::{Mode, ReservedFlags};
use dual_async::runtime::LoopConfig;

/// Upper bound accepted for `LoopConfig::max_blocking_threads`.
const MAX_BLOCKING_THREADS: usize = 10_000;

/// Settings shared by dual-mode functions.
#[derive(Debug, Clone)]
pub struct DualConfig {
    /// Names that select the mode of a call
    pub reserved_flags: ReservedFlags,

    /// Mode used when a call passes no reserved flag
    pub default_mode: Mode,

    /// Worker pool for wrapped blocking functions
    pub executor: ExecutorRef,

    /// Settings for event loops created on demand
    pub loop_config: LoopConfig,
}

impl Default for DualConfig {
    fn default() -> Self {
        Self {
            reserved_flags: ReservedFlags::default(),
            default_mode: Mode::Sync,
            executor: ExecutorRef::Default,
            loop_config: LoopConfig::default(),
        }
    }
}

impl DualConfig {
    pub fn builder() -> DualConfigBuilder {
        DualConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Reserved flags have both polarities and no name in both
    /// - The loop's blocking pool size is within (0, 10,000]
    /// - A blocking thread name, if set, is not empty
    pub fn validate(&self) -> Result<()> {
        self.reserved_flags
            .validate()
            .map_err(|e| Error::Config(format!("Invalid reserved flags: {}", e)))?;

        if self.loop_config.max_blocking_threads == 0 {
            return Err(Error::Config(
                "max_blocking_threads must be greater than 0".to_string(),
            ));
        }

        if self.loop_config.max_blocking_threads > MAX_BLOCKING_THREADS {
            return Err(Error::Config(format!(
                "max_blocking_threads exceeds maximum of {}",
                MAX_BLOCKING_THREADS
            )));
        }

        if matches!(self.loop_config.thread_name.as_deref(), Some("")) {
            return Err(Error::Config(
                "Blocking thread name cannot be empty. Omit it to use the runtime default."
                    .to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for [`DualConfig`].
#[derive(Debug, Default)]
pub struct DualConfigBuilder {
    reserved_flags: Option<ReservedFlags>,
    default_mode: Option<Mode>,
    executor: Option<ExecutorRef>,
    loop_config: Option<LoopConfig>,
}

impl DualConfigBuilder {
    pub fn reserved_flags(mut self, flags: ReservedFlags) -> Self {
        self.reserved_flags = Some(flags);
        self
    }

    pub fn default_mode(mut self, mode: Mode) -> Self {
        self.default_mode = Some(mode);
        self
    }

    pub fn executor(mut self, executor: ExecutorRef) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn loop_config(mut self, config: LoopConfig) -> Self {
        self.loop_config = Some(config);
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when [`DualConfig::validate`] fails.
    pub fn build(self) -> Result<DualConfig> {
        let defaults = DualConfig::default();

        let config = DualConfig {
            reserved_flags: self.reserved_flags.unwrap_or(defaults.reserved_flags),
            default_mode: self.default_mode.unwrap_or(defaults.default_mode),
            executor: self.executor.unwrap_or(defaults.executor),
            loop_config: self.loop_config.unwrap_or(defaults.loop_config),
        };

        config.validate()?;

        Ok(config)
    }
}
