use thiserror::Error;

use crate::flags::ReservedFlags;

/// Event-loop state errors, dispatched structurally by the bridge.
#[derive(Error, Debug)]
pub enum LoopError {
    #[error("There is no current event loop in thread '{thread}'")]
    NoCurrentLoop { thread: String },

    #[error("This event loop is already running")]
    AlreadyRunning,

    #[error("Failed to build event loop: {0}")]
    Build(#[from] std::io::Error),
}

/// Wrap-time errors raised by the signature validator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Input is not callable. Unable to decorate {value}")]
    NotCallable { value: String },

    #[error("{callable} must not have any arguments with the following names: {flags}")]
    ReservedFlag {
        callable: String,
        flags: ReservedFlags,
    },
}

#[derive(Error, Debug)]
pub enum AwaitError {
    /// Sync mode was requested from inside a running loop.
    #[error("{message}. {hint}")]
    LoopAlreadyRunning { message: String, hint: String },

    #[error(transparent)]
    Loop(#[from] LoopError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutorError {
    #[error("Worker pool dropped the job for '{name}' before it completed")]
    Cancelled { name: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlagError {
    #[error("'{0}' is not a reserved mode flag")]
    Unknown(String),

    #[error("Only one of the following flags may be passed per call: {flags} (got {given:?})")]
    Conflicting {
        given: Vec<String>,
        flags: ReservedFlags,
    },

    #[error("Flag '{0}' is registered as both affirmative and negative")]
    Ambiguous(String),

    #[error("Reserved flag set needs at least one affirmative and one negative flag")]
    Incomplete,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Loop(#[from] LoopError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Await(#[from] AwaitError),

    #[error(transparent)]
    Executor(#[from] ExecutorError),

    #[error(transparent)]
    Flag(#[from] FlagError),
}

pub type Result<T> = std::result::Result<T, Error>;
