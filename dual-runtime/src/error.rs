use dual_async::error::{AwaitError, ExecutorError, FlagError, LoopError, ValidationError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Dual(#[from] dual_async::Error),

    #[error("Logger sink error: {0}")]
    Sink(String),
}

impl From<LoopError> for Error {
    fn from(err: LoopError) -> Self {
        Error::Dual(err.into())
    }
}

impl From<ValidationError> for Error {
    fn from(err: ValidationError) -> Self {
        Error::Dual(err.into())
    }
}

impl From<AwaitError> for Error {
    fn from(err: AwaitError) -> Self {
        Error::Dual(err.into())
    }
}

impl From<ExecutorError> for Error {
    fn from(err: ExecutorError) -> Self {
        Error::Dual(err.into())
    }
}

impl From<FlagError> for Error {
    fn from(err: FlagError) -> Self {
        Error::Dual(err.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
