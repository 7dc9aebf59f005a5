use std::collections::TryReserveError;
use std::error;
use std::fmt;
use std::result;

/// Errors that can occur while growing a tree.
#[derive(Debug)]
pub enum Error {
    /// The allocator could not provide storage for another node.
    AllocError(TryReserveError),
}

impl From<TryReserveError> for Error {
    fn from(err: TryReserveError) -> Error {
        Error::AllocError(err)
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::AllocError(error) => Some(error),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::AllocError(error) => write!(f, "node allocation failed: {}", error),
        }
    }
}

pub type Result<T> = result::Result<T, Error>;
