use trackable::error::{ErrorKind as TrackableErrorKind, ErrorKindExt};
use trackable::error::{Failure, TrackableError};

/// This crate specific `Error` type.
#[derive(Debug, Clone, TrackableError)]
pub struct Error(TrackableError<ErrorKind>);
impl From<Failure> for Error {
    fn from(f: Failure) -> Self {
        ErrorKind::Other.takes_over(f).into()
    }
}
impl From<std::io::Error> for Error {
    fn from(f: std::io::Error) -> Self {
        ErrorKind::IoError.cause(f).into()
    }
}
impl From<serde_json::Error> for Error {
    fn from(f: serde_json::Error) -> Self {
        if f.is_io() {
            ErrorKind::IoError.cause(f).into()
        } else {
            ErrorKind::Serialization.cause(f).into()
        }
    }
}

/// Possible error kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid input was given (e.g., inconsistent shapes or dimensionality).
    InvalidInput,

    /// I/O error.
    IoError,

    /// An archive could not be encoded or decoded.
    Serialization,

    /// Other error.
    Other,
}
impl TrackableErrorKind for ErrorKind {}
