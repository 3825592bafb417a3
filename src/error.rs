use std::io;

use libc::{EACCES, EAGAIN, EINTR, EINVAL, ENOENT, EPERM, EWOULDBLOCK};

/// Failure of a file operation.
///
/// Syscall failures are classified by their OS error code so callers can
/// tell terminal conditions (missing file, bad permissions, reading past the
/// end) apart from transient ones, see [`Error::is_retryable`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no such file or directory")]
    NotFound,
    #[error("permission denied")]
    PermissionDenied,
    /// the requested offset lies beyond the size captured at open time
    #[error("offset {offset} out of range, file size is {size}")]
    OutOfRange { offset: u64, size: u64 },
    /// only escapes when a caller drives the raw syscalls itself, the read
    /// and write paths retry it
    #[error("interrupted by signal")]
    Interrupted,
    #[error("invalid argument")]
    InvalidArgument,
    #[error("io error: {0}")]
    Io(#[source] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn from_errno(code: i32) -> Self {
        io::Error::from_raw_os_error(code).into()
    }

    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            Error::NotFound => Some(ENOENT),
            Error::PermissionDenied => Some(EACCES),
            Error::Interrupted => Some(EINTR),
            Error::InvalidArgument => Some(EINVAL),
            Error::OutOfRange { .. } => None,
            Error::Io(e) => e.raw_os_error(),
        }
    }

    /// true when repeating the same call may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Interrupted => true,
            Error::Io(e) => matches!(e.raw_os_error(), Some(c) if c == EAGAIN || c == EWOULDBLOCK),
            _ => false,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        match e.raw_os_error() {
            Some(ENOENT) => Error::NotFound,
            Some(EACCES) | Some(EPERM) => Error::PermissionDenied,
            Some(EINTR) => Error::Interrupted,
            Some(EINVAL) => Error::InvalidArgument,
            _ => Error::Io(e),
        }
    }
}

impl From<Error> for io::Error {
    fn from(e: Error) -> Self {
        match e {
            Error::Io(e) => e,
            Error::OutOfRange { .. } => io::Error::new(io::ErrorKind::InvalidInput, e),
            Error::NotFound
            | Error::PermissionDenied
            | Error::Interrupted
            | Error::InvalidArgument => match e.raw_os_error() {
                Some(code) => io::Error::from_raw_os_error(code),
                None => io::Error::other(e),
            },
        }
    }
}
