//! Positional, vectored file io on top of posix file descriptors.
//!
//! Reads never expose partial transfers or signal interruption: a
//! [`ReadonlyFile::read`] fills every buffer unless end of file comes first.
//! Writes are a single `writev` and may be short, [`WriteFile::write_all`]
//! resubmits the remainder. [`FileSource`] turns a positional file into a
//! sequential one.

pub use error::{Error, Result};
pub use file::{
    open_read, open_write, LocalWriteFile, PosixReadFile, ReadOptions, ReadonlyFile, WriteFile,
    WriteOptions, CREATE_MODE,
};
pub use iovec::{IoVec, IoVecMut};
pub use mem::MemFile;
pub use path::{delete, exists};
pub use read::{read_all, read_vectored, PositionalRead};
pub use source::{FileRef, FileSource};
pub use utils::RandomPath;

mod error;
mod file;
mod iovec;
mod mem;
mod path;
mod read;
mod source;
mod unix;
mod utils;

#[cfg(not(unix))]
compile_error!("fileio only supports unix-like targets");
