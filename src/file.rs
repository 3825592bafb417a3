use std::{
    io,
    os::fd::RawFd,
    path::{Path, PathBuf},
};

use libc::{
    c_int, mode_t, EBADF, EINTR, O_APPEND, O_CLOEXEC, O_CREAT, O_RDONLY, O_TRUNC, O_WRONLY,
};

use crate::{
    read::read_vectored,
    unix::{Advice, FileHandle},
    Error, IoVec, IoVecMut, Result,
};

/// permission bits of files created by [`open_write`]
pub const CREATE_MODE: mode_t = 0o644;

/// A file read by explicit offset, its size is fixed when it is opened.
pub trait ReadonlyFile {
    /// Read into `bufs` in order, starting at `offset`.
    ///
    /// Returns fewer bytes than the total length of `bufs` only when end of
    /// file was reached. `offset == size()` is a clean end of file, anything
    /// beyond is [`Error::OutOfRange`].
    fn read(&self, offset: u64, bufs: &mut [IoVecMut<'_>]) -> Result<usize>;

    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        self.read(offset, &mut [IoVecMut::new(buf)])
    }

    /// size captured at open time
    fn size(&self) -> u64;

    /// the underlying descriptor, `-1` once closed
    fn handle(&self) -> RawFd;

    /// release the file, calling it again is a no-op
    fn close(&mut self) -> Result<()>;
}

/// A file written at its descriptor's current position.
pub trait WriteFile {
    /// Submit `bufs` once. The count may be less than requested, the caller
    /// owns resubmitting the rest (see [`WriteFile::write_all`]).
    ///
    /// A call interrupted by a signal before any byte was transferred is
    /// retried, a short count never is.
    fn write(&mut self, bufs: &[IoVec<'_>]) -> Result<usize>;

    /// Resubmit until every byte of `bufs` is written, `bufs` is consumed in
    /// the process.
    fn write_all(&mut self, mut bufs: &mut [IoVec<'_>]) -> Result<()> {
        loop {
            let empty = bufs.iter().take_while(|x| x.is_empty()).count();
            bufs = &mut std::mem::take(&mut bufs)[empty..];
            if bufs.is_empty() {
                return Ok(());
            }

            let mut n = self.write(bufs)?;
            if n == 0 {
                return Err(io::Error::from(io::ErrorKind::WriteZero).into());
            }

            let mut done = 0;
            while done < bufs.len() && bufs[done].len() <= n {
                n -= bufs[done].len();
                done += 1;
            }
            bufs = &mut std::mem::take(&mut bufs)[done..];
            if n > 0 {
                match bufs.first_mut() {
                    Some(b) => b.advance(n),
                    None => return Err(Error::InvalidArgument),
                }
            }
        }
    }

    /// the underlying descriptor, `-1` once closed or when there is none
    fn handle(&self) -> RawFd;

    /// release the file, calling it again is a no-op
    fn close(&mut self) -> Result<()>;
}

impl<T: ReadonlyFile + ?Sized> ReadonlyFile for Box<T> {
    fn read(&self, offset: u64, bufs: &mut [IoVecMut<'_>]) -> Result<usize> {
        (**self).read(offset, bufs)
    }

    fn size(&self) -> u64 {
        (**self).size()
    }

    fn handle(&self) -> RawFd {
        (**self).handle()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

impl<T: WriteFile + ?Sized> WriteFile for Box<T> {
    fn write(&mut self, bufs: &[IoVec<'_>]) -> Result<usize> {
        (**self).write(bufs)
    }

    fn handle(&self) -> RawFd {
        (**self).handle()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReadOptions {
    sequential: bool,
    drop_cache_on_close: bool,
}

impl ReadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// advise the kernel the file will be read front to back
    pub fn sequential(&mut self, on: bool) -> &mut Self {
        self.sequential = on;
        self
    }

    /// ask the kernel to evict the file's cached pages on close
    pub fn drop_cache_on_close(&mut self, on: bool) -> &mut Self {
        self.drop_cache_on_close = on;
        self
    }

    pub fn open<P: AsRef<Path>>(&self, path: P) -> Result<PosixReadFile> {
        open_read(path, self)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WriteOptions {
    append: bool,
}

impl WriteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// keep existing content and write at its end, otherwise the file is
    /// truncated on open
    pub fn append(&mut self, on: bool) -> &mut Self {
        self.append = on;
        self
    }

    pub fn open<P: AsRef<Path>>(&self, path: P) -> Result<LocalWriteFile> {
        open_write(path, self)
    }
}

/// `pread` based access.
#[derive(Debug)]
pub struct PosixReadFile {
    fd: FileHandle,
    file_size: u64,
    drop_cache: bool,
}

impl PosixReadFile {
    fn new(fd: FileHandle, file_size: u64, advice: Advice, drop_cache: bool) -> Self {
        fd.advise(advice);
        Self {
            fd,
            file_size,
            drop_cache,
        }
    }

    pub fn options() -> ReadOptions {
        ReadOptions::new()
    }
}

impl ReadonlyFile for PosixReadFile {
    fn read(&self, offset: u64, bufs: &mut [IoVecMut<'_>]) -> Result<usize> {
        if offset > self.file_size {
            return Err(Error::OutOfRange {
                offset,
                size: self.file_size,
            });
        }
        if IoVecMut::total_len(bufs) == 0 {
            return Ok(0);
        }
        if !self.fd.is_open() {
            return Err(Error::from_errno(EBADF));
        }

        read_vectored(&self.fd, bufs, offset).map_err(|e| {
            log::debug!("read fd {} offset {offset} fail: {e}", self.fd.raw());
            e.into()
        })
    }

    fn size(&self) -> u64 {
        self.file_size
    }

    fn handle(&self) -> RawFd {
        self.fd.raw()
    }

    fn close(&mut self) -> Result<()> {
        if self.fd.is_open() && self.drop_cache {
            self.fd.advise(Advice::DontNeed);
        }
        self.fd.close()
    }
}

impl Drop for PosixReadFile {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::warn!("close read file fail: {e}");
        }
    }
}

/// `writev` based local file, writes land at the descriptor's position.
#[derive(Debug)]
pub struct LocalWriteFile {
    fd: FileHandle,
    path: PathBuf,
    flags: c_int,
}

impl LocalWriteFile {
    pub fn options() -> WriteOptions {
        WriteOptions::new()
    }

    /// the path the file was created with
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_append(&self) -> bool {
        self.flags & O_APPEND != 0
    }
}

impl WriteFile for LocalWriteFile {
    fn write(&mut self, bufs: &[IoVec<'_>]) -> Result<usize> {
        if IoVec::total_len(bufs) == 0 {
            return Ok(0);
        }
        if !self.fd.is_open() {
            return Err(Error::from_errno(EBADF));
        }

        loop {
            match self.fd.writev(bufs) {
                Ok(n) => return Ok(n),
                // nothing was transferred, safe to submit again
                Err(e) if e.raw_os_error() == Some(EINTR) => continue,
                Err(e) => {
                    log::debug!("write {:?} fail: {e}", self.path);
                    return Err(e.into());
                }
            }
        }
    }

    fn handle(&self) -> RawFd {
        self.fd.raw()
    }

    fn close(&mut self) -> Result<()> {
        self.fd.close()
    }
}

/// Open `path` for positional reads.
///
/// The descriptor is closed again when its size can't be queried.
pub fn open_read<P: AsRef<Path>>(path: P, opts: &ReadOptions) -> Result<PosixReadFile> {
    let path = path.as_ref();
    let fd = FileHandle::open(path, O_RDONLY | O_CLOEXEC, 0)
        .inspect_err(|e| log::debug!("open {path:?} for read fail: {e}"))?;
    let size = fd
        .size()
        .inspect_err(|e| log::debug!("stat {path:?} fail: {e}"))?;

    let advice = if opts.sequential {
        Advice::Sequential
    } else {
        Advice::Normal
    };
    Ok(PosixReadFile::new(fd, size, advice, opts.drop_cache_on_close))
}

/// Create or open `path` for writing, truncated unless appending.
pub fn open_write<P: AsRef<Path>>(path: P, opts: &WriteOptions) -> Result<LocalWriteFile> {
    let path = path.as_ref();
    let mut flags = O_CREAT | O_WRONLY | O_CLOEXEC;
    if opts.append {
        flags |= O_APPEND;
    } else {
        flags |= O_TRUNC;
    }

    let fd = FileHandle::open(path, flags, CREATE_MODE)
        .inspect_err(|e| log::debug!("open {path:?} for write fail: {e}"))?;
    Ok(LocalWriteFile {
        fd,
        path: path.to_path_buf(),
        flags,
    })
}
