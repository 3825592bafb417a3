use std::{
    ffi::CString,
    io,
    os::{raw::c_void, unix::ffi::OsStrExt},
    path::Path,
};

use libc::{c_int, close, fstat, off_t, open, pread, preadv, stat, writev, EINTR, EINVAL};

#[cfg(any(target_os = "freebsd", target_os = "macos"))]
use libc::__error;

#[cfg(target_os = "linux")]
use libc::__errno_location;

use crate::{Error, IoVec, IoVecMut, Result};

/// the kernel rejects longer lists with EINVAL, value shared by linux and the BSDs
pub(crate) const IOV_MAX: usize = 1024;

#[cfg(any(target_os = "freebsd", target_os = "macos"))]
#[inline]
pub(crate) fn errno() -> i32 {
    unsafe { *__error() }
}

#[cfg(target_os = "linux")]
#[inline]
pub(crate) fn errno() -> i32 {
    unsafe { *__errno_location() }
}

#[cfg(not(any(target_os = "linux", target_os = "freebsd", target_os = "macos")))]
#[inline]
pub(crate) fn errno() -> i32 {
    io::Error::last_os_error().raw_os_error().unwrap_or(0)
}

#[inline]
fn last_error() -> io::Error {
    io::Error::from_raw_os_error(errno())
}

pub(crate) fn to_cstring(path: &Path) -> Result<CString> {
    CString::new(path.as_os_str().as_bytes()).map_err(|_| Error::InvalidArgument)
}

fn to_off(pos: u64) -> io::Result<off_t> {
    off_t::try_from(pos).map_err(|_| io::Error::from_raw_os_error(EINVAL))
}

/// Access pattern hint forwarded to the page cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Advice {
    Normal,
    Sequential,
    DontNeed,
}

/// An owned file descriptor, closed exactly once.
///
/// After [`FileHandle::close`] the descriptor is replaced by a sentinel, so a
/// later `close` or the drop is a no-op.
#[derive(Debug)]
pub(crate) struct FileHandle {
    fd: c_int,
}

impl FileHandle {
    pub(crate) const INVALID: c_int = -1;

    pub(crate) fn open(path: &Path, flag: c_int, mode: libc::mode_t) -> Result<Self> {
        let c_path = to_cstring(path)?;
        loop {
            let fd = unsafe { open(c_path.as_ptr(), flag, mode as libc::c_uint) };
            if fd >= 0 {
                return Ok(Self { fd });
            }
            let e = errno();
            if e != EINTR {
                return Err(Error::from_errno(e));
            }
        }
    }

    pub(crate) fn raw(&self) -> c_int {
        self.fd
    }

    pub(crate) fn is_open(&self) -> bool {
        self.fd != Self::INVALID
    }

    pub(crate) fn size(&self) -> Result<u64> {
        unsafe {
            let mut sb: stat = std::mem::zeroed();
            if fstat(self.fd, &mut sb) < 0 {
                return Err(Error::from_errno(errno()));
            }
            Ok(sb.st_size as u64)
        }
    }

    /// one `pread`, EINTR is reported like any other error
    pub(crate) fn pread(&self, buf: &mut [u8], pos: u64) -> io::Result<usize> {
        let off = to_off(pos)?;
        let n = unsafe { pread(self.fd, buf.as_mut_ptr().cast::<c_void>(), buf.len(), off) };
        if n < 0 {
            return Err(last_error());
        }
        Ok(n as usize)
    }

    /// one `preadv` over at most [`IOV_MAX`] entries
    pub(crate) fn preadv(&self, bufs: &mut [IoVecMut<'_>], pos: u64) -> io::Result<usize> {
        let off = to_off(pos)?;
        let cnt = bufs.len().min(IOV_MAX) as c_int;
        let n = unsafe { preadv(self.fd, IoVecMut::as_raw(bufs), cnt, off) };
        if n < 0 {
            return Err(last_error());
        }
        Ok(n as usize)
    }

    /// one `writev` at the descriptor's current position
    pub(crate) fn writev(&self, bufs: &[IoVec<'_>]) -> io::Result<usize> {
        let cnt = bufs.len().min(IOV_MAX) as c_int;
        let n = unsafe { writev(self.fd, IoVec::as_raw(bufs), cnt) };
        if n < 0 {
            return Err(last_error());
        }
        Ok(n as usize)
    }

    /// failures are ignored, the hint never affects correctness
    #[cfg(any(target_os = "linux", target_os = "android", target_os = "freebsd"))]
    pub(crate) fn advise(&self, advice: Advice) {
        let advice = match advice {
            Advice::Normal => libc::POSIX_FADV_NORMAL,
            Advice::Sequential => libc::POSIX_FADV_SEQUENTIAL,
            Advice::DontNeed => libc::POSIX_FADV_DONTNEED,
        };
        let rc = unsafe { libc::posix_fadvise(self.fd, 0, 0, advice) };
        if rc != 0 {
            log::trace!("posix_fadvise fd {} advice {} rc {}", self.fd, advice, rc);
        }
    }

    #[cfg(not(any(target_os = "linux", target_os = "android", target_os = "freebsd")))]
    pub(crate) fn advise(&self, _advice: Advice) {}

    pub(crate) fn close(&mut self) -> Result<()> {
        if !self.is_open() {
            return Ok(());
        }
        // the descriptor is gone even if close reports EINTR, never retry it
        let fd = std::mem::replace(&mut self.fd, Self::INVALID);
        if unsafe { close(fd) } < 0 {
            let e = errno();
            if e != EINTR {
                return Err(Error::from_errno(e));
            }
        }
        Ok(())
    }
}

impl Drop for FileHandle {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::warn!("close fd fail: {e}");
        }
    }
}
