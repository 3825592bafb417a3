//! Positional reads that hide partial transfers and signal interruption.
//!
//! A read either fills every buffer, stops short because end of file was
//! reached, or fails. Bytes delivered before a hard error are not reported.

use std::io::{self, ErrorKind};

use libc::EINVAL;

use crate::{unix::FileHandle, IoVecMut};

/// The raw positional syscalls the read loops are built on. Each call is a
/// single attempt: EINTR and short counts are returned to the caller.
pub trait PositionalRead {
    fn pread(&self, buf: &mut [u8], pos: u64) -> io::Result<usize>;

    fn preadv(&self, bufs: &mut [IoVecMut<'_>], pos: u64) -> io::Result<usize>;
}

impl PositionalRead for FileHandle {
    fn pread(&self, buf: &mut [u8], pos: u64) -> io::Result<usize> {
        FileHandle::pread(self, buf, pos)
    }

    fn preadv(&self, bufs: &mut [IoVecMut<'_>], pos: u64) -> io::Result<usize> {
        FileHandle::preadv(self, bufs, pos)
    }
}

/// Fill `buf` starting at `pos`, returns less than `buf.len()` only at end of
/// file.
pub fn read_all<R>(r: &R, buf: &mut [u8], mut pos: u64) -> io::Result<usize>
where
    R: PositionalRead + ?Sized,
{
    debug_assert!(!buf.is_empty());
    let mut sz = 0;
    while sz < buf.len() {
        match r.pread(&mut buf[sz..], pos) {
            Ok(0) => break,
            Ok(n) => {
                sz += n;
                pos += n as u64;
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(sz)
}

/// Fill `bufs` in order starting at `pos`.
///
/// A short `preadv` may stop in the middle of an entry, that entry is
/// finished with [`read_all`] before the remaining entries are submitted
/// again. Empty entries are skipped. The result is smaller than the total
/// length of `bufs` only when end of file was hit, entries past that point are
/// left untouched.
pub fn read_vectored<R>(r: &R, mut bufs: &mut [IoVecMut<'_>], pos: u64) -> io::Result<usize>
where
    R: PositionalRead + ?Sized,
{
    debug_assert!(!bufs.is_empty());
    let mut total = 0usize;

    loop {
        // a window made only of empty entries would read 0 and look like eof
        let empty = bufs.iter().take_while(|x| x.is_empty()).count();
        bufs = &mut std::mem::take(&mut bufs)[empty..];
        if bufs.is_empty() {
            break;
        }

        let mut n = match r.preadv(bufs, pos + total as u64) {
            Ok(0) => return Ok(total),
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        total += n;

        // pass through all completed entries
        let mut done = 0;
        while done < bufs.len() && bufs[done].len() <= n {
            n -= bufs[done].len();
            done += 1;
        }
        bufs = &mut std::mem::take(&mut bufs)[done..];

        if n > 0 {
            let Some((cur, rest)) = std::mem::take(&mut bufs).split_first_mut() else {
                // the kernel never returns more than it was given
                return Err(io::Error::from_raw_os_error(EINVAL));
            };
            let want = cur.len() - n;
            let got = read_all(r, &mut cur.as_mut_slice()[n..], pos + total as u64)?;
            total += got;
            if got < want {
                return Ok(total);
            }
            bufs = rest;
        }
    }

    Ok(total)
}
