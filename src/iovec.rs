use std::{
    fmt,
    marker::PhantomData,
    ops::{Deref, DerefMut},
    slice,
};

use libc::{c_void, iovec};

/// A gather entry: one read-only region of a buffer list handed to `writev`.
///
/// The layout is identical to the OS `struct iovec`, a `&[IoVec]` is passed to
/// the kernel as is.
#[repr(transparent)]
#[derive(Clone, Copy)]
pub struct IoVec<'a> {
    raw: iovec,
    _marker: PhantomData<&'a [u8]>,
}

/// A scatter entry: one writable region of a buffer list filled by `preadv`.
#[repr(transparent)]
pub struct IoVecMut<'a> {
    raw: iovec,
    _marker: PhantomData<&'a mut [u8]>,
}

unsafe impl Send for IoVec<'_> {}
unsafe impl Sync for IoVec<'_> {}
unsafe impl Send for IoVecMut<'_> {}
unsafe impl Sync for IoVecMut<'_> {}

impl<'a> IoVec<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            raw: iovec {
                iov_base: buf.as_ptr() as *mut c_void,
                iov_len: buf.len(),
            },
            _marker: PhantomData,
        }
    }

    /// sum of all entry lengths, the logical length of the list
    pub fn total_len(bufs: &[Self]) -> usize {
        bufs.iter().map(|x| x.raw.iov_len).sum()
    }

    /// drop the first `n` bytes of this entry
    pub(crate) fn advance(&mut self, n: usize) {
        assert!(n <= self.raw.iov_len, "advance {n} past end {}", self.raw.iov_len);
        self.raw.iov_base = unsafe { self.raw.iov_base.cast::<u8>().add(n).cast() };
        self.raw.iov_len -= n;
    }

    pub fn as_slice(&self) -> &'a [u8] {
        unsafe { slice::from_raw_parts(self.raw.iov_base.cast::<u8>(), self.raw.iov_len) }
    }

    pub(crate) fn as_raw(bufs: &[Self]) -> *const iovec {
        bufs.as_ptr().cast::<iovec>()
    }
}

impl<'a> IoVecMut<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self {
            raw: iovec {
                iov_base: buf.as_mut_ptr().cast::<c_void>(),
                iov_len: buf.len(),
            },
            _marker: PhantomData,
        }
    }

    pub fn total_len(bufs: &[Self]) -> usize {
        bufs.iter().map(|x| x.raw.iov_len).sum()
    }

    pub fn as_slice(&self) -> &[u8] {
        unsafe { slice::from_raw_parts(self.raw.iov_base.cast::<u8>(), self.raw.iov_len) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        unsafe { slice::from_raw_parts_mut(self.raw.iov_base.cast::<u8>(), self.raw.iov_len) }
    }

    pub(crate) fn as_raw(bufs: &[Self]) -> *const iovec {
        bufs.as_ptr().cast::<iovec>()
    }
}

impl<'a> From<&'a [u8]> for IoVec<'a> {
    fn from(buf: &'a [u8]) -> Self {
        Self::new(buf)
    }
}

impl<'a> From<&'a mut [u8]> for IoVecMut<'a> {
    fn from(buf: &'a mut [u8]) -> Self {
        Self::new(buf)
    }
}

impl Deref for IoVec<'_> {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl Deref for IoVecMut<'_> {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl DerefMut for IoVecMut<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.as_mut_slice()
    }
}

impl fmt::Debug for IoVec<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IoVec")
            .field("len", &self.raw.iov_len)
            .finish()
    }
}

impl fmt::Debug for IoVecMut<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IoVecMut")
            .field("len", &self.raw.iov_len)
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::{IoVec, IoVecMut};

    #[test]
    fn layout() {
        assert_eq!(size_of::<IoVec>(), size_of::<libc::iovec>());
        assert_eq!(size_of::<IoVecMut>(), size_of::<libc::iovec>());
    }

    #[test]
    fn advance() {
        let data = b"foobar";
        let mut v = IoVec::new(data);
        assert_eq!(IoVec::total_len(&[v, IoVec::new(b"baz")]), 9);
        v.advance(2);
        assert_eq!(v.as_slice(), b"obar");
        v.advance(4);
        assert!(v.is_empty());
    }

    #[test]
    fn scatter_view() {
        let mut a = [0u8; 3];
        let mut b = [0u8; 2];
        {
            let mut bufs = [IoVecMut::new(&mut a), IoVecMut::new(&mut b)];
            assert_eq!(IoVecMut::total_len(&bufs), 5);
            bufs[0].as_mut_slice().copy_from_slice(b"abc");
            bufs[1][1] = b'z';
        }
        assert_eq!(&a, b"abc");
        assert_eq!(&b, b"\0z");
    }
}
