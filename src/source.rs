use std::io;

use crate::{Error, IoVecMut, ReadonlyFile, Result};

/// How a [`FileSource`] holds its file, decides what closing the source does.
#[derive(Debug)]
pub enum FileRef<'a, F> {
    /// the source closes and drops the file
    Owned(F),
    /// the file outlives the source and is left open
    Borrowed(&'a F),
}

/// Sequential reader over a [`ReadonlyFile`].
///
/// Every successful read moves the cursor forward by exactly the bytes it
/// delivered, a failed read leaves it where it was. Moving the source out
/// with [`FileSource::detach`] leaves an empty, non-owning source behind.
#[derive(Debug)]
pub struct FileSource<'a, F: ReadonlyFile> {
    file: Option<FileRef<'a, F>>,
    offset: u64,
}

impl<'a, F: ReadonlyFile> FileSource<'a, F> {
    pub fn new(file: FileRef<'a, F>) -> Self {
        Self::with_offset(file, 0)
    }

    pub fn with_offset(file: FileRef<'a, F>, offset: u64) -> Self {
        Self {
            file: Some(file),
            offset,
        }
    }

    pub fn owned(file: F) -> Self {
        Self::new(FileRef::Owned(file))
    }

    pub fn borrowed(file: &'a F) -> Self {
        Self::new(FileRef::Borrowed(file))
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn is_owned(&self) -> bool {
        matches!(self.file, Some(FileRef::Owned(_)))
    }

    pub fn file(&self) -> Option<&F> {
        match self.file.as_ref()? {
            FileRef::Owned(f) => Some(f),
            FileRef::Borrowed(f) => Some(*f),
        }
    }

    /// Read at the cursor and advance it. An empty source fails with
    /// [`Error::InvalidArgument`].
    pub fn read_some(&mut self, bufs: &mut [IoVecMut<'_>]) -> Result<usize> {
        let file = self.file().ok_or(Error::InvalidArgument)?;
        let n = file.read(self.offset, bufs)?;
        self.offset += n as u64;
        Ok(n)
    }

    /// Close an owned file, a borrowed one is only released. A close error
    /// is logged, the file is gone either way.
    pub fn close(&mut self) {
        if let Some(FileRef::Owned(mut f)) = self.file.take() {
            if let Err(e) = f.close() {
                log::warn!("error closing a file: {e}");
            }
        }
    }

    /// move the file and cursor out, leaving an empty source behind
    pub fn detach(&mut self) -> Self {
        std::mem::take(self)
    }

    /// close the current file if owned, then adopt `other`'s file and cursor
    pub fn replace(&mut self, other: Self) {
        self.close();
        *self = other;
    }
}

impl<F: ReadonlyFile> Default for FileSource<'_, F> {
    fn default() -> Self {
        Self {
            file: None,
            offset: 0,
        }
    }
}

impl<F: ReadonlyFile> Drop for FileSource<'_, F> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<F: ReadonlyFile> io::Read for FileSource<'_, F> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        Ok(self.read_some(&mut [IoVecMut::new(buf)])?)
    }

    fn read_vectored(&mut self, bufs: &mut [io::IoSliceMut<'_>]) -> io::Result<usize> {
        let mut v: Vec<IoVecMut<'_>> = bufs.iter_mut().map(|b| IoVecMut::new(b)).collect();
        Ok(self.read_some(&mut v)?)
    }
}
