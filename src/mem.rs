use std::os::fd::RawFd;

use crate::{IoVec, Result, WriteFile};

/// Accumulates everything written to it, never writes short.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MemFile {
    val: Vec<u8>,
}

impl MemFile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> &[u8] {
        &self.val
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.val
    }
}

impl WriteFile for MemFile {
    fn write(&mut self, bufs: &[IoVec<'_>]) -> Result<usize> {
        let mut res = 0;
        for b in bufs {
            self.val.extend_from_slice(b);
            res += b.len();
        }
        Ok(res)
    }

    fn handle(&self) -> RawFd {
        -1
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}
