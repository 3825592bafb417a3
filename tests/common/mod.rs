#![allow(dead_code)]

use fileio::RandomPath;
use std::path::Path;

pub struct TestEnv {
    root: RandomPath,
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl TestEnv {
    pub fn new() -> Self {
        logger::Logger::init().add_console();
        Self {
            root: RandomPath::tmp(),
        }
    }

    /// a scratch file already holding `data`
    pub fn with_content(data: &[u8]) -> Self {
        let env = Self::new();
        std::fs::write(env.path(), data).expect("can't write fixture");
        env
    }

    pub fn path(&self) -> &Path {
        self.root.as_path()
    }

    pub fn content(&self) -> Vec<u8> {
        std::fs::read(self.path()).expect("can't read back")
    }
}

/// deterministic non-repeating-ish bytes
pub fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 + 7) as u8 ^ (i >> 8) as u8).collect()
}

pub fn is_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}
