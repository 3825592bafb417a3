use std::{
    cell::RefCell,
    ops::{Deref, Range},
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering::Relaxed},
};

use rand::{rngs::ThreadRng, Rng};

thread_local! {
    static G_RAND: RefCell<ThreadRng> = RefCell::new(rand::thread_rng());
}

pub(crate) fn rand_range(range: Range<usize>) -> usize {
    G_RAND.with_borrow_mut(|x| x.gen_range(range))
}

/// A path that doesn't exist yet, unique within the process. With
/// [`RandomPath::tmp`] whatever ends up there is removed on drop.
pub struct RandomPath {
    path: PathBuf,
    del: bool,
}

impl RandomPath {
    const PREFIX: &'static str = "fileio_tmp_";

    fn gen_path(root: &Path) -> PathBuf {
        static SEQ: AtomicU64 = AtomicU64::new(0);
        loop {
            let r = rand_range(1000..1000000);
            let p = root.join(format!(
                "{}{}_{}_{}",
                Self::PREFIX,
                std::process::id(),
                SEQ.fetch_add(1, Relaxed),
                r
            ));
            if !crate::exists(&p) {
                return p;
            }
        }
    }

    /// under the system temp dir, removed on drop
    pub fn tmp() -> Self {
        Self {
            path: Self::gen_path(&std::env::temp_dir()),
            del: true,
        }
    }

    /// under the system temp dir, kept on drop
    pub fn new() -> Self {
        Self {
            path: Self::gen_path(&std::env::temp_dir()),
            del: false,
        }
    }

    pub fn from_root<P: AsRef<Path>>(root: P) -> Self {
        Self {
            path: Self::gen_path(root.as_ref()),
            del: false,
        }
    }

    pub fn unlink(&self) {
        if self.path.is_dir() {
            let _ = std::fs::remove_dir_all(&self.path);
        } else {
            crate::delete(&self.path);
        }
    }
}

impl Default for RandomPath {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for RandomPath {
    type Target = PathBuf;

    fn deref(&self) -> &Self::Target {
        &self.path
    }
}

impl AsRef<Path> for RandomPath {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}

impl Drop for RandomPath {
    fn drop(&mut self) {
        if self.del {
            self.unlink();
        }
    }
}
