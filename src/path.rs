use std::path::Path;

use libc::{access, unlink, F_OK};

use crate::unix::to_cstring;

/// true if `path` can be resolved, it may still be unreadable
pub fn exists<P: AsRef<Path>>(path: P) -> bool {
    match to_cstring(path.as_ref()) {
        Ok(p) => unsafe { access(p.as_ptr(), F_OK) == 0 },
        Err(_) => false,
    }
}

/// true if `path` was unlinked
pub fn delete<P: AsRef<Path>>(path: P) -> bool {
    let path = path.as_ref();
    match to_cstring(path) {
        Ok(p) => {
            let ok = unsafe { unlink(p.as_ptr()) == 0 };
            if !ok {
                log::trace!("unlink {path:?} fail: {}", std::io::Error::last_os_error());
            }
            ok
        }
        Err(_) => false,
    }
}
