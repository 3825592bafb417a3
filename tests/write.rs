mod common;

use common::{pattern, TestEnv};
use fileio::{
    open_read, open_write, Error, IoVec, LocalWriteFile, ReadOptions, ReadonlyFile, WriteFile,
    WriteOptions,
};
use libc::EBADF;
use std::os::unix::fs::PermissionsExt;

#[test]
fn truncate_then_read_back() {
    let env = TestEnv::with_content(b"previous content");
    let mut w = open_write(env.path(), &WriteOptions::default()).unwrap();
    assert!(!w.is_append());
    assert_eq!(w.path(), env.path());

    let n = w.write(&[IoVec::new(b"AB"), IoVec::new(b"CDE")]).unwrap();
    assert_eq!(n, 5);
    w.close().unwrap();

    let f = open_read(env.path(), &ReadOptions::default()).unwrap();
    assert_eq!(f.size(), 5);
    let mut buf = [0u8; 8];
    assert_eq!(f.read_at(0, &mut buf).unwrap(), 5);
    assert_eq!(&buf[..5], b"ABCDE");
}

#[test]
fn append_keeps_content() {
    let env = TestEnv::new();
    let mut w = open_write(env.path(), &WriteOptions::default()).unwrap();
    w.write(&[IoVec::new(b"AB")]).unwrap();
    drop(w);

    let mut w = LocalWriteFile::options().append(true).open(env.path()).unwrap();
    assert!(w.is_append());
    w.write(&[IoVec::new(b"C"), IoVec::new(b"DE")]).unwrap();
    w.write(&[IoVec::new(b"F")]).unwrap();
    drop(w);

    assert_eq!(env.content(), b"ABCDEF");
}

#[test]
fn sequential_writes_follow_position() {
    let env = TestEnv::new();
    let mut w = open_write(env.path(), &WriteOptions::default()).unwrap();
    for part in [&b"12"[..], b"345", b"6789"] {
        assert_eq!(w.write(&[IoVec::new(part)]).unwrap(), part.len());
    }
    w.close().unwrap();
    assert_eq!(env.content(), b"123456789");
}

#[test]
fn empty_write_is_noop() {
    let env = TestEnv::new();
    let mut w = open_write(env.path(), &WriteOptions::default()).unwrap();
    assert_eq!(w.write(&[]).unwrap(), 0);
    assert_eq!(w.write(&[IoVec::new(b"")]).unwrap(), 0);
    w.close().unwrap();
    assert!(env.content().is_empty());
}

#[test]
fn short_write_is_surfaced() {
    let data = pattern(2000);
    let env = TestEnv::new();
    let mut w = open_write(env.path(), &WriteOptions::default()).unwrap();
    let bufs: Vec<IoVec> = data.chunks(1).map(IoVec::new).collect();

    // one writev never takes more entries than the kernel accepts per call
    let n = w.write(&bufs).unwrap();
    assert!(n > 0);
    assert!(n < data.len());
    w.close().unwrap();
    assert_eq!(env.content(), &data[..n]);
}

#[test]
fn write_all_finishes_the_rest() {
    let data = pattern(5000);
    let env = TestEnv::new();
    let mut w = open_write(env.path(), &WriteOptions::default()).unwrap();
    let mut bufs: Vec<IoVec> = data.chunks(3).map(IoVec::new).collect();
    w.write_all(&mut bufs).unwrap();
    w.close().unwrap();
    assert_eq!(env.content(), data);
}

#[test]
fn creation_mode() {
    let env = TestEnv::new();
    let w = open_write(env.path(), &WriteOptions::default()).unwrap();
    drop(w);
    let mode = std::fs::metadata(env.path()).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode & 0o600, 0o600);
    assert_eq!(mode & 0o111, 0);
    assert_eq!(mode & !(fileio::CREATE_MODE as u32), 0);
}

#[test]
fn open_errors() {
    let env = TestEnv::new();
    let r = open_write(env.path().join("no_such_dir").join("f"), &WriteOptions::default());
    assert!(matches!(r, Err(Error::NotFound)));

    let r = open_write("bad\0name", &WriteOptions::default());
    assert!(matches!(r, Err(Error::InvalidArgument)));

    if !common::is_root() {
        std::fs::write(env.path(), b"x").unwrap();
        std::fs::set_permissions(env.path(), std::fs::Permissions::from_mode(0o444)).unwrap();
        let r = open_write(env.path(), &WriteOptions::default());
        assert!(matches!(r, Err(Error::PermissionDenied)));
    }
}

#[test]
fn close_is_idempotent() {
    let env = TestEnv::new();
    let mut w = open_write(env.path(), &WriteOptions::default()).unwrap();
    assert!(w.handle() >= 0);
    w.close().unwrap();
    assert_eq!(w.handle(), -1);
    w.close().unwrap();

    let r = w.write(&[IoVec::new(b"late")]);
    assert!(matches!(r, Err(ref e) if e.raw_os_error() == Some(EBADF)));
    assert!(env.content().is_empty());
}

#[test]
fn boxed_writer() {
    let env = TestEnv::new();
    let w = open_write(env.path(), &WriteOptions::default()).unwrap();
    let fd = w.handle();
    let mut w: Box<dyn WriteFile> = Box::new(w);
    assert_eq!(w.handle(), fd);
    assert!(fd >= 0);
    w.write_all(&mut [IoVec::new(b"boxed")]).unwrap();
    w.close().unwrap();
    assert_eq!(w.handle(), -1);
    assert_eq!(env.content(), b"boxed");
}
