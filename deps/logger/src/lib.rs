use log::{LevelFilter, Metadata, Record};
use std::cell::OnceCell;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

thread_local! {
    static G_TID: OnceCell<i32> = const { OnceCell::new() };
}
#[cfg(not(target_os = "linux"))]
static G_ID: std::sync::atomic::AtomicI32 = std::sync::atomic::AtomicI32::new(1);

static G_LOGGER: OnceLock<Logger> = OnceLock::new();

const G_CONSOLE: &str = "console";
const G_FILE: &str = "file";
const G_CAPTURE: &str = "capture";

#[cfg(target_os = "linux")]
fn get_tid() -> i32 {
    G_TID.with(|x| *x.get_or_init(|| unsafe { libc::gettid() }))
}

#[cfg(not(target_os = "linux"))]
fn get_tid() -> i32 {
    use std::sync::atomic::Ordering::Relaxed;
    G_TID.with(|x| *x.get_or_init(|| G_ID.fetch_add(1, Relaxed)))
}

trait Sink: Send {
    fn sink(&mut self, line: &str);

    fn flush(&mut self);

    fn name(&self) -> &'static str;
}

struct Console;

impl Sink for Console {
    fn sink(&mut self, line: &str) {
        let _ = std::io::stdout().write_all(line.as_bytes());
    }

    fn flush(&mut self) {
        let _ = std::io::stdout().flush();
    }

    fn name(&self) -> &'static str {
        G_CONSOLE
    }
}

/// NOTE: file rolling is not support at present
struct File {
    w: std::fs::File,
}

impl File {
    fn new(path: impl AsRef<Path>, trunc: bool) -> Result<Self, std::io::Error> {
        let mut ops = std::fs::File::options();
        ops.write(true).create(true);
        if trunc {
            ops.truncate(true);
        } else {
            ops.append(true);
        }
        ops.open(path).map(|w| Self { w })
    }
}

impl Sink for File {
    fn sink(&mut self, line: &str) {
        let _ = self.w.write_all(line.as_bytes());
    }

    fn flush(&mut self) {
        let _ = self.w.flush();
    }

    fn name(&self) -> &'static str {
        G_FILE
    }
}

struct Memory {
    lines: Arc<Mutex<Vec<String>>>,
}

impl Sink for Memory {
    fn sink(&mut self, line: &str) {
        lock(&self.lines).push(line.to_string());
    }

    fn flush(&mut self) {}

    fn name(&self) -> &'static str {
        G_CAPTURE
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

/// Lines recorded since the capture sink was installed, shared by every
/// caller of [`Logger::capture`].
#[derive(Clone)]
pub struct Capture {
    lines: Arc<Mutex<Vec<String>>>,
}

impl Capture {
    pub fn lines(&self) -> Vec<String> {
        lock(&self.lines).clone()
    }

    pub fn contains(&self, pat: &str) -> bool {
        lock(&self.lines).iter().any(|x| x.contains(pat))
    }
}

/// a simple sync logger which impl log::Log
pub struct Logger {
    sinks: Mutex<Vec<Box<dyn Sink>>>,
    captured: Arc<Mutex<Vec<String>>>,
}

impl log::Log for Logger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        let s = format!(
            "{} {} [{}] {}:{} {}\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S.%6f"),
            get_tid(),
            record.level().as_str(),
            record.file().unwrap_or("?"),
            record.line().unwrap_or(0),
            record.args()
        );
        for p in lock(&self.sinks).iter_mut() {
            p.sink(&s);
        }
    }

    fn flush(&self) {
        for p in lock(&self.sinks).iter_mut() {
            p.flush();
        }
    }
}

impl Logger {
    /// install the global logger once, later calls return the same instance
    pub fn init() -> &'static Self {
        let mut fresh = false;
        let l = G_LOGGER.get_or_init(|| {
            fresh = true;
            Logger {
                sinks: Mutex::new(Vec::new()),
                captured: Arc::new(Mutex::new(Vec::new())),
            }
        });
        if fresh && log::set_logger(l).is_ok() {
            log::set_max_level(LevelFilter::Trace);
        }
        l
    }

    fn add(&self, name: &'static str, make: impl FnOnce() -> Option<Box<dyn Sink>>) -> bool {
        let mut sinks = lock(&self.sinks);
        if sinks.iter().any(|x| x.name() == name) {
            return true;
        }
        match make() {
            Some(s) => {
                sinks.push(s);
                true
            }
            None => false,
        }
    }

    pub fn add_console(&self) -> &Self {
        self.add(G_CONSOLE, || Some(Box::new(Console) as Box<dyn Sink>));
        self
    }

    pub fn add_file(&self, path: impl AsRef<Path>, trunc: bool) -> Option<&Self> {
        let ok = self.add(G_FILE, || match File::new(&path, trunc) {
            Ok(f) => Some(Box::new(f) as Box<dyn Sink>),
            Err(e) => {
                eprintln!("can't open {:?}, error {}", path.as_ref(), e);
                None
            }
        });
        ok.then_some(self)
    }

    /// start recording log lines in memory
    pub fn capture(&self) -> Capture {
        let lines = self.captured.clone();
        self.add(G_CAPTURE, || {
            Some(Box::new(Memory {
                lines: lines.clone(),
            }) as Box<dyn Sink>)
        });
        Capture { lines }
    }

    fn remove_impl(&self, name: &'static str) {
        lock(&self.sinks).retain(|x| x.name() != name);
    }

    pub fn remove_file(&self) {
        self.remove_impl(G_FILE);
    }

    pub fn remove_console(&self) {
        self.remove_impl(G_CONSOLE);
    }
}
