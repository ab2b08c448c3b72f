//! Allocation-free log sink for hook context.
//!
//! Hooks cannot use an ordinary logging stack: formatting must not
//! allocate (hooks run inside `malloc`-adjacent code paths of the hosted
//! program) and output must not travel through an intercepted function.
//! Messages land in a fixed ring buffer; when debug output is enabled they
//! are mirrored to stderr through a raw `write` syscall, which cannot
//! re-enter a hook.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Log category tags, one per interception subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// Dynamic-loader hooks (`dlopen`/`dlsym`).
    Hook,
    /// File lifecycle and read/write hooks.
    FileIo,
}

impl Category {
    pub fn tag(self) -> &'static str {
        match self {
            Category::Hook => "HOOK",
            Category::FileIo => "FILEIO",
        }
    }
}

pub(crate) const LOG_BUF_SIZE: usize = 64 * 1024;

pub struct LogSink {
    buffer: UnsafeCell<[u8; LOG_BUF_SIZE]>,
    head: AtomicUsize,
}

// Concurrent appenders reserve disjoint ranges through `head`; two writers
// lapping each other can interleave bytes, which is acceptable for a
// diagnostic ring.
unsafe impl Sync for LogSink {}

pub static LOGGER: LogSink = LogSink::new();

impl LogSink {
    pub const fn new() -> Self {
        Self {
            buffer: UnsafeCell::new([0u8; LOG_BUF_SIZE]),
            head: AtomicUsize::new(0),
        }
    }

    /// Append a message to the ring and mirror it to stderr when debug
    /// output is on. Safe to call at any point in process life, including
    /// before main-line initialization.
    pub fn log(&self, msg: &str) {
        let len = msg.len();
        if len > LOG_BUF_SIZE {
            return;
        }

        let start = self.head.fetch_add(len, Ordering::SeqCst);
        let base = self.buffer.get() as *mut u8;
        for (i, byte) in msg.bytes().enumerate() {
            unsafe {
                *base.add((start + i) % LOG_BUF_SIZE) = byte;
            }
        }

        if moviola_config::debug_output() {
            raw_stderr_write(msg.as_bytes());
        }
    }

    /// Post-mortem escape hatch: dump the ring to /tmp.
    pub fn dump_to_file(&self) {
        let pid = unsafe { libc::getpid() };
        let path = format!("/tmp/moviola-shim-{}.log", pid);
        if let Ok(mut f) = std::fs::File::create(&path) {
            use std::io::Write;
            let buffer = unsafe { &*self.buffer.get() };
            let head = self.head.load(Ordering::SeqCst);
            if head > LOG_BUF_SIZE {
                let start = head % LOG_BUF_SIZE;
                let _ = f.write_all(&buffer[start..]);
                let _ = f.write_all(&buffer[..start]);
            } else {
                let _ = f.write_all(&buffer[..head]);
            }
        }
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new()
    }
}

/// stderr through the raw syscall: never resolves a symbol, never lands in
/// a hook.
fn raw_stderr_write(bytes: &[u8]) {
    unsafe {
        libc::syscall(libc::SYS_write, 2, bytes.as_ptr(), bytes.len());
    }
}

/// Stack-based formatting target so hook logging never heap-allocates.
pub struct StackWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> StackWriter<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.buf[..self.pos]).unwrap_or("")
    }
}

impl std::fmt::Write for StackWriter<'_> {
    fn write_str(&mut self, s: &str) -> std::fmt::Result {
        let bytes = s.as_bytes();
        let remaining = self.buf.len() - self.pos;
        let to_copy = std::cmp::min(bytes.len(), remaining);
        self.buf[self.pos..self.pos + to_copy].copy_from_slice(&bytes[..to_copy]);
        self.pos += to_copy;
        Ok(())
    }
}
