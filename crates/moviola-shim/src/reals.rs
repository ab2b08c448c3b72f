//! Cached real implementations of every hooked libc function, plus their
//! signatures. `dlopen`/`dlsym` live in `resolve` (bootstrap case).

use libc::{c_char, c_int, c_void, mode_t, off_t, size_t, ssize_t, FILE};

use crate::resolve::RealSymbol;

// stdio
pub static REAL_FOPEN: RealSymbol = RealSymbol::new(c"fopen");
pub static REAL_FOPEN64: RealSymbol = RealSymbol::new(c"fopen64");
pub static REAL_FCLOSE: RealSymbol = RealSymbol::new(c"fclose");
pub static REAL_FWRITE: RealSymbol = RealSymbol::new(c"fwrite");
pub static REAL_FPUTC: RealSymbol = RealSymbol::new(c"fputc");
pub static REAL_PUTC: RealSymbol = RealSymbol::new(c"putc");
pub static REAL_VFPRINTF: RealSymbol = RealSymbol::new(c"vfprintf");

// POSIX file I/O
pub static REAL_OPEN: RealSymbol = RealSymbol::new(c"open");
pub static REAL_OPEN64: RealSymbol = RealSymbol::new(c"open64");
pub static REAL_OPENAT: RealSymbol = RealSymbol::new(c"openat");
pub static REAL_OPENAT64: RealSymbol = RealSymbol::new(c"openat64");
pub static REAL_CREAT: RealSymbol = RealSymbol::new(c"creat");
pub static REAL_CREAT64: RealSymbol = RealSymbol::new(c"creat64");
pub static REAL_CLOSE: RealSymbol = RealSymbol::new(c"close");
pub static REAL_WRITE: RealSymbol = RealSymbol::new(c"write");
pub static REAL_PWRITE: RealSymbol = RealSymbol::new(c"pwrite");
pub static REAL_PWRITE64: RealSymbol = RealSymbol::new(c"pwrite64");
pub static REAL_RENAME: RealSymbol = RealSymbol::new(c"rename");
pub static REAL_UNLINK: RealSymbol = RealSymbol::new(c"unlink");
pub static REAL_REMOVE: RealSymbol = RealSymbol::new(c"remove");

pub type FopenFn = unsafe extern "C" fn(*const c_char, *const c_char) -> *mut FILE;
pub type FcloseFn = unsafe extern "C" fn(*mut FILE) -> c_int;
pub type FwriteFn = unsafe extern "C" fn(*const c_void, size_t, size_t, *mut FILE) -> size_t;
pub type FputcFn = unsafe extern "C" fn(c_int, *mut FILE) -> c_int;
pub type OpenFn = unsafe extern "C" fn(*const c_char, c_int, mode_t) -> c_int;
pub type OpenatFn = unsafe extern "C" fn(c_int, *const c_char, c_int, mode_t) -> c_int;
pub type CreatFn = unsafe extern "C" fn(*const c_char, mode_t) -> c_int;
pub type CloseFn = unsafe extern "C" fn(c_int) -> c_int;
pub type WriteFn = unsafe extern "C" fn(c_int, *const c_void, size_t) -> ssize_t;
pub type PwriteFn = unsafe extern "C" fn(c_int, *const c_void, size_t, off_t) -> ssize_t;
pub type RenameFn = unsafe extern "C" fn(*const c_char, *const c_char) -> c_int;
pub type UnlinkFn = unsafe extern "C" fn(*const c_char) -> c_int;
