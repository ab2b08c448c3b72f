//! POSIX file-descriptor hooks: the `open` family, `close`, the `write`
//! family, and the name-space operations `rename`/`unlink`/`remove`.
//!
//! The variadic `open` entry points live in the C bridge
//! (`src/c/variadic_bridge.c`); it extracts the optional `mode_t` and
//! forwards to the fixed-arity `moviola_*_hook` exports here. Everything
//! else is exported directly.

use std::ffi::CStr;

use libc::{c_char, c_int, c_void, mode_t, off_t, size_t, ssize_t};
use moviola_vfs::{is_native, registry, Disposition, NativeGuard};

use crate::logsink::Category;
use crate::reals::{
    CloseFn, CreatFn, OpenFn, OpenatFn, PwriteFn, RenameFn, UnlinkFn, WriteFn, REAL_CLOSE,
    REAL_CREAT, REAL_CREAT64, REAL_OPEN, REAL_OPEN64, REAL_OPENAT, REAL_OPENAT64, REAL_PWRITE,
    REAL_PWRITE64, REAL_REMOVE, REAL_RENAME, REAL_UNLINK, REAL_WRITE,
};
use crate::resolve::RealSymbol;

unsafe fn cstr(ptr: *const c_char) -> Option<&'static str> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok()
}

fn set_errno(err: c_int) {
    unsafe {
        *libc::__errno_location() = err;
    }
}

/// Shared body of the `open`/`open64` pair.
unsafe fn open_common(real_sym: &RealSymbol, file: *const c_char, oflag: c_int, mode: mode_t) -> c_int {
    let Some(real) = real_fn!(real_sym, OpenFn) else {
        return -1;
    };
    if is_native() {
        return real(file, oflag, mode);
    }
    let _guard = NativeGuard::new();

    let path = cstr(file);
    if let Some(p) = path {
        hook_log!(Category::FileIo, "open call with file {} and flag {:#x}", p, oflag);
        // A tombstoned save file reads as absent until something recreates it.
        if moviola_config::prevent_savefiles()
            && registry().contains(p)
            && registry().is_removed(p)
            && oflag & libc::O_CREAT == 0
        {
            set_errno(libc::ENOENT);
            return -1;
        }
    }

    let fd = real(file, oflag, mode);
    if fd >= 0 {
        if let Some(p) = path {
            if registry().is_save_file_flags(p, oflag) {
                registry().adopt_fd(p, oflag, fd);
            }
        }
    }
    fd
}

#[no_mangle]
pub unsafe extern "C" fn moviola_open_hook(file: *const c_char, oflag: c_int, mode: mode_t) -> c_int {
    open_common(&REAL_OPEN, file, oflag, mode)
}

#[no_mangle]
pub unsafe extern "C" fn moviola_open64_hook(file: *const c_char, oflag: c_int, mode: mode_t) -> c_int {
    open_common(&REAL_OPEN64, file, oflag, mode)
}

unsafe fn openat_common(
    real_sym: &RealSymbol,
    dirfd: c_int,
    file: *const c_char,
    oflag: c_int,
    mode: mode_t,
) -> c_int {
    let Some(real) = real_fn!(real_sym, OpenatFn) else {
        return -1;
    };
    if is_native() {
        return real(dirfd, file, oflag, mode);
    }
    let _guard = NativeGuard::new();

    // Paths relative to an arbitrary directory fd cannot be canonicalized
    // here; only absolute and cwd-relative spellings participate in save
    // tracking.
    let path = cstr(file).filter(|p| p.starts_with('/') || dirfd == libc::AT_FDCWD);
    if let Some(p) = path {
        hook_log!(Category::FileIo, "openat call with file {} and flag {:#x}", p, oflag);
        if moviola_config::prevent_savefiles()
            && registry().contains(p)
            && registry().is_removed(p)
            && oflag & libc::O_CREAT == 0
        {
            set_errno(libc::ENOENT);
            return -1;
        }
    }

    let fd = real(dirfd, file, oflag, mode);
    if fd >= 0 {
        if let Some(p) = path {
            if registry().is_save_file_flags(p, oflag) {
                registry().adopt_fd(p, oflag, fd);
            }
        }
    }
    fd
}

#[no_mangle]
pub unsafe extern "C" fn moviola_openat_hook(
    dirfd: c_int,
    file: *const c_char,
    oflag: c_int,
    mode: mode_t,
) -> c_int {
    openat_common(&REAL_OPENAT, dirfd, file, oflag, mode)
}

#[no_mangle]
pub unsafe extern "C" fn moviola_openat64_hook(
    dirfd: c_int,
    file: *const c_char,
    oflag: c_int,
    mode: mode_t,
) -> c_int {
    openat_common(&REAL_OPENAT64, dirfd, file, oflag, mode)
}

unsafe fn creat_common(real_sym: &RealSymbol, file: *const c_char, mode: mode_t) -> c_int {
    let Some(real) = real_fn!(real_sym, CreatFn) else {
        return -1;
    };
    if is_native() {
        return real(file, mode);
    }
    let _guard = NativeGuard::new();

    let path = cstr(file);
    if let Some(p) = path {
        hook_log!(Category::FileIo, "creat call with file {}", p);
    }

    let fd = real(file, mode);
    if fd >= 0 {
        if let Some(p) = path {
            // creat is open with O_WRONLY | O_CREAT | O_TRUNC.
            let oflag = libc::O_WRONLY | libc::O_CREAT | libc::O_TRUNC;
            if registry().is_save_file_flags(p, oflag) {
                registry().adopt_fd(p, oflag, fd);
            }
        }
    }
    fd
}

#[no_mangle]
pub unsafe extern "C" fn creat(file: *const c_char, mode: mode_t) -> c_int {
    creat_common(&REAL_CREAT, file, mode)
}

#[no_mangle]
pub unsafe extern "C" fn creat64(file: *const c_char, mode: mode_t) -> c_int {
    creat_common(&REAL_CREAT64, file, mode)
}

#[no_mangle]
pub unsafe extern "C" fn close(fd: c_int) -> c_int {
    let Some(real) = real_fn!(&REAL_CLOSE, CloseFn) else {
        return -1;
    };
    if is_native() {
        return real(fd);
    }
    let _guard = NativeGuard::new();

    hook_log!(Category::FileIo, "close call with fd {}", fd);
    let rc = real(fd);
    if rc == 0 {
        registry().release_fd(fd);
    }
    rc
}

#[no_mangle]
pub unsafe extern "C" fn write(fd: c_int, buf: *const c_void, count: size_t) -> ssize_t {
    let Some(real) = real_fn!(&REAL_WRITE, WriteFn) else {
        return -1;
    };
    if is_native() {
        return real(fd, buf, count);
    }
    let _guard = NativeGuard::new();

    hook_log!(Category::FileIo, "write call with fd {} and size {}", fd, count);
    if moviola_config::prevent_savefiles() && registry().is_save_fd(fd) {
        // Swallow the bytes and report complete success; the hosted
        // program cannot tell its save never reached disk.
        return count as ssize_t;
    }
    real(fd, buf, count)
}

unsafe fn pwrite_common(
    real_sym: &RealSymbol,
    fd: c_int,
    buf: *const c_void,
    count: size_t,
    offset: off_t,
) -> ssize_t {
    let Some(real) = real_fn!(real_sym, PwriteFn) else {
        return count as ssize_t;
    };
    if is_native() {
        return real(fd, buf, count, offset);
    }
    let _guard = NativeGuard::new();

    hook_log!(
        Category::FileIo,
        "pwrite call with fd {} size {} offset {}",
        fd,
        count,
        offset
    );
    if moviola_config::prevent_savefiles() && registry().is_save_fd(fd) {
        return count as ssize_t;
    }
    real(fd, buf, count, offset)
}

#[no_mangle]
pub unsafe extern "C" fn pwrite(fd: c_int, buf: *const c_void, count: size_t, offset: off_t) -> ssize_t {
    pwrite_common(&REAL_PWRITE, fd, buf, count, offset)
}

#[no_mangle]
pub unsafe extern "C" fn pwrite64(
    fd: c_int,
    buf: *const c_void,
    count: size_t,
    offset: off_t,
) -> ssize_t {
    pwrite_common(&REAL_PWRITE64, fd, buf, count, offset)
}

#[no_mangle]
pub unsafe extern "C" fn rename(old: *const c_char, new: *const c_char) -> c_int {
    let Some(real) = real_fn!(&REAL_RENAME, RenameFn) else {
        return -1;
    };
    if is_native() {
        return real(old, new);
    }
    let _guard = NativeGuard::new();

    let (Some(old_path), Some(new_path)) = (cstr(old), cstr(new)) else {
        return real(old, new);
    };
    hook_log!(Category::FileIo, "rename call from {} to {}", old_path, new_path);

    match registry().rename(old_path, new_path) {
        Disposition::Virtual(rc) => rc,
        Disposition::Passthrough => real(old, new),
    }
}

unsafe fn unlink_common(real_sym: &RealSymbol, file: *const c_char) -> c_int {
    let Some(real) = real_fn!(real_sym, UnlinkFn) else {
        return -1;
    };
    if is_native() {
        return real(file);
    }
    let _guard = NativeGuard::new();

    let Some(path) = cstr(file) else {
        return real(file);
    };
    hook_log!(Category::FileIo, "unlink call with file {}", path);

    match registry().remove(path) {
        Disposition::Virtual(rc) => rc,
        Disposition::Passthrough => real(file),
    }
}

#[no_mangle]
pub unsafe extern "C" fn unlink(file: *const c_char) -> c_int {
    unlink_common(&REAL_UNLINK, file)
}

#[no_mangle]
pub unsafe extern "C" fn remove(file: *const c_char) -> c_int {
    unlink_common(&REAL_REMOVE, file)
}
