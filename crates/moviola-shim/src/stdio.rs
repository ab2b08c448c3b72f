//! C stream hooks: `fopen` family, `fclose`, and the buffered write
//! entry points.
//!
//! `fprintf`/`vfprintf` are variadic and live in the C bridge; the bridge
//! calls back into `moviola_vfprintf_enter` for the real function pointer
//! and does the `va_list` legwork itself.

use std::ffi::CStr;

use libc::{c_char, c_int, c_void, size_t, FILE};
use moviola_vfs::{is_native, registry, NativeGuard};

use crate::logsink::Category;
use crate::reals::{
    FcloseFn, FopenFn, FputcFn, FwriteFn, REAL_FCLOSE, REAL_FOPEN, REAL_FOPEN64, REAL_FPUTC,
    REAL_FWRITE, REAL_PUTC, REAL_VFPRINTF,
};
use crate::resolve::RealSymbol;

unsafe fn cstr(ptr: *const c_char) -> Option<&'static str> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok()
}

unsafe fn fopen_common(
    real_sym: &RealSymbol,
    file: *const c_char,
    modes: *const c_char,
) -> *mut FILE {
    let Some(real) = real_fn!(real_sym, FopenFn) else {
        return std::ptr::null_mut();
    };
    if is_native() {
        return real(file, modes);
    }
    let _guard = NativeGuard::new();

    let path = cstr(file);
    let mode = cstr(modes);
    if let (Some(p), Some(m)) = (path, mode) {
        hook_log!(Category::FileIo, "fopen call with file {} and mode {}", p, m);
        // Non-creating opens of a tombstoned save file observe the
        // removal; every "r" mode (including "r+") requires the file to
        // already exist.
        if m.starts_with('r')
            && moviola_config::prevent_savefiles()
            && registry().contains(p)
            && registry().is_removed(p)
        {
            *libc::__errno_location() = libc::ENOENT;
            return std::ptr::null_mut();
        }
    }

    let stream = real(file, modes);
    if !stream.is_null() {
        if let (Some(p), Some(m)) = (path, mode) {
            if registry().is_save_file_mode(p, m) {
                registry().adopt_stream(p, m, stream);
            }
        }
    }
    stream
}

#[no_mangle]
pub unsafe extern "C" fn fopen(file: *const c_char, modes: *const c_char) -> *mut FILE {
    fopen_common(&REAL_FOPEN, file, modes)
}

#[no_mangle]
pub unsafe extern "C" fn fopen64(file: *const c_char, modes: *const c_char) -> *mut FILE {
    fopen_common(&REAL_FOPEN64, file, modes)
}

#[no_mangle]
pub unsafe extern "C" fn fclose(stream: *mut FILE) -> c_int {
    let Some(real) = real_fn!(&REAL_FCLOSE, FcloseFn) else {
        return libc::EOF;
    };
    if is_native() {
        return real(stream);
    }
    let _guard = NativeGuard::new();

    let rc = real(stream);
    if rc == 0 {
        registry().release_stream(stream);
    }
    rc
}

fn suppress_stream(stream: *mut FILE) -> bool {
    moviola_config::prevent_savefiles() && registry().is_save_stream(stream)
}

#[no_mangle]
pub unsafe extern "C" fn fwrite(
    ptr: *const c_void,
    size: size_t,
    n: size_t,
    stream: *mut FILE,
) -> size_t {
    let Some(real) = real_fn!(&REAL_FWRITE, FwriteFn) else {
        return 0;
    };
    if is_native() {
        return real(ptr, size, n, stream);
    }
    let _guard = NativeGuard::new();

    if suppress_stream(stream) {
        return n;
    }
    real(ptr, size, n, stream)
}

// Character output carries no durability concern; logged pass-through.
unsafe fn fputc_common(real_sym: &RealSymbol, c: c_int, stream: *mut FILE) -> c_int {
    let Some(real) = real_fn!(real_sym, FputcFn) else {
        return libc::EOF;
    };
    if is_native() {
        return real(c, stream);
    }
    let _guard = NativeGuard::new();

    hook_log!(Category::FileIo, "fputc call with char {:#x}", c);
    real(c, stream)
}

#[no_mangle]
pub unsafe extern "C" fn fputc(c: c_int, stream: *mut FILE) -> c_int {
    fputc_common(&REAL_FPUTC, c, stream)
}

#[no_mangle]
pub unsafe extern "C" fn putc(c: c_int, stream: *mut FILE) -> c_int {
    fputc_common(&REAL_PUTC, c, stream)
}

/// Called from the C-side `vfprintf` wrapper. Returns the real `vfprintf`
/// address, or NULL when resolution failed. Formatted output carries no
/// durability concern; the wrapper passes straight through.
#[no_mangle]
pub unsafe extern "C" fn moviola_vfprintf_enter(
    _stream: *mut FILE,
    _format: *const c_char,
) -> *mut c_void {
    if !is_native() {
        let _guard = NativeGuard::new();
        hook_log!(Category::FileIo, "vfprintf call");
    }
    match REAL_VFPRINTF.get() {
        Some(real) => real,
        None => std::ptr::null_mut(),
    }
}
