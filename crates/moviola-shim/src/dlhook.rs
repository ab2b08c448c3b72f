//! `dlopen`/`dlsym` interception.
//!
//! Hooking the loader entry points is what makes the rest of the layer
//! stick: a program that looks functions up at runtime would otherwise
//! reach the genuine libc and bypass every other hook. `dlsym` arbitrates
//! each lookup — if this layer overrides the requested symbol, the lookup
//! gets our hook; otherwise it proceeds exactly as the program asked.

use std::ffi::CStr;

use libc::{c_char, c_int, c_void};
use moviola_vfs::{is_native, NativeGuard};

use crate::logsink::Category;
use crate::module;
use crate::resolve::{real_dlopen, real_dlsym};
use crate::state;

#[no_mangle]
pub unsafe extern "C" fn dlopen(file: *const c_char, mode: c_int) -> *mut c_void {
    let Some(real) = real_dlopen() else {
        hook_log!(Category::Hook, "dlopen unavailable, returning NULL");
        return std::ptr::null_mut();
    };

    if is_native() {
        return real(file, mode);
    }

    let name = if file.is_null() {
        "<NULL>"
    } else {
        CStr::from_ptr(file).to_str().unwrap_or("<invalid>")
    };
    {
        let _guard = NativeGuard::new();
        hook_log!(Category::Hook, "dlopen call with file {}", name);
    }

    // No native scope around the real call: constructors of the loaded
    // library run with interception active, so file I/O they perform is
    // classified like any other call.
    let handle = real(file, mode);

    if !handle.is_null() && !file.is_null() {
        let _guard = NativeGuard::new();
        state::record_library(name);
    }
    handle
}

#[no_mangle]
pub unsafe extern "C" fn dlsym(handle: *mut c_void, name: *const c_char) -> *mut c_void {
    let Some(real) = real_dlsym() else {
        return std::ptr::null_mut();
    };

    if is_native() || name.is_null() {
        return real(handle, name);
    }
    let _guard = NativeGuard::new();

    let sym = CStr::from_ptr(name).to_str().unwrap_or("<invalid>");
    hook_log!(Category::Hook, "dlsym call with symbol {}", sym);

    // A program asking for the loader entry points themselves must get our
    // wrappers, or every lookup it makes afterwards escapes the layer.
    match sym {
        "dlopen" => return dlopen as *mut c_void,
        "dlsym" => return dlsym as *mut c_void,
        _ => {}
    }

    // Global search first: if the symbol resolves into this module, the
    // layer overrides it and the program gets the hook regardless of which
    // handle it asked through.
    libc::dlerror();
    let addr = real(libc::RTLD_DEFAULT, name);
    if libc::dlerror().is_null() && !addr.is_null() && module::owns_address(addr) {
        hook_log!(Category::Hook, "symbol {} is overridden", sym);
        return addr;
    }

    real(handle, name)
}
