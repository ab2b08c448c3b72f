//! Address-to-module ownership: "is this resolved address ours?"
//!
//! `dlsym` arbitration needs to know whether a globally-resolved address
//! comes from this interception layer or from some unrelated library that
//! happens to export the same name. The query compares `dladdr` module
//! base addresses against our own base, captured once from a function we
//! know lives here. Comparing bases instead of file-name suffixes cannot
//! be fooled by a look-alike library name.

use std::sync::atomic::{AtomicPtr, Ordering};

use libc::c_void;

static OWN_BASE: AtomicPtr<c_void> = AtomicPtr::new(std::ptr::null_mut());

fn own_base() -> *mut c_void {
    let cached = OWN_BASE.load(Ordering::Acquire);
    if !cached.is_null() {
        return cached;
    }

    let probe = own_base as *const c_void;
    let mut info: libc::Dl_info = unsafe { std::mem::zeroed() };
    let base = if unsafe { libc::dladdr(probe, &mut info) } != 0 {
        info.dli_fbase
    } else {
        std::ptr::null_mut()
    };
    OWN_BASE.store(base, Ordering::Release);
    base
}

/// Does `addr` belong to this layer's own module?
pub fn owns_address(addr: *const c_void) -> bool {
    let base = own_base();
    if base.is_null() {
        return false;
    }

    let mut info: libc::Dl_info = unsafe { std::mem::zeroed() };
    unsafe { libc::dladdr(addr, &mut info) != 0 && info.dli_fbase == base }
}
