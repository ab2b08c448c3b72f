//! Original-symbol resolution.
//!
//! Every hook needs the address of the *next* definition of its symbol in
//! the library search order, skipping this layer's own export. For most
//! symbols that is `dlsym(RTLD_NEXT, name)` — but called through the real
//! `dlsym`, never the PLT, because the PLT entry in this process is our
//! own hook.
//!
//! `dlopen` and `dlsym` themselves are the bootstrap case: the standard
//! lookup primitive is the very function being resolved. They go through
//! `dlvsym`, the versioned-lookup entry point this layer does not
//! interpose, which makes it a privileged channel into the loader. (The
//! historical route, glibc's private `_dl_sym`, is no longer exported as
//! of glibc 2.34.)

use std::ffi::CStr;
use std::sync::atomic::{AtomicPtr, Ordering};

use libc::{c_char, c_int, c_void};

extern "C" {
    fn dlvsym(handle: *mut c_void, symbol: *const c_char, version: *const c_char) -> *mut c_void;
}

/// Sentinel distinguishing "resolution attempted and failed" from the null
/// "not yet attempted" state. Address 1 is never a valid symbol address.
const FAILED: *mut c_void = 1 as *mut c_void;

/// Lazily-populated cache slot for one real symbol.
///
/// Populated at most once logically; concurrent first uses resolve
/// redundantly and converge, since `dlsym` returns the identical address
/// to every caller. A failed slot stays failed: callers must treat the
/// symbol as unusable rather than dereference anything.
pub struct RealSymbol {
    ptr: AtomicPtr<c_void>,
    name: &'static CStr,
}

impl RealSymbol {
    pub const fn new(name: &'static CStr) -> Self {
        Self {
            ptr: AtomicPtr::new(std::ptr::null_mut()),
            name,
        }
    }

    /// Address of the next definition of this symbol, or `None` if it
    /// could not be found.
    pub fn get(&self) -> Option<*mut c_void> {
        let p = self.ptr.load(Ordering::Acquire);
        if p == FAILED {
            return None;
        }
        if !p.is_null() {
            return Some(p);
        }

        let f = match real_dlsym() {
            Some(dlsym) => unsafe { dlsym(libc::RTLD_NEXT, self.name.as_ptr()) },
            None => std::ptr::null_mut(),
        };
        self.ptr
            .store(if f.is_null() { FAILED } else { f }, Ordering::Release);

        if f.is_null() {
            hook_log!(
                crate::logsink::Category::Hook,
                "failed to resolve symbol {}",
                self.name.to_str().unwrap_or("<?>")
            );
            None
        } else {
            Some(f)
        }
    }
}

pub type DlopenFn = unsafe extern "C" fn(*const c_char, c_int) -> *mut c_void;
pub type DlsymFn = unsafe extern "C" fn(*mut c_void, *const c_char) -> *mut c_void;

/// Symbol versions to try, newest first. 2.34 is the merged-libdl default;
/// the older ones cover pre-2.34 x86_64 and aarch64 baselines.
const LOADER_VERSIONS: [&CStr; 3] = [c"GLIBC_2.34", c"GLIBC_2.2.5", c"GLIBC_2.17"];

fn bootstrap_resolve(name: &CStr) -> *mut c_void {
    for version in LOADER_VERSIONS {
        let addr = unsafe { dlvsym(libc::RTLD_NEXT, name.as_ptr(), version.as_ptr()) };
        if !addr.is_null() {
            return addr;
        }
    }
    std::ptr::null_mut()
}

static REAL_DLOPEN: AtomicPtr<c_void> = AtomicPtr::new(std::ptr::null_mut());
static REAL_DLSYM: AtomicPtr<c_void> = AtomicPtr::new(std::ptr::null_mut());

fn bootstrap_slot(slot: &AtomicPtr<c_void>, name: &CStr) -> *mut c_void {
    let p = slot.load(Ordering::Acquire);
    if p == FAILED {
        return std::ptr::null_mut();
    }
    if !p.is_null() {
        return p;
    }
    let f = bootstrap_resolve(name);
    slot.store(if f.is_null() { FAILED } else { f }, Ordering::Release);
    f
}

/// The real `dlopen`, resolved through the privileged channel.
pub fn real_dlopen() -> Option<DlopenFn> {
    let p = bootstrap_slot(&REAL_DLOPEN, c"dlopen");
    if p.is_null() {
        None
    } else {
        Some(unsafe { std::mem::transmute::<*mut c_void, DlopenFn>(p) })
    }
}

/// The real `dlsym`, resolved through the privileged channel.
pub fn real_dlsym() -> Option<DlsymFn> {
    let p = bootstrap_slot(&REAL_DLSYM, c"dlsym");
    if p.is_null() {
        None
    } else {
        Some(unsafe { std::mem::transmute::<*mut c_void, DlsymFn>(p) })
    }
}
