//! Shim-global state: the loaded-library set and initialization flags.
//!
//! Games call hooked functions from global constructors, before anything
//! resembling orderly startup, so the state object is built on first
//! access behind an atomic pointer rather than at static-initialization
//! time. `INITIALIZING` doubles as the construction reentrancy guard.

use std::ptr;
use std::sync::atomic::{AtomicBool, AtomicPtr, Ordering};
use std::sync::{Mutex, PoisonError};

static SHIM_STATE: AtomicPtr<ShimState> = AtomicPtr::new(ptr::null_mut());

/// True while the state object is being constructed; hooks that need state
/// during that window skip their bookkeeping instead of recursing.
pub(crate) static INITIALIZING: AtomicBool = AtomicBool::new(false);

pub(crate) struct ShimState {
    /// Libraries the hosted program loaded through `dlopen`. Append-only:
    /// unload is not tracked, a deliberate simplification — the set exists
    /// for substring lookup, and games do not meaningfully unload.
    libraries: Mutex<Vec<String>>,
}

impl ShimState {
    fn init() -> *mut Self {
        Box::into_raw(Box::new(ShimState {
            libraries: Mutex::new(Vec::new()),
        }))
    }

    pub(crate) fn get() -> Option<&'static Self> {
        let ptr = SHIM_STATE.load(Ordering::Acquire);
        if !ptr.is_null() {
            return unsafe { Some(&*ptr) };
        }

        if INITIALIZING.swap(true, Ordering::SeqCst) {
            return None;
        }
        let ptr = Self::init();
        SHIM_STATE.store(ptr, Ordering::Release);
        INITIALIZING.store(false, Ordering::SeqCst);

        unsafe { Some(&*ptr) }
    }
}

/// Record a successfully dlopen'ed library path.
pub(crate) fn record_library(path: &str) {
    if let Some(state) = ShimState::get() {
        let mut libraries = state
            .libraries
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !libraries.iter().any(|l| l == path) {
            libraries.push(path.to_string());
        }
    }
}

/// Find a loaded library whose path contains `fragment`.
///
/// This is how per-API wrapper layers locate a game-loaded library without
/// knowing its full path or version suffix.
pub fn find_library(fragment: &str) -> Option<String> {
    let state = ShimState::get()?;
    let libraries = state
        .libraries
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    libraries.iter().find(|l| l.contains(fragment)).cloned()
}
