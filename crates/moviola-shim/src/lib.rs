//! # moviola-shim
//!
//! LD_PRELOAD interposition layer for deterministic game replay.
//!
//! The hosted program is an unmodified binary; this library is injected in
//! front of it and exports libc-shaped symbols (`dlopen`, `open`, `write`,
//! …) that the dynamic linker resolves instead of the real ones. Each hook
//! lazily resolves the genuine implementation, decides whether the call
//! needs virtualized behavior (see `moviola-vfs`), and otherwise passes
//! straight through.

// Unsafe FFI exports without safety docs - these are inherently unsafe C ABI
#![allow(clippy::missing_safety_doc)]

// Macros must be defined before modules that use them
#[macro_use]
pub mod macros;

pub mod dlhook;
pub mod fileio;
pub mod logsink;
pub mod module;
pub mod reals;
pub mod resolve;
pub mod state;
pub mod stdio;

pub use logsink::LOGGER;
pub use state::find_library;

/// Static constructor: runs when the loader maps this library, before the
/// hosted program's own constructors. Publishes environment configuration
/// and marks the shim ready so hooks stop pass-through-only behavior.
#[cfg(target_os = "linux")]
#[link_section = ".init_array"]
#[used]
pub static SHIM_INIT: unsafe extern "C" fn() = {
    unsafe extern "C" fn init() {
        moviola_config::init_from_env();
        crate::state::INITIALIZING.store(false, std::sync::atomic::Ordering::SeqCst);
    }
    init
};

/// Static destructor: when diagnostics are on, dump the ring buffer to
/// /tmp as the process unwinds, while hooks still resolve.
#[cfg(target_os = "linux")]
#[link_section = ".fini_array"]
#[used]
pub static SHIM_FINI: unsafe extern "C" fn() = {
    unsafe extern "C" fn fini() {
        if moviola_config::debug_output() {
            let _native = moviola_vfs::NativeGuard::new();
            crate::logsink::LOGGER.dump_to_file();
        }
    }
    fini
};
