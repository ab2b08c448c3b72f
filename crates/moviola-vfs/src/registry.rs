//! The process-wide set of save-file entities.
//!
//! Lookups are linear scans keyed by canonical filename, live descriptor,
//! or live stream handle. The set is bounded by the number of distinct
//! save-relevant paths a game touches, not by I/O call volume, so a `Vec`
//! behind one coarse lock is enough. The registry is built lazily on first
//! access; games call hooked functions from global constructors, before
//! anything resembling main-line initialization has run.
//!
//! The `tracing` events in this module serve library embedding and tests.
//! In a preloaded process no subscriber is installed, so from hook context
//! they reduce to a disabled-callsite check with no allocation.

use std::ffi::CString;
use std::sync::{Mutex, PoisonError};

use libc::{c_int, FILE};
use once_cell::sync::Lazy;
use tracing::debug;

use crate::native::NativeGuard;
use crate::path::canonicalize;
use crate::savefile::SaveFile;

/// Outcome of a registry operation that may or may not virtualize the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// The operation was handled virtually; the caller returns this value
    /// and performs no real filesystem mutation.
    Virtual(c_int),
    /// Not a save file; the caller falls through to the real call.
    Passthrough,
}

#[derive(Default)]
pub struct SaveFileRegistry {
    files: Mutex<Vec<SaveFile>>,
}

static REGISTRY: Lazy<SaveFileRegistry> = Lazy::new(SaveFileRegistry::new);

/// The process-wide registry, constructed on first access.
pub fn registry() -> &'static SaveFileRegistry {
    &REGISTRY
}

impl SaveFileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<SaveFile>> {
        self.files.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ------------------------------------------------------------------
    // Classification
    // ------------------------------------------------------------------

    /// Classify an `open`-style request. Once a path has an entity it is a
    /// save file unconditionally; identity persists.
    pub fn is_save_file_flags(&self, path: &str, oflag: c_int) -> bool {
        if self.contains(path) {
            return true;
        }
        if !moviola_config::prevent_savefiles() {
            return false;
        }
        if oflag & libc::O_ACCMODE == libc::O_RDONLY {
            return false;
        }
        // Shared-memory style objects are opened with O_CLOEXEC; those are
        // IPC, not persistent state.
        if oflag & libc::O_CLOEXEC != 0 {
            return false;
        }
        probe_save_path(path)
    }

    /// Classify an `fopen`-style request by its mode string.
    pub fn is_save_file_mode(&self, path: &str, modes: &str) -> bool {
        if self.contains(path) {
            return true;
        }
        if !moviola_config::prevent_savefiles() {
            return false;
        }
        if !(modes.contains('w') || modes.contains('a') || modes.contains('+')) {
            return false;
        }
        probe_save_path(path)
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Register a descriptor the hook obtained from the real `open`,
    /// reusing the existing entity for this canonical path if there is one.
    pub fn adopt_fd(&self, path: &str, oflag: c_int, fd: c_int) {
        let Some(canonical) = canonicalize(path) else {
            return;
        };
        debug!(file = %canonical, fd, "registering save-file descriptor");
        let mut files = self.lock();
        if let Some(entity) = files.iter_mut().find(|e| e.filename == canonical) {
            entity.adopt_fd(fd, oflag);
            return;
        }
        if let Some(mut entity) = SaveFile::new(path) {
            entity.adopt_fd(fd, oflag);
            files.push(entity);
        }
    }

    /// Register a stdio handle the hook obtained from the real `fopen`.
    pub fn adopt_stream(&self, path: &str, modes: &str, stream: *mut FILE) {
        let Some(canonical) = canonicalize(path) else {
            return;
        };
        debug!(file = %canonical, "registering save-file stream");
        let mut files = self.lock();
        if let Some(entity) = files.iter_mut().find(|e| e.filename == canonical) {
            entity.adopt_stream(stream, modes);
            return;
        }
        if let Some(mut entity) = SaveFile::new(path) {
            entity.adopt_stream(stream, modes);
            files.push(entity);
        }
    }

    /// Descriptor-liveness eviction after a real `close`. The entity is
    /// retained; only the handle mapping is cleared. Returns whether the
    /// descriptor was tracked.
    pub fn release_fd(&self, fd: c_int) -> bool {
        if fd <= 0 {
            return false;
        }
        let mut files = self.lock();
        match files.iter_mut().find(|e| e.fd == fd) {
            Some(entity) => {
                debug!(file = %entity.filename, fd, "closing save-file descriptor");
                entity.release_fd();
                true
            }
            None => false,
        }
    }

    /// Stream-liveness eviction after a real `fclose`.
    pub fn release_stream(&self, stream: *mut FILE) -> bool {
        if stream.is_null() {
            return false;
        }
        let mut files = self.lock();
        match files.iter_mut().find(|e| e.stream == stream) {
            Some(entity) => {
                debug!(file = %entity.filename, "closing save-file stream");
                entity.release_stream();
                true
            }
            None => false,
        }
    }

    /// Virtually remove `path`.
    ///
    /// A tracked path is tombstoned. An untracked path, with virtualization
    /// enabled, gets a fresh tombstoned entity so later existence queries
    /// report "absent" — plus a real-filesystem permission probe so the
    /// caller still sees a realistic error if it could not have removed the
    /// file. No real mutation happens in either case.
    pub fn remove(&self, path: &str) -> Disposition {
        let mut files = self.lock();
        if let Some(entity) = files.iter_mut().find(|e| e.is_same_file(path)) {
            entity.mark_removed();
            return Disposition::Virtual(0);
        }

        if !moviola_config::prevent_savefiles() {
            return Disposition::Passthrough;
        }

        let Some(mut entity) = SaveFile::new(path) else {
            return Disposition::Passthrough;
        };
        entity.mark_removed();
        files.push(entity);
        drop(files);

        Disposition::Virtual(access_write(path))
    }

    /// Virtually rename `old` to `new`, transferring the entity's identity
    /// (descriptor, tombstone, buffered content) to the destination.
    pub fn rename(&self, old: &str, new: &str) -> Disposition {
        let Some(canonical_new) = canonicalize(new) else {
            return Disposition::Virtual(-1);
        };

        let mut files = self.lock();
        // A rename overwrites whatever identity previously lived at the
        // destination; stale entries must not survive the insert below.
        files.retain(|e| e.filename != canonical_new);

        if let Some(entity) = files.iter_mut().find(|e| e.is_same_file(old)) {
            debug!(from = %entity.filename, to = %canonical_new, "renaming save file");
            entity.filename = canonical_new;
            return Disposition::Virtual(0);
        }

        if !moviola_config::prevent_savefiles() {
            return Disposition::Passthrough;
        }

        let Some(mut entity) = SaveFile::new(old) else {
            return Disposition::Virtual(-1);
        };
        entity.open_readonly();
        entity.filename = canonical_new;
        files.push(entity);
        drop(files);

        Disposition::Virtual(access_write(old))
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn contains(&self, path: &str) -> bool {
        self.lock().iter().any(|e| e.is_same_file(path))
    }

    /// Live descriptor for `path`, or 0 when no entity (or no descriptor)
    /// exists.
    pub fn fd_for(&self, path: &str) -> c_int {
        self.lock()
            .iter()
            .find(|e| e.is_same_file(path))
            .map_or(0, |e| e.fd)
    }

    /// Virtual existence query. "No entity" and "explicitly removed" are
    /// the same observable state: absent.
    pub fn is_removed(&self, path: &str) -> bool {
        self.lock()
            .iter()
            .find(|e| e.is_same_file(path))
            .map_or(true, |e| e.removed)
    }

    pub fn is_save_fd(&self, fd: c_int) -> bool {
        fd > 0 && self.lock().iter().any(|e| e.fd == fd)
    }

    pub fn is_save_stream(&self, stream: *mut FILE) -> bool {
        !stream.is_null() && self.lock().iter().any(|e| e.stream == stream)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// The filesystem half of classification: does this path look like
/// persistent, regular-file state?
fn probe_save_path(path: &str) -> bool {
    // Anything under the shared-memory mount is IPC, never a save file.
    if path.contains("/dev/shm") {
        return false;
    }

    let Ok(cpath) = CString::new(path) else {
        return false;
    };

    let _native = NativeGuard::new();
    let mut st: libc::stat = unsafe { std::mem::zeroed() };
    let rv = unsafe { libc::stat(cpath.as_ptr(), &mut st) };

    if rv == -1 {
        // About to be created: persistent state. Any other stat failure is
        // treated conservatively as "not ours".
        return std::io::Error::last_os_error().raw_os_error() == Some(libc::ENOENT);
    }

    st.st_mode & libc::S_IFMT == libc::S_IFREG
}

/// Real-filesystem permission probe for virtualized remove/rename: the
/// caller still observes EACCES where the real call would have failed.
fn access_write(path: &str) -> c_int {
    let Ok(cpath) = CString::new(path) else {
        return -1;
    };
    let _native = NativeGuard::new();
    unsafe { libc::access(cpath.as_ptr(), libc::W_OK) }
}
