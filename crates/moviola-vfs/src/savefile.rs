//! A single virtualized save file.
//!
//! An entity is created the first time a path is classified as
//! save-worthy and then lives for the rest of the process: the virtual
//! identity ("this path exists / was removed") has to survive any number
//! of open/close cycles and restarts of the recording. Only the live
//! descriptor and stream handle come and go.

use std::ffi::CString;

use libc::{c_int, FILE};
use tracing::debug;

use crate::native::NativeGuard;
use crate::path::canonicalize;

/// What the entity's most recent descriptor refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backing {
    /// No live descriptor.
    None,
    /// A descriptor onto the real file (writes to it are suppressed at the
    /// hook layer, so the file itself stays untouched).
    Passthrough,
    /// An anonymous in-memory file, used when a descriptor is needed for a
    /// path that does not exist on disk or is tombstoned.
    Shadow,
}

pub struct SaveFile {
    /// Canonical path; the entity's identity key.
    pub filename: String,
    /// Most recently issued descriptor, or 0 for none.
    pub fd: c_int,
    /// Most recently issued stdio handle, or null for none.
    pub stream: *mut FILE,
    /// Tombstone: the path has been virtually removed.
    pub removed: bool,
    backing: Backing,
}

// The raw stream pointer is only ever handed back to the thread that owns
// the FILE; the registry treats it as an opaque lookup key.
unsafe impl Send for SaveFile {}

impl SaveFile {
    /// Create an entity for `path`. Fails only if the path cannot be
    /// canonicalized; the file itself need not exist.
    pub fn new(path: &str) -> Option<Self> {
        Some(SaveFile {
            filename: canonicalize(path)?,
            fd: 0,
            stream: std::ptr::null_mut(),
            removed: false,
            backing: Backing::None,
        })
    }

    /// Does `path` denote this entity, under any relative spelling?
    pub fn is_same_file(&self, path: &str) -> bool {
        canonicalize(path).is_some_and(|canonical| canonical == self.filename)
    }

    pub fn is_shadow_backed(&self) -> bool {
        self.backing == Backing::Shadow
    }

    /// Record a descriptor the hook layer obtained from the real `open`.
    /// An open with creation intent resurrects a tombstoned entity.
    pub(crate) fn adopt_fd(&mut self, fd: c_int, oflag: c_int) {
        self.fd = fd;
        self.backing = Backing::Passthrough;
        if oflag & libc::O_CREAT != 0 {
            self.removed = false;
        }
    }

    /// Record a stdio handle from the real `fopen`. Modes `w`/`a` carry
    /// creation intent.
    pub(crate) fn adopt_stream(&mut self, stream: *mut FILE, modes: &str) {
        self.stream = stream;
        self.backing = Backing::Passthrough;
        if modes.contains('w') || modes.contains('a') {
            self.removed = false;
        }
    }

    /// The descriptor was closed; the entity itself is retained.
    pub(crate) fn release_fd(&mut self) {
        self.fd = 0;
        if self.stream.is_null() {
            self.backing = Backing::None;
        }
    }

    pub(crate) fn release_stream(&mut self) {
        self.stream = std::ptr::null_mut();
        if self.fd == 0 {
            self.backing = Backing::None;
        }
    }

    pub(crate) fn mark_removed(&mut self) {
        // Disabled-callsite no-op under a preloaded process (no
        // subscriber); see the registry module docs.
        debug!(file = %self.filename, "tombstoning save file");
        self.removed = true;
    }

    /// Open a read-only descriptor onto this entity, for registry
    /// operations that need a live handle (rename fabrication). Falls back
    /// to an in-memory file when the real path cannot be opened, so the
    /// entity still carries a usable descriptor.
    pub(crate) fn open_readonly(&mut self) -> c_int {
        let _native = NativeGuard::new();

        if !self.removed {
            if let Ok(cpath) = CString::new(self.filename.as_str()) {
                let fd = unsafe { libc::open(cpath.as_ptr(), libc::O_RDONLY) };
                if fd >= 0 {
                    self.fd = fd;
                    self.backing = Backing::Passthrough;
                    return fd;
                }
            }
        }

        let fd = unsafe { libc::memfd_create(c"moviola-savefile".as_ptr(), 0) };
        if fd >= 0 {
            self.fd = fd;
            self.backing = Backing::Shadow;
        }
        fd
    }
}
