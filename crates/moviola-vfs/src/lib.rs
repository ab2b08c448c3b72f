//! # moviola-vfs
//!
//! Save-file virtualization core for the Moviola replay layer.
//!
//! A hosted game's persistent writes (saves, configuration) must not
//! durably land on disk, otherwise re-running the same recording from the
//! start observes different state. This crate models each such path as a
//! [`SaveFile`] entity with a stable canonical identity, keeps the set of
//! known entities in a [`SaveFileRegistry`], and decides which opened paths
//! qualify in the first place.
//!
//! The interposition layer (`moviola-shim`) is the only production caller;
//! everything here is plain safe-ish library code so the hard parts can be
//! tested without `LD_PRELOAD` in the picture.

pub mod native;
pub mod path;
pub mod registry;
pub mod savefile;

pub use native::{is_native, NativeGuard};
pub use path::canonicalize;
pub use registry::{registry, Disposition, SaveFileRegistry};
pub use savefile::SaveFile;
