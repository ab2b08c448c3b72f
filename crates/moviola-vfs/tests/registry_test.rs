//! Behavioral tests for the save-file registry: classification policy,
//! identity stability, rename/remove semantics.
//!
//! The virtualization flag is process-global, so every test serializes on
//! one lock before touching it.

use std::fs;
use std::sync::{Mutex, MutexGuard, PoisonError};

use moviola_vfs::{Disposition, SaveFileRegistry};

static TEST_LOCK: Mutex<()> = Mutex::new(());

fn serialized(prevent: bool) -> MutexGuard<'static, ()> {
    let guard = TEST_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    moviola_config::set_prevent_savefiles(prevent);
    guard
}

#[test]
fn classification_concrete_cases() {
    let _guard = serialized(true);
    let dir = tempfile::tempdir().unwrap();
    let registry = SaveFileRegistry::new();

    // A path that does not exist yet: the game is about to create
    // persistent state.
    let missing = dir.path().join("fresh.sav");
    let missing = missing.to_str().unwrap();
    assert!(registry.is_save_file_flags(missing, libc::O_WRONLY | libc::O_CREAT));

    // An existing regular file opened with write intent.
    let existing = dir.path().join("profile.cfg");
    fs::write(&existing, b"volume=7\n").unwrap();
    let existing = existing.to_str().unwrap();
    assert!(registry.is_save_file_flags(existing, libc::O_RDWR));
    assert!(registry.is_save_file_mode(existing, "w"));
    assert!(registry.is_save_file_mode(existing, "r+"));

    // Read-only access carries no durability concern.
    assert!(!registry.is_save_file_flags(existing, libc::O_RDONLY));
    assert!(!registry.is_save_file_mode(existing, "r"));

    // O_CLOEXEC marks shared-memory style IPC objects.
    assert!(!registry.is_save_file_flags(existing, libc::O_RDWR | libc::O_CLOEXEC));

    // The shared-memory mount is never save-worthy.
    assert!(!registry.is_save_file_flags("/dev/shm/moviola-test", libc::O_RDWR | libc::O_CREAT));

    // Directories are not regular files.
    let subdir = dir.path().join("saves");
    fs::create_dir(&subdir).unwrap();
    assert!(!registry.is_save_file_flags(subdir.to_str().unwrap(), libc::O_RDWR));
}

#[test]
fn classification_disabled_by_config() {
    let _guard = serialized(false);
    let dir = tempfile::tempdir().unwrap();
    let registry = SaveFileRegistry::new();

    let path = dir.path().join("fresh.sav");
    assert!(!registry.is_save_file_flags(path.to_str().unwrap(), libc::O_WRONLY | libc::O_CREAT));
}

#[test]
fn tracked_path_stays_classified_without_write_intent() {
    let _guard = serialized(true);
    let dir = tempfile::tempdir().unwrap();
    let registry = SaveFileRegistry::new();

    let path = dir.path().join("slot0.sav");
    fs::write(&path, b"state").unwrap();
    let path = path.to_str().unwrap();

    registry.adopt_fd(path, libc::O_WRONLY | libc::O_CREAT, 9);
    // Identity persists once established, even for a read-only reopen.
    assert!(registry.is_save_file_flags(path, libc::O_RDONLY));
    assert!(registry.is_save_file_mode(path, "r"));
}

#[test]
fn identity_is_stable_across_spellings() {
    let _guard = serialized(true);
    let dir = tempfile::tempdir().unwrap();
    let registry = SaveFileRegistry::new();

    let direct = dir.path().join("slot1.sav");
    let dotted = dir.path().join("sub/../slot1.sav");
    let direct = direct.to_str().unwrap();
    let dotted = dotted.to_str().unwrap();

    registry.adopt_fd(direct, libc::O_WRONLY | libc::O_CREAT, 11);
    registry.adopt_fd(dotted, libc::O_WRONLY | libc::O_CREAT, 12);

    // Both spellings resolved to the same entity, carrying the latest fd.
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.fd_for(direct), 12);
    assert_eq!(registry.fd_for(dotted), 12);
}

#[test]
fn close_evicts_descriptor_but_keeps_entity() {
    let _guard = serialized(true);
    let dir = tempfile::tempdir().unwrap();
    let registry = SaveFileRegistry::new();

    let path = dir.path().join("slot2.sav");
    let path = path.to_str().unwrap();
    registry.adopt_fd(path, libc::O_WRONLY | libc::O_CREAT, 21);

    assert!(registry.release_fd(21));
    assert!(!registry.release_fd(21));
    assert_eq!(registry.fd_for(path), 0);
    assert!(registry.contains(path));
    // Still virtually present: the entity was never tombstoned.
    assert!(!registry.is_removed(path));
}

#[test]
fn remove_then_reopen_reports_absent() {
    let _guard = serialized(true);
    let dir = tempfile::tempdir().unwrap();
    let registry = SaveFileRegistry::new();

    let path = dir.path().join("doomed.sav");
    fs::write(&path, b"old state").unwrap();
    let path_str = path.to_str().unwrap();

    // Untracked path removed under virtualization: a tombstoned entity
    // appears and no real mutation happens.
    assert_eq!(registry.remove(path_str), Disposition::Virtual(0));
    assert!(registry.is_removed(path_str));
    assert!(path.exists(), "real file must be untouched");

    // An open with creation intent resurrects the virtual file.
    registry.adopt_fd(path_str, libc::O_WRONLY | libc::O_CREAT, 31);
    assert!(!registry.is_removed(path_str));
}

#[test]
fn remove_untracked_passes_through_when_disabled() {
    let _guard = serialized(false);
    let registry = SaveFileRegistry::new();
    assert_eq!(
        registry.remove("/tmp/moviola-untracked.sav"),
        Disposition::Passthrough
    );
    assert!(registry.is_empty());
}

#[test]
fn unknown_paths_read_as_removed() {
    let _guard = serialized(true);
    let registry = SaveFileRegistry::new();
    // "No entity" and "explicitly removed" are the same observable state.
    assert!(registry.is_removed("/tmp/moviola-never-seen.sav"));
    assert_eq!(registry.fd_for("/tmp/moviola-never-seen.sav"), 0);
}

#[test]
fn rename_transfers_identity_and_tombstone() {
    let _guard = serialized(true);
    let dir = tempfile::tempdir().unwrap();
    let registry = SaveFileRegistry::new();

    let a = dir.path().join("a.sav");
    let b = dir.path().join("b.sav");
    let a = a.to_str().unwrap();
    let b = b.to_str().unwrap();

    registry.adopt_fd(a, libc::O_WRONLY | libc::O_CREAT, 41);
    registry.remove(a);

    assert_eq!(registry.rename(a, b), Disposition::Virtual(0));
    assert_eq!(registry.len(), 1);
    assert!(registry.contains(b));
    assert!(!registry.contains(a));
    // Tombstone and descriptor carried over from the source.
    assert!(registry.is_removed(b));
    assert_eq!(registry.fd_for(b), 41);
}

#[test]
fn rename_evicts_previous_destination_entity() {
    let _guard = serialized(true);
    let dir = tempfile::tempdir().unwrap();
    let registry = SaveFileRegistry::new();

    let a = dir.path().join("src.sav");
    let b = dir.path().join("dst.sav");
    let a = a.to_str().unwrap();
    let b = b.to_str().unwrap();

    registry.adopt_fd(a, libc::O_WRONLY | libc::O_CREAT, 51);
    registry.adopt_fd(b, libc::O_WRONLY | libc::O_CREAT, 52);
    assert_eq!(registry.len(), 2);

    assert_eq!(registry.rename(a, b), Disposition::Virtual(0));
    // Exactly one entity afterward, keyed by the destination, carrying the
    // source's descriptor; the old destination identity is discarded.
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.fd_for(b), 51);
}

#[test]
fn rename_of_untracked_file_fabricates_entity() {
    let _guard = serialized(true);
    let dir = tempfile::tempdir().unwrap();
    let registry = SaveFileRegistry::new();

    let a = dir.path().join("orig.sav");
    let b = dir.path().join("moved.sav");
    fs::write(&a, b"payload").unwrap();
    let a_str = a.to_str().unwrap();
    let b_str = b.to_str().unwrap();

    assert_eq!(registry.rename(a_str, b_str), Disposition::Virtual(0));
    assert!(registry.contains(b_str));
    assert!(registry.fd_for(b_str) > 0, "fabricated entity holds a live fd");
    // Virtual rename only: the real file never moved.
    assert!(a.exists());
    assert!(!b.exists());
}
