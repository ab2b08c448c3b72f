//! Real-symbol resolution behavior.
//!
//! These run in an ordinary (non-preloaded) process, which is still a
//! valid resolution environment: `RTLD_NEXT` from the main object walks
//! into libc the same way it does from an injected library.

use moviola_shim::reals::{REAL_CLOSE, REAL_WRITE};
use moviola_shim::resolve::{real_dlopen, real_dlsym, RealSymbol};

#[test]
fn bootstrap_channels_resolve() {
    assert!(real_dlsym().is_some());
    assert!(real_dlopen().is_some());
}

#[test]
fn resolution_is_idempotent() {
    let first = REAL_WRITE.get();
    let second = REAL_WRITE.get();
    assert!(first.is_some());
    assert_eq!(first, second);
}

#[test]
fn failed_resolution_stays_failed() {
    static BOGUS: RealSymbol = RealSymbol::new(c"moviola_no_such_symbol_b2c4");
    assert_eq!(BOGUS.get(), None);
    // The slot must remember the failure, not retry into a different answer.
    assert_eq!(BOGUS.get(), None);
}

#[test]
fn concurrent_first_use_converges() {
    let results: Vec<_> = (0..8)
        .map(|_| std::thread::spawn(|| REAL_CLOSE.get().map(|p| p as usize)))
        .collect();

    let mut addrs = Vec::new();
    for handle in results {
        addrs.push(handle.join().unwrap());
    }
    assert!(addrs[0].is_some());
    assert!(addrs.iter().all(|a| *a == addrs[0]));
}
