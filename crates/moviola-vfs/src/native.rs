//! Native mode: the reentrancy switch every hook checks first.
//!
//! The interposition layer's own internals (classification probes, logging,
//! canonicalization) call libc functions that are themselves intercepted in
//! this process. Without a way to say "call straight through", a `stat`
//! issued while classifying a path would land back in our own hook and
//! recurse. Native mode is that switch: while it is set on the current
//! thread, every hook degrades to a pure pass-through.

use std::cell::Cell;

thread_local! {
    static NATIVE: Cell<bool> = const { Cell::new(false) };
}

/// Is the current thread in native mode?
#[inline]
pub fn is_native() -> bool {
    NATIVE.with(|flag| flag.get())
}

/// Scoped entry into native mode.
///
/// Records the current flag value on construction and restores it on drop,
/// whichever way the scope is left. Nesting is safe: the inner guard
/// restores `true`, the outer one restores the original `false`.
#[must_use = "native mode ends when the guard is dropped"]
pub struct NativeGuard {
    prev: bool,
}

impl NativeGuard {
    pub fn new() -> Self {
        let prev = NATIVE.with(|flag| flag.replace(true));
        NativeGuard { prev }
    }
}

impl Default for NativeGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for NativeGuard {
    fn drop(&mut self) {
        NATIVE.with(|flag| flag.set(self.prev));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_sets_and_restores() {
        assert!(!is_native());
        {
            let _guard = NativeGuard::new();
            assert!(is_native());
        }
        assert!(!is_native());
    }

    #[test]
    fn nested_guards_restore_in_order() {
        let outer = NativeGuard::new();
        assert!(is_native());
        {
            let _inner = NativeGuard::new();
            assert!(is_native());
        }
        // Inner exit must not clear the outer scope.
        assert!(is_native());
        drop(outer);
        assert!(!is_native());
    }

    #[test]
    fn restores_on_unwind() {
        let result = std::panic::catch_unwind(|| {
            let _guard = NativeGuard::new();
            panic!("leave by unwinding");
        });
        assert!(result.is_err());
        assert!(!is_native());
    }

    #[test]
    fn flag_is_per_thread() {
        let _guard = NativeGuard::new();
        assert!(is_native());
        std::thread::spawn(|| assert!(!is_native()))
            .join()
            .unwrap();
    }
}
