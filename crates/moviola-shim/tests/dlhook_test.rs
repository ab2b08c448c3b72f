//! Dynamic-loader hook behavior: library bookkeeping, loader-entry-point
//! self-reference, and module ownership queries.

use libc::c_void;

use moviola_shim::{dlhook, find_library, module};

#[test]
fn dlopen_records_loaded_libraries() {
    unsafe {
        let handle = dlhook::dlopen(c"libm.so.6".as_ptr(), libc::RTLD_NOW);
        assert!(!handle.is_null());
    }

    let found = find_library("libm").expect("libm should be in the loaded set");
    assert!(found.contains("libm"));
    assert_eq!(find_library("libnonexistent-fragment"), None);
}

#[test]
fn dlsym_hands_back_our_loader_wrappers() {
    unsafe {
        let addr = dlhook::dlsym(libc::RTLD_DEFAULT, c"dlopen".as_ptr());
        assert_eq!(addr, dlhook::dlopen as *mut c_void);

        let addr = dlhook::dlsym(libc::RTLD_DEFAULT, c"dlsym".as_ptr());
        assert_eq!(addr, dlhook::dlsym as *mut c_void);
    }
}

#[test]
fn dlsym_resolves_ordinary_symbols_through_the_handle() {
    unsafe {
        let handle = dlhook::dlopen(c"libm.so.6".as_ptr(), libc::RTLD_NOW);
        assert!(!handle.is_null());

        let cos = dlhook::dlsym(handle, c"cos".as_ptr());
        assert!(!cos.is_null());
    }
}

#[test]
fn address_ownership_distinguishes_our_module() {
    assert!(module::owns_address(dlhook::dlopen as *const c_void));
    assert!(module::owns_address(find_library as *const c_void));

    // An address resolved out of libm does not belong to us.
    unsafe {
        let handle = dlhook::dlopen(c"libm.so.6".as_ptr(), libc::RTLD_NOW);
        assert!(!handle.is_null());
        let cos = dlhook::dlsym(handle, c"cos".as_ptr());
        assert!(!cos.is_null());
        assert!(!module::owns_address(cos));
    }
}
