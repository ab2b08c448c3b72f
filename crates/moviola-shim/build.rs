//! Build script for moviola-shim
//!
//! Compiles the C bridge for variadic entry points (`open` family,
//! `fprintf`/`vfprintf`). The C compiler generates correct va_list ABI code
//! on every target; the bridge hands fixed-arity calls to Rust.
//!
//! Also builds a small shared-object fixture for the integration tests and
//! makes test binaries export their symbols, so code they `dlopen` binds
//! against the hooks the way a preloaded process would.

use std::path::PathBuf;

fn main() {
    let target_os = std::env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    if target_os != "linux" {
        return;
    }

    println!("cargo:rerun-if-changed=src/c/variadic_bridge.c");
    cc::Build::new()
        .file("src/c/variadic_bridge.c")
        .opt_level(2)
        .compile("variadic_bridge");

    println!("cargo:rerun-if-changed=tests/fixtures/ctor_writer.c");
    let out_dir = PathBuf::from(std::env::var("OUT_DIR").expect("OUT_DIR set by cargo"));
    let fixture = out_dir.join("libctor_writer.so");
    let status = cc::Build::new()
        .get_compiler()
        .to_command()
        .args(["-shared", "-fPIC", "-o"])
        .arg(&fixture)
        .arg("tests/fixtures/ctor_writer.c")
        .status()
        .expect("compiling test fixture shared object");
    assert!(status.success(), "test fixture compilation failed");

    println!("cargo:rustc-link-arg-tests=-Wl,--export-dynamic");
}
