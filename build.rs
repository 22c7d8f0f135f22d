//! Build script for the amplifier firmware
//!
//! Handles:
//! - Linker search path for a board-specific memory.x on the target build

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Host test builds never link against memory.x / link.x
    let target = std::env::var("TARGET").unwrap_or_default();
    if !target.starts_with("thumb") {
        return;
    }

    println!("cargo:rerun-if-changed=memory.x");
    if let Ok(dir) = std::env::var("CARGO_MANIFEST_DIR") {
        println!("cargo:rustc-link-search={dir}");
    }
}
