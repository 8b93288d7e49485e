//! Generates `build_identity.rs` in OUT_DIR: firmware version and the git
//! short hash + dirty flag served by the VERSION_* and GIT_HASH_* registers.
//!
//! Outside a git checkout (crate tarball, CI cache) the hash is zero and the
//! tree is reported dirty, so an unidentifiable build never claims to be clean.

use std::env;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout).ok()
}

fn main() {
    let major: u8 = env::var("CARGO_PKG_VERSION_MAJOR")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    let minor: u8 = env::var("CARGO_PKG_VERSION_MINOR")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);

    // 7 hex digits = 28 bits, exactly what the four hash registers carry.
    let hash = git(&["rev-parse", "--short=7", "HEAD"])
        .and_then(|h| u32::from_str_radix(h.trim(), 16).ok());
    let dirty = match hash {
        Some(_) => git(&["status", "--porcelain", "--untracked-files=no"])
            .map_or(true, |s| !s.trim().is_empty()),
        None => true,
    };
    let hash = hash.unwrap_or(0) & 0x0FFF_FFFF;

    let out = PathBuf::from(env::var_os("OUT_DIR").unwrap());
    let mut file = File::create(out.join("build_identity.rs")).unwrap();
    writeln!(file, "/// Firmware major version (Cargo package version).").unwrap();
    writeln!(file, "pub const VERSION_MAJOR: u8 = {major};").unwrap();
    writeln!(file, "/// Firmware minor version (Cargo package version).").unwrap();
    writeln!(file, "pub const VERSION_MINOR: u8 = {minor};").unwrap();
    writeln!(file, "/// 28-bit git short hash of the build.").unwrap();
    writeln!(file, "pub const GIT_HASH: u32 = {hash:#09x};").unwrap();
    writeln!(file, "/// Working tree had uncommitted changes.").unwrap();
    writeln!(file, "pub const GIT_DIRTY: bool = {dirty};").unwrap();

    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=../../.git/HEAD");
    println!("cargo:rerun-if-changed=../../.git/index");
}
