//! Build script: exposes `STUNTMAN_*` build metadata to `src/version.rs`.

use std::env;
use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/index");

    let git_dirty = match command_output("git", &["status", "--porcelain"]) {
        Some(status) if status.is_empty() => "false",
        Some(_) => "true",
        None => "unknown",
    };

    let metadata = [
        (
            "GIT_HASH",
            command_output("git", &["rev-parse", "--short=8", "HEAD"]),
        ),
        ("GIT_DIRTY", Some(git_dirty.to_string())),
        (
            "BUILD_TIMESTAMP",
            Some(chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string()),
        ),
        ("TARGET", env::var("TARGET").ok()),
        ("PROFILE", env::var("PROFILE").ok()),
        ("RUSTC_VERSION", command_output("rustc", &["--version"])),
    ];

    for (key, value) in metadata {
        println!(
            "cargo:rustc-env=STUNTMAN_{}={}",
            key,
            value.unwrap_or_else(|| "unknown".to_string())
        );
    }
}

/// Trimmed stdout of a successful command
fn command_output(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout)
        .ok()
        .map(|s| s.trim().to_string())
}
