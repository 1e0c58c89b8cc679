use std::process::Command;

/// Short commit hash reported by `/health`.
///
/// `ROUTINE_BUILD_SHA` wins when set, for builds from a source tarball where
/// no `.git` directory exists.
fn main() {
    println!("cargo:rerun-if-env-changed=ROUTINE_BUILD_SHA");
    println!("cargo:rerun-if-changed=../../.git/HEAD");

    let sha = std::env::var("ROUTINE_BUILD_SHA")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .or_else(git_short_sha)
        .unwrap_or_else(|| "unknown".to_string());

    println!("cargo:rustc-env=ROUTINE_GIT_SHA={sha}");
}

fn git_short_sha() -> Option<String> {
    let out = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;
    out.status
        .success()
        .then(|| String::from_utf8_lossy(&out.stdout).trim().to_string())
}
