use std::process::Command;

/// Short commit hash from git, or `GIT_SHA` when building outside a checkout
fn commit_sha() -> Option<String> {
    let from_git = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|out| out.status.success())
        .map(|out| String::from_utf8_lossy(&out.stdout).trim().to_string());

    from_git
        .into_iter()
        .chain(std::env::var("GIT_SHA").ok())
        .find(|sha| !sha.is_empty())
}

fn is_nightly() -> bool {
    std::env::var("ENTSOE_NIGHTLY").is_ok_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

fn main() {
    let mut version = env!("CARGO_PKG_VERSION").to_string();
    if is_nightly() {
        version.push_str("-nightly");
        if let Some(sha) = commit_sha() {
            version.push('+');
            version.push_str(&sha);
        }
    }

    // Reported by the User-Agent header and /api/version
    println!("cargo:rustc-env=APP_VERSION={version}");

    for var in ["ENTSOE_NIGHTLY", "GIT_SHA"] {
        println!("cargo:rerun-if-env-changed={var}");
    }
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/heads");
}
