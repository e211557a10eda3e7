//! Build-time information
//!
//! Metadata captured by `build.rs` at compile time. Git fields are optional
//! because the crate can be built from a source tarball.

/// Build timestamp (when the binary was compiled)
pub const BUILD_TIMESTAMP: &str = env!("VERGEN_BUILD_TIMESTAMP");

/// Cargo optimization level (0, 1, 2, 3, s, z)
pub const CARGO_OPT_LEVEL: &str = env!("VERGEN_CARGO_OPT_LEVEL");

/// Target triple (e.g., x86_64-unknown-linux-gnu, thumbv7em-none-eabihf)
pub const CARGO_TARGET_TRIPLE: &str = env!("VERGEN_CARGO_TARGET_TRIPLE");

/// Rust compiler version (e.g., 1.85.0)
pub const RUSTC_SEMVER: &str = env!("VERGEN_RUSTC_SEMVER");

pub const GIT_SHA: Option<&str> = option_env!("VERGEN_GIT_SHA");

pub const GIT_BRANCH: Option<&str> = option_env!("VERGEN_GIT_BRANCH");

/// Returns a formatted build version string
///
/// Format: `{crate_version} {target_triple}-opt{opt_level} ({sha})`
pub fn version_string() -> String {
    let sha = GIT_SHA.map_or("unknown", |sha| &sha[..sha.len().min(7)]);
    format!(
        "{} {}-opt{} ({})",
        env!("CARGO_PKG_VERSION"),
        CARGO_TARGET_TRIPLE,
        CARGO_OPT_LEVEL,
        sha
    )
}

/// Returns a detailed build info string
pub fn detailed_info() -> String {
    format!(
        "Built: {}\nTarget: {}\nOptimization: {}\nRustc: {}\nGit: {}@{}",
        BUILD_TIMESTAMP,
        CARGO_TARGET_TRIPLE,
        CARGO_OPT_LEVEL,
        RUSTC_SEMVER,
        GIT_BRANCH.unwrap_or("unknown"),
        GIT_SHA.unwrap_or("unknown"),
    )
}
