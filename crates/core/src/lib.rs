//! # svcplus-core
//!
//! Build metadata for the svcplus binary. No workspace dependencies, safe to
//! import anywhere.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

/// Compile-time facts about the running binary.
///
/// ```
/// use svcplus_core::build_info;
///
/// let info = build_info();
/// println!("{}", info.version_string());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInfo {
    /// Package name from Cargo.toml.
    pub name: &'static str,
    /// Package version (semver).
    pub version: &'static str,
    /// Minimum supported rustc declared by the workspace.
    pub rust_version: &'static str,
    /// Operating system the binary targets.
    pub os: &'static str,
    /// CPU architecture the binary targets.
    pub arch: &'static str,
    /// `debug` or `release`.
    pub profile: &'static str,
    /// Short git hash injected through `SVCPLUS_GIT_HASH`, when present.
    pub git_hash: Option<&'static str>,
}

impl BuildInfo {
    /// `name version (hash)` or `name version`.
    #[must_use]
    pub fn version_string(&self) -> String {
        self.git_hash.map_or_else(
            || format!("{} {}", self.name, self.version),
            |hash| format!("{} {} ({hash})", self.name, self.version),
        )
    }

    /// `<arch>-<os>`, e.g. `x86_64-linux`.
    #[must_use]
    pub fn platform(&self) -> String {
        format!("{}-{}", self.arch, self.os)
    }

    /// Returns true for debug builds.
    #[must_use]
    pub const fn is_debug(&self) -> bool {
        matches!(self.profile.as_bytes(), b"debug")
    }
}

/// Returns build-time information about the binary.
#[must_use]
pub const fn build_info() -> BuildInfo {
    BuildInfo {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        rust_version: env!("CARGO_PKG_RUST_VERSION"),
        os: std::env::consts::OS,
        arch: std::env::consts::ARCH,
        profile: if cfg!(debug_assertions) {
            "debug"
        } else {
            "release"
        },
        git_hash: option_env!("SVCPLUS_GIT_HASH"),
    }
}
