//! Version and build information embedded by `build.rs`.

use std::fmt;

use serde::Serialize;

/// Build information embedded at compile time
#[derive(Debug, Clone, Copy, Serialize)]
pub struct BuildInfo {
    pub name: &'static str,
    pub version: &'static str,
    /// Short commit hash, or "unknown" outside a git checkout
    pub git_hash: &'static str,
    #[serde(skip)]
    git_dirty: &'static str,
    pub built_at: &'static str,
    pub target: &'static str,
    pub profile: &'static str,
    pub rustc: &'static str,
}

pub const BUILD_INFO: BuildInfo = BuildInfo {
    name: env!("CARGO_PKG_NAME"),
    version: env!("CARGO_PKG_VERSION"),
    git_hash: env!("STUNTMAN_GIT_HASH"),
    git_dirty: env!("STUNTMAN_GIT_DIRTY"),
    built_at: env!("STUNTMAN_BUILD_TIMESTAMP"),
    target: env!("STUNTMAN_TARGET"),
    profile: env!("STUNTMAN_PROFILE"),
    rustc: env!("STUNTMAN_RUSTC_VERSION"),
};

impl BuildInfo {
    pub fn is_dirty(&self) -> bool {
        self.git_dirty == "true"
    }

    /// `0.1.0+abc12345`, with `.dirty` appended for uncommitted builds.
    pub fn full_version(&self) -> String {
        let dirty = if self.is_dirty() { ".dirty" } else { "" };
        format!("{}+{}{}", self.version, self.git_hash, dirty)
    }
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {}", self.name, self.full_version())?;
        writeln!(f, "  profile: {}", self.profile)?;
        writeln!(f, "  target:  {}", self.target)?;
        writeln!(f, "  built:   {}", self.built_at)?;
        writeln!(f, "  rustc:   {}", self.rustc)
    }
}
