//! Run configuration for an integration
//!
//! Everything the engine needs to know about the invocation is carried by an
//! explicitly constructed [`IntegrationConfig`] rather than read from globals.

use std::path::{Path, PathBuf};

/// Extension of module manifest files
pub const MANIFEST_EXTENSION: &str = "gula";

/// Highest `objectVersion` written by legacy-era Xcode (15 and earlier)
pub const LEGACY_OBJECT_VERSION_CEILING: u32 = 76;

/// Environment variable that forces overwriting existing destinations
pub const FORCE_INSTALL_ENV: &str = "FORCE_INSTALL";

/// Configuration for one integration run
#[derive(Debug, Clone)]
pub struct IntegrationConfig {
    /// Directory containing the `.xcodeproj` bundle
    pub project_dir: PathBuf,

    /// Replace existing module destinations without asking
    pub force: bool,

    /// Manifest file extension (without the dot)
    pub manifest_extension: String,

    /// Object versions above this value are treated as modern-era projects
    pub legacy_ceiling: u32,
}

impl IntegrationConfig {
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        Self {
            project_dir: project_dir.into(),
            force: false,
            manifest_extension: MANIFEST_EXTENSION.to_string(),
            legacy_ceiling: LEGACY_OBJECT_VERSION_CEILING,
        }
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    /// Whether `path` is a module manifest and must be kept out of the index
    pub fn is_manifest(&self, path: &Path) -> bool {
        path.extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(self.manifest_extension.as_str()))
    }
}

/// Interpret a `FORCE_INSTALL`-style value
pub fn parse_force_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes"
    )
}
