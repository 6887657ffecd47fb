//! Module manifest types and parsing
//!
//! Each module may carry one `*.gula` manifest at its root declaring the shared
//! code it depends on and the Swift packages it needs. The file is JSON in
//! practice; it is read with the YAML parser, which accepts JSON documents as
//! well as hand-written YAML.

use crate::error::{IntegrationError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// An external Swift package required by a module
///
/// Fields are passed through untouched; the project adapter validates the URL
/// and version when it registers the package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryDeclaration {
    /// Product name linked into the target
    #[serde(default)]
    pub name: String,

    /// Repository URL of the package
    #[serde(default)]
    pub url: String,

    /// Minimum version (up to next major)
    #[serde(default)]
    pub version: String,
}

/// Parsed `*.gula` manifest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Shared-code locations relative to the staging root, e.g. `Gula/Shared/Network`
    #[serde(default)]
    pub shared: Vec<String>,

    /// External libraries to register with the project
    #[serde(default)]
    pub libraries: Vec<LibraryDeclaration>,
}

impl Manifest {
    pub fn is_empty(&self) -> bool {
        self.shared.is_empty() && self.libraries.is_empty()
    }

    /// Parse manifest text; an empty document is an empty manifest
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Manifest::default());
        }
        serde_yaml::from_str(content).map_err(|source| IntegrationError::MalformedManifest {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Find the manifest file directly inside `module_dir`
///
/// Manifests are matched by extension. When several are present the first in
/// name order wins.
pub fn locate(module_dir: &Path, extension: &str) -> Result<Option<PathBuf>> {
    let entries = match fs::read_dir(module_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(IntegrationError::io(module_dir, e)),
    };

    let mut candidates = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| IntegrationError::io(module_dir, e))?;
        let path = entry.path();
        let matches = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
        if matches && path.is_file() {
            candidates.push(path);
        }
    }
    candidates.sort();

    if candidates.len() > 1 {
        warn!(
            "Found {} manifests in {}, using {}",
            candidates.len(),
            module_dir.display(),
            candidates[0].display()
        );
    }

    Ok(candidates.into_iter().next())
}

/// Read the module's manifest, or an empty one when the module has none
pub fn resolve(module_dir: &Path, extension: &str) -> Result<Manifest> {
    let Some(path) = locate(module_dir, extension)? else {
        warn!(
            "No .{} file found in '{}', assuming no dependencies",
            extension,
            module_dir.display()
        );
        return Ok(Manifest::default());
    };

    let content = fs::read_to_string(&path).map_err(|e| IntegrationError::io(&path, e))?;
    Manifest::parse(&content, &path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_json_manifest() {
        let content = r#"{
            "shared": ["Gula/Shared/Util", "Gula/Shared/Network"],
            "libraries": [
                {"name": "Logger", "url": "https://example/logger", "version": "1.0.0"}
            ]
        }"#;
        let manifest = Manifest::parse(content, Path::new("auth.gula")).unwrap();

        assert_eq!(manifest.shared, vec!["Gula/Shared/Util", "Gula/Shared/Network"]);
        assert_eq!(
            manifest.libraries,
            vec![LibraryDeclaration {
                name: "Logger".to_string(),
                url: "https://example/logger".to_string(),
                version: "1.0.0".to_string(),
            }]
        );
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let manifest = Manifest::parse(r#"{"shared": ["Gula/Shared/Util"]}"#, Path::new("m.gula"))
            .unwrap();
        assert_eq!(manifest.shared.len(), 1);
        assert!(manifest.libraries.is_empty());

        let manifest = Manifest::parse("", Path::new("m.gula")).unwrap();
        assert!(manifest.is_empty());
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let content = r#"{"shared": [], "libraries": [], "description": "Auth module"}"#;
        let manifest = Manifest::parse(content, Path::new("m.gula")).unwrap();
        assert!(manifest.is_empty());
    }

    #[test]
    fn test_library_fields_pass_through_unvalidated() {
        let content = r#"{"libraries": [{"name": "Broken", "url": "not a url"}]}"#;
        let manifest = Manifest::parse(content, Path::new("m.gula")).unwrap();
        assert_eq!(manifest.libraries[0].url, "not a url");
        assert_eq!(manifest.libraries[0].version, "");
    }

    #[test]
    fn test_malformed_manifest_is_fatal() {
        let err = Manifest::parse(r#"{"shared": ["#, Path::new("m.gula")).unwrap_err();
        assert!(matches!(err, IntegrationError::MalformedManifest { .. }));

        let err = Manifest::parse(r#"{"shared": "Gula/Shared"}"#, Path::new("m.gula")).unwrap_err();
        assert!(matches!(err, IntegrationError::MalformedManifest { .. }));
    }

    #[test]
    fn test_resolve_without_manifest_is_empty() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("README.md"), "docs").unwrap();

        let manifest = resolve(tmp.path(), "gula").unwrap();
        assert!(manifest.is_empty());
    }

    #[test]
    fn test_resolve_reads_manifest_by_extension() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("authentication.gula"),
            r#"{"shared": ["Gula/Shared/Util"]}"#,
        )
        .unwrap();

        let located = locate(tmp.path(), "gula").unwrap().unwrap();
        assert_eq!(located.file_name().unwrap(), "authentication.gula");

        let manifest = resolve(tmp.path(), "gula").unwrap();
        assert_eq!(manifest.shared, vec!["Gula/Shared/Util"]);
    }

    #[test]
    fn test_locate_prefers_first_by_name() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("b.gula"), "{}").unwrap();
        fs::write(tmp.path().join("a.gula"), "{}").unwrap();

        let located = locate(tmp.path(), "gula").unwrap().unwrap();
        assert_eq!(located.file_name().unwrap(), "a.gula");
    }
}
