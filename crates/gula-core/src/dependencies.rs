//! Shared-code and library dependency installation
//!
//! Shared identifiers look like `Gula/Shared/Network`: the first segment is
//! the template root placeholder and is replaced by the app's own folder, so
//! the staged `<staging>/Gula/Shared/Network` lands in `<App>/Shared/Network`.
//! A shared directory may carry its own manifest; its dependencies are
//! installed too, each identifier at most once per run.

use crate::config::IntegrationConfig;
use crate::error::Result;
use crate::manifest::{self, LibraryDeclaration, Manifest};
use crate::mirror::{mirror, ConflictPolicy, MirrorReport};
use crate::project::{Era, PackageOutcome, ProjectHandle};
use crate::sync::{sync, sync_layer, SyncReport};
use std::collections::{HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Where one shared identifier comes from and goes to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedPlacement {
    pub identifier: String,
    pub source: PathBuf,
    pub destination: PathBuf,
    /// First segment below the app root (e.g. `Shared`), if any
    pub layer: Option<String>,
}

/// Map a shared identifier onto the staging area and the app tree
pub fn plan_shared(
    identifier: &str,
    app_name: &str,
    staging_root: &Path,
    project_root: &Path,
) -> SharedPlacement {
    let segments: Vec<&str> = identifier.split('/').filter(|s| !s.is_empty()).collect();
    let below_root = segments.get(1..).unwrap_or_default();

    let mut source = staging_root.to_path_buf();
    source.extend(&segments);

    let mut destination = project_root.join(app_name);
    destination.extend(below_root);

    SharedPlacement {
        identifier: identifier.to_string(),
        source,
        destination,
        layer: below_root.first().map(|s| s.to_string()),
    }
}

/// Everything the installer did
#[derive(Debug, Clone, Default)]
pub struct InstallReport {
    pub shared: Vec<SharedPlacement>,
    pub mirror: MirrorReport,
    pub sync: SyncReport,
    pub libraries_added: Vec<String>,
    pub libraries_present: Vec<String>,
}

/// Install the dependencies declared by `manifest`
pub fn install(
    project: &mut ProjectHandle,
    staging_root: &Path,
    manifest: &Manifest,
    era: Era,
    config: &IntegrationConfig,
) -> Result<InstallReport> {
    let mut report = InstallReport::default();
    let libraries = install_shared(project, staging_root, manifest, era, config, &mut report)?;
    install_libraries(project, &libraries, &mut report)?;
    Ok(report)
}

/// Copy and index every shared dependency, following nested manifests
///
/// Shared copies never replace existing files, whatever the force setting.
/// For legacy-era projects each distinct layer is indexed once, after all
/// copies are done. Returns the library declarations collected along the way.
pub fn install_shared(
    project: &mut ProjectHandle,
    staging_root: &Path,
    manifest: &Manifest,
    era: Era,
    config: &IntegrationConfig,
    report: &mut InstallReport,
) -> Result<Vec<LibraryDeclaration>> {
    let app_name = project.app_name().to_string();
    let project_root = project.project_root().to_path_buf();

    let mut seen: HashSet<String> = HashSet::new();
    let mut queue: VecDeque<String> = manifest.shared.iter().cloned().collect();
    let mut libraries: Vec<LibraryDeclaration> = manifest.libraries.clone();
    let mut layers: Vec<Option<String>> = Vec::new();

    while let Some(identifier) = queue.pop_front() {
        if !seen.insert(identifier.clone()) {
            continue;
        }

        let placement = plan_shared(&identifier, &app_name, staging_root, &project_root);
        info!(
            "Shared dependency {} -> {}",
            identifier,
            placement.destination.display()
        );
        report
            .mirror
            .absorb(mirror(&placement.source, &placement.destination, ConflictPolicy::Skip)?);

        if let Some(nested) = nested_manifest(&placement.source, config)? {
            queue.extend(nested.shared);
            libraries.extend(nested.libraries);
        }

        if !layers.contains(&placement.layer) {
            layers.push(placement.layer.clone());
        }
        report.shared.push(placement);
    }

    if era.needs_index_sync() {
        let app_dir = project_root.join(&app_name);
        for layer in &layers {
            let synced = match layer {
                Some(layer) => sync_layer(project, &app_dir, layer, config)?,
                None => sync(project, &app_name, &app_dir, "", config)?,
            };
            report.sync.absorb(synced);
        }
    }

    Ok(libraries)
}

/// Register each library with the project; already-present URLs are reported
pub fn install_libraries(
    project: &mut ProjectHandle,
    libraries: &[LibraryDeclaration],
    report: &mut InstallReport,
) -> Result<()> {
    for library in libraries {
        match project.add_package_reference(library)? {
            PackageOutcome::Added => {
                info!("Library added: {} ({})", library.name, library.url);
                report.libraries_added.push(library.name.clone());
            }
            PackageOutcome::AlreadyPresent { existing_url } => {
                warn!(
                    "Library {} is already installed ({})",
                    library.name, existing_url
                );
                report.libraries_present.push(library.name.clone());
            }
        }
    }
    Ok(())
}

/// Manifest inside a staged shared directory, if it has one
fn nested_manifest(source: &Path, config: &IntegrationConfig) -> Result<Option<Manifest>> {
    let Some(path) = manifest::locate(source, &config.manifest_extension)? else {
        return Ok(None);
    };
    let content = fs::read_to_string(&path)
        .map_err(|e| crate::error::IntegrationError::io(&path, e))?;
    Manifest::parse(&content, &path).map(Some)
}
