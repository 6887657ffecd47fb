//! Group synchronization for legacy-era projects
//!
//! Mirrors a directory tree that is already on disk into the project's group
//! hierarchy: one group per directory, one file reference per regular file.
//! Manifests and hidden files are never indexed.

use crate::config::IntegrationConfig;
use crate::error::{IntegrationError, Result};
use crate::project::{GroupId, GroupLookup, ProjectHandle, ReferenceOutcome};
use std::path::Path;
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

/// What a synchronization pass changed
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub groups_created: usize,
    /// Paths (relative to the synchronized directory) that gained a reference
    pub references_added: Vec<String>,
    /// Paths whose file name was already referenced in its group
    pub already_present: Vec<String>,
}

impl SyncReport {
    pub fn absorb(&mut self, other: SyncReport) {
        self.groups_created += other.groups_created;
        self.references_added.extend(other.references_added);
        self.already_present.extend(other.already_present);
    }

    pub fn is_noop(&self) -> bool {
        self.groups_created == 0 && self.references_added.is_empty()
    }
}

fn track(lookup: GroupLookup, report: &mut SyncReport) -> GroupId {
    if lookup.was_created() {
        report.groups_created += 1;
    }
    lookup.id()
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}

/// Index `destination` under `<app_group>/<relative_group_path>`
pub fn sync(
    project: &mut ProjectHandle,
    app_group: &str,
    destination: &Path,
    relative_group_path: &str,
    config: &IntegrationConfig,
) -> Result<SyncReport> {
    let mut report = SyncReport::default();

    let main = project.main_group();
    let mut base = track(project.find_or_create_group(main, app_group)?, &mut report);
    for segment in relative_group_path.split('/').filter(|s| !s.is_empty()) {
        base = track(project.find_or_create_group(base, segment)?, &mut report);
    }

    if !destination.is_dir() {
        debug!("Nothing to index at {}", destination.display());
        return Ok(report);
    }

    let walker = WalkDir::new(destination)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e));

    for entry in walker {
        let entry = entry.map_err(IntegrationError::walk)?;
        if entry.file_type().is_dir() || config.is_manifest(entry.path()) {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(destination) else {
            continue;
        };

        let mut group = base;
        if let Some(parent) = relative.parent() {
            for component in parent.components() {
                let name = component.as_os_str().to_string_lossy();
                group = track(project.find_or_create_group(group, &name)?, &mut report);
            }
        }

        let shown = relative.to_string_lossy().replace('\\', "/");
        match project.add_file_reference(group, entry.path())? {
            ReferenceOutcome::Added => {
                info!(
                    "Reference added: {} in group {}",
                    shown,
                    project.groups().path(group)
                );
                report.references_added.push(shown);
            }
            ReferenceOutcome::AlreadyPresent => {
                info!("Reference already present: {}", shown);
                report.already_present.push(shown);
            }
        }
    }

    Ok(report)
}

/// Index one layer placed directly under the app root (`<app>/<layer>`)
pub fn sync_layer(
    project: &mut ProjectHandle,
    app_dir: &Path,
    layer: &str,
    config: &IntegrationConfig,
) -> Result<SyncReport> {
    let app_name = project.app_name().to_string();
    sync(project, &app_name, &app_dir.join(layer), layer, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::fixtures::{create_project, write_file};
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> (TempDir, IntegrationConfig) {
        let tmp = TempDir::new().unwrap();
        create_project(tmp.path(), 56);
        let app = tmp.path().join("MyApp/Modules/Auth");
        write_file(&app.join("Data/Repository/AuthRepository.swift"), "");
        write_file(&app.join("Data/Repository/Auth/AuthRepository.swift"), "");
        write_file(&app.join("Domain/AuthUseCase.swift"), "");
        write_file(&app.join("auth.gula"), "{}");
        write_file(&app.join("Data/.DS_Store"), "");
        let config = IntegrationConfig::new(tmp.path());
        (tmp, config)
    }

    #[test]
    fn test_sync_builds_nested_groups() {
        let (tmp, config) = setup();
        let mut project = ProjectHandle::open(tmp.path()).unwrap();
        let dest = tmp.path().join("MyApp/Modules/Auth");

        let report = sync(&mut project, "MyApp", &dest, "Modules/Auth", &config).unwrap();

        // Modules, Auth, Data, Repository, Repository/Auth, Domain
        assert_eq!(report.groups_created, 6);
        assert_eq!(
            report.references_added,
            vec![
                "Data/Repository/Auth/AuthRepository.swift",
                "Data/Repository/AuthRepository.swift",
                "Domain/AuthUseCase.swift",
            ]
        );

        let groups = project.groups();
        let app = groups.child(groups.root(), "MyApp").unwrap();
        let modules = groups.child(app, "Modules").unwrap();
        let auth = groups.child(modules, "Auth").unwrap();
        let repository = groups
            .child(groups.child(auth, "Data").unwrap(), "Repository")
            .unwrap();
        assert!(groups.has_file(repository, "AuthRepository.swift"));
        // Same file name in a different group is a separate reference
        let nested = groups.child(repository, "Auth").unwrap();
        assert!(groups.has_file(nested, "AuthRepository.swift"));
        // Manifest and hidden files are not indexed
        assert!(!groups.has_file(auth, "auth.gula"));
        assert_eq!(groups.files(groups.child(auth, "Data").unwrap()).count(), 0);
    }

    #[test]
    fn test_resync_changes_nothing() {
        let (tmp, config) = setup();
        let dest = tmp.path().join("MyApp/Modules/Auth");
        let descriptor = tmp.path().join("MyApp.xcodeproj/project.pbxproj");

        let mut project = ProjectHandle::open(tmp.path()).unwrap();
        sync(&mut project, "MyApp", &dest, "Modules/Auth", &config).unwrap();
        let bytes_before = fs::read(&descriptor).unwrap();
        let objects_before = project.object_count();

        let mut project = ProjectHandle::open(tmp.path()).unwrap();
        let report = sync(&mut project, "MyApp", &dest, "Modules/Auth", &config).unwrap();

        assert!(report.is_noop());
        assert_eq!(report.already_present.len(), 3);
        assert_eq!(project.object_count(), objects_before);
        assert_eq!(fs::read(&descriptor).unwrap(), bytes_before);
    }

    #[test]
    fn test_existing_reference_is_reported() {
        let tmp = TempDir::new().unwrap();
        create_project(tmp.path(), 56);
        write_file(&tmp.path().join("MyApp/Data/Foo.swift"), "");
        let config = IntegrationConfig::new(tmp.path());

        let mut project = ProjectHandle::open(tmp.path()).unwrap();
        let app_dir = tmp.path().join("MyApp");
        let first = sync_layer(&mut project, &app_dir, "Data", &config).unwrap();
        assert_eq!(first.references_added, vec!["Foo.swift"]);

        let second = sync_layer(&mut project, &app_dir, "Data", &config).unwrap();
        assert_eq!(second.already_present, vec!["Foo.swift"]);
        assert!(second.is_noop());
    }

    #[test]
    fn test_missing_destination_only_creates_groups() {
        let tmp = TempDir::new().unwrap();
        create_project(tmp.path(), 56);
        let config = IntegrationConfig::new(tmp.path());

        let mut project = ProjectHandle::open(tmp.path()).unwrap();
        let report = sync(
            &mut project,
            "MyApp",
            &tmp.path().join("MyApp/Nothing"),
            "Nothing",
            &config,
        )
        .unwrap();

        assert_eq!(report.groups_created, 1);
        assert!(report.references_added.is_empty());
    }
}
