//! Integration workflow
//!
//! One integration walks a fixed sequence of stages:
//!
//! ```text
//! Start -> ProjectDiscovered -> EraClassified -> FilesPlaced
//!       -> Indexed (legacy only) -> DependenciesResolved
//!       -> LibrariesInstalled -> Done
//! ```
//!
//! Any fatal error aborts the run where it happens. Work already written to
//! disk or to the project descriptor stays; every step is idempotent, so a
//! rerun picks up where the failed one stopped.

use crate::config::IntegrationConfig;
use crate::dependencies::{install_libraries, install_shared, InstallReport};
use crate::error::{IntegrationError, Result};
use crate::manifest;
use crate::mirror::{mirror, place_module, ConflictPolicy, MirrorReport, PlacementOutcome};
use crate::project::{Era, ProjectHandle};
use crate::prompt::OverwritePrompt;
use crate::sync::{sync, sync_layer, SyncReport};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Where the module's files go inside the app folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// The whole module lands at `<App>/<destination>`
    Flat { destination: String },
    /// Each top-level directory of the module is a layer merged into `<App>/<layer>`
    Layered { module_name: String },
}

/// Inputs of one integration run
#[derive(Debug, Clone)]
pub struct IntegrationRequest {
    /// Staged module directory
    pub module_path: PathBuf,
    pub placement: Placement,
    /// Root of the staging area that shared identifiers resolve against
    pub staging_root: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    ProjectDiscovered,
    EraClassified,
    FilesPlaced,
    Indexed,
    DependenciesResolved,
    LibrariesInstalled,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Start => "start",
            Stage::ProjectDiscovered => "project discovered",
            Stage::EraClassified => "era classified",
            Stage::FilesPlaced => "files placed",
            Stage::Indexed => "indexed",
            Stage::DependenciesResolved => "dependencies resolved",
            Stage::LibrariesInstalled => "libraries installed",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Summary of a finished integration
#[derive(Debug, Clone)]
pub struct IntegrationReport {
    pub app_name: String,
    pub object_version: u32,
    pub era: Era,
    /// Module files written or kept
    pub placed: MirrorReport,
    /// The operator chose to keep an existing destination
    pub declined: bool,
    /// Layers merged by a layered placement, in order
    pub layers: Vec<String>,
    /// Indexing of the module's own files
    pub index: SyncReport,
    pub dependencies: InstallReport,
    /// Stages visited, in order
    pub stages: Vec<Stage>,
}

/// Drives one integration through its stages
pub struct Integrator<'a> {
    config: &'a IntegrationConfig,
    prompt: &'a mut dyn OverwritePrompt,
    stages: Vec<Stage>,
}

impl<'a> Integrator<'a> {
    pub fn new(config: &'a IntegrationConfig, prompt: &'a mut dyn OverwritePrompt) -> Self {
        Self {
            config,
            prompt,
            stages: vec![Stage::Start],
        }
    }

    /// Last stage reached
    pub fn stage(&self) -> Stage {
        self.stages.last().copied().unwrap_or(Stage::Start)
    }

    fn advance(&mut self, stage: Stage) {
        debug!("Stage: {} -> {}", self.stage(), stage);
        self.stages.push(stage);
    }

    pub fn run(&mut self, request: &IntegrationRequest) -> Result<IntegrationReport> {
        let mut project = ProjectHandle::open(self.config.project_dir())?;
        self.advance(Stage::ProjectDiscovered);

        let era = project.classify_era(self.config.legacy_ceiling)?;
        let object_version = project.object_version()?;
        self.advance(Stage::EraClassified);

        let app_name = project.app_name().to_string();
        let app_dir = project.project_root().join(&app_name);

        let mut placed = MirrorReport::default();
        let mut declined = false;
        let mut layers = Vec::new();
        let mut index = SyncReport::default();

        match &request.placement {
            Placement::Flat { destination } => {
                let target = app_dir.join(destination);
                match place_module(
                    &request.module_path,
                    &target,
                    self.config.force,
                    &mut *self.prompt,
                )? {
                    PlacementOutcome::Placed(report) => placed = report,
                    PlacementOutcome::Declined => {
                        info!("Keeping existing {}", target.display());
                        declined = true;
                    }
                }
                self.advance(Stage::FilesPlaced);

                if era.needs_index_sync() {
                    index = sync(&mut project, &app_name, &target, destination, self.config)?;
                    self.advance(Stage::Indexed);
                }
            }
            Placement::Layered { module_name } => {
                info!("Merging module {} into {}", module_name, app_dir.display());
                layers = module_layers(&request.module_path)?;
                let policy = if self.config.force {
                    ConflictPolicy::Overwrite
                } else {
                    ConflictPolicy::Skip
                };
                for layer in &layers {
                    placed.absorb(mirror(
                        &request.module_path.join(layer),
                        &app_dir.join(layer),
                        policy,
                    )?);
                }
                self.advance(Stage::FilesPlaced);

                if era.needs_index_sync() {
                    for layer in &layers {
                        index.absorb(sync_layer(&mut project, &app_dir, layer, self.config)?);
                    }
                    self.advance(Stage::Indexed);
                }
            }
        }

        let manifest = manifest::resolve(&request.module_path, &self.config.manifest_extension)?;
        let mut dependencies = InstallReport::default();
        let libraries = install_shared(
            &mut project,
            &request.staging_root,
            &manifest,
            era,
            self.config,
            &mut dependencies,
        )?;
        self.advance(Stage::DependenciesResolved);

        install_libraries(&mut project, &libraries, &mut dependencies)?;
        self.advance(Stage::LibrariesInstalled);

        self.advance(Stage::Done);

        Ok(IntegrationReport {
            app_name,
            object_version,
            era,
            placed,
            declined,
            layers,
            index,
            dependencies,
            stages: self.stages.clone(),
        })
    }
}

/// Run one integration with the given configuration and prompt
pub fn integrate(
    config: &IntegrationConfig,
    prompt: &mut dyn OverwritePrompt,
    request: &IntegrationRequest,
) -> Result<IntegrationReport> {
    Integrator::new(config, prompt).run(request)
}

/// Visible top-level directories of a layered module, sorted
fn module_layers(module_path: &Path) -> Result<Vec<String>> {
    if !module_path.is_dir() {
        return Err(IntegrationError::SourceNotFound {
            path: module_path.to_path_buf(),
        });
    }

    let entries = fs::read_dir(module_path).map_err(|e| IntegrationError::io(module_path, e))?;
    let mut layers = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| IntegrationError::io(module_path, e))?;
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('.') || !entry.path().is_dir() {
            continue;
        }
        layers.push(name);
    }
    layers.sort();
    Ok(layers)
}
