//! Directory tree mirroring
//!
//! Copies a module tree onto the target project byte-for-byte, preserving the
//! relative layout. Nothing is ever deleted; existing files are either kept or
//! replaced depending on the [`ConflictPolicy`].

use crate::error::{IntegrationError, Result};
use crate::prompt::OverwritePrompt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// What to do when a destination file already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictPolicy {
    /// Keep the existing file and log it
    Skip,
    /// Replace the existing file
    Overwrite,
}

/// Files touched by a mirror operation
#[derive(Debug, Clone, Default)]
pub struct MirrorReport {
    pub copied: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
}

impl MirrorReport {
    pub fn absorb(&mut self, other: MirrorReport) {
        self.copied.extend(other.copied);
        self.skipped.extend(other.skipped);
    }
}

/// Result of placing a whole module
#[derive(Debug)]
pub enum PlacementOutcome {
    Placed(MirrorReport),
    /// The destination existed and the operator chose to keep it
    Declined,
}

/// Recursively copy `source` into `destination`
pub fn mirror(source: &Path, destination: &Path, policy: ConflictPolicy) -> Result<MirrorReport> {
    if !source.is_dir() {
        return Err(IntegrationError::SourceNotFound {
            path: source.to_path_buf(),
        });
    }

    fs::create_dir_all(destination).map_err(|e| IntegrationError::io(destination, e))?;

    let mut report = MirrorReport::default();

    for entry in WalkDir::new(source).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(IntegrationError::walk)?;
        let relative = match entry.path().strip_prefix(source) {
            Ok(relative) => relative,
            Err(_) => continue,
        };
        let target = destination.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| IntegrationError::io(&target, e))?;
            continue;
        }

        if target.exists() && policy == ConflictPolicy::Skip {
            debug!("File already exists, skipping: {}", target.display());
            report.skipped.push(target);
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| IntegrationError::io(parent, e))?;
        }
        fs::copy(entry.path(), &target).map_err(|e| IntegrationError::io(&target, e))?;
        debug!("Copied {}", target.display());
        report.copied.push(target);
    }

    Ok(report)
}

/// Place a whole module, asking before replacing an existing destination
///
/// With `force` set an existing destination is updated in place without
/// asking. A declined prompt is not an error; an unanswerable one is.
pub fn place_module<P: OverwritePrompt + ?Sized>(
    source: &Path,
    destination: &Path,
    force: bool,
    prompt: &mut P,
) -> Result<PlacementOutcome> {
    if !source.is_dir() {
        return Err(IntegrationError::SourceNotFound {
            path: source.to_path_buf(),
        });
    }

    let policy = if destination.exists() {
        if force {
            warn!(
                "Directory {} already exists, updating with --force",
                destination.display()
            );
            ConflictPolicy::Overwrite
        } else {
            match prompt.confirm_overwrite(destination) {
                Some(true) => ConflictPolicy::Overwrite,
                Some(false) => return Ok(PlacementOutcome::Declined),
                None => {
                    return Err(IntegrationError::DestinationNoInput {
                        path: destination.to_path_buf(),
                    })
                }
            }
        }
    } else {
        ConflictPolicy::Skip
    };

    mirror(source, destination, policy).map(PlacementOutcome::Placed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::FixedAnswer;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn module_tree(root: &Path) -> PathBuf {
        let module = root.join("stage/Auth");
        write(&module.join("Data/Repository/AuthRepository.swift"), "repo");
        write(&module.join("Domain/UseCase/AuthUseCase.swift"), "use case");
        write(&module.join("auth.gula"), "{}");
        fs::create_dir_all(module.join("Presentation/Empty")).unwrap();
        module
    }

    #[test]
    fn test_mirror_preserves_structure() {
        let tmp = TempDir::new().unwrap();
        let module = module_tree(tmp.path());
        let dest = tmp.path().join("MyApp/Modules/Auth");

        let report = mirror(&module, &dest, ConflictPolicy::Skip).unwrap();

        assert_eq!(report.copied.len(), 3);
        assert!(report.skipped.is_empty());
        assert_eq!(
            fs::read_to_string(dest.join("Data/Repository/AuthRepository.swift")).unwrap(),
            "repo"
        );
        assert!(dest.join("auth.gula").exists());
        assert!(dest.join("Presentation/Empty").is_dir());
    }

    #[test]
    fn test_mirror_skips_existing_files() {
        let tmp = TempDir::new().unwrap();
        let module = module_tree(tmp.path());
        let dest = tmp.path().join("out");
        write(&dest.join("Domain/UseCase/AuthUseCase.swift"), "local edit");

        let report = mirror(&module, &dest, ConflictPolicy::Skip).unwrap();

        assert_eq!(report.copied.len(), 2);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(
            fs::read_to_string(dest.join("Domain/UseCase/AuthUseCase.swift")).unwrap(),
            "local edit"
        );
    }

    #[test]
    fn test_mirror_overwrites_when_asked() {
        let tmp = TempDir::new().unwrap();
        let module = module_tree(tmp.path());
        let dest = tmp.path().join("out");
        write(&dest.join("Domain/UseCase/AuthUseCase.swift"), "local edit");
        write(&dest.join("Domain/Extra.swift"), "kept");

        let report = mirror(&module, &dest, ConflictPolicy::Overwrite).unwrap();

        assert_eq!(report.copied.len(), 3);
        assert_eq!(
            fs::read_to_string(dest.join("Domain/UseCase/AuthUseCase.swift")).unwrap(),
            "use case"
        );
        // Never deletes
        assert!(dest.join("Domain/Extra.swift").exists());
    }

    #[test]
    fn test_mirror_missing_source_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let err = mirror(
            &tmp.path().join("missing"),
            &tmp.path().join("out"),
            ConflictPolicy::Skip,
        )
        .unwrap_err();
        assert!(matches!(err, IntegrationError::SourceNotFound { .. }));
    }

    #[test]
    fn test_place_module_declined_copies_nothing() {
        let tmp = TempDir::new().unwrap();
        let module = module_tree(tmp.path());
        let dest = tmp.path().join("MyApp/Auth");
        fs::create_dir_all(&dest).unwrap();

        let outcome = place_module(&module, &dest, false, &mut FixedAnswer(Some(false))).unwrap();

        assert!(matches!(outcome, PlacementOutcome::Declined));
        assert_eq!(fs::read_dir(&dest).unwrap().count(), 0);
    }

    #[test]
    fn test_place_module_without_answer_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let module = module_tree(tmp.path());
        let dest = tmp.path().join("MyApp/Auth");
        fs::create_dir_all(&dest).unwrap();

        let err = place_module(&module, &dest, false, &mut FixedAnswer(None)).unwrap_err();
        assert!(matches!(err, IntegrationError::DestinationNoInput { .. }));
    }

    #[test]
    fn test_place_module_force_skips_prompt() {
        let tmp = TempDir::new().unwrap();
        let module = module_tree(tmp.path());
        let dest = tmp.path().join("MyApp/Auth");
        write(&dest.join("auth.gula"), "old");

        // A prompt that would refuse is never consulted
        let outcome = place_module(&module, &dest, true, &mut FixedAnswer(None)).unwrap();

        match outcome {
            PlacementOutcome::Placed(report) => assert_eq!(report.copied.len(), 3),
            PlacementOutcome::Declined => panic!("forced placement must not be declined"),
        }
        assert_eq!(fs::read_to_string(dest.join("auth.gula")).unwrap(), "{}");
    }

    #[test]
    fn test_place_module_fresh_destination_needs_no_prompt() {
        let tmp = TempDir::new().unwrap();
        let module = module_tree(tmp.path());
        let dest = tmp.path().join("MyApp/Auth");

        let outcome = place_module(&module, &dest, false, &mut FixedAnswer(None)).unwrap();
        assert!(matches!(outcome, PlacementOutcome::Placed(_)));
    }
}
