//! Error types for module integration
//!
//! Only fatal conditions live here. Soft outcomes (a missing manifest, a
//! declined overwrite, a library or file reference that is already present)
//! are reported through the outcome types of the module that produced them.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors that abort an integration run
#[derive(Error, Debug)]
pub enum IntegrationError {
    /// No `.xcodeproj` bundle in the invocation directory
    #[error("No .xcodeproj found in {}", dir.display())]
    ProjectNotFound { dir: PathBuf },

    /// The project descriptor could not be parsed
    #[error("Malformed project descriptor {}: {message} (line {line})", path.display())]
    MalformedProject {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// The descriptor parsed but lacks an object the engine depends on
    #[error("Unexpected project structure: {message}")]
    ProjectStructure { message: String },

    /// `objectVersion` is missing or not numeric
    #[error("No objectVersion found in {}", path.display())]
    VersionMarkerMissing { path: PathBuf },

    /// The module manifest exists but is not valid structured data
    #[error("Failed to parse manifest {}: {source}", path.display())]
    MalformedManifest {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A module, layer or shared dependency is not present on disk
    #[error("Source folder not found: {}", path.display())]
    SourceNotFound { path: PathBuf },

    /// Overwrite confirmation was required but stdin had nothing to read
    #[error(
        "Could not read a response for existing directory {}. Use --force to reinstall automatically.",
        path.display()
    )]
    DestinationNoInput { path: PathBuf },

    /// A library declaration was rejected when registering it with the project
    #[error("Invalid library '{name}': {message}")]
    InvalidLibrary { name: String, message: String },

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl IntegrationError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        IntegrationError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn walk(err: walkdir::Error) -> Self {
        let path = err.path().map(PathBuf::from).unwrap_or_default();
        let source = err.into_io_error().unwrap_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "filesystem loop detected")
        });
        IntegrationError::Io { path, source }
    }

    pub(crate) fn structure(message: impl Into<String>) -> Self {
        IntegrationError::ProjectStructure {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, IntegrationError>;
