//! Gula Core - module integration engine for Xcode projects
//!
//! This library takes an already staged module (a directory of source files,
//! optionally carrying a `*.gula` manifest) and integrates it into an Xcode
//! project: files are mirrored into the app folder, legacy-era projects get
//! their group tree and file references synchronized, shared dependencies are
//! copied in and Swift packages are registered.
//!
//! # Architecture
//!
//! The library is organized into layers:
//!
//! - **Layer 1: Core Operations** - tree mirroring, the pbxproj codec and
//!   project handle, manifest resolution
//! - **Layer 2: Workflow Orchestration** - group synchronization, dependency
//!   installation and the [`Integrator`] stage machine
//! - **Layer 3: CLI/TUI Interface** - optional cliclack-based prompts (feature-gated)
//!
//! # Feature Flags
//!
//! - `tui` (default): Enables the cliclack-based overwrite prompt
//!
//! # Example Usage (without TUI)
//!
//! ```ignore
//! use gula_core::{integrate, FixedAnswer, IntegrationConfig, IntegrationRequest, Placement};
//!
//! let config = IntegrationConfig::new(".").with_force(true);
//! let request = IntegrationRequest {
//!     module_path: "/tmp/stage/Auth".into(),
//!     placement: Placement::Flat { destination: "Modules/Auth".into() },
//!     staging_root: "/tmp/stage".into(),
//! };
//! let report = integrate(&config, &mut FixedAnswer(None), &request)?;
//! ```

pub mod config;
pub mod dependencies;
pub mod error;
pub mod manifest;
pub mod mirror;
pub mod orchestrator;
pub mod project;
pub mod prompt;
pub mod sync;
pub mod toolchain;
pub mod version;

#[cfg(feature = "tui")]
pub mod tui;

// Re-export main types for convenience
pub use config::{parse_force_flag, IntegrationConfig, FORCE_INSTALL_ENV};
pub use error::{IntegrationError, Result};
pub use manifest::{LibraryDeclaration, Manifest};
pub use orchestrator::{integrate, IntegrationReport, IntegrationRequest, Integrator, Placement, Stage};
pub use project::{Era, ProjectHandle};
pub use prompt::{stdin_prompt, FixedAnswer, LinePrompt, OverwritePrompt};
pub use toolchain::{check_xcode, XcodeInfo};
