//! gula-xcode - integrate staged gula modules into Xcode projects

use anyhow::{bail, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use colored::Colorize;
use gula_core::project::ProjectHandle;
use gula_core::{
    check_xcode, integrate, parse_force_flag, Era, IntegrationConfig, IntegrationReport,
    IntegrationRequest, Placement, FORCE_INSTALL_ENV,
};
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "gula-xcode")]
#[command(about = "Integrate staged gula modules into an Xcode project")]
#[command(version)]
pub struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory containing the .xcodeproj (defaults to the current directory)
    #[arg(long = "project-dir", global = true)]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Copy a module into <App>/<destination> and index it
    Install(InstallArgs),
    /// Merge each layer of a module into the matching <App>/<layer> folder
    Integrate(IntegrateArgs),
    /// Report the project's object version and era
    Check(CheckArgs),
}

#[derive(ClapArgs, Debug)]
pub struct InstallArgs {
    /// Staged module directory
    pub module_path: PathBuf,

    /// Destination relative to the app folder (e.g. Modules/Auth)
    pub destination: String,

    /// Root of the staging area shared dependencies resolve against
    pub staging_root: PathBuf,

    /// Replace an existing destination without asking (also FORCE_INSTALL=true)
    #[arg(short, long)]
    pub force: bool,
}

#[derive(ClapArgs, Debug)]
pub struct IntegrateArgs {
    /// Staged module directory whose subfolders are layers
    pub module_path: PathBuf,

    /// Module name, for display
    pub module_name: String,

    /// Root of the staging area shared dependencies resolve against
    pub staging_root: PathBuf,

    /// Overwrite files that already exist in the app folder
    #[arg(short, long)]
    pub force: bool,
}

#[derive(ClapArgs, Debug)]
pub struct CheckArgs {
    /// Exit with an error unless the project uses the Xcode 16+ layout
    #[arg(long = "require-modern")]
    pub require_modern: bool,
}

fn main() -> Result<()> {
    // Ensure terminal cursor is restored on panic
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = console::Term::stderr().show_cursor();
        default_panic(info);
    }));

    // Handle Ctrl+C gracefully
    ctrlc::set_handler(move || {
        let _ = console::Term::stderr().show_cursor();
        std::process::exit(130);
    })
    .ok();

    let args = Args::parse();

    // RUST_LOG wins over the built-in levels
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if args.verbose {
            EnvFilter::new("gula_core=debug,gula_xcode=debug")
        } else {
            EnvFilter::new("gula_core=info,gula_xcode=info")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let project_dir = match args.project_dir {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to read the current directory")?,
    };

    let result = match args.command {
        Command::Install(install) => {
            let request = IntegrationRequest {
                module_path: install.module_path,
                placement: Placement::Flat {
                    destination: install.destination,
                },
                staging_root: install.staging_root,
            };
            run_integration(project_dir, install.force, request)
        }
        Command::Integrate(layered) => {
            let request = IntegrationRequest {
                module_path: layered.module_path,
                placement: Placement::Layered {
                    module_name: layered.module_name,
                },
                staging_root: layered.staging_root,
            };
            run_integration(project_dir, layered.force, request)
        }
        Command::Check(check) => run_check(project_dir, check.require_modern),
    };

    // Ensure cursor is visible on normal exit
    let _ = console::Term::stderr().show_cursor();

    result
}

/// `--force` on the command line, or a truthy FORCE_INSTALL in the environment
fn force_requested(flag: bool) -> bool {
    flag || std::env::var(FORCE_INSTALL_ENV)
        .map(|value| parse_force_flag(&value))
        .unwrap_or(false)
}

fn run_integration(project_dir: PathBuf, force: bool, request: IntegrationRequest) -> Result<()> {
    let xcode = check_xcode();
    if xcode.available {
        info!("{}", xcode);
    } else {
        debug!("xcodebuild not available");
    }

    let config = IntegrationConfig::new(project_dir).with_force(force_requested(force));
    let mut prompt = gula_core::tui::overwrite_prompt();

    let report = integrate(&config, prompt.as_mut(), &request)?;
    print_summary(&report);
    Ok(())
}

fn run_check(project_dir: PathBuf, require_modern: bool) -> Result<()> {
    let config = IntegrationConfig::new(project_dir);
    let project = ProjectHandle::open(config.project_dir())?;
    let era = project.classify_era(config.legacy_ceiling)?;
    let object_version = project.object_version()?;

    println!(
        "{} {}",
        "Project:".bold(),
        project.bundle_path().display()
    );
    println!("{} {}", "objectVersion:".bold(), object_version);
    println!("{} {}", "Layout:".bold(), era);

    let xcode = check_xcode();
    if xcode.available {
        println!("{} {}", "Installed:".bold(), xcode);
    }

    if require_modern && era == Era::Legacy {
        bail!(
            "{} uses the legacy project layout (objectVersion {})",
            project.app_name(),
            object_version
        );
    }
    Ok(())
}

fn print_summary(report: &IntegrationReport) {
    println!();
    println!(
        "{} {} ({}, objectVersion {})",
        "Integrated into".green().bold(),
        report.app_name,
        report.era,
        report.object_version
    );

    if report.declined {
        println!("  {} existing module folder kept", "•".yellow());
    } else {
        println!(
            "  {} {} files copied, {} kept",
            "•".cyan(),
            report.placed.copied.len(),
            report.placed.skipped.len()
        );
    }
    if !report.layers.is_empty() {
        println!("  {} layers: {}", "•".cyan(), report.layers.join(", "));
    }

    let index = &report.index;
    let shared = &report.dependencies.sync;
    if report.era == Era::Legacy {
        println!(
            "  {} {} groups created, {} references added, {} already present",
            "•".cyan(),
            index.groups_created + shared.groups_created,
            index.references_added.len() + shared.references_added.len(),
            index.already_present.len() + shared.already_present.len()
        );
    }

    let deps = &report.dependencies;
    if !deps.shared.is_empty() {
        println!(
            "  {} shared: {} ({} files copied, {} kept)",
            "•".cyan(),
            deps.shared
                .iter()
                .map(|s| s.identifier.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            deps.mirror.copied.len(),
            deps.mirror.skipped.len()
        );
    }
    for name in &deps.libraries_added {
        println!("  {} library added: {}", "✓".green(), name);
    }
    for name in &deps.libraries_present {
        println!("  {} library already present: {}", "•".yellow(), name);
    }
}
