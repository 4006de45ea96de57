//! extbuild command-line interface
//!
//! Builds the `CMake`-based native extensions of a hybrid package

use clap::{Parser, Subcommand};
use extbuild::platform::PlatformFamily;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process;

/// Display an error followed by its chain of causes
fn display_error(err: &anyhow::Error) {
    eprintln!("error: {err}");

    let mut source = err.source();
    while let Some(err) = source {
        eprintln!("caused by: {err}");
        source = err.source();
    }
}

fn parse_platform(value: &str) -> Result<PlatformFamily, String> {
    PlatformFamily::from_name(value)
        .ok_or_else(|| format!("unknown platform {value:?} (expected unix or windows)"))
}

#[derive(Parser)]
#[command(name = "extbuild")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Build CMake-based native extensions", long_about = None)]
pub(crate) struct Cli {
    /// Print debug diagnostics (resolved paths, commands, state changes) to stderr
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure and build every extension listed in the manifest
    Build {
        /// Build the Debug configuration instead of Release
        #[arg(long)]
        debug: bool,

        /// Path to extbuild.toml
        #[arg(long)]
        manifest: Option<PathBuf>,

        /// Parallel jobs passed to the native build tool on Unix
        #[arg(long, short = 'j')]
        jobs: Option<NonZeroUsize>,

        /// Run directory listings before building (Windows only)
        #[arg(long)]
        diagnostics: bool,

        /// Only build the named extension (repeatable)
        #[arg(long = "ext", value_name = "NAME")]
        extensions: Vec<String>,

        /// Print the commands without running them
        #[arg(long)]
        dry_run: bool,

        /// Suppress progress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Show the `CMake` commands a build would run
    Plan {
        /// Plan the Debug configuration instead of Release
        #[arg(long)]
        debug: bool,

        /// Path to extbuild.toml
        #[arg(long)]
        manifest: Option<PathBuf>,

        /// Plan for another platform family (unix or windows)
        #[arg(long, value_parser = parse_platform)]
        platform: Option<PlatformFamily>,

        /// Only plan the named extension (repeatable)
        #[arg(long = "ext", value_name = "NAME")]
        extensions: Vec<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that `CMake` and the interpreter are usable
    Doctor {
        /// Path to extbuild.toml
        #[arg(long)]
        manifest: Option<PathBuf>,
    },

    /// Remove the scratch directories
    Clean {
        /// Path to extbuild.toml
        #[arg(long)]
        manifest: Option<PathBuf>,

        /// Show what would be removed
        #[arg(long)]
        dry_run: bool,

        /// Remove a scratch root outside the project directory
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completion for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

fn main() {
    let cli = Cli::parse();

    extbuild::init_debug(cli.verbose);

    let result = match cli.command {
        Commands::Build {
            debug,
            manifest,
            jobs,
            diagnostics,
            extensions,
            dry_run,
            quiet,
        } => commands::build::run(&commands::build::BuildOptions {
            debug,
            manifest,
            jobs: jobs.map(NonZeroUsize::get),
            diagnostics,
            extensions,
            dry_run,
            quiet,
        }),
        Commands::Plan {
            debug,
            manifest,
            platform,
            extensions,
            json,
        } => commands::plan::run(&commands::plan::PlanOptions {
            debug,
            manifest,
            platform,
            extensions,
            json,
        }),
        Commands::Doctor { manifest } => commands::doctor::run(manifest.as_deref()),
        Commands::Clean {
            manifest,
            dry_run,
            force,
        } => commands::clean::run(manifest.as_deref(), dry_run, force),
        Commands::Completion { shell } => commands::completion::run(shell),
    };

    if let Err(e) = result {
        display_error(&e);
        process::exit(1);
    }
}

mod commands;
