//! Doctor command - Diagnose build environment problems
//!
//! Checks everything a build needs before any extension is configured:
//! - `CMake` can be found and reports a version
//! - The version meets the Windows minimum
//! - The interpreter handed to `CMake` exists
//! - Every extension source tree has a `CMakeLists.txt`

use anyhow::{Result, bail};
use extbuild::config::{CliOverrides, Config, EnvOverrides};
use extbuild::error::BuildError;
use extbuild::extensions::toolchain::{self, MINIMUM_WINDOWS_VERSION};
use extbuild::extensions::SystemInvoker;
use extbuild::paths;
use extbuild::platform;
use std::path::Path;

/// Report on the toolchain and manifest; fails if any problem was found
pub(crate) fn run(manifest: Option<&Path>) -> Result<()> {
    let manifest_exists = manifest.map_or_else(|| paths::find_manifest().is_file(), Path::is_file);
    let config = if manifest_exists {
        Config::load(manifest)?
    } else {
        Config::user_only()?
    };
    let missing_manifest = manifest.filter(|path| !path.is_file());

    let host = platform::detect_current_host();
    let settings = config.settings(CliOverrides::default(), &EnvOverrides::from_env(), host);
    let mut problems = 0;

    println!("Checking build environment...");
    println!();
    println!("Platform:    {host}");
    if let Some(path) = missing_manifest {
        eprintln!("Manifest:    {} does not exist", path.display());
        problems += 1;
    }
    if missing_manifest.is_none() {
        let manifest_label = config.manifest_path.as_ref().map_or_else(
            || "not found (using defaults)".to_string(),
            |path| path.display().to_string(),
        );
        println!("Manifest:    {manifest_label}");
    }

    let mut invoker = SystemInvoker::new();
    match toolchain::validate_toolchain(&mut invoker, &settings.program, host) {
        Ok(info) => {
            println!("CMake:       {} ({})", info.program, info.summary());
            if host.is_windows() {
                println!("  minimum {MINIMUM_WINDOWS_VERSION} satisfied");
            }
        }
        Err(err @ BuildError::ToolchainTooOld { .. }) => {
            eprintln!("CMake:       {err}");
            problems += 1;
        }
        Err(err) => {
            eprintln!("CMake:       {err}");
            eprintln!("  Install CMake from https://cmake.org or set CMAKE");
            problems += 1;
        }
    }

    if SystemInvoker::resolve(&settings.interpreter.to_string_lossy()).is_ok() {
        println!("Interpreter: {}", settings.interpreter.display());
    } else {
        eprintln!(
            "Interpreter: {} not found (set PYTHON or [build] interpreter)",
            settings.interpreter.display()
        );
        problems += 1;
    }

    println!("Jobs:        {}", settings.jobs);
    println!(
        "Diagnostics: {}",
        if settings.diagnostics { "on" } else { "off" }
    );

    if manifest_exists {
        match config.descriptors(&[]) {
            Ok(descriptors) => {
                println!("Extensions:  {}", descriptors.len());
                for descriptor in &descriptors {
                    match descriptor.validate_source() {
                        Ok(()) => println!("  {} ({})", descriptor.name(), descriptor.source_dir().display()),
                        Err(err) => {
                            eprintln!("  {err}");
                            problems += 1;
                        }
                    }
                }
            }
            Err(err) => {
                eprintln!("Extensions:  {err:#}");
                problems += 1;
            }
        }
    }

    println!();
    if problems > 0 {
        bail!("Found {problems} problem(s)");
    }
    println!("No problems found");
    Ok(())
}
