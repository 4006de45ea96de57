//! Clean command
//!
//! Remove the scratch directories left behind by previous builds

use anyhow::{Context, Result, bail};
use extbuild::config::{CliOverrides, Config, EnvOverrides};
use extbuild::platform;
use std::fs;
use std::path::Path;

/// Remove the `build_temp` root configured for the project.
///
/// A root outside the manifest directory is only removed with `force`.
pub(crate) fn run(manifest: Option<&Path>, dry_run: bool, force: bool) -> Result<()> {
    let config = Config::load(manifest)?;
    let settings = config.settings(
        CliOverrides::default(),
        &EnvOverrides::from_env(),
        platform::detect_current_host(),
    );
    let build_temp = settings.build_temp;

    // Never delete the project (or anything above it)
    if config.root.starts_with(&build_temp) {
        bail!(
            "Refusing to remove {} because it contains the project",
            build_temp.display()
        );
    }

    if !build_temp.starts_with(&config.root) && !dry_run && !force {
        bail!(
            "Refusing to remove {} because it is outside the project at {} (use --force to remove it anyway)",
            build_temp.display(),
            config.root.display()
        );
    }

    if !build_temp.exists() {
        println!("Nothing to clean at {}", build_temp.display());
        return Ok(());
    }

    if dry_run {
        println!("Would remove {}", build_temp.display());
        return Ok(());
    }

    fs::remove_dir_all(&build_temp)
        .with_context(|| format!("Failed to remove {}", build_temp.display()))?;
    println!("Removed {}", build_temp.display());

    Ok(())
}
