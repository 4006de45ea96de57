//! Build command
//!
//! Configure and build every extension listed in the manifest

use anyhow::{Context, Result};
use extbuild::config::{CliOverrides, Config, EnvOverrides};
use extbuild::extensions::{Configuration, ExtensionBuilder, SystemInvoker};
use extbuild::platform;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug)]
pub(crate) struct BuildOptions {
    pub(crate) debug: bool,
    pub(crate) manifest: Option<PathBuf>,
    pub(crate) jobs: Option<usize>,
    pub(crate) diagnostics: bool,
    pub(crate) extensions: Vec<String>,
    pub(crate) dry_run: bool,
    pub(crate) quiet: bool,
}

/// Build the selected extensions, stopping at the first failure
pub(crate) fn run(options: &BuildOptions) -> Result<()> {
    let config = Config::load(options.manifest.as_deref())?;
    let host = platform::detect_current_host();

    let cli = CliOverrides {
        jobs: options.jobs,
        diagnostics: options.diagnostics,
        quiet: options.quiet,
    };
    let settings = config.settings(cli, &EnvOverrides::from_env(), host);
    let descriptors = config.descriptors(&options.extensions)?;
    let configuration = Configuration::from_debug_flag(options.debug);

    extbuild::debug!(
        "cmake={} interpreter={} jobs={} host={host}",
        settings.program,
        settings.interpreter.display(),
        settings.jobs
    );

    let mut builder = ExtensionBuilder::new(settings, SystemInvoker::new());

    if options.dry_run {
        if descriptors.is_empty() && !options.quiet {
            println!("No extensions to build");
        }
        for descriptor in &descriptors {
            let (ctx, plan) = builder.plan(descriptor, configuration)?;
            super::plan::print_extension(&builder.settings().program, descriptor, &ctx, &plan);
        }
        return Ok(());
    }

    let package = &config.manifest.package;
    let results = builder
        .run(&descriptors, configuration)
        .with_context(|| format!("Failed to build extensions for {} {}", package.name, package.version))?;

    if options.quiet {
        return Ok(());
    }
    if results.is_empty() {
        println!("No extensions to build");
    } else {
        let total: Duration = results.iter().map(|r| r.duration).sum();
        let noun = if results.len() == 1 {
            "extension"
        } else {
            "extensions"
        };
        println!(
            "Built {} {noun} ({configuration}) in {:.1}s",
            results.len(),
            total.as_secs_f64()
        );
    }

    Ok(())
}
