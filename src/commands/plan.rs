//! Plan command
//!
//! Print the `CMake` invocations a build would run, without running them

use anyhow::{Context, Result};
use extbuild::config::{CliOverrides, Config, EnvOverrides};
use extbuild::debug::render_command;
use extbuild::extensions::{
    BuildContext, BuildPlan, Configuration, ExtensionBuilder, ExtensionDescriptor, SystemInvoker,
};
use extbuild::platform::{self, PlatformFamily};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug)]
pub(crate) struct PlanOptions {
    pub(crate) debug: bool,
    pub(crate) manifest: Option<PathBuf>,
    pub(crate) platform: Option<PlatformFamily>,
    pub(crate) extensions: Vec<String>,
    pub(crate) json: bool,
}

#[derive(Serialize)]
struct PlanReport<'a> {
    program: &'a str,
    configuration: Configuration,
    extensions: Vec<ExtensionReport<'a>>,
}

#[derive(Serialize)]
struct ExtensionReport<'a> {
    extension: &'a ExtensionDescriptor,
    context: BuildContext,
    plan: BuildPlan,
    env: BTreeMap<String, String>,
}

/// Preview the build for every selected extension
pub(crate) fn run(options: &PlanOptions) -> Result<()> {
    let config = Config::load(options.manifest.as_deref())?;

    let mut host = platform::detect_current_host();
    if let Some(family) = options.platform {
        host = host.with_family(family);
    }

    let settings = config.settings(CliOverrides::default(), &EnvOverrides::from_env(), host);
    let descriptors = config.descriptors(&options.extensions)?;
    let configuration = Configuration::from_debug_flag(options.debug);
    let builder = ExtensionBuilder::new(settings, SystemInvoker::new());
    let env = builder.version_env();

    let mut extensions = Vec::with_capacity(descriptors.len());
    for descriptor in &descriptors {
        let (context, plan) = builder.plan(descriptor, configuration)?;
        extensions.push(ExtensionReport {
            extension: descriptor,
            context,
            plan,
            env: env.clone(),
        });
    }

    let program = &builder.settings().program;
    if options.json {
        let report = PlanReport {
            program,
            configuration,
            extensions,
        };
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize plan")?;
        println!("{json}");
    } else if extensions.is_empty() {
        println!("No extensions in the manifest");
    } else {
        for (index, report) in extensions.iter().enumerate() {
            if index > 0 {
                println!();
            }
            print_extension(program, report.extension, &report.context, &report.plan);
        }
    }

    Ok(())
}

/// Human-readable listing of one extension's commands
pub(crate) fn print_extension(
    program: &str,
    descriptor: &ExtensionDescriptor,
    ctx: &BuildContext,
    plan: &BuildPlan,
) {
    println!(
        "{} ({}, {})",
        descriptor.name(),
        ctx.configuration,
        ctx.host
    );
    println!("  source:  {}", descriptor.source_dir().display());
    println!("  output:  {}", ctx.output_dir.display());
    println!("  scratch: {}", ctx.build_temp_dir.display());

    for listing in &plan.diagnostics {
        if let Some((listing_program, args)) = listing.split_first() {
            println!("  $ {}", render_command(listing_program, args));
        }
    }
    println!("  $ {}", render_command(program, &plan.configure));
    println!("  $ {}", render_command(program, &plan.build));
}
