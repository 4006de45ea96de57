//! Extension build orchestration
//!
//! Validates the toolchain once, then builds each extension in order:
//! resolve paths, plan arguments, optional diagnostics, scratch directory,
//! configure, build. The first failure stops the run; artifacts already
//! placed stay where they are.

use super::invoker::{Invocation, ProcessInvoker};
use super::strategy::{BuildPlan, plan_build};
use super::toolchain::{self, ToolchainInfo};
use super::types::{
    BuildContext, BuildResult, BuildState, Configuration, ExtensionDescriptor,
    ensure_distinct_modules,
};
use crate::env_vars;
use crate::error::BuildError;
use crate::paths;
use crate::platform::HostPlatform;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Everything the orchestrator needs besides the descriptors
///
/// Resolved by the caller (the CLI resolves it from flags, environment and
/// manifest); the builder reads no environment of its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSettings {
    /// `CMake` program name or path
    pub program: String,
    /// Interpreter handed to `CMake` as `PYTHON_EXECUTABLE`
    pub interpreter: PathBuf,
    /// Root under which artifacts are placed
    pub build_lib: PathBuf,
    /// Root of the per-extension scratch directories
    pub build_temp: PathBuf,
    /// Version embedded in native code via `VERSION_INFO`
    pub package_version: String,
    pub jobs: usize,
    pub diagnostics: bool,
    /// File suffix of the compiled module (`.so`, `.pyd`)
    pub artifact_suffix: String,
    /// Ambient `CXXFLAGS`, extended rather than replaced
    pub cxxflags: Option<String>,
    pub host: HostPlatform,
    /// Suppress progress lines on stdout
    pub quiet: bool,
}

/// Drives `CMake` for a list of extensions
#[derive(Debug)]
pub struct ExtensionBuilder<I: ProcessInvoker> {
    settings: BuildSettings,
    invoker: I,
}

impl<I: ProcessInvoker> ExtensionBuilder<I> {
    #[must_use]
    pub const fn new(settings: BuildSettings, invoker: I) -> Self {
        Self { settings, invoker }
    }

    #[must_use]
    pub const fn settings(&self) -> &BuildSettings {
        &self.settings
    }

    #[must_use]
    pub const fn invoker(&self) -> &I {
        &self.invoker
    }

    /// Run `cmake --version` and check it against the host's requirements.
    pub fn validate_toolchain(&mut self) -> Result<ToolchainInfo, BuildError> {
        toolchain::validate_toolchain(&mut self.invoker, &self.settings.program, self.settings.host)
    }

    /// Build every descriptor in order, stopping at the first failure.
    pub fn run(
        &mut self,
        descriptors: &[ExtensionDescriptor],
        configuration: Configuration,
    ) -> Result<Vec<BuildResult>, BuildError> {
        ensure_distinct_modules(descriptors)?;
        self.validate_toolchain()?;

        let mut results = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            results.push(self.build_extension(descriptor, configuration)?);
        }
        Ok(results)
    }

    /// Derive the context for `descriptor` without touching the filesystem.
    pub fn context(
        &self,
        descriptor: &ExtensionDescriptor,
        configuration: Configuration,
    ) -> Result<BuildContext, BuildError> {
        let settings = &self.settings;
        Ok(BuildContext {
            output_dir: paths::output_dir(
                &settings.build_lib,
                descriptor.name(),
                &settings.artifact_suffix,
            )?,
            build_temp_dir: paths::build_temp_dir(&settings.build_temp, descriptor.name())?,
            configuration,
            host: settings.host,
            jobs: settings.jobs,
            diagnostics: settings.diagnostics,
        })
    }

    /// Context and argument vectors for `descriptor`. Spawns nothing.
    pub fn plan(
        &self,
        descriptor: &ExtensionDescriptor,
        configuration: Configuration,
    ) -> Result<(BuildContext, BuildPlan), BuildError> {
        let ctx = self.context(descriptor, configuration)?;
        let plan = plan_build(descriptor, &ctx, &self.settings.interpreter);
        Ok((ctx, plan))
    }

    /// Configure and build one extension.
    pub fn build_extension(
        &mut self,
        descriptor: &ExtensionDescriptor,
        configuration: Configuration,
    ) -> Result<BuildResult, BuildError> {
        let name = descriptor.name();
        let started = Instant::now();

        descriptor.validate_source()?;
        let (ctx, plan) = self.plan(descriptor, configuration)?;
        crate::debug!("{name}: output directory {}", ctx.output_dir.display());
        crate::debug!("{name}: scratch directory {}", ctx.build_temp_dir.display());

        if !self.settings.quiet {
            println!("Building {name} ({configuration})");
        }

        for listing in &plan.diagnostics {
            if let Some(invocation) = Invocation::from_command(listing) {
                self.invoker.invoke(&invocation)?;
            }
        }

        ensure_build_temp(&ctx.build_temp_dir)?;

        let env = self.version_env();
        let mut state = BuildState::Idle;
        for args in [&plan.configure, &plan.build] {
            state = transition(name, state);
            let invocation = Invocation::new(&self.settings.program, args.iter().cloned())
                .current_dir(&ctx.build_temp_dir)
                .envs(&env);

            if let Err(err) = self.invoker.invoke(&invocation) {
                return Err(fail(name, state, err));
            }
        }
        state = transition(name, state);

        let duration = started.elapsed();
        if !self.settings.quiet {
            println!("Built {name} in {:.1}s", duration.as_secs_f64());
        }

        Ok(BuildResult {
            name: name.to_string(),
            output_dir: ctx.output_dir,
            build_temp_dir: ctx.build_temp_dir,
            state,
            duration,
        })
    }

    /// Environment overrides shared by the configure and build steps
    #[must_use]
    pub fn version_env(&self) -> BTreeMap<String, String> {
        let mut env = BTreeMap::new();
        env.insert(
            env_vars::CXXFLAGS.to_string(),
            version_info_flags(self.settings.cxxflags.as_deref(), &self.settings.package_version),
        );
        env
    }
}

fn transition(name: &str, state: BuildState) -> BuildState {
    let Some(next) = state.advance() else {
        crate::debug!("{name}: ignoring transition out of terminal state {state}");
        return state;
    };
    crate::debug!("{name}: {state} -> {next}");
    next
}

fn fail(name: &str, state: BuildState, err: BuildError) -> BuildError {
    let (Some(failed), Some(phase)) = (state.fail(), state.active_phase()) else {
        return err;
    };
    crate::debug!("{name}: {state} -> {failed}");
    err.in_phase(name, phase)
}

/// Create `dir` (and parents) if missing. Existing contents are kept.
pub fn ensure_build_temp(dir: &Path) -> Result<(), BuildError> {
    std::fs::create_dir_all(dir).map_err(|source| BuildError::FileSystem {
        path: dir.to_path_buf(),
        source,
    })
}

/// `CXXFLAGS` value embedding the package version as a string literal.
///
/// `0.9.0` becomes `-DVERSION_INFO=\"0.9.0\"` appended to the existing flags.
/// The literal is escaped twice: once for C, once more for the shell the
/// generated build files pass `CXXFLAGS` through.
#[must_use]
pub fn version_info_flags(existing: Option<&str>, version: &str) -> String {
    let literal = format!("\"{}\"", escape_quoted(version));
    env_vars::append_flags(existing, &format!("-DVERSION_INFO={}", escape_quoted(&literal)))
}

fn escape_quoted(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
