//! Configuration file management
//!
//! Reads the project manifest (`extbuild.toml`) and the optional user-level
//! config, then resolves them together with environment variables and
//! command-line flags into [`BuildSettings`].
//!
//! Priority (highest first): CLI flags, environment, project manifest, user
//! config, built-in defaults.

use crate::env_vars;
use crate::extensions::builder::BuildSettings;
use crate::extensions::types::{ExtensionDescriptor, ensure_distinct_modules};
use crate::paths;
use crate::platform::HostPlatform;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default artifact root, relative to the manifest directory
pub const DEFAULT_BUILD_LIB: &str = "build/lib";

/// Default scratch root, relative to the manifest directory
pub const DEFAULT_BUILD_TEMP: &str = "build/temp";

/// Concurrency hint used when nothing else is known
pub const FALLBACK_JOBS: usize = 2;

/// `[package]` table
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PackageSection {
    pub name: String,
    pub version: String,
}

/// `[build]` table, shared by the manifest and the user config
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct BuildSection {
    #[serde(default)]
    pub build_lib: Option<PathBuf>,
    #[serde(default)]
    pub build_temp: Option<PathBuf>,
    /// `CMake` program name or path
    #[serde(default)]
    pub cmake: Option<String>,
    #[serde(default)]
    pub interpreter: Option<PathBuf>,
    #[serde(default)]
    pub jobs: Option<usize>,
    #[serde(default)]
    pub diagnostics: Option<bool>,
    #[serde(default)]
    pub artifact_suffix: Option<String>,
}

impl BuildSection {
    /// Overlay `other` on top of `self`; values set in `other` win.
    #[must_use]
    pub fn merge(mut self, other: Self) -> Self {
        if other.build_lib.is_some() {
            self.build_lib = other.build_lib;
        }
        if other.build_temp.is_some() {
            self.build_temp = other.build_temp;
        }
        if other.cmake.is_some() {
            self.cmake = other.cmake;
        }
        if other.interpreter.is_some() {
            self.interpreter = other.interpreter;
        }
        if other.jobs.is_some() {
            self.jobs = other.jobs;
        }
        if other.diagnostics.is_some() {
            self.diagnostics = other.diagnostics;
        }
        if other.artifact_suffix.is_some() {
            self.artifact_suffix = other.artifact_suffix;
        }
        self
    }
}

/// One `[[extension]]` entry
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ExtensionEntry {
    /// Module path, e.g. `pastaq/pastaq_cpp`
    pub name: String,
    /// Directory with the `CMakeLists.txt`, relative to the manifest
    pub source_dir: PathBuf,
}

/// Project manifest (`extbuild.toml`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Manifest {
    pub package: PackageSection,
    #[serde(default)]
    pub build: BuildSection,
    #[serde(default, rename = "extension")]
    pub extensions: Vec<ExtensionEntry>,
}

impl Manifest {
    pub fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Failed to parse manifest")
    }
}

/// User-level config (`~/.config/extbuild/config.toml`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct UserConfig {
    #[serde(default)]
    pub build: BuildSection,
}

/// Values taken from the environment, read once through [`env_vars`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    pub cmake: Option<String>,
    pub python: Option<String>,
    pub jobs: Option<usize>,
    pub diagnostics: bool,
    pub cxxflags: Option<String>,
}

impl EnvOverrides {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            cmake: env_vars::cmake(),
            python: env_vars::python(),
            jobs: env_vars::extbuild_jobs(),
            diagnostics: env_vars::extbuild_diagnostics(),
            cxxflags: env_vars::cxxflags(),
        }
    }
}

/// Values given on the command line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CliOverrides {
    pub jobs: Option<usize>,
    pub diagnostics: bool,
    pub quiet: bool,
}

/// Manifest and user config as loaded from disk
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub manifest: Manifest,
    /// Directory relative manifest paths are resolved against
    pub root: PathBuf,
    /// Where the manifest was read from, if anywhere
    pub manifest_path: Option<PathBuf>,
    pub user: UserConfig,
}

impl Config {
    /// Load the manifest at `manifest_path` (or the default location) plus
    /// the user config.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest is missing or either file fails to
    /// parse.
    pub fn load(manifest_path: Option<&Path>) -> Result<Self> {
        Self::load_with_options(manifest_path, false)
    }

    /// Load configuration with custom options.
    ///
    /// # Arguments
    /// * `manifest_path` - Manifest to read instead of the default lookup
    /// * `skip_user` - If true, ignore the user-level config
    pub fn load_with_options(manifest_path: Option<&Path>, skip_user: bool) -> Result<Self> {
        let path = manifest_path.map_or_else(paths::find_manifest, Path::to_path_buf);
        if !path.is_file() {
            bail!(
                "No {} found at {}. Pass --manifest or set EXTBUILD_MANIFEST.",
                paths::MANIFEST_FILE,
                path.display()
            );
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let manifest = Manifest::parse(&contents)
            .with_context(|| format!("Invalid manifest {}", path.display()))?;

        // A bare file name has an empty parent
        let root = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let root = paths::absolutize(root)?;

        let user = if skip_user {
            UserConfig::default()
        } else {
            Self::load_user()?
        };

        crate::debug!("Loaded manifest {}", path.display());
        Ok(Self {
            manifest,
            root,
            manifest_path: Some(path),
            user,
        })
    }

    /// Configuration without a project manifest, for commands that can run
    /// outside a project.
    pub fn user_only() -> Result<Self> {
        Ok(Self {
            root: paths::absolutize(Path::new("."))?,
            user: Self::load_user()?,
            ..Self::default()
        })
    }

    fn load_user() -> Result<UserConfig> {
        let Some(path) = Self::user_config_path() else {
            return Ok(UserConfig::default());
        };
        if !path.is_file() {
            return Ok(UserConfig::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        crate::debug!("Loaded user config {}", path.display());
        toml::from_str(&contents).with_context(|| format!("Invalid user config {}", path.display()))
    }

    /// `$XDG_CONFIG_HOME/extbuild/config.toml`, else `~/.config/extbuild/config.toml`
    #[must_use]
    pub fn user_config_path() -> Option<PathBuf> {
        let dir = env_vars::xdg_config_home().map_or_else(
            || dirs::home_dir().map(|home| home.join(".config")),
            |xdg| Some(PathBuf::from(xdg)),
        )?;
        Some(dir.join("extbuild").join("config.toml"))
    }

    /// `[build]` values with the manifest layered over the user config
    #[must_use]
    pub fn build_section(&self) -> BuildSection {
        self.user.build.clone().merge(self.manifest.build.clone())
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        paths::normalize(&self.root.join(path))
    }

    /// Resolve everything the builder needs for `host`.
    #[must_use]
    pub fn settings(&self, cli: CliOverrides, env: &EnvOverrides, host: HostPlatform) -> BuildSettings {
        let build = self.build_section();

        let build_lib = build
            .build_lib
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BUILD_LIB));
        let build_temp = build
            .build_temp
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BUILD_TEMP));

        let interpreter = env
            .python
            .as_ref()
            .map(PathBuf::from)
            .or(build.interpreter)
            .unwrap_or_else(default_interpreter);

        BuildSettings {
            program: env
                .cmake
                .clone()
                .or(build.cmake)
                .unwrap_or_else(|| "cmake".to_string()),
            interpreter,
            build_lib: self.resolve_path(&build_lib),
            build_temp: self.resolve_path(&build_temp),
            package_version: self.manifest.package.version.clone(),
            jobs: resolve_jobs(cli.jobs, env.jobs, build.jobs),
            diagnostics: cli.diagnostics || env.diagnostics || build.diagnostics.unwrap_or(false),
            artifact_suffix: build
                .artifact_suffix
                .unwrap_or_else(|| host.extension_suffix().to_string()),
            cxxflags: env.cxxflags.clone(),
            host,
            quiet: cli.quiet,
        }
    }

    /// Descriptors for the manifest's extensions, in manifest order.
    ///
    /// With a non-empty `only`, just the named extensions are returned
    /// (still in manifest order); an unknown name is an error.
    pub fn descriptors(&self, only: &[String]) -> Result<Vec<ExtensionDescriptor>> {
        if let Some(unknown) = only
            .iter()
            .find(|name| !self.manifest.extensions.iter().any(|e| &e.name == *name))
        {
            bail!("No extension named {unknown:?} in the manifest");
        }

        let descriptors = self
            .manifest
            .extensions
            .iter()
            .filter(|entry| only.is_empty() || only.contains(&entry.name))
            .map(|entry| {
                ExtensionDescriptor::new(&entry.name, self.resolve_path(&entry.source_dir))
                    .with_context(|| format!("Invalid [[extension]] entry {:?}", entry.name))
            })
            .collect::<Result<Vec<_>>>()?;

        ensure_distinct_modules(&descriptors).context("Duplicate [[extension]] entries")?;
        Ok(descriptors)
    }
}

/// CLI, then environment, then config, then the machine's parallelism.
#[must_use]
pub fn resolve_jobs(cli: Option<usize>, env: Option<usize>, config: Option<usize>) -> usize {
    cli.or(env)
        .or(config)
        .filter(|&jobs| jobs > 0)
        .or_else(|| std::thread::available_parallelism().ok().map(usize::from))
        .unwrap_or(FALLBACK_JOBS)
}

fn default_interpreter() -> PathBuf {
    which::which("python3")
        .or_else(|_| which::which("python"))
        .unwrap_or_else(|_| PathBuf::from("python3"))
}
