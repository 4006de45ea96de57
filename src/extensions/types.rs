//! Extension build type definitions
//!
//! A hybrid package ships native modules next to interpreted code. Each
//! module is described by an [`ExtensionDescriptor`] and built once per
//! run under a [`Configuration`].

use crate::error::{BuildError, BuildPhase};
use crate::paths;
use crate::platform::HostPlatform;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// One native module to build
///
/// `name` is the module path that decides where the artifact lands
/// (`pkg/ext` ends up as `<build_lib>/pkg/ext.so`); `source_dir` is the
/// absolute path of a tree with a `CMakeLists.txt`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtensionDescriptor {
    name: String,
    source_dir: PathBuf,
}

impl ExtensionDescriptor {
    /// Create a descriptor, making `source_dir` absolute.
    ///
    /// The module path is validated here; the source tree is checked by
    /// [`Self::validate_source`] right before it is built.
    pub fn new(name: impl Into<String>, source_dir: impl AsRef<Path>) -> Result<Self, BuildError> {
        let name = name.into();
        paths::module_segments(&name)?;
        let source_dir = paths::absolutize(source_dir.as_ref())?;

        Ok(Self { name, source_dir })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    /// Check that the source tree exists and holds a build description.
    pub fn validate_source(&self) -> Result<(), BuildError> {
        let invalid = |reason: String| BuildError::InvalidDescriptor {
            name: self.name.clone(),
            reason,
        };

        if !self.source_dir.is_dir() {
            return Err(invalid(format!(
                "source directory {} does not exist",
                self.source_dir.display()
            )));
        }

        let description = self.source_dir.join(paths::BUILD_DESCRIPTION);
        if !description.is_file() {
            return Err(invalid(format!(
                "{} not found in {}",
                paths::BUILD_DESCRIPTION,
                self.source_dir.display()
            )));
        }

        Ok(())
    }
}

/// Reject descriptors that would share an output or scratch directory.
///
/// `pkg/ext`, `pkg.ext` and `pkg\ext` all name the same module.
pub fn ensure_distinct_modules(descriptors: &[ExtensionDescriptor]) -> Result<(), BuildError> {
    let mut seen: HashMap<Vec<&str>, &str> = HashMap::with_capacity(descriptors.len());
    for descriptor in descriptors {
        let segments = paths::module_segments(descriptor.name())?;
        if let Some(first) = seen.insert(segments, descriptor.name()) {
            return Err(BuildError::InvalidDescriptor {
                name: descriptor.name().to_string(),
                reason: format!("same module path as {first:?}"),
            });
        }
    }
    Ok(())
}

/// Build profile, chosen by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Configuration {
    Debug,
    #[default]
    Release,
}

impl Configuration {
    /// Pick the profile from a "debug build requested" flag.
    #[must_use]
    pub const fn from_debug_flag(debug: bool) -> Self {
        if debug { Self::Debug } else { Self::Release }
    }

    /// Name as `CMake` expects it in `--config` and `CMAKE_BUILD_TYPE`
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "Debug",
            Self::Release => "Release",
        }
    }

    /// Upper-cased name used in per-configuration directive keys
    #[must_use]
    pub const fn directive_key(&self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Release => "RELEASE",
        }
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything derived for one descriptor at build time
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildContext {
    /// Absolute directory the artifact is placed in
    pub output_dir: PathBuf,
    /// Scratch directory owned by this descriptor alone
    pub build_temp_dir: PathBuf,
    pub configuration: Configuration,
    pub host: HostPlatform,
    /// Parallel jobs hint passed to the native build tool
    pub jobs: usize,
    /// Run the Windows directory listings before building
    pub diagnostics: bool,
}

/// Lifecycle of one extension build
///
/// `Idle -> Configuring -> Building -> Done`, with `Failed` reachable from
/// either active state. `Done` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum BuildState {
    #[default]
    Idle,
    Configuring,
    Building,
    Done,
    Failed { phase: BuildPhase },
}

impl BuildState {
    /// Phase whose process runs while in this state
    #[must_use]
    pub const fn active_phase(&self) -> Option<BuildPhase> {
        match self {
            Self::Configuring => Some(BuildPhase::Configure),
            Self::Building => Some(BuildPhase::Build),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed { .. })
    }

    /// Move to the next state after the current step succeeded.
    ///
    /// Returns `None` from terminal states: a finished or failed build is
    /// never resumed.
    #[must_use]
    pub const fn advance(self) -> Option<Self> {
        match self {
            Self::Idle => Some(Self::Configuring),
            Self::Configuring => Some(Self::Building),
            Self::Building => Some(Self::Done),
            Self::Done | Self::Failed { .. } => None,
        }
    }

    /// Record a failure of the step running in the current state.
    ///
    /// Only `Configuring` and `Building` can fail.
    #[must_use]
    pub fn fail(self) -> Option<Self> {
        self.active_phase().map(|phase| Self::Failed { phase })
    }
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Configuring => f.write_str("configuring"),
            Self::Building => f.write_str("building"),
            Self::Done => f.write_str("done"),
            Self::Failed { phase } => write!(f, "failed ({phase})"),
        }
    }
}

/// Result of one successfully built extension
#[derive(Debug, Clone, Serialize)]
pub struct BuildResult {
    /// Module path
    pub name: String,
    /// Directory holding the artifact
    pub output_dir: PathBuf,
    /// Scratch directory left on disk for inspection
    pub build_temp_dir: PathBuf,
    /// Final state (always `Done` for results returned by the builder)
    pub state: BuildState,
    /// Wall-clock time spent configuring and building
    pub duration: Duration,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Tests can panic")]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn descriptor_makes_source_dir_absolute() {
        let descriptor = ExtensionDescriptor::new("pkg/ext", "native").unwrap();
        assert!(descriptor.source_dir().is_absolute());
        assert!(descriptor.source_dir().ends_with("native"));
        assert_eq!(descriptor.name(), "pkg/ext");
    }

    #[test]
    fn descriptor_rejects_empty_name() {
        let result = ExtensionDescriptor::new("", "/repo/native");
        assert!(matches!(result, Err(BuildError::InvalidDescriptor { .. })));
    }

    #[test]
    fn module_paths_must_be_distinct() {
        let slash = ExtensionDescriptor::new("pkg/ext", "a").unwrap();
        let dotted = ExtensionDescriptor::new("pkg.ext", "b").unwrap();
        let other = ExtensionDescriptor::new("pkg/other", "c").unwrap();

        assert!(ensure_distinct_modules(&[slash.clone(), other.clone()]).is_ok());

        let err = ensure_distinct_modules(&[slash.clone(), other, dotted]).unwrap_err();
        assert!(matches!(&err, BuildError::InvalidDescriptor { name, .. } if name == "pkg.ext"));
        assert!(err.to_string().contains("same module path as \"pkg/ext\""));

        assert!(ensure_distinct_modules(&[slash.clone(), slash]).is_err());
    }

    #[test]
    fn validate_source_requires_cmake_lists() {
        let dir = TempDir::new().unwrap();
        let descriptor = ExtensionDescriptor::new("pkg/ext", dir.path()).unwrap();

        let err = descriptor.validate_source().unwrap_err();
        assert!(err.to_string().contains("CMakeLists.txt not found"));

        fs::write(dir.path().join("CMakeLists.txt"), "project(ext)\n").unwrap();
        assert!(descriptor.validate_source().is_ok());
    }

    #[test]
    fn validate_source_requires_directory() {
        let dir = TempDir::new().unwrap();
        let descriptor = ExtensionDescriptor::new("pkg/ext", dir.path().join("missing")).unwrap();

        let err = descriptor.validate_source().unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn configuration_names() {
        assert_eq!(Configuration::from_debug_flag(true), Configuration::Debug);
        assert_eq!(Configuration::from_debug_flag(false), Configuration::Release);
        assert_eq!(Configuration::Release.as_str(), "Release");
        assert_eq!(Configuration::Debug.directive_key(), "DEBUG");
        assert_eq!(Configuration::default(), Configuration::Release);
    }

    #[test]
    fn state_machine_happy_path() {
        let mut state = BuildState::default();
        let mut seen = vec![state];
        while let Some(next) = state.advance() {
            state = next;
            seen.push(state);
        }

        assert_eq!(
            seen,
            vec![
                BuildState::Idle,
                BuildState::Configuring,
                BuildState::Building,
                BuildState::Done
            ]
        );
        assert!(state.is_terminal());
    }

    #[test]
    fn state_machine_failures_are_absorbing() {
        let failed = BuildState::Configuring.fail().unwrap();
        assert_eq!(
            failed,
            BuildState::Failed {
                phase: BuildPhase::Configure
            }
        );
        assert!(failed.is_terminal());
        assert_eq!(failed.advance(), None);
        assert_eq!(failed.fail(), None);

        assert_eq!(
            BuildState::Building.fail(),
            Some(BuildState::Failed {
                phase: BuildPhase::Build
            })
        );
    }

    #[test]
    fn idle_and_done_cannot_fail() {
        assert_eq!(BuildState::Idle.fail(), None);
        assert_eq!(BuildState::Done.fail(), None);
    }

    #[test]
    fn state_display() {
        assert_eq!(BuildState::Building.to_string(), "building");
        assert_eq!(
            BuildState::Failed {
                phase: BuildPhase::Build
            }
            .to_string(),
            "failed (build)"
        );
    }
}
