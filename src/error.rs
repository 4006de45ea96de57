//! Error taxonomy for extension builds
//!
//! Every failure aborts the whole run. Callers that need a human-readable
//! chain wrap these in `anyhow` at the CLI boundary.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Which external step of an extension build failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildPhase {
    /// Generating build files from `CMakeLists.txt`
    Configure,
    /// Compiling and linking with the generated build files
    Build,
}

impl fmt::Display for BuildPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configure => f.write_str("configure"),
            Self::Build => f.write_str("build"),
        }
    }
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("{program} could not be found or started. CMake must be installed to build native extensions")]
    ToolchainMissing { program: String },

    #[error("CMake >= {required} is required on Windows (found {found})")]
    ToolchainTooOld {
        found: semver::Version,
        required: semver::Version,
    },

    #[error("Could not read a version from the CMake version report: {report:?}")]
    ToolchainVersionUnreadable { report: String },

    #[error("{phase} step for {extension} failed with {}", describe_exit(*exit_code))]
    BuildStepFailed {
        extension: String,
        phase: BuildPhase,
        exit_code: Option<i32>,
    },

    #[error("Command `{}` failed with {}", command.join(" "), describe_exit(*exit_code))]
    ProcessFailed {
        command: Vec<String>,
        exit_code: Option<i32>,
    },

    #[error("Failed to create scratch directory {}: {source}", path.display())]
    FileSystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid extension {name:?}: {reason}")]
    InvalidDescriptor { name: String, reason: String },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl BuildError {
    /// Attach a build phase to a generic process failure.
    ///
    /// Missing toolchains and I/O errors pass through untouched so the
    /// original cause is not hidden behind a phase label.
    #[must_use]
    pub fn in_phase(self, extension: &str, phase: BuildPhase) -> Self {
        match self {
            Self::ProcessFailed { exit_code, .. } => Self::BuildStepFailed {
                extension: extension.to_string(),
                phase,
                exit_code,
            },
            other => other,
        }
    }
}

fn describe_exit(exit_code: Option<i32>) -> String {
    exit_code.map_or_else(
        || "no exit code (terminated by signal)".to_string(),
        |code| format!("exit code {code}"),
    )
}
