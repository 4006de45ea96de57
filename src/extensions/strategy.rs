//! Per-platform `CMake` arguments
//!
//! Turns a descriptor and its build context into the argument vectors for
//! the configure and build invocations. Pure: no environment reads, no
//! filesystem access, so the same inputs always give the same vectors.
//!
//! Unix (single-config generators):
//! ```bash
//! cmake <source_dir> -DCMAKE_LIBRARY_OUTPUT_DIRECTORY=<out> -DPYTHON_EXECUTABLE=<py> -DCMAKE_BUILD_TYPE=Release
//! cmake --build <temp> --config Release -- -j<jobs>
//! ```
//!
//! Windows (multi-config Visual Studio generators):
//! ```bash
//! cmake <source_dir> -DCMAKE_LIBRARY_OUTPUT_DIRECTORY=<out> -DPYTHON_EXECUTABLE=<py> -DCMAKE_LIBRARY_OUTPUT_DIRECTORY_RELEASE=<out> -DCMAKE_GENERATOR_PLATFORM=x64
//! cmake --build <temp> --config Release -- /m
//! ```

use super::types::{BuildContext, ExtensionDescriptor};
use crate::platform::PlatformFamily;
use serde::Serialize;
use std::path::Path;

/// Command vectors for one extension, excluding the `CMake` program itself
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct BuildPlan {
    /// Arguments of the configure invocation
    pub configure: Vec<String>,
    /// Arguments of the build invocation
    pub build: Vec<String>,
    /// Full commands (program first) run before configuring
    pub diagnostics: Vec<Vec<String>>,
}

fn directive(key: &str, value: impl AsRef<Path>) -> String {
    format!("-D{key}={}", value.as_ref().display())
}

/// Compute the plan for `descriptor` under `ctx`.
///
/// `interpreter` is the host package's interpreter, handed to `CMake` so
/// the extension links against the matching headers.
#[must_use]
pub fn plan_build(
    descriptor: &ExtensionDescriptor,
    ctx: &BuildContext,
    interpreter: &Path,
) -> BuildPlan {
    let mut configure = vec![
        descriptor.source_dir().display().to_string(),
        directive("CMAKE_LIBRARY_OUTPUT_DIRECTORY", &ctx.output_dir),
        directive("PYTHON_EXECUTABLE", interpreter),
    ];

    let mut build = vec![
        "--build".to_string(),
        ctx.build_temp_dir.display().to_string(),
        "--config".to_string(),
        ctx.configuration.as_str().to_string(),
        "--".to_string(),
    ];

    let mut diagnostics = Vec::new();

    match ctx.host.family {
        PlatformFamily::Unix => {
            configure.push(directive("CMAKE_BUILD_TYPE", ctx.configuration.as_str()));
            build.push(format!("-j{}", ctx.jobs));
        }
        PlatformFamily::Windows => {
            // Multi-config generators ignore the plain output directory
            configure.push(directive(
                &format!(
                    "CMAKE_LIBRARY_OUTPUT_DIRECTORY_{}",
                    ctx.configuration.directive_key()
                ),
                &ctx.output_dir,
            ));
            if ctx.host.pointer_width_64 {
                configure.push(directive("CMAKE_GENERATOR_PLATFORM", "x64"));
            }
            build.push("/m".to_string());

            if ctx.diagnostics {
                diagnostics.push(listing(None));
                diagnostics.push(listing(Some("..")));
            }
        }
    }

    BuildPlan {
        configure,
        build,
        diagnostics,
    }
}

fn listing(target: Option<&str>) -> Vec<String> {
    let mut command = vec!["cmd".to_string(), "/C".to_string(), "dir".to_string()];
    command.extend(target.map(str::to_string));
    command
}
