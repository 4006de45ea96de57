//! Path utilities for manifests, artifacts and scratch directories.
//! Module paths (`pkg/ext` or `pkg.ext`) map onto directory trees under the
//! build roots.

use crate::env_vars;
use crate::error::BuildError;
use std::path::{Component, Path, PathBuf};

/// Default manifest file name
pub const MANIFEST_FILE: &str = "extbuild.toml";

/// Build description every extension source tree must contain
pub const BUILD_DESCRIPTION: &str = "CMakeLists.txt";

/// Find the manifest for the current directory.
/// Priority: `EXTBUILD_MANIFEST` env var -> ./extbuild.toml.
#[must_use]
pub fn find_manifest() -> PathBuf {
    if let Some(manifest) = env_vars::extbuild_manifest() {
        return PathBuf::from(manifest);
    }

    find_manifest_in(".")
}

/// Path of the manifest in `dir` (whether or not it exists).
#[must_use]
pub fn find_manifest_in(dir: impl AsRef<Path>) -> PathBuf {
    dir.as_ref().join(MANIFEST_FILE)
}

/// Split a module path into its segments.
///
/// Accepts `/`, `\` and `.` as separators. Empty segments and parent
/// references are rejected so artifacts can never escape the build root.
pub fn module_segments(name: &str) -> Result<Vec<&str>, BuildError> {
    let invalid = |reason: &str| BuildError::InvalidDescriptor {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.trim().is_empty() {
        return Err(invalid("module path is empty"));
    }

    let segments: Vec<&str> = name.split(['/', '\\', '.']).collect();
    if segments.iter().any(|segment| segment.is_empty()) {
        return Err(invalid("module path has an empty segment"));
    }
    if segments.iter().any(|segment| segment.trim() != *segment) {
        return Err(invalid("module path segments cannot have surrounding whitespace"));
    }

    Ok(segments)
}

/// Final artifact path for module `name` under `build_lib`.
///
/// `pkg/ext` with suffix `.so` becomes `<build_lib>/pkg/ext.so`.
pub fn artifact_path(build_lib: &Path, name: &str, suffix: &str) -> Result<PathBuf, BuildError> {
    let segments = module_segments(name)?;
    let Some((file_stem, packages)) = segments.split_last() else {
        return Err(BuildError::InvalidDescriptor {
            name: name.to_string(),
            reason: "module path is empty".to_string(),
        });
    };

    let mut path = build_lib.to_path_buf();
    path.extend(packages);
    path.push(format!("{file_stem}{suffix}"));
    Ok(path)
}

/// Absolute directory that receives the artifact of module `name`.
pub fn output_dir(build_lib: &Path, name: &str, suffix: &str) -> Result<PathBuf, BuildError> {
    let artifact = absolutize(&artifact_path(build_lib, name, suffix)?)?;
    artifact
        .parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| BuildError::InvalidDescriptor {
            name: name.to_string(),
            reason: format!("{} has no parent directory", artifact.display()),
        })
}

/// Absolute scratch directory for module `name`, one per module.
///
/// `pkg/ext` under `build/temp` becomes `<cwd>/build/temp/pkg/ext`.
pub fn build_temp_dir(build_temp: &Path, name: &str) -> Result<PathBuf, BuildError> {
    let mut path = build_temp.to_path_buf();
    path.extend(module_segments(name)?);
    absolutize(&path)
}

/// Make `path` absolute against the current directory and normalize it.
/// Does not touch the filesystem.
pub fn absolutize(path: &Path) -> Result<PathBuf, BuildError> {
    let absolute = std::path::absolute(path).map_err(|source| BuildError::Io {
        context: format!("Failed to resolve {}", path.display()),
        source,
    })?;

    Ok(normalize(&absolute))
}

/// Drop `.` components and fold `..` into the preceding component,
/// lexically. A `..` at the root stays at the root.
#[must_use]
pub fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => normalized.push(component),
            },
            other => normalized.push(other),
        }
    }
    normalized
}
