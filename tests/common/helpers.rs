//! Shared test helpers and utilities

use std::fmt::Write;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Path to the extbuild binary built for this test run
pub(crate) fn get_extbuild_binary() -> &'static str {
    env!("CARGO_BIN_EXE_extbuild")
}

/// Create a project with one `CMake` source tree per module path and a
/// manifest listing them. Returns the manifest path.
pub(crate) fn create_project(temp_dir: &TempDir, modules: &[&str]) -> PathBuf {
    let mut manifest = String::from("[package]\nname = \"pastaq\"\nversion = \"0.9.0\"\n");

    for module in modules {
        let source_dir = Path::new("native").join(module);
        fs::create_dir_all(temp_dir.path().join(&source_dir)).expect("Failed to create source dir");
        fs::write(
            temp_dir.path().join(&source_dir).join("CMakeLists.txt"),
            "cmake_minimum_required(VERSION 3.1)\nproject(ext CXX)\n",
        )
        .expect("Failed to write CMakeLists.txt");

        writeln!(
            &mut manifest,
            "\n[[extension]]\nname = \"{module}\"\nsource_dir = \"{}\"",
            source_dir.display()
        )
        .expect("Failed to format manifest");
    }

    let manifest_path = temp_dir.path().join("extbuild.toml");
    fs::write(&manifest_path, manifest).expect("Failed to write manifest");
    manifest_path
}

/// Command for the binary with the environment pinned, so the host's
/// `CMAKE`, `PYTHON` or user config never leak into a test
pub(crate) fn extbuild(temp_dir: &TempDir) -> Command {
    let mut cmd = Command::new(get_extbuild_binary());
    cmd.current_dir(temp_dir.path())
        .env("XDG_CONFIG_HOME", temp_dir.path().join("xdg"))
        .env("PYTHON", "/usr/bin/python3")
        .env_remove("CMAKE")
        .env_remove("CXXFLAGS")
        .env_remove("EXTBUILD_JOBS")
        .env_remove("EXTBUILD_DIAGNOSTICS")
        .env_remove("EXTBUILD_MANIFEST");
    cmd
}

/// Write an executable stand-in for `cmake` that logs each call to
/// `$FAKE_CMAKE_LOG`, and fails the build step with exit code 3 when
/// `FAKE_CMAKE_FAIL_BUILD` is set
#[cfg(unix)]
#[allow(dead_code)]
pub(crate) fn create_fake_cmake(temp_dir: &TempDir, version: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let script = format!(
        r#"#!/bin/sh
if [ "$1" = "--version" ]; then
  echo "cmake version {version}"
  exit 0
fi
echo "cwd=$(pwd) args=$* cxxflags=$CXXFLAGS" >> "$FAKE_CMAKE_LOG"
if [ "$1" = "--build" ] && [ -n "$FAKE_CMAKE_FAIL_BUILD" ]; then
  exit 3
fi
exit 0
"#
    );

    let path = temp_dir.path().join("fake-cmake");
    fs::write(&path, script).expect("Failed to write fake cmake");
    let mut permissions = fs::metadata(&path).expect("Failed to stat fake cmake").permissions();
    permissions.set_mode(0o755);
    fs::set_permissions(&path, permissions).expect("Failed to chmod fake cmake");
    path
}
