//! Shared test utilities for extbuild tests
//!
//! A recording process invoker plus helpers that lay out `CMake` source
//! trees and build settings inside a temporary directory.

#[cfg(test)]
pub mod fixtures {
    use crate::error::BuildError;
    use crate::extensions::builder::BuildSettings;
    use crate::extensions::invoker::{Invocation, ProcessInvoker};
    use crate::extensions::types::ExtensionDescriptor;
    use crate::platform::HostPlatform;
    use std::fs;
    use std::path::Path;

    /// Invoker that records every call and spawns nothing
    #[derive(Debug, Clone, Default)]
    pub struct RecordingInvoker {
        /// Output returned from `capture`
        report: String,
        /// Every call to `capture` and `invoke`, in order
        history: Vec<Invocation>,
        /// Only the calls to `invoke`
        invoked: Vec<Invocation>,
        toolchain_missing: bool,
        /// Argument that makes an invocation exit with the given code
        failure: Option<(String, i32)>,
    }

    impl RecordingInvoker {
        pub fn with_report(report: &str) -> Self {
            Self {
                report: report.to_string(),
                ..Self::default()
            }
        }

        /// Every call fails as if `CMake` were not installed
        pub fn missing_toolchain() -> Self {
            Self {
                toolchain_missing: true,
                ..Self::default()
            }
        }

        /// Exit with `exit_code` from any invocation that has `arg` among
        /// its arguments
        pub fn fail_when(mut self, arg: impl Into<String>, exit_code: i32) -> Self {
            self.failure = Some((arg.into(), exit_code));
            self
        }

        pub fn invoked(&self) -> &[Invocation] {
            &self.invoked
        }

        /// Command vectors of every call, captured ones included
        pub fn commands(&self) -> Vec<Vec<String>> {
            self.history.iter().map(Invocation::command_vector).collect()
        }

        fn outcome(&mut self, invocation: &Invocation) -> Result<(), BuildError> {
            self.history.push(invocation.clone());

            if self.toolchain_missing {
                return Err(BuildError::ToolchainMissing {
                    program: invocation.program.clone(),
                });
            }

            if let Some((arg, exit_code)) = &self.failure
                && invocation.args.iter().any(|a| a == arg)
            {
                return Err(BuildError::ProcessFailed {
                    command: invocation.command_vector(),
                    exit_code: Some(*exit_code),
                });
            }

            Ok(())
        }
    }

    impl ProcessInvoker for RecordingInvoker {
        fn invoke(&mut self, invocation: &Invocation) -> Result<(), BuildError> {
            self.invoked.push(invocation.clone());
            self.outcome(invocation)
        }

        fn capture(&mut self, invocation: &Invocation) -> Result<String, BuildError> {
            self.outcome(invocation)?;
            Ok(self.report.clone())
        }
    }

    /// Create `<root>/src/<module path>/CMakeLists.txt` and a descriptor for it
    pub fn cmake_project(root: &Path, name: &str) -> ExtensionDescriptor {
        let source_dir = root.join("src").join(name);
        fs::create_dir_all(&source_dir).expect("Failed to create source dir");
        fs::write(
            source_dir.join("CMakeLists.txt"),
            "cmake_minimum_required(VERSION 3.1)\nproject(ext CXX)\n",
        )
        .expect("Failed to write CMakeLists.txt");

        ExtensionDescriptor::new(name, source_dir).expect("Failed to create descriptor")
    }

    /// Quiet settings rooted at `root` for package version 0.9.0
    pub fn settings_for(root: &Path, host: HostPlatform) -> BuildSettings {
        BuildSettings {
            program: "cmake".to_string(),
            interpreter: "/usr/bin/python3".into(),
            build_lib: root.join("build/lib"),
            build_temp: root.join("build/temp"),
            package_version: "0.9.0".to_string(),
            jobs: 2,
            diagnostics: false,
            artifact_suffix: host.extension_suffix().to_string(),
            cxxflags: None,
            host,
            quiet: true,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Tests can panic")]
mod tests {
    use super::fixtures::*;
    use crate::extensions::invoker::{Invocation, ProcessInvoker};
    use crate::platform::{HostPlatform, PlatformFamily};
    use tempfile::TempDir;

    #[test]
    fn recording_invoker_keeps_order() {
        let mut invoker = RecordingInvoker::with_report("cmake version 3.27.4\n");
        let report = invoker
            .capture(&Invocation::new("cmake", ["--version"]))
            .unwrap();
        invoker
            .invoke(&Invocation::new("cmake", ["--build", "."]))
            .unwrap();

        assert_eq!(report, "cmake version 3.27.4\n");
        assert_eq!(
            invoker.commands(),
            vec![vec!["cmake", "--version"], vec!["cmake", "--build", "."]]
        );
        assert_eq!(invoker.invoked().len(), 1);
    }

    #[test]
    fn recording_invoker_fails_on_marker() {
        let mut invoker = RecordingInvoker::default().fail_when("--build", 4);
        assert!(invoker.invoke(&Invocation::new("cmake", ["src"])).is_ok());
        assert!(
            invoker
                .invoke(&Invocation::new("cmake", ["--build", "."]))
                .is_err()
        );
    }

    #[test]
    fn cmake_project_is_valid() {
        let root = TempDir::new().unwrap();
        let descriptor = cmake_project(root.path(), "pkg/ext");
        assert!(descriptor.validate_source().is_ok());

        let settings = settings_for(root.path(), HostPlatform::new(PlatformFamily::Unix, true));
        assert_eq!(settings.artifact_suffix, ".so");
    }
}
