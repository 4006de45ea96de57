use extbuild::{
    BuildError, BuildPhase, BuildSettings, Configuration, ExtensionBuilder, ExtensionDescriptor,
    HostPlatform, Invocation, PlatformFamily, ProcessInvoker,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Invoker that answers the version probe and records everything else
#[derive(Debug, Default)]
struct ScriptedInvoker {
    version: &'static str,
    calls: Vec<Invocation>,
    fail_configure: bool,
}

impl ProcessInvoker for ScriptedInvoker {
    fn invoke(&mut self, invocation: &Invocation) -> Result<(), BuildError> {
        self.calls.push(invocation.clone());
        let is_build = invocation.args.first().is_some_and(|arg| arg == "--build");
        if self.fail_configure && !is_build {
            return Err(BuildError::ProcessFailed {
                command: invocation.command_vector(),
                exit_code: None,
            });
        }
        Ok(())
    }

    fn capture(&mut self, _invocation: &Invocation) -> Result<String, BuildError> {
        Ok(format!("cmake version {}\n", self.version))
    }
}

fn settings(root: &Path, family: PlatformFamily) -> BuildSettings {
    let host = HostPlatform::new(family, true);
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

fn descriptor(root: &Path, name: &str) -> ExtensionDescriptor {
    let source = root.join("native");
    fs::create_dir_all(&source).unwrap();
    fs::write(source.join("CMakeLists.txt"), "project(ext)\n").unwrap();
    ExtensionDescriptor::new(name, source).unwrap()
}

#[test]
fn library_callers_can_supply_their_own_invoker() {
    let temp = TempDir::new().unwrap();
    let ext = descriptor(temp.path(), "pastaq/pastaq_cpp");
    let invoker = ScriptedInvoker {
        version: "3.27.4",
        ..ScriptedInvoker::default()
    };

    let mut builder = ExtensionBuilder::new(settings(temp.path(), PlatformFamily::Unix), invoker);
    let results = builder.run(&[ext], Configuration::Release).unwrap();

    let result = results.first().unwrap();
    assert_eq!(result.name, "pastaq/pastaq_cpp");
    assert!(result.output_dir.ends_with("build/lib/pastaq"));
    assert!(result.build_temp_dir.ends_with("build/temp/pastaq/pastaq_cpp"));
    assert!(result.build_temp_dir.is_dir());

    let calls = &builder.invoker().calls;
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|call| call.cwd.as_deref() == Some(result.build_temp_dir.as_path())));
}

#[test]
fn signal_terminated_configure_is_a_configure_failure() {
    let temp = TempDir::new().unwrap();
    let ext = descriptor(temp.path(), "pkg/ext");
    let invoker = ScriptedInvoker {
        version: "3.27.4",
        fail_configure: true,
        ..ScriptedInvoker::default()
    };

    let mut builder = ExtensionBuilder::new(settings(temp.path(), PlatformFamily::Windows), invoker);
    let err = builder.run(&[ext], Configuration::Debug).unwrap_err();

    assert!(matches!(
        err,
        BuildError::BuildStepFailed {
            phase: BuildPhase::Configure,
            exit_code: None,
            ..
        }
    ));
    assert!(err.to_string().contains("terminated by signal"));
    assert_eq!(builder.invoker().calls.len(), 1);
}

#[test]
fn windows_rejects_cmake_older_than_3_1() {
    let temp = TempDir::new().unwrap();
    let ext = descriptor(temp.path(), "pkg/ext");
    let invoker = ScriptedInvoker {
        version: "2.8.12",
        ..ScriptedInvoker::default()
    };

    let mut builder = ExtensionBuilder::new(settings(temp.path(), PlatformFamily::Windows), invoker);
    let err = builder.run(&[ext], Configuration::Release).unwrap_err();

    assert_eq!(
        err.to_string(),
        "CMake >= 3.1.0 is required on Windows (found 2.8.12)"
    );
    assert!(builder.invoker().calls.is_empty());
    assert!(!temp.path().join("build/temp").exists());
}
