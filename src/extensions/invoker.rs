//! External process execution
//!
//! Every `CMake` call goes through a [`ProcessInvoker`]. The system
//! implementation blocks until the child exits and lets it write straight
//! to the terminal; the trait exists so orchestration can be exercised
//! without spawning anything.

use crate::debug::render_command;
use crate::error::BuildError;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

/// A fully described external command
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Working directory (inherits the caller's when `None`)
    pub cwd: Option<PathBuf>,
    /// Variables set on top of the inherited environment
    pub env: BTreeMap<String, String>,
}

impl Invocation {
    #[must_use]
    pub fn new(program: impl Into<String>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            cwd: None,
            env: BTreeMap::new(),
        }
    }

    /// Build an invocation from a command vector whose first element is the
    /// program. Returns `None` for an empty vector.
    #[must_use]
    pub fn from_command(command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self::new(program.clone(), args.iter().cloned()))
    }

    #[must_use]
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    #[must_use]
    pub fn envs(mut self, vars: &BTreeMap<String, String>) -> Self {
        self.env
            .extend(vars.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    /// Program followed by its arguments
    #[must_use]
    pub fn command_vector(&self) -> Vec<String> {
        std::iter::once(self.program.clone())
            .chain(self.args.iter().cloned())
            .collect()
    }

    /// Shell-like rendering for logs and dry runs
    #[must_use]
    pub fn render(&self) -> String {
        render_command(&self.program, &self.args)
    }
}

/// Runs external commands on behalf of the build orchestrator
pub trait ProcessInvoker {
    /// Run to completion with inherited stdout/stderr.
    ///
    /// Fails with `ToolchainMissing` if the program cannot be found and
    /// `ProcessFailed` on a non-zero exit.
    fn invoke(&mut self, invocation: &Invocation) -> Result<(), BuildError>;

    /// Run to completion and return stdout followed by stderr.
    fn capture(&mut self, invocation: &Invocation) -> Result<String, BuildError>;
}

/// Invoker backed by `std::process::Command`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemInvoker;

impl SystemInvoker {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Locate `program` via `PATH` (or verify it when given as a path).
    pub fn resolve(program: &str) -> Result<PathBuf, BuildError> {
        which::which(program).map_err(|_| BuildError::ToolchainMissing {
            program: program.to_string(),
        })
    }

    fn command(invocation: &Invocation) -> Result<Command, BuildError> {
        let program = Self::resolve(&invocation.program)?;
        let mut cmd = Command::new(program);
        cmd.args(&invocation.args).envs(&invocation.env);
        if let Some(cwd) = &invocation.cwd {
            cmd.current_dir(cwd);
        }
        Ok(cmd)
    }

    fn spawn_error(invocation: &Invocation, source: std::io::Error) -> BuildError {
        if source.kind() == ErrorKind::NotFound {
            BuildError::ToolchainMissing {
                program: invocation.program.clone(),
            }
        } else {
            BuildError::Io {
                context: format!("Failed to run {}", invocation.render()),
                source,
            }
        }
    }

    fn check_status(invocation: &Invocation, status: ExitStatus) -> Result<(), BuildError> {
        if status.success() {
            Ok(())
        } else {
            Err(BuildError::ProcessFailed {
                command: invocation.command_vector(),
                exit_code: status.code(),
            })
        }
    }
}

impl ProcessInvoker for SystemInvoker {
    fn invoke(&mut self, invocation: &Invocation) -> Result<(), BuildError> {
        crate::debug!("Running: {}", invocation.render());
        let status = Self::command(invocation)?
            .status()
            .map_err(|e| Self::spawn_error(invocation, e))?;
        Self::check_status(invocation, status)
    }

    fn capture(&mut self, invocation: &Invocation) -> Result<String, BuildError> {
        crate::debug!("Capturing: {}", invocation.render());
        let output = Self::command(invocation)?
            .output()
            .map_err(|e| Self::spawn_error(invocation, e))?;
        Self::check_status(invocation, output.status)?;

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(text)
    }
}
