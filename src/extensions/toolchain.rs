//! `CMake` availability and version checks
//!
//! The build tool is probed once per run with `cmake --version`, before any
//! extension is configured. Only Windows enforces a minimum version: older
//! releases there lack the per-configuration output directory handling the
//! build arguments rely on.

use super::invoker::{Invocation, ProcessInvoker};
use crate::error::BuildError;
use crate::platform::HostPlatform;
use regex::Regex;
use semver::Version;
use std::sync::LazyLock;

/// Oldest `CMake` accepted on Windows
pub const MINIMUM_WINDOWS_VERSION: Version = Version::new(3, 1, 0);

static VERSION_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"version\s*([\d.]+)").ok());

/// What the version probe found
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainInfo {
    /// Program name or path that was probed
    pub program: String,
    /// Raw `--version` output
    pub report: String,
    /// Parsed version, when the report had one
    pub version: Option<Version>,
}

impl ToolchainInfo {
    /// First line of the report, e.g. `cmake version 3.27.4`
    #[must_use]
    pub fn summary(&self) -> &str {
        self.report.lines().next().unwrap_or_default().trim()
    }
}

/// Extract the version number from a `cmake --version` report.
#[must_use]
pub fn parse_version_report(report: &str) -> Option<Version> {
    let pattern = VERSION_PATTERN.as_ref()?;
    let captured = pattern.captures(report)?.get(1)?.as_str();
    parse_lenient_version(captured)
}

/// Parse a dotted version that may have fewer than three parts.
///
/// `3.1` becomes `3.1.0`; suffixes past the patch number are ignored.
#[must_use]
pub fn parse_lenient_version(text: &str) -> Option<Version> {
    let mut parts = text
        .trim()
        .trim_matches('.')
        .split('.')
        .map(|part| part.parse::<u64>().ok());

    let major = parts.next()??;
    let minor = parts.next().unwrap_or(Some(0))?;
    let patch = parts.next().unwrap_or(Some(0))?;

    Some(Version::new(major, minor, patch))
}

/// Probe `program` and return what it reported, without judging it.
pub fn probe<I: ProcessInvoker>(invoker: &mut I, program: &str) -> Result<ToolchainInfo, BuildError> {
    let report = invoker.capture(&Invocation::new(program, ["--version"]))?;
    let version = parse_version_report(&report);

    Ok(ToolchainInfo {
        program: program.to_string(),
        report,
        version,
    })
}

/// Confirm `CMake` can be run and, on Windows, that it is recent enough.
pub fn validate_toolchain<I: ProcessInvoker>(
    invoker: &mut I,
    program: &str,
    host: HostPlatform,
) -> Result<ToolchainInfo, BuildError> {
    let info = probe(invoker, program)?;
    crate::debug!("Toolchain {}: {}", info.program, info.summary());

    if host.is_windows() {
        let Some(found) = info.version.clone() else {
            return Err(BuildError::ToolchainVersionUnreadable {
                report: info.report,
            });
        };
        if found < MINIMUM_WINDOWS_VERSION {
            return Err(BuildError::ToolchainTooOld {
                found,
                required: MINIMUM_WINDOWS_VERSION,
            });
        }
    }

    Ok(info)
}
