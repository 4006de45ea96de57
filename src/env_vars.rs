//! Environment variable handling.
//!
//! Every variable extbuild reads is accessed through this module so the
//! set of inputs is visible in one place.

use std::env;

/// Flag variable used to embed the package version in native code
pub const CXXFLAGS: &str = "CXXFLAGS";

// Boolean variables accept "1", "true", "yes" (case-insensitive)
fn parse_enabled(value: &str) -> bool {
    let value = value.trim().to_lowercase();
    value == "1" || value == "true" || value == "yes"
}

fn is_enabled(var: &str) -> bool {
    env::var(var).ok().is_some_and(|s| parse_enabled(&s))
}

// Toolchain and interpreter locations

/// Get `CMake` executable override.
pub fn cmake() -> Option<String> {
    env::var("CMAKE").ok().filter(|s| !s.is_empty())
}

/// Get interpreter override passed to `CMake` as `PYTHON_EXECUTABLE`.
pub fn python() -> Option<String> {
    env::var("PYTHON").ok().filter(|s| !s.is_empty())
}

/// Get C++ compiler flags from the ambient environment.
pub fn cxxflags() -> Option<String> {
    env::var(CXXFLAGS).ok()
}

// extbuild settings

/// Get build concurrency override (returns None if not set or invalid).
pub fn extbuild_jobs() -> Option<usize> {
    env::var("EXTBUILD_JOBS")
        .ok()
        .and_then(|s| parse_jobs(&s))
}

/// Check if the Windows diagnostic directory listings are enabled.
pub fn extbuild_diagnostics() -> bool {
    is_enabled("EXTBUILD_DIAGNOSTICS")
}

/// Get manifest path override.
pub fn extbuild_manifest() -> Option<String> {
    env::var("EXTBUILD_MANIFEST").ok().filter(|s| !s.is_empty())
}

/// Get XDG config home for the user-level config file.
pub fn xdg_config_home() -> Option<String> {
    env::var("XDG_CONFIG_HOME").ok().filter(|s| !s.is_empty())
}

// Zero jobs would stall the native build tool, so it counts as unset
fn parse_jobs(value: &str) -> Option<usize> {
    value.trim().parse().ok().filter(|&jobs: &usize| jobs > 0)
}

/// Append `extra` to an existing flags value without discarding it.
///
/// An absent or blank existing value yields just `extra`.
#[must_use]
pub fn append_flags(existing: Option<&str>, extra: &str) -> String {
    match existing.map(str::trim_end) {
        Some(current) if !current.trim().is_empty() => format!("{current} {extra}"),
        _ => extra.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enabled_parsing_true_variants() {
        assert!(parse_enabled("1"));
        assert!(parse_enabled("true"));
        assert!(parse_enabled("YES"));
        assert!(parse_enabled(" True "));
    }

    #[test]
    fn enabled_parsing_false_variants() {
        assert!(!parse_enabled("0"));
        assert!(!parse_enabled("false"));
        assert!(!parse_enabled("no"));
        assert!(!parse_enabled(""));
    }

    #[test]
    fn jobs_parsing() {
        assert_eq!(parse_jobs("8"), Some(8));
        assert_eq!(parse_jobs(" 4 "), Some(4));
        assert_eq!(parse_jobs("0"), None);
        assert_eq!(parse_jobs("-3"), None);
        assert_eq!(parse_jobs("many"), None);
    }

    #[test]
    fn append_flags_extends_existing_value() {
        assert_eq!(
            append_flags(Some("-O2 -Wall"), "-DVERSION_INFO=\\\"1.0\\\""),
            "-O2 -Wall -DVERSION_INFO=\\\"1.0\\\""
        );
    }

    #[test]
    fn append_flags_without_existing_value() {
        assert_eq!(append_flags(None, "-DX"), "-DX");
        assert_eq!(append_flags(Some(""), "-DX"), "-DX");
        assert_eq!(append_flags(Some("   "), "-DX"), "-DX");
    }
}
