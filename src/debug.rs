//! Debug logging
//!
//! Verbose diagnostics for build orchestration: resolved paths, argument
//! vectors, state transitions. Off unless `--verbose` is passed, in which
//! case messages go to stderr so they never mix with `plan --json` output.

use std::sync::OnceLock;

static DEBUG_ENABLED: OnceLock<bool> = OnceLock::new();

/// Prefix written before every debug line
pub const DEBUG_PREFIX: &str = "[DEBUG]";

/// Initialize debug mode from the command-line flag.
///
/// Only the first call takes effect.
pub fn init_debug(enabled: bool) {
    if DEBUG_ENABLED.set(enabled).is_err() {
        debug_log("debug mode already initialized");
    }
}

/// Check if debug mode is enabled
pub fn is_debug_enabled() -> bool {
    DEBUG_ENABLED.get().copied().unwrap_or(false)
}

/// Print a debug message if debug mode is enabled
pub fn debug_log(message: &str) {
    if is_debug_enabled() {
        eprintln!("{DEBUG_PREFIX} {message}");
    }
}

/// Render a command vector the way it would be typed in a shell.
///
/// Arguments containing whitespace are quoted; used only for log output.
#[must_use]
pub fn render_command(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .map(|part| {
            if part.is_empty() || part.contains(char::is_whitespace) {
                format!("\"{part}\"")
            } else {
                part.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Macro for convenient debug logging
///
/// Usage: `debug!("configuring {} in {}", name, dir.display())`
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {
        if $crate::debug::is_debug_enabled() {
            eprintln!("{} {}", $crate::debug::DEBUG_PREFIX, format_args!($($arg)*));
        }
    };
}
