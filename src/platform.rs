//! Host platform detection
//!
//! Build arguments depend on the operating system family and, on Windows,
//! on whether the running process is 64-bit. Both are read once per
//! process and never probed again.

use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

/// Cached host detection (computed once, reused throughout execution)
static CURRENT_HOST: LazyLock<HostPlatform> = LazyLock::new(detect_host_impl);

/// Operating system family, the only key the argument strategy switches on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformFamily {
    /// Linux, macOS, BSDs: single-config generators such as Makefiles or Ninja
    Unix,
    /// Windows: multi-config Visual Studio generators
    Windows,
}

impl PlatformFamily {
    /// Parse a family name as accepted on the command line.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "unix" | "linux" | "macos" | "darwin" => Some(Self::Unix),
            "windows" | "win32" | "win" => Some(Self::Windows),
            _ => None,
        }
    }
}

impl fmt::Display for PlatformFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unix => f.write_str("unix"),
            Self::Windows => f.write_str("windows"),
        }
    }
}

/// Host identity consulted by the build strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HostPlatform {
    pub family: PlatformFamily,
    /// Whether the current process uses 64-bit pointers
    pub pointer_width_64: bool,
}

impl HostPlatform {
    #[must_use]
    pub const fn new(family: PlatformFamily, pointer_width_64: bool) -> Self {
        Self {
            family,
            pointer_width_64,
        }
    }

    /// The same host with a different family, for previewing another
    /// platform's arguments.
    #[must_use]
    pub const fn with_family(self, family: PlatformFamily) -> Self {
        Self { family, ..self }
    }

    #[must_use]
    pub const fn is_windows(&self) -> bool {
        matches!(self.family, PlatformFamily::Windows)
    }

    /// Default file suffix for a native extension module on this family
    #[must_use]
    pub const fn extension_suffix(&self) -> &'static str {
        match self.family {
            PlatformFamily::Unix => ".so",
            PlatformFamily::Windows => ".pyd",
        }
    }
}

impl fmt::Display for HostPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = if self.pointer_width_64 { 64 } else { 32 };
        write!(f, "{}-{width}bit", self.family)
    }
}

/// Detect the host platform this process runs on.
///
/// The result is cached: the first call detects, later calls copy.
#[must_use]
pub fn detect_current_host() -> HostPlatform {
    *CURRENT_HOST
}

fn detect_host_impl() -> HostPlatform {
    let family = if cfg!(windows) {
        PlatformFamily::Windows
    } else {
        PlatformFamily::Unix
    };

    HostPlatform::new(family, cfg!(target_pointer_width = "64"))
}
