//! extbuild internal library code
//!
//! Drives `CMake` to build the native extension modules of a hybrid
//! package. The CLI in `main.rs` is a thin layer over this crate.

pub mod config;
pub mod debug;
pub mod env_vars;
pub mod error;
pub mod extensions;
pub mod paths;
pub mod platform;

#[cfg(test)]
pub mod test_utils;

// Re-export common types for convenience
pub use config::{CliOverrides, Config, EnvOverrides, Manifest};
pub use debug::{debug_log, init_debug, is_debug_enabled};
pub use error::{BuildError, BuildPhase};
pub use extensions::{
    BuildPlan, BuildResult, BuildSettings, Configuration, ExtensionBuilder, ExtensionDescriptor,
    Invocation, ProcessInvoker, SystemInvoker,
};
pub use paths::{find_manifest, find_manifest_in};
pub use platform::{HostPlatform, PlatformFamily, detect_current_host};
