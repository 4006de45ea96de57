//! Native extension building
//!
//! Compiles the native modules of a hybrid package by driving `CMake`:
//! one configure step and one build step per extension, run strictly in
//! sequence.
//!
//! - [`types`]: descriptors, configurations, per-build state
//! - [`strategy`]: per-platform argument vectors
//! - [`invoker`]: external process execution
//! - [`toolchain`]: `CMake` discovery and version checks
//! - [`builder`]: orchestration

pub mod builder;
pub mod invoker;
pub mod strategy;
pub mod toolchain;
pub mod types;

pub use builder::{BuildSettings, ExtensionBuilder, ensure_build_temp, version_info_flags};
pub use invoker::{Invocation, ProcessInvoker, SystemInvoker};
pub use strategy::{BuildPlan, plan_build};
pub use toolchain::{MINIMUM_WINDOWS_VERSION, ToolchainInfo, validate_toolchain};
pub use types::{
    BuildContext, BuildResult, BuildState, Configuration, ExtensionDescriptor,
    ensure_distinct_modules,
};
