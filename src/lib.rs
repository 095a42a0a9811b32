//! cmake-target - delegate a native subtree to CMake from a host build
//!
//! This crate decides whether a wrapped CMake project has to be reconfigured,
//! runs configure and build as child processes, and splices the include
//! paths, libraries and dependencies the build reports back into the host
//! module's description.

pub mod builder;
pub mod core;
pub mod ops;
pub mod util;

/// Test utilities and mocks for unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides scripted process runners and injectable
/// file modification times.
#[cfg(test)]
pub mod test_support;

pub use builder::{BuildError, BuildOrchestrator, BuildState, Manifest};
pub use core::{BuildContext, BuildTarget, ModuleDescription, ModuleRules};
pub use ops::add_target;
pub use util::context::GlobalContext;
