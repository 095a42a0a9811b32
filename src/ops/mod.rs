//! High-level operations.
//!
//! This module contains the implementation of cmake-target commands.

pub mod add_target;
pub mod clean;

pub use add_target::{add_target, try_add_target, BuildEnvironment};
pub use clean::clean_target;
