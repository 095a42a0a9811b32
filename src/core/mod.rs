//! Core data structures.
//!
//! - Host build context (platform, configuration, compiler selection)
//! - External build targets and their derived paths
//! - The host module description sink

pub mod context;
pub mod language;
pub mod paths;
pub mod rules;
pub mod target;

pub use context::{Architecture, BuildContext, BuildType, CompilerFamily, Configuration, Platform};
pub use language::CppStandard;
pub use paths::BuildPaths;
pub use rules::{ModuleDescription, ModuleRules};
pub use target::BuildTarget;
