//! Host module description sink.
//!
//! The host build system is an external collaborator: this crate only appends
//! to the lists it exposes. [`ModuleRules`] is the seam; [`ModuleDescription`]
//! is a plain in-memory implementation used by the CLI and tests.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::language::CppStandard;

/// Append-only view of a host module's compile/link description.
pub trait ModuleRules {
    /// Add a public include directory.
    fn add_public_include_path(&mut self, path: &str);

    /// Add a library to link (name or full path).
    fn add_library(&mut self, library: &str);

    /// Add a runtime library search path.
    fn add_runtime_library_path(&mut self, path: &str);

    /// Add a file whose existence/mtime the host watches for staleness.
    fn add_external_dependency(&mut self, path: &Path);

    /// Set the module's C++ standard.
    fn set_cpp_standard(&mut self, standard: CppStandard);

    /// Link a system library (e.g., `stdc++`).
    fn add_system_library(&mut self, name: &str);
}

/// In-memory module description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ModuleDescription {
    pub public_include_paths: Vec<String>,
    pub additional_libraries: Vec<String>,
    pub runtime_library_paths: Vec<String>,
    pub external_dependencies: Vec<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpp_standard: Option<CppStandard>,
    pub system_libraries: Vec<String>,
}

impl ModuleDescription {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any external dependency is missing on disk.
    pub fn has_missing_dependency(&self) -> bool {
        self.external_dependencies.iter().any(|p| !p.exists())
    }
}

impl ModuleRules for ModuleDescription {
    fn add_public_include_path(&mut self, path: &str) {
        self.public_include_paths.push(path.to_string());
    }

    fn add_library(&mut self, library: &str) {
        self.additional_libraries.push(library.to_string());
    }

    fn add_runtime_library_path(&mut self, path: &str) {
        self.runtime_library_paths.push(path.to_string());
    }

    fn add_external_dependency(&mut self, path: &Path) {
        self.external_dependencies.push(path.to_path_buf());
    }

    fn set_cpp_standard(&mut self, standard: CppStandard) {
        self.cpp_standard = Some(standard);
    }

    fn add_system_library(&mut self, name: &str) {
        if !self.system_libraries.iter().any(|l| l == name) {
            self.system_libraries.push(name.to_string());
        }
    }
}
