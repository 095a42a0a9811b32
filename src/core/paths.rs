//! Derived filesystem locations for one external build.
//!
//! All paths are a pure function of the target, the build type, the module
//! directory and the third-party root, so repeated evaluations of the same
//! module land on the same generated project and the same CMake cache.
//!
//! ```text
//! <third_party_root>/generated/                 install prefix
//! <third_party_root>/generated/<name>/          generated project root
//!     CMakeLists.txt                            generated project descriptor
//!     toolchain.cmake                           generated toolchain descriptor
//!     <BuildType>.built                         built marker
//!     build/                                    CMake binary dir
//!         buildinfo_<BuildType>.output          manifest
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::context::BuildType;
use crate::core::target::BuildTarget;
use crate::util::fs::ensure_dir;

/// Name of the CMake binary directory inside the generated project.
pub const BUILD_DIR_NAME: &str = "build";

/// File name of the sentinel dependency injected after a failure.
pub const FAILED_SENTINEL: &str = "build.failed";

/// Paths for one (target, build type) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPaths {
    /// Host module directory
    pub module_dir: PathBuf,
    /// CMake project being wrapped (`module_dir/location`)
    pub target_dir: PathBuf,
    /// `<third_party_root>/generated`
    pub generated_root: PathBuf,
    /// `<generated_root>/<name>`
    pub project_root: PathBuf,
    /// `<project_root>/build`
    pub build_dir: PathBuf,
    /// `<build_dir>/buildinfo_<type>.output`
    pub manifest: PathBuf,
    /// `<project_root>/<type>.built`
    pub built_marker: PathBuf,
    /// `<project_root>/CMakeLists.txt`
    pub project_descriptor: PathBuf,
    /// `<project_root>/toolchain.cmake`
    pub toolchain_file: PathBuf,
}

impl BuildPaths {
    /// Derive the paths for `target`.
    ///
    /// A relative `third_party_root` is resolved against the module directory.
    pub fn new(
        target: &BuildTarget,
        build_type: &BuildType,
        module_dir: &Path,
        third_party_root: &Path,
    ) -> Self {
        let module_dir = absolute(module_dir);
        let target_dir = module_dir.join(target.location());
        let generated_root = module_dir.join(third_party_root).join("generated");
        let project_root = generated_root.join(target.name());
        let build_dir = project_root.join(BUILD_DIR_NAME);

        BuildPaths {
            manifest: build_dir.join(format!("buildinfo_{}.output", build_type)),
            built_marker: project_root.join(format!("{}.built", build_type)),
            project_descriptor: project_root.join("CMakeLists.txt"),
            toolchain_file: project_root.join("toolchain.cmake"),
            module_dir,
            target_dir,
            generated_root,
            project_root,
            build_dir,
        }
    }

    /// The wrapped project's own `CMakeLists.txt`, whose modification time
    /// decides whether a reconfigure is needed.
    pub fn authoring_descriptor(&self) -> PathBuf {
        self.target_dir.join("CMakeLists.txt")
    }

    /// Non-existent file that keeps the host treating the module as stale.
    pub fn failed_sentinel(&self) -> PathBuf {
        self.target_dir.join(FAILED_SENTINEL)
    }

    /// Create the generated project and build directories. Idempotent.
    pub fn ensure_dirs(&self) -> Result<()> {
        ensure_dir(&self.project_root)?;
        ensure_dir(&self.build_dir)
    }

    /// Remove the built markers of every build type.
    ///
    /// The binary dir is shared between build types, so a configure for one
    /// type invalidates the markers of all the others.
    pub fn clear_built_markers(&self) -> Result<()> {
        let entries = match std::fs::read_dir(&self.project_root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("failed to read directory: {}", self.project_root.display())
                })
            }
        };

        for entry in entries {
            let path = entry
                .with_context(|| format!("failed to read directory: {}", self.project_root.display()))?
                .path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "built") {
                std::fs::remove_file(&path)
                    .with_context(|| format!("failed to remove {}", path.display()))?;
            }
        }
        Ok(())
    }
}

/// Make `path` absolute against the current directory without touching the
/// filesystem, so paths stay stable whether or not they exist yet.
fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
