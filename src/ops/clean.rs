//! Implementation of `cmake-target clean`.

use std::path::Path;

use anyhow::Result;

use crate::core::context::BuildType;
use crate::core::paths::BuildPaths;
use crate::core::target::BuildTarget;
use crate::util::fs::remove_dir_all_if_exists;

/// Remove the generated project for `name`, including its CMake cache and
/// built markers. Returns whether anything was removed.
pub fn clean_target(name: &str, module_dir: &Path, third_party_root: &Path) -> Result<bool> {
    let target = BuildTarget::new(name, "", "");
    let paths = BuildPaths::new(&target, &BuildType::Release, module_dir, third_party_root);

    if !paths.project_root.exists() {
        tracing::debug!("nothing to clean at {}", paths.project_root.display());
        return Ok(false);
    }

    tracing::info!("Removing {}", paths.project_root.display());
    remove_dir_all_if_exists(&paths.project_root)?;
    Ok(true)
}
