//! Projects a build info manifest onto a host module description.

use std::path::Path;

use crate::builder::manifest::{keys, Manifest};
use crate::core::context::BuildContext;
use crate::core::language::CppStandard;
use crate::core::rules::ModuleRules;

/// System library linked when the external build picks its own C++ runtime.
pub const CPP_STDLIB: &str = "stdc++";

/// Append everything `manifest` declares to `rules`.
pub fn project(manifest: &Manifest, ctx: &BuildContext, rules: &mut dyn ModuleRules) {
    for include in manifest.list(keys::INCLUDES) {
        rules.add_public_include_path(include);
    }

    for library in manifest.list(keys::LIBRARIES) {
        rules.add_library(library);
    }

    for dir in manifest.list(keys::BINARY_DIRECTORIES) {
        rules.add_runtime_library_path(dir);
    }

    for dependency in manifest.list(keys::DEPENDENCIES) {
        rules.add_external_dependency(Path::new(dependency));
    }

    let source_path = Path::new(manifest.get(keys::SOURCE_PATH).unwrap_or(""));
    for dependency in manifest.list(keys::SOURCE_DEPENDENCIES) {
        rules.add_external_dependency(&source_path.join(dependency));
    }

    if let Some(value) = manifest.get(keys::CPP_STANDARD).filter(|v| !v.is_empty()) {
        let standard = CppStandard::from_manifest(value);
        rules.set_cpp_standard(standard);

        if ctx.platform.is_unix() && !ctx.use_system_compiler {
            rules.add_system_library(CPP_STDLIB);
        }
    }

    tracing::debug!(
        "projected {} manifest keys ({} lines skipped)",
        manifest.len(),
        manifest.skipped_lines()
    );
}
