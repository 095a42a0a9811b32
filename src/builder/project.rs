//! Project and toolchain descriptor generation.
//!
//! Descriptors are produced by literal `@PLACEHOLDER@` substitution into
//! template text. Default templates are compiled in; a templates directory
//! can override any of them by providing a file with the same relative name.
//! Generation is unconditional: the orchestrator decides when to call it.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::builder::toolchain::{
    project_forces_release_runtime, toolchain_forces_release_runtime, GeneratorDescriptor,
};
use crate::core::context::{BuildContext, BuildType};
use crate::core::paths::{BuildPaths, BUILD_DIR_NAME};
use crate::core::target::BuildTarget;
use crate::util::fs::{read_to_string, to_cmake_path, write_string};

const DEFAULT_PROJECT: &str = include_str!("../../templates/CMakeLists.in");
const DEFAULT_WINDOWS_TOOLCHAIN: &str =
    include_str!("../../templates/toolchains/windows_toolchain.in");
const DEFAULT_UNIX_TOOLCHAIN: &str = include_str!("../../templates/toolchains/unix_toolchain.in");

/// Which template to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    Project,
    WindowsToolchain,
    UnixToolchain,
}

impl TemplateKind {
    /// Path relative to a templates directory.
    pub fn relative_path(&self) -> &'static str {
        match self {
            TemplateKind::Project => "CMakeLists.in",
            TemplateKind::WindowsToolchain => "toolchains/windows_toolchain.in",
            TemplateKind::UnixToolchain => "toolchains/unix_toolchain.in",
        }
    }

    fn embedded(&self) -> &'static str {
        match self {
            TemplateKind::Project => DEFAULT_PROJECT,
            TemplateKind::WindowsToolchain => DEFAULT_WINDOWS_TOOLCHAIN,
            TemplateKind::UnixToolchain => DEFAULT_UNIX_TOOLCHAIN,
        }
    }
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.relative_path())
    }
}

/// Template source: the compiled-in defaults, optionally overridden from disk.
#[derive(Debug, Clone, Default)]
pub struct Templates {
    dir: Option<PathBuf>,
}

impl Templates {
    pub fn new(dir: Option<PathBuf>) -> Self {
        Templates { dir }
    }

    pub fn embedded() -> Self {
        Templates::default()
    }

    /// Load the text for `kind`.
    pub fn load(&self, kind: TemplateKind) -> Result<String> {
        if let Some(ref dir) = self.dir {
            let path = dir.join(kind.relative_path());
            if path.is_file() {
                tracing::debug!("using template {}", path.display());
                return read_to_string(&path);
            }
        }
        Ok(kind.embedded().to_string())
    }
}

/// Ordered placeholder substitutions.
#[derive(Debug, Clone, Default)]
pub struct Substitutions {
    pairs: Vec<(String, String)>,
}

impl Substitutions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every `@name@` with `value`.
    pub fn set(mut self, name: &str, value: impl Into<String>) -> Self {
        self.pairs.push((format!("@{}@", name), value.into()));
        self
    }

    pub fn set_flag(self, name: &str, on: bool) -> Self {
        self.set(name, if on { "ON" } else { "OFF" })
    }

    pub fn apply(&self, template: &str) -> String {
        self.pairs
            .iter()
            .fold(template.to_string(), |text, (placeholder, value)| {
                text.replace(placeholder, value)
            })
    }
}

/// Substitute into `template` and write the project descriptor to `output`.
pub fn generate_project_descriptor(
    template: &str,
    output: &Path,
    substitutions: &Substitutions,
) -> Result<()> {
    write_string(output, &substitutions.apply(template))
        .with_context(|| format!("failed to generate {}", output.display()))
}

/// Substitute into `template`, append the contents of `included` if given,
/// and write the toolchain descriptor to `output`.
pub fn generate_toolchain_descriptor(
    template: &str,
    output: &Path,
    substitutions: &Substitutions,
    included: Option<&Path>,
) -> Result<()> {
    let mut contents = substitutions.apply(template);

    if let Some(included) = included {
        let extra = read_to_string(included)
            .with_context(|| format!("failed to include toolchain file {}", included.display()))?;
        if !contents.ends_with('\n') {
            contents.push('\n');
        }
        contents.push_str(&format!("\n# Included from {}\n", to_cmake_path(included)));
        contents.push_str(&extra);
    }

    write_string(output, &contents)
        .with_context(|| format!("failed to generate {}", output.display()))
}

/// Materializes both descriptors for one target.
#[derive(Debug, Clone, Default)]
pub struct ProjectGenerator {
    templates: Templates,
}

impl ProjectGenerator {
    pub fn new(templates: Templates) -> Self {
        ProjectGenerator { templates }
    }

    pub fn generate(
        &self,
        ctx: &BuildContext,
        target: &BuildTarget,
        paths: &BuildPaths,
        build_type: &BuildType,
        generator: &GeneratorDescriptor,
    ) -> Result<()> {
        let project = Substitutions::new()
            .set("BUILD_TARGET_NAME", target.name())
            .set("BUILD_TARGET_DIR", to_cmake_path(&paths.target_dir))
            .set("BUILD_TARGET_THIRDPARTY_DIR", to_cmake_path(&paths.generated_root))
            .set("BUILD_TARGET_BUILD_DIR", BUILD_DIR_NAME)
            .set_flag(
                "FORCE_RELEASE_RUNTIME",
                project_forces_release_runtime(ctx, build_type),
            );

        generate_project_descriptor(
            &self.templates.load(TemplateKind::Project)?,
            &paths.project_descriptor,
            &project,
        )?;

        let included = target
            .included_toolchain()
            .map(|p| paths.module_dir.join(p));

        let (kind, toolchain) = if ctx.platform.is_windows() {
            let subs = Substitutions::new().set_flag(
                "FORCE_RELEASE_RUNTIME",
                toolchain_forces_release_runtime(ctx, target.forced_build_type()),
            );
            (TemplateKind::WindowsToolchain, subs)
        } else {
            let use_compiler = !ctx.use_system_compiler && generator.has_compilers();
            let subs = Substitutions::new()
                .set("USE_COMPILER", if use_compiler { "1" } else { "0" })
                .set("COMPILER", to_cmake_path(Path::new(&generator.c_compiler)))
                .set("CPPCOMPILER", to_cmake_path(Path::new(&generator.cpp_compiler)))
                .set("LINKER", to_cmake_path(Path::new(&generator.linker)))
                .set_flag(
                    "FORCE_RELEASE_RUNTIME",
                    project_forces_release_runtime(ctx, build_type),
                );
            (TemplateKind::UnixToolchain, subs)
        };

        generate_toolchain_descriptor(
            &self.templates.load(kind)?,
            &paths.toolchain_file,
            &toolchain,
            included.as_deref(),
        )?;

        tracing::debug!(
            "generated {} and {}",
            paths.project_descriptor.display(),
            paths.toolchain_file.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::{Architecture, CompilerFamily, Configuration, Platform};
    use tempfile::TempDir;

    fn setup(tmp: &TempDir, args: &str) -> (BuildTarget, BuildPaths) {
        let target = BuildTarget::new("zlib", "zlib", args);
        let paths = BuildPaths::new(&target, &BuildType::Release, tmp.path(), Path::new("tp"));
        paths.ensure_dirs().unwrap();
        (target, paths)
    }

    #[test]
    fn test_substitution_is_literal() {
        let subs = Substitutions::new()
            .set("NAME", "zlib")
            .set_flag("FLAG", false);
        assert_eq!(subs.apply("@NAME@ @NAME@ @FLAG@ @OTHER@"), "zlib zlib OFF @OTHER@");
    }

    #[test]
    fn test_generate_project_descriptor() {
        let tmp = TempDir::new().unwrap();
        let (target, paths) = setup(&tmp, "");
        let ctx = BuildContext::host(Configuration::Development).with_platform(Platform::Linux);

        ProjectGenerator::default()
            .generate(&ctx, &target, &paths, &BuildType::Release, &GeneratorDescriptor::default())
            .unwrap();

        let project = std::fs::read_to_string(&paths.project_descriptor).unwrap();
        assert!(project.contains("set(BUILD_TARGET_NAME \"zlib\")"));
        assert!(project.contains(&format!(
            "set(BUILD_TARGET_DIR \"{}\")",
            to_cmake_path(&paths.target_dir)
        )));
        assert!(project.contains("set(BUILD_TARGET_BUILD_DIR \"build\")"));
        assert!(project.contains("set(FORCE_RELEASE_RUNTIME OFF)"));
        assert!(!project.contains("@BUILD_TARGET"));

        let toolchain = std::fs::read_to_string(&paths.toolchain_file).unwrap();
        assert!(toolchain.contains("set(USE_COMPILER 0)"));
    }

    #[test]
    fn test_unix_toolchain_with_compilers() {
        let tmp = TempDir::new().unwrap();
        let (target, paths) = setup(&tmp, "");
        let ctx = BuildContext::host(Configuration::Development).with_platform(Platform::Linux);
        let generator = GeneratorDescriptor {
            name: "Unix Makefiles".to_string(),
            c_compiler: "/sdk/bin/clang".to_string(),
            cpp_compiler: "/sdk/bin/clang++".to_string(),
            linker: "/sdk/bin/lld".to_string(),
            ..GeneratorDescriptor::default()
        };

        let generator_impl = ProjectGenerator::default();
        generator_impl
            .generate(&ctx, &target, &paths, &BuildType::Release, &generator)
            .unwrap();
        let toolchain = std::fs::read_to_string(&paths.toolchain_file).unwrap();
        assert!(toolchain.contains("set(USE_COMPILER 1)"));
        assert!(toolchain.contains("set(CMAKE_CXX_COMPILER \"/sdk/bin/clang++\")"));

        let ctx = ctx.with_system_compiler(true);
        generator_impl
            .generate(&ctx, &target, &paths, &BuildType::Release, &generator)
            .unwrap();
        let toolchain = std::fs::read_to_string(&paths.toolchain_file).unwrap();
        assert!(toolchain.contains("set(USE_COMPILER 0)"));
    }

    #[test]
    fn test_included_toolchain_is_appended() {
        let tmp = TempDir::new().unwrap();
        let user_tc = tmp.path().join("tc.cmake");
        std::fs::write(&user_tc, "set(MY_VAR 42)\n").unwrap();

        let args = format!(
            "-DCMAKE_BUILD_TYPE=Release -DCMAKE_TOOLCHAIN_FILE={}",
            user_tc.display()
        );
        let (target, paths) = setup(&tmp, &args);
        let ctx = BuildContext::host(Configuration::Debug).with_platform(Platform::Linux);

        ProjectGenerator::default()
            .generate(&ctx, &target, &paths, &BuildType::Release, &GeneratorDescriptor::default())
            .unwrap();

        let toolchain = std::fs::read_to_string(&paths.toolchain_file).unwrap();
        let defaults = toolchain.find("CMAKE_POSITION_INDEPENDENT_CODE").unwrap();
        let appended = toolchain.find("set(MY_VAR 42)").unwrap();
        assert!(appended > defaults);
        assert!(toolchain.ends_with("set(MY_VAR 42)\n"));
    }

    #[test]
    fn test_missing_included_toolchain_fails() {
        let tmp = TempDir::new().unwrap();
        let (target, paths) = setup(&tmp, "-DCMAKE_TOOLCHAIN_FILE=missing.cmake");
        let ctx = BuildContext::host(Configuration::Debug).with_platform(Platform::Linux);

        let result = ProjectGenerator::default().generate(
            &ctx,
            &target,
            &paths,
            &BuildType::Debug,
            &GeneratorDescriptor::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_windows_runtime_flags() {
        let tmp = TempDir::new().unwrap();
        let (target, paths) = setup(&tmp, "");
        let ctx = BuildContext::host(Configuration::DebugGame)
            .with_platform(Platform::Windows)
            .with_compiler(CompilerFamily::VisualStudio2022)
            .with_architecture(Architecture::X64);

        ProjectGenerator::default()
            .generate(&ctx, &target, &paths, &BuildType::Debug, &GeneratorDescriptor::default())
            .unwrap();

        let project = std::fs::read_to_string(&paths.project_descriptor).unwrap();
        assert!(project.contains("set(FORCE_RELEASE_RUNTIME ON)"));
        let toolchain = std::fs::read_to_string(&paths.toolchain_file).unwrap();
        assert!(toolchain.contains("set(FORCE_RELEASE_RUNTIME ON)"));
        assert!(!toolchain.contains("USE_COMPILER"));
    }

    #[test]
    fn test_template_dir_overrides_one_file() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("templates");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("CMakeLists.in"), "project(@BUILD_TARGET_NAME@)\n").unwrap();

        let templates = Templates::new(Some(dir));
        assert_eq!(
            templates.load(TemplateKind::Project).unwrap(),
            "project(@BUILD_TARGET_NAME@)\n"
        );
        assert!(templates
            .load(TemplateKind::UnixToolchain)
            .unwrap()
            .contains("@USE_COMPILER@"));
    }
}
