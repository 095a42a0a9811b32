//! CMake command lines for the configure and build steps.

use std::path::{Path, PathBuf};

use crate::builder::toolchain::GeneratorDescriptor;
use crate::core::context::{BuildType, Platform};
use crate::core::paths::BuildPaths;
use crate::util::fs::to_cmake_path;

/// Builds the two CMake invocations for one target.
#[derive(Debug, Clone)]
pub struct CmakeInvocation<'a> {
    program: PathBuf,
    host: Platform,
    paths: &'a BuildPaths,
    build_type: &'a BuildType,
}

impl<'a> CmakeInvocation<'a> {
    pub fn new(
        program: impl Into<PathBuf>,
        host: Platform,
        paths: &'a BuildPaths,
        build_type: &'a BuildType,
    ) -> Self {
        CmakeInvocation {
            program: program.into(),
            host,
            paths,
            build_type,
        }
    }

    /// Full configure command line.
    ///
    /// Explicit compiler defines are only emitted when the generator resolved
    /// compiler paths and the caller does not want the system compiler.
    pub fn configure_line(
        &self,
        generator: &GeneratorDescriptor,
        use_system_compiler: bool,
        extra_args: &str,
    ) -> String {
        let mut parts = vec![quote_program(&self.program)];

        if !generator.name.is_empty() {
            parts.push(format!("-G \"{}\"", generator.name));
        }
        if !generator.options.is_empty() {
            parts.push(generator.options.clone());
        }

        parts.push(format!("-S \"{}\"", to_cmake_path(&self.paths.project_root)));
        parts.push(format!("-B \"{}\"", to_cmake_path(&self.paths.build_dir)));
        parts.push(format!("-DCMAKE_BUILD_TYPE={}", self.build_type));
        parts.push(format!(
            "-DCMAKE_INSTALL_PREFIX=\"{}\"",
            to_cmake_path(&self.paths.generated_root)
        ));
        parts.push(format!(
            "-DCMAKE_TOOLCHAIN_FILE=\"{}\"",
            to_cmake_path(&self.paths.toolchain_file)
        ));

        if self.host.is_windows() {
            parts.push("-T host=x64".to_string());
        }

        if !use_system_compiler && generator.has_compilers() {
            parts.push(format!(
                "-DCMAKE_C_COMPILER=\"{}\"",
                to_cmake_path(Path::new(&generator.c_compiler))
            ));
            parts.push(format!(
                "-DCMAKE_CXX_COMPILER=\"{}\"",
                to_cmake_path(Path::new(&generator.cpp_compiler))
            ));
        }

        let extra_args = extra_args.trim();
        if !extra_args.is_empty() {
            parts.push(extra_args.to_string());
        }

        parts.join(" ")
    }

    /// `cmake --build "<build_dir>" --config <type>`.
    pub fn build_line(&self) -> String {
        format!(
            "{} --build \"{}\" --config {}",
            quote_program(&self.program),
            to_cmake_path(&self.paths.build_dir),
            self.build_type
        )
    }
}

fn quote_program(program: &Path) -> String {
    let text = program.display().to_string();
    if text.contains(char::is_whitespace) {
        format!("\"{}\"", text)
    } else {
        text
    }
}
