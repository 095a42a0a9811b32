//! Failure taxonomy for one external build.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::core::context::Platform;

/// Why an external build did not produce usable output.
///
/// All of these are local to one target: the caller turns them into a
/// `false` return and a sentinel dependency, never a process-level failure.
#[derive(Debug, Error, Diagnostic)]
pub enum BuildError {
    #[error("platform `{0}` is not supported for external CMake builds")]
    #[diagnostic(
        code(cmake_target::unsupported_platform),
        help("only Windows, Linux and Mac targets can build CMake projects")
    )]
    UnsupportedPlatform(Platform),

    #[error("configure failed, exit code {code}")]
    #[diagnostic(
        code(cmake_target::configure_failed),
        help("check the CMake output above; the module is rebuilt on the next host build")
    )]
    ConfigureFailed { code: i32 },

    #[error("build failed, exit code {code}")]
    #[diagnostic(
        code(cmake_target::build_failed),
        help("check the compiler output above; the module is rebuilt on the next host build")
    )]
    BuildFailed { code: i32 },

    #[error("build info file not found: {}", path.display())]
    #[diagnostic(
        code(cmake_target::manifest_missing),
        help("the generated project must write buildinfo_<BuildType>.output during its build")
    )]
    ManifestMissing { path: PathBuf },

    #[error("failed to generate project files: {0:#}")]
    #[diagnostic(code(cmake_target::generate))]
    Generate(anyhow::Error),

    #[error("failed to run `{command}`: {reason:#}")]
    #[diagnostic(code(cmake_target::spawn), help("is CMake installed and on PATH?"))]
    Spawn {
        command: String,
        reason: anyhow::Error,
    },
}
