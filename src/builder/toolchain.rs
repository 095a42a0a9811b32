//! Toolchain synthesis.
//!
//! Derives the CMake generator, architecture switch and compiler paths that
//! match the host's own compiler selection, so the external build produces
//! artifacts the host can link.
//!
//! Synthesis never fails: when no internal toolchain can be resolved the
//! compiler paths stay empty and CMake picks whatever compiler it finds.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::context::{Architecture, BuildContext, BuildType, CompilerFamily, Platform};
use crate::util::config::Config;

/// Generator and compiler selection for one configure run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GeneratorDescriptor {
    /// CMake generator name (`-G`); empty lets CMake choose
    pub name: String,
    /// Generator options (e.g., `-A x64`, `-DCMAKE_CXX_FLAGS=...`)
    pub options: String,
    /// C compiler; empty means the external build finds its own
    pub c_compiler: String,
    /// C++ compiler
    pub cpp_compiler: String,
    /// Linker
    pub linker: String,
}

impl GeneratorDescriptor {
    /// Whether explicit compiler paths were resolved.
    pub fn has_compilers(&self) -> bool {
        !self.c_compiler.is_empty()
    }
}

/// Locates the host's internal toolchain root for a platform.
pub trait SdkLocator {
    fn internal_sdk_path(&self, platform: Platform) -> Option<PathBuf>;
}

/// [`SdkLocator`] returning a fixed, pre-resolved root.
#[derive(Debug, Clone, Default)]
pub struct StaticSdk {
    root: Option<PathBuf>,
}

impl StaticSdk {
    pub fn new(root: Option<PathBuf>) -> Self {
        StaticSdk { root }
    }

    /// SDK root from the configuration (or `CMAKE_TARGET_SDK_ROOT`).
    pub fn from_config(config: &Config) -> Self {
        StaticSdk::new(config.sdk_root())
    }
}

impl SdkLocator for StaticSdk {
    fn internal_sdk_path(&self, platform: Platform) -> Option<PathBuf> {
        if !platform.is_unix() {
            return None;
        }
        self.root.clone().filter(|p| !p.as_os_str().is_empty())
    }
}

/// Optional enrichment: compile flags the host itself uses.
///
/// Hosts without a stable way to expose their flags return `None`; synthesis
/// carries on without them.
pub trait HostFlagProvider {
    fn try_extract_host_compile_flags(&self, ctx: &BuildContext) -> Option<Vec<String>>;
}

/// Host that exposes no compile flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHostFlags;

impl HostFlagProvider for NoHostFlags {
    fn try_extract_host_compile_flags(&self, _ctx: &BuildContext) -> Option<Vec<String>> {
        None
    }
}

/// Host flags listed in configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfiguredHostFlags {
    flags: Vec<String>,
}

impl ConfiguredHostFlags {
    pub fn new(flags: Vec<String>) -> Self {
        ConfiguredHostFlags { flags }
    }

    pub fn from_config(config: &Config) -> Self {
        ConfiguredHostFlags::new(config.toolchain.extra_cxx_flags.clone())
    }
}

impl HostFlagProvider for ConfiguredHostFlags {
    fn try_extract_host_compile_flags(&self, _ctx: &BuildContext) -> Option<Vec<String>> {
        if self.flags.is_empty() {
            None
        } else {
            Some(self.flags.clone())
        }
    }
}

/// Builds [`GeneratorDescriptor`]s from a [`BuildContext`].
pub struct ToolchainSynthesizer<'a> {
    sdk: &'a dyn SdkLocator,
    host_flags: &'a dyn HostFlagProvider,
    libcxx_root: Option<PathBuf>,
}

impl<'a> ToolchainSynthesizer<'a> {
    pub fn new(sdk: &'a dyn SdkLocator, host_flags: &'a dyn HostFlagProvider) -> Self {
        ToolchainSynthesizer {
            sdk,
            host_flags,
            libcxx_root: None,
        }
    }

    /// Use libc++ headers from `root` instead of the compiler's own.
    pub fn libcxx_root(mut self, root: Option<PathBuf>) -> Self {
        self.libcxx_root = root;
        self
    }

    pub fn synthesize(&self, ctx: &BuildContext) -> GeneratorDescriptor {
        if ctx.platform.is_windows() {
            return GeneratorDescriptor {
                name: windows_generator_name(ctx.compiler).to_string(),
                options: windows_generator_options(ctx.compiler, ctx.architecture).to_string(),
                ..GeneratorDescriptor::default()
            };
        }

        if !ctx.platform.is_unix() {
            return GeneratorDescriptor::default();
        }

        let mut desc = GeneratorDescriptor {
            name: "Unix Makefiles".to_string(),
            ..GeneratorDescriptor::default()
        };

        match self.sdk.internal_sdk_path(ctx.platform) {
            Some(sdk) => {
                let bin = sdk.join("bin");
                desc.c_compiler = bin.join("clang").display().to_string();
                desc.cpp_compiler = bin.join("clang++").display().to_string();
                desc.linker = bin.join("lld").display().to_string();
                desc.options = self.clang_generator_options(ctx, &sdk);
            }
            None => {
                tracing::debug!(
                    "no internal toolchain for {}, using the system compiler",
                    ctx.platform
                );
            }
        }

        desc
    }

    /// `-DCMAKE_CXX_FLAGS` for an internal clang toolchain.
    fn clang_generator_options(&self, ctx: &BuildContext, sdk: &Path) -> String {
        let mut flags: Vec<String> = CLANG_WARNING_FLAGS.iter().map(|f| f.to_string()).collect();
        flags.extend(CLANG_CODEGEN_FLAGS.iter().map(|f| f.to_string()));

        if ctx.architecture == Architecture::X64 {
            flags.push("-mssse3".to_string());
        }

        if let Some(ref libcxx) = self.libcxx_root {
            flags.push("-nostdinc++".to_string());
            flags.push(format!("-isystem\"{}\"", libcxx.join("include").display()));
            flags.push(format!(
                "-isystem\"{}\"",
                libcxx.join("include").join("c++").join("v1").display()
            ));
        }

        flags.push(format!("-target {}", ctx.architecture.clang_triple(ctx.platform)));
        flags.push(format!("--sysroot=\\\"{}\\\"", sdk.display()));
        flags.push("-std=c++17".to_string());

        if let Some(host) = self.host_flags.try_extract_host_compile_flags(ctx) {
            flags.extend(host);
        }

        let options = format!("-DCMAKE_CXX_FLAGS=\"{}\"", flags.join(" "));
        tracing::debug!("Clang generator options: {}", options);
        options
    }
}

const CLANG_WARNING_FLAGS: &[&str] = &[
    "-Wall",
    "-Wdelete-non-virtual-dtor",
    "-Wenum-conversion",
    "-Wno-enum-enum-conversion",
    "-Wno-unused-but-set-variable",
    "-Wno-inconsistent-missing-override",
    "-Wno-invalid-offsetof",
    "-Wno-switch",
    "-Wno-tautological-compare",
    "-Wno-unknown-pragmas",
    "-Wno-unused-function",
    "-Wno-unused-private-field",
    "-Wno-unused-variable",
    "-Wshadow",
];

const CLANG_CODEGEN_FLAGS: &[&str] = &[
    "-O3",
    "-fexceptions",
    "-DPLATFORM_EXCEPTIONS_DISABLED=0",
    "-fno-math-errno",
    "-fPIC",
    "-ftls-model=local-dynamic",
    "-fvisibility-inlines-hidden",
    "-fdiagnostics-absolute-paths",
];

/// CMake generator for a Windows compiler family.
pub fn windows_generator_name(compiler: CompilerFamily) -> &'static str {
    match compiler {
        CompilerFamily::Default => "",
        CompilerFamily::Clang | CompilerFamily::Intel => "NMake Makefiles",
        CompilerFamily::VisualStudio2017 => "Visual Studio 15 2017",
        CompilerFamily::VisualStudio2019 => "Visual Studio 16 2019",
        CompilerFamily::VisualStudio2022 => "Visual Studio 17 2022",
    }
}

/// Architecture switch; only Visual Studio generators take one.
pub fn windows_generator_options(compiler: CompilerFamily, arch: Architecture) -> &'static str {
    if !compiler.is_visual_studio() {
        return "";
    }

    match (compiler, arch) {
        (_, Architecture::X64) => "-A x64",
        (_, Architecture::Arm64) => "-A ARM64",
        (CompilerFamily::VisualStudio2017, Architecture::X86) => "-A Win32",
        (CompilerFamily::VisualStudio2017, Architecture::Arm32) => "-A ARM",
        _ => "",
    }
}

/// `@FORCE_RELEASE_RUNTIME@` for the generated project descriptor.
///
/// Only Windows Debug builds are switched to the release CRT, and not when
/// the host itself is a Debug build on the debug CRT.
pub fn project_forces_release_runtime(ctx: &BuildContext, build_type: &BuildType) -> bool {
    ctx.platform.is_windows() && build_type.is_debug() && !ctx.uses_debug_crt()
}

/// `@FORCE_RELEASE_RUNTIME@` for the Windows toolchain descriptor.
pub fn toolchain_forces_release_runtime(ctx: &BuildContext, forced: Option<&BuildType>) -> bool {
    match forced {
        Some(build_type) => build_type.is_release(),
        None => !ctx.uses_debug_crt(),
    }
}
