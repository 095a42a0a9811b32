//! Configuration file support.
//!
//! Two configuration file locations are supported:
//! - Global: `~/.cmake-target/config.toml` - User-wide defaults
//! - Project: `.cmake-target/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::context::Platform;
use crate::util::process::find_cmake;

/// Environment variable naming an internal clang toolchain root.
pub const SDK_ROOT_ENV: &str = "CMAKE_TARGET_SDK_ROOT";

/// Default third-party root, relative to the module directory.
pub const DEFAULT_THIRD_PARTY_ROOT: &str = "../ThirdParty";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// External build tool settings
    pub cmake: CmakeConfig,

    /// Directory layout
    pub paths: PathsConfig,

    /// Toolchain synthesis settings
    pub toolchain: ToolchainSettings,
}

/// External build tool settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CmakeConfig {
    /// Path to the cmake executable
    pub program: Option<PathBuf>,
}

/// Directory layout settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Root holding `generated/`, relative to the module directory
    pub third_party_root: Option<PathBuf>,

    /// Directory with `CMakeLists.in` and `toolchains/*.in`
    pub templates_dir: Option<PathBuf>,
}

/// Toolchain synthesis settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainSettings {
    /// Let the external build find its own compiler
    pub use_system_compiler: Option<bool>,

    /// Internal clang toolchain root for Unix targets
    pub sdk_root: Option<PathBuf>,

    /// libc++ root providing `include` and `include/c++/v1`
    pub libcxx_root: Option<PathBuf>,

    /// Host Debug builds link the debug C runtime
    pub debug_crt: Option<bool>,

    /// Host compile flags forwarded to the external build
    #[serde(default)]
    pub extra_cxx_flags: Vec<String>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.cmake.program.is_some() {
            self.cmake.program = other.cmake.program;
        }

        if other.paths.third_party_root.is_some() {
            self.paths.third_party_root = other.paths.third_party_root;
        }
        if other.paths.templates_dir.is_some() {
            self.paths.templates_dir = other.paths.templates_dir;
        }

        if other.toolchain.use_system_compiler.is_some() {
            self.toolchain.use_system_compiler = other.toolchain.use_system_compiler;
        }
        if other.toolchain.sdk_root.is_some() {
            self.toolchain.sdk_root = other.toolchain.sdk_root;
        }
        if other.toolchain.libcxx_root.is_some() {
            self.toolchain.libcxx_root = other.toolchain.libcxx_root;
        }
        if other.toolchain.debug_crt.is_some() {
            self.toolchain.debug_crt = other.toolchain.debug_crt;
        }
        if !other.toolchain.extra_cxx_flags.is_empty() {
            self.toolchain.extra_cxx_flags = other.toolchain.extra_cxx_flags;
        }
    }

    /// The external build tool to invoke.
    ///
    /// Configured path, then `cmake` on PATH, then the bare tool name for the
    /// host so the shell gets a chance to resolve it.
    pub fn cmake_program(&self, host: Platform) -> PathBuf {
        if let Some(ref program) = self.cmake.program {
            return program.clone();
        }
        find_cmake().unwrap_or_else(|| {
            PathBuf::from(if host.is_windows() { "cmake.exe" } else { "cmake" })
        })
    }

    pub fn third_party_root(&self) -> PathBuf {
        self.paths
            .third_party_root
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_THIRD_PARTY_ROOT))
    }

    pub fn use_system_compiler(&self) -> bool {
        self.toolchain.use_system_compiler.unwrap_or(false)
    }

    pub fn debug_crt(&self) -> bool {
        self.toolchain.debug_crt.unwrap_or(false)
    }

    /// Configured SDK root, falling back to `CMAKE_TARGET_SDK_ROOT`.
    pub fn sdk_root(&self) -> Option<PathBuf> {
        self.toolchain.sdk_root.clone().or_else(|| {
            std::env::var_os(SDK_ROOT_ENV)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        })
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.cmake-target/config.toml)
/// 2. Global config (~/.cmake-target/config.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    if let Some(global) = global_path {
        if global.exists() {
            config.merge(Config::load_or_default(global));
        }
    }

    if project_path.exists() {
        config.merge(Config::load_or_default(project_path));
    }

    config
}

/// Get the global config directory (~/.cmake-target).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".cmake-target"))
}

/// Get the global config path (~/.cmake-target/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.cmake-target/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".cmake-target").join("config.toml")
}
