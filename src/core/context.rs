//! Host build context - platform, configuration, and compiler selection.
//!
//! A [`BuildContext`] is derived from the host build invocation every time a
//! module is evaluated and passed explicitly into every component. Nothing in
//! this crate reads the host configuration from ambient state.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Platform a module is being built for (or the machine doing the building).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Windows,
    Linux,
    Mac,
    Android,
    Ios,
}

impl Platform {
    /// Detect the platform of the running process.
    pub fn host() -> Self {
        match std::env::consts::OS {
            "windows" => Platform::Windows,
            "macos" => Platform::Mac,
            "android" => Platform::Android,
            "ios" => Platform::Ios,
            _ => Platform::Linux,
        }
    }

    /// Linux and Mac share the Unix toolchain path.
    pub fn is_unix(&self) -> bool {
        matches!(self, Platform::Linux | Platform::Mac)
    }

    pub fn is_windows(&self) -> bool {
        matches!(self, Platform::Windows)
    }

    /// Whether an external CMake build can be orchestrated for this platform.
    pub fn is_supported(&self) -> bool {
        self.is_windows() || self.is_unix()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Windows => "windows",
            Platform::Linux => "linux",
            Platform::Mac => "mac",
            Platform::Android => "android",
            Platform::Ios => "ios",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "windows" | "win64" | "win" => Ok(Platform::Windows),
            "linux" => Ok(Platform::Linux),
            "mac" | "macos" | "darwin" => Ok(Platform::Mac),
            "android" => Ok(Platform::Android),
            "ios" => Ok(Platform::Ios),
            _ => Err(format!(
                "invalid platform '{}'; expected windows, linux, mac, android or ios",
                s
            )),
        }
    }
}

/// Host build configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Configuration {
    Debug,
    DebugGame,
    #[default]
    Development,
    Shipping,
    Test,
}

impl Configuration {
    /// Map the host configuration onto the two-valued external build type.
    pub fn build_type(&self) -> BuildType {
        match self {
            Configuration::Debug | Configuration::DebugGame => BuildType::Debug,
            Configuration::Development | Configuration::Shipping | Configuration::Test => {
                BuildType::Release
            }
        }
    }
}

impl FromStr for Configuration {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "debug" => Ok(Configuration::Debug),
            "debuggame" | "debug-game" => Ok(Configuration::DebugGame),
            "development" | "dev" => Ok(Configuration::Development),
            "shipping" => Ok(Configuration::Shipping),
            "test" => Ok(Configuration::Test),
            _ => Err(format!(
                "invalid configuration '{}'; expected debug, debuggame, development, shipping or test",
                s
            )),
        }
    }
}

/// Build type handed to the external build system.
///
/// The host only ever produces `Debug` or `Release`; `Custom` carries a forced
/// override such as `RelWithDebInfo` verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildType {
    Debug,
    Release,
    Custom(String),
}

impl BuildType {
    /// Parse a forced build type from the extra-args grammar.
    pub fn from_forced(value: &str) -> Self {
        match value {
            "Debug" => BuildType::Debug,
            "Release" => BuildType::Release,
            other => BuildType::Custom(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            BuildType::Debug => "Debug",
            BuildType::Release => "Release",
            BuildType::Custom(s) => s,
        }
    }

    pub fn is_debug(&self) -> bool {
        matches!(self, BuildType::Debug)
    }

    pub fn is_release(&self) -> bool {
        matches!(self, BuildType::Release)
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target CPU architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    X64,
    Arm64,
    X86,
    Arm32,
}

impl Architecture {
    pub fn host() -> Self {
        match std::env::consts::ARCH {
            "aarch64" => Architecture::Arm64,
            "x86" => Architecture::X86,
            "arm" => Architecture::Arm32,
            _ => Architecture::X64,
        }
    }

    /// LLVM triple used when driving an internal clang toolchain.
    pub fn clang_triple(&self, platform: Platform) -> &'static str {
        match (platform, self) {
            (Platform::Mac, Architecture::Arm64) => "arm64-apple-macos",
            (Platform::Mac, _) => "x86_64-apple-macos",
            (_, Architecture::Arm64) => "aarch64-unknown-linux-gnueabi",
            (_, Architecture::X86) => "i686-unknown-linux-gnu",
            (_, Architecture::Arm32) => "arm-unknown-linux-gnueabihf",
            (_, Architecture::X64) => "x86_64-unknown-linux-gnu",
        }
    }
}

impl FromStr for Architecture {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "x64" | "x86_64" | "amd64" => Ok(Architecture::X64),
            "arm64" | "aarch64" => Ok(Architecture::Arm64),
            "x86" | "win32" | "i686" => Ok(Architecture::X86),
            "arm32" | "arm" => Ok(Architecture::Arm32),
            _ => Err(format!(
                "invalid architecture '{}'; expected x64, arm64, x86 or arm32",
                s
            )),
        }
    }
}

/// Compiler family selected by the host for Windows targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompilerFamily {
    /// Let the external build system pick its own generator.
    #[default]
    Default,
    Clang,
    Intel,
    VisualStudio2017,
    VisualStudio2019,
    VisualStudio2022,
}

impl CompilerFamily {
    /// Visual Studio generators accept `-A <arch>`.
    pub fn is_visual_studio(&self) -> bool {
        matches!(
            self,
            CompilerFamily::VisualStudio2017
                | CompilerFamily::VisualStudio2019
                | CompilerFamily::VisualStudio2022
        )
    }
}

impl FromStr for CompilerFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "default" => Ok(CompilerFamily::Default),
            "clang" => Ok(CompilerFamily::Clang),
            "intel" => Ok(CompilerFamily::Intel),
            "vs2017" | "visualstudio2017" => Ok(CompilerFamily::VisualStudio2017),
            "vs2019" | "visualstudio2019" => Ok(CompilerFamily::VisualStudio2019),
            "vs2022" | "visualstudio2022" => Ok(CompilerFamily::VisualStudio2022),
            _ => Err(format!(
                "invalid compiler '{}'; expected default, clang, intel, vs2017, vs2019 or vs2022",
                s
            )),
        }
    }
}

/// Everything the orchestrator needs to know about the host invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildContext {
    /// Platform the module is built for
    pub platform: Platform,
    /// Platform of the machine running the build
    pub host_platform: Platform,
    /// Active host configuration
    pub configuration: Configuration,
    /// Target architecture
    pub architecture: Architecture,
    /// Compiler family (Windows targets)
    pub compiler: CompilerFamily,
    /// Let the external build find its own compiler
    pub use_system_compiler: bool,
    /// Host Debug builds link the debug C runtime
    pub debug_crt: bool,
}

impl BuildContext {
    /// Context for the machine we are running on.
    pub fn host(configuration: Configuration) -> Self {
        let platform = Platform::host();
        BuildContext {
            platform,
            host_platform: platform,
            configuration,
            architecture: Architecture::host(),
            compiler: CompilerFamily::Default,
            use_system_compiler: false,
            debug_crt: false,
        }
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn with_architecture(mut self, architecture: Architecture) -> Self {
        self.architecture = architecture;
        self
    }

    pub fn with_compiler(mut self, compiler: CompilerFamily) -> Self {
        self.compiler = compiler;
        self
    }

    pub fn with_system_compiler(mut self, use_system_compiler: bool) -> Self {
        self.use_system_compiler = use_system_compiler;
        self
    }

    pub fn with_debug_crt(mut self, debug_crt: bool) -> Self {
        self.debug_crt = debug_crt;
        self
    }

    /// Host Debug configuration that actually links the debug CRT.
    pub fn uses_debug_crt(&self) -> bool {
        self.configuration == Configuration::Debug && self.debug_crt
    }
}
