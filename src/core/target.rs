//! External build targets.
//!
//! A [`BuildTarget`] names a CMake project living somewhere under a host
//! module, plus the opaque argument string forwarded to its configure step.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::core::context::BuildType;

static BUILD_TYPE_ARG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-DCMAKE_BUILD_TYPE=(\w+)").expect("valid regex"));

static TOOLCHAIN_FILE_ARG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"-DCMAKE_TOOLCHAIN_FILE="?([^\s"]+)"?"#).expect("valid regex")
});

/// A subordinate CMake project requested by a host module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildTarget {
    /// Target name, used for the generated directory
    name: String,
    /// Location of the CMake project, relative to the module directory
    location: PathBuf,
    /// Extra configure arguments with any toolchain file stripped
    extra_args: String,
    /// Build type pinned through `-DCMAKE_BUILD_TYPE=`
    forced_build_type: Option<BuildType>,
    /// User toolchain file to append to the generated one
    included_toolchain: Option<PathBuf>,
}

impl BuildTarget {
    /// Create a target, scanning `args` for a forced build type and an
    /// included toolchain file.
    pub fn new(name: impl Into<String>, location: impl Into<PathBuf>, args: &str) -> Self {
        let forced_build_type = BUILD_TYPE_ARG
            .captures(args)
            .and_then(|caps| caps.get(1))
            .map(|m| BuildType::from_forced(m.as_str()));

        let included_toolchain = TOOLCHAIN_FILE_ARG
            .captures(args)
            .and_then(|caps| caps.get(1))
            .map(|m| PathBuf::from(m.as_str()));

        // The toolchain file is concatenated into the generated toolchain, so
        // it must not reach the configure line a second time.
        let extra_args = if included_toolchain.is_some() {
            normalize_whitespace(&TOOLCHAIN_FILE_ARG.replace_all(args, ""))
        } else {
            args.trim().to_string()
        };

        BuildTarget {
            name: name.into(),
            location: location.into(),
            extra_args,
            forced_build_type,
            included_toolchain,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn extra_args(&self) -> &str {
        &self.extra_args
    }

    pub fn forced_build_type(&self) -> Option<&BuildType> {
        self.forced_build_type.as_ref()
    }

    pub fn included_toolchain(&self) -> Option<&Path> {
        self.included_toolchain.as_deref()
    }

    /// The build type for this target: the forced override if any,
    /// otherwise the one derived from the host configuration.
    pub fn build_type(&self, host: BuildType) -> BuildType {
        self.forced_build_type.clone().unwrap_or(host)
    }
}

fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
