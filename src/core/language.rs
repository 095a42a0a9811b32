//! C++ language standard reported by an external build.

use serde::{Deserialize, Serialize};

/// C++ standard a host module is compiled with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CppStandard {
    /// C++11
    #[serde(rename = "11")]
    Cpp11,
    /// C++14
    #[serde(rename = "14")]
    Cpp14,
    /// C++17
    #[serde(rename = "17")]
    Cpp17,
    /// C++20
    #[serde(rename = "20")]
    Cpp20,
    /// Newest standard the host compiler supports
    #[serde(rename = "latest")]
    Latest,
}

impl CppStandard {
    /// Map a manifest `cppStandard` value. Anything unrecognized falls back to
    /// [`CppStandard::Latest`] so newer standards still compile.
    pub fn from_manifest(value: &str) -> Self {
        match value.trim() {
            "11" => CppStandard::Cpp11,
            "14" => CppStandard::Cpp14,
            "17" => CppStandard::Cpp17,
            "20" => CppStandard::Cpp20,
            _ => CppStandard::Latest,
        }
    }

    /// Get the standard as a compiler flag value (e.g., "c++17").
    pub fn as_flag_value(&self) -> &'static str {
        match self {
            CppStandard::Cpp11 => "c++11",
            CppStandard::Cpp14 => "c++14",
            CppStandard::Cpp17 => "c++17",
            CppStandard::Cpp20 => "c++20",
            CppStandard::Latest => "c++latest",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CppStandard::Cpp11 => "11",
            CppStandard::Cpp14 => "14",
            CppStandard::Cpp17 => "17",
            CppStandard::Cpp20 => "20",
            CppStandard::Latest => "latest",
        }
    }
}

impl std::fmt::Display for CppStandard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CppStandard::Latest => write!(f, "C++latest"),
            other => write!(f, "C++{}", other.as_str()),
        }
    }
}
