//! Build info manifest and built marker.
//!
//! The generated CMake project writes `buildinfo_<BuildType>.output` during its
//! build: one `key=value` pair per line, list values comma-joined. There is no
//! escaping, so a comma inside a path splits it and a line with more than one
//! `=` is dropped. Both are kept for compatibility with existing projects.
//!
//! The built marker records the modification time of the wrapped project's
//! `CMakeLists.txt` as of the last successful configure.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::SystemTime;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};

use crate::util::fs::{read_to_string, write_string};

/// Manifest keys understood by the projector.
pub mod keys {
    pub const INCLUDES: &str = "includes";
    pub const LIBRARIES: &str = "libraries";
    pub const BINARY_DIRECTORIES: &str = "binaryDirectories";
    pub const DEPENDENCIES: &str = "dependencies";
    pub const SOURCE_DEPENDENCIES: &str = "sourceDependencies";
    pub const SOURCE_PATH: &str = "sourcePath";
    pub const CPP_STANDARD: &str = "cppStandard";
}

/// Parsed build info manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    values: BTreeMap<String, String>,
    skipped_lines: usize,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse manifest text. Lines that do not split into exactly one key and
    /// one value are skipped; a repeated key keeps its last value.
    pub fn parse(contents: &str) -> Self {
        let mut manifest = Manifest::new();

        for (index, raw) in contents.lines().enumerate() {
            let line = raw.trim_end_matches('\r');
            let mut tokens = line.split('=');
            match (tokens.next(), tokens.next(), tokens.next()) {
                (Some(key), Some(value), None) => {
                    manifest.values.insert(key.to_string(), value.to_string());
                }
                _ => {
                    if !line.trim().is_empty() {
                        tracing::debug!("skipping malformed build info line {}: {}", index + 1, line);
                    }
                    manifest.skipped_lines += 1;
                }
            }
        }

        manifest
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Comma-separated tokens of `key`, in order, empty tokens dropped.
    pub fn list(&self, key: &str) -> Vec<&str> {
        self.get(key)
            .map(|v| v.split(',').filter(|t| !t.is_empty()).collect())
            .unwrap_or_default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Set a list-valued key from its tokens.
    pub fn set_list<I, S>(&mut self, key: impl Into<String>, tokens: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = tokens
            .into_iter()
            .map(|t| t.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(",");
        self.set(key, joined);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of lines ignored while parsing.
    pub fn skipped_lines(&self) -> usize {
        self.skipped_lines
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn render(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.values {
            out.push_str(key);
            out.push('=');
            out.push_str(value);
            out.push('\n');
        }
        out
    }
}

/// Read a manifest. `Ok(None)` means the file does not exist.
pub fn read_manifest(path: &Path) -> Result<Option<Manifest>> {
    if !path.is_file() {
        return Ok(None);
    }
    let contents = read_to_string(path)?;
    Ok(Some(Manifest::parse(&contents)))
}

/// Write a manifest in the same format the generated project emits.
pub fn write_manifest(path: &Path, manifest: &Manifest) -> Result<()> {
    write_string(path, &manifest.render())
}

/// Timestamp stored in a built marker, truncated to whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct BuiltTimestamp(DateTime<Utc>);

impl BuiltTimestamp {
    pub fn from_system_time(time: SystemTime) -> Self {
        let dt: DateTime<Utc> = time.into();
        let secs = dt.timestamp();
        BuiltTimestamp(DateTime::from_timestamp(secs, 0).unwrap_or(dt))
    }

    /// Canonical string form (RFC 3339, whole seconds, UTC).
    pub fn to_canonical(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    pub fn parse(s: &str) -> Result<Self> {
        let dt = DateTime::parse_from_rfc3339(s.trim())
            .with_context(|| format!("invalid built timestamp: {}", s.trim()))?;
        Ok(BuiltTimestamp::from_system_time(dt.with_timezone(&Utc).into()))
    }

    /// Equal to whole-second granularity.
    pub fn matches(&self, time: SystemTime) -> bool {
        *self == BuiltTimestamp::from_system_time(time)
    }
}

impl std::fmt::Display for BuiltTimestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_canonical())
    }
}

/// Read a built marker. `Ok(None)` means no marker exists yet.
pub fn read_built_marker(path: &Path) -> Result<Option<BuiltTimestamp>> {
    if !path.is_file() {
        return Ok(None);
    }
    let contents = read_to_string(path)?;
    BuiltTimestamp::parse(&contents).map(Some)
}

/// Overwrite a built marker with `timestamp`.
pub fn write_built_marker(path: &Path, timestamp: BuiltTimestamp) -> Result<()> {
    write_string(path, &timestamp.to_canonical())
}
