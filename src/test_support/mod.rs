//! Test utilities and mocks for unit tests.
//!
//! The orchestrator talks to the outside world through [`ProcessRunner`] and
//! [`FileTimes`]; the mocks here stand in for both so tests can script exit
//! codes and move modification times without real CMake or sleeping.
//!
//! # Example
//!
//! ```rust,ignore
//! let runner = MockRunner::new();
//! runner.expect_contains("--build", MockRun::success())
//!       .writes("buildinfo_Release.output", "includes=/a\n");
//!
//! let times = FakeFileTimes::new();
//! times.set(&descriptor, UNIX_EPOCH + Duration::from_secs(100));
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{bail, Result};

use crate::util::fs::{FileTimes, write_string};
use crate::util::process::ProcessRunner;

/// Pattern for matching command lines in [`MockRunner`].
#[derive(Debug, Clone)]
pub enum CommandPattern {
    /// Exact match on the full command line.
    Exact(String),
    /// Match if the command line starts with a prefix.
    StartsWith(String),
    /// Match if the command line contains a substring.
    Contains(String),
    /// Match any command line.
    Any,
}

impl CommandPattern {
    pub fn matches(&self, cmd: &str) -> bool {
        match self {
            CommandPattern::Exact(s) => cmd == s,
            CommandPattern::StartsWith(s) => cmd.starts_with(s),
            CommandPattern::Contains(s) => cmd.contains(s),
            CommandPattern::Any => true,
        }
    }
}

/// Scripted result of one run.
#[derive(Debug, Clone, Default)]
pub struct MockRun {
    /// Exit code to report.
    pub code: i32,
    /// Files to create before returning, as the real build would.
    pub writes: Vec<(PathBuf, String)>,
    /// Report a spawn failure instead of an exit code.
    pub spawn_error: bool,
}

impl MockRun {
    pub fn success() -> Self {
        MockRun::default()
    }

    pub fn exit(code: i32) -> Self {
        MockRun {
            code,
            ..MockRun::default()
        }
    }

    pub fn spawn_error() -> Self {
        MockRun {
            spawn_error: true,
            ..MockRun::default()
        }
    }

    /// Write `contents` to `path` when this run is matched.
    pub fn writes(mut self, path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        self.writes.push((path.into(), contents.into()));
        self
    }
}

#[derive(Debug, Clone)]
struct Expectation {
    pattern: CommandPattern,
    run: MockRun,
    times: Option<usize>,
    used: usize,
}

impl Expectation {
    fn available(&self) -> bool {
        match self.times {
            Some(n) => self.used < n,
            None => true,
        }
    }
}

/// Recorded call to [`MockRunner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub command: String,
    pub cwd: PathBuf,
}

/// Mock [`ProcessRunner`] that matches command lines against expectations
/// and records every call.
///
/// Interior mutability because the runner trait takes `&self`.
#[derive(Debug, Default)]
pub struct MockRunner {
    expectations: RefCell<Vec<Expectation>>,
    calls: RefCell<Vec<RecordedCall>>,
    default_run: RefCell<Option<MockRun>>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, pattern: CommandPattern, run: MockRun, times: Option<usize>) -> &Self {
        self.expectations.borrow_mut().push(Expectation {
            pattern,
            run,
            times,
            used: 0,
        });
        self
    }

    pub fn expect(&self, cmd: &str, run: MockRun) -> &Self {
        self.push(CommandPattern::Exact(cmd.to_string()), run, None)
    }

    pub fn expect_prefix(&self, prefix: &str, run: MockRun) -> &Self {
        self.push(CommandPattern::StartsWith(prefix.to_string()), run, None)
    }

    pub fn expect_contains(&self, substring: &str, run: MockRun) -> &Self {
        self.push(CommandPattern::Contains(substring.to_string()), run, None)
    }

    /// Like [`expect_contains`](Self::expect_contains) but usable `times` times.
    pub fn expect_contains_times(&self, substring: &str, run: MockRun, times: usize) -> &Self {
        self.push(CommandPattern::Contains(substring.to_string()), run, Some(times))
    }

    /// Result for commands that match nothing.
    pub fn set_default(&self, run: MockRun) -> &Self {
        *self.default_run.borrow_mut() = Some(run);
        self
    }

    /// All command lines run so far.
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|c| c.command.clone()).collect()
    }

    pub fn recorded(&self) -> Vec<RecordedCall> {
        self.calls.borrow().clone()
    }

    /// Number of calls whose command line contains `substring`.
    pub fn count_containing(&self, substring: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.command.contains(substring))
            .count()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    /// Check that every counted expectation was used exactly as often as declared.
    pub fn verify(&self) -> Result<()> {
        for (i, exp) in self.expectations.borrow().iter().enumerate() {
            if let Some(expected) = exp.times {
                if exp.used != expected {
                    bail!(
                        "expectation {} was used {} times, expected {}",
                        i,
                        exp.used,
                        expected
                    );
                }
            }
        }
        Ok(())
    }
}

impl ProcessRunner for MockRunner {
    fn run(&self, command: &str, cwd: &Path) -> Result<i32> {
        self.calls.borrow_mut().push(RecordedCall {
            command: command.to_string(),
            cwd: cwd.to_path_buf(),
        });

        let matched = {
            let mut expectations = self.expectations.borrow_mut();
            expectations
                .iter_mut()
                .find(|exp| exp.pattern.matches(command) && exp.available())
                .map(|exp| {
                    exp.used += 1;
                    exp.run.clone()
                })
        };

        let run = match matched.or_else(|| self.default_run.borrow().clone()) {
            Some(run) => run,
            None => bail!("unexpected command: {}", command),
        };

        if run.spawn_error {
            bail!("mock spawn failure: {}", command);
        }

        for (path, contents) in &run.writes {
            write_string(path, contents)?;
        }

        Ok(run.code)
    }
}

/// [`FileTimes`] with modification times set by the test.
#[derive(Debug, Default)]
pub struct FakeFileTimes {
    times: RefCell<HashMap<PathBuf, SystemTime>>,
}

impl FakeFileTimes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, path: impl Into<PathBuf>, time: SystemTime) {
        self.times.borrow_mut().insert(path.into(), time);
    }

    pub fn remove(&self, path: &Path) {
        self.times.borrow_mut().remove(path);
    }
}

impl FileTimes for FakeFileTimes {
    fn modified(&self, path: &Path) -> Option<SystemTime> {
        self.times.borrow().get(path).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};
    use tempfile::TempDir;

    #[test]
    fn test_mock_runner_matches_in_order() {
        let runner = MockRunner::new();
        runner
            .expect_contains_times("--build", MockRun::exit(1), 1)
            .expect_contains("--build", MockRun::success());

        assert_eq!(runner.run("cmake --build x", Path::new("/")).unwrap(), 1);
        assert_eq!(runner.run("cmake --build x", Path::new("/")).unwrap(), 0);
        assert_eq!(runner.count_containing("--build"), 2);
        runner.verify().unwrap();
    }

    #[test]
    fn test_mock_runner_unexpected_command() {
        let runner = MockRunner::new();
        assert!(runner.run("cmake -G", Path::new("/")).is_err());

        runner.set_default(MockRun::exit(3));
        assert_eq!(runner.run("cmake -G", Path::new("/")).unwrap(), 3);
    }

    #[test]
    fn test_mock_runner_writes_files() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("build/buildinfo_Debug.output");
        let runner = MockRunner::new();
        runner.expect_prefix("cmake", MockRun::success().writes(&out, "includes=/a\n"));

        runner.run("cmake --build build", tmp.path()).unwrap();
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "includes=/a\n");
        assert_eq!(runner.recorded()[0].cwd, tmp.path());
    }

    #[test]
    fn test_fake_file_times() {
        let times = FakeFileTimes::new();
        let path = Path::new("/p/CMakeLists.txt");
        assert!(times.modified(path).is_none());

        let t = UNIX_EPOCH + Duration::from_secs(5);
        times.set(path, t);
        assert_eq!(times.modified(path), Some(t));
    }
}
