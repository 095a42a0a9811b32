//! Subprocess execution utilities.

use std::ffi::OsStr;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::sync::mpsc;
use std::thread;

use anyhow::{Context, Result};

use crate::core::context::Platform;

/// Builder for subprocess execution.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<String>,
    cwd: Option<PathBuf>,
}

impl ProcessBuilder {
    /// Create a new process builder for the given program.
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            cwd: None,
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(
            args.into_iter()
                .map(|s| s.as_ref().to_string_lossy().into_owned()),
        );
        self
    }

    /// Set the working directory.
    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);

        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }

        cmd
    }

    /// Execute the command and wait for completion.
    pub fn exec(&self) -> Result<Output> {
        let mut cmd = self.build_command();
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let child = cmd
            .spawn()
            .with_context(|| format!("failed to spawn `{}`", self.program.display()))?;

        child
            .wait_with_output()
            .with_context(|| format!("failed to wait for `{}`", self.program.display()))
    }

    /// Spawn with stdout and stderr piped for incremental reading.
    pub fn spawn_piped(&self) -> Result<Child> {
        let mut cmd = self.build_command();
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        cmd.spawn()
            .with_context(|| format!("failed to spawn `{}`", self.display_command()))
    }

    /// Display the command for error messages.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

/// Runs a full command line and reports its exit code.
///
/// Synchronous and blocking: there is no timeout, so a hung external build
/// hangs the caller.
pub trait ProcessRunner {
    /// Run `command` in `cwd`. `Err` means the process could not be started;
    /// a process that ran and failed is `Ok` with a non-zero code.
    fn run(&self, command: &str, cwd: &Path) -> Result<i32>;
}

/// Runs command lines through the host's shell, logging output as it arrives.
#[derive(Debug, Clone)]
pub struct ShellRunner {
    host: Platform,
}

impl ShellRunner {
    pub fn new(host: Platform) -> Self {
        ShellRunner { host }
    }

    /// Shell program and the flag that makes it run one command string.
    pub fn shell(&self) -> (&'static str, &'static str) {
        if self.host.is_windows() {
            ("cmd.exe", "/c")
        } else {
            ("sh", "-c")
        }
    }
}

impl Default for ShellRunner {
    fn default() -> Self {
        ShellRunner::new(Platform::host())
    }
}

impl ProcessRunner for ShellRunner {
    fn run(&self, command: &str, cwd: &Path) -> Result<i32> {
        let (shell, flag) = self.shell();
        tracing::debug!("Calling: {} {} {}", shell, flag, command);

        let mut child = ProcessBuilder::new(shell)
            .arg(flag)
            .arg(command)
            .cwd(cwd)
            .spawn_piped()?;

        let (tx, rx) = mpsc::channel();
        let mut readers = Vec::new();
        if let Some(stdout) = child.stdout.take() {
            readers.push(forward_lines(stdout, tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(forward_lines(stderr, tx.clone()));
        }
        drop(tx);

        // Ends once both pipes are closed.
        let mut captured = String::new();
        for line in rx {
            tracing::info!("{}", line);
            captured.push_str(&line);
            captured.push('\n');
        }

        for reader in readers {
            if reader.join().is_err() {
                tracing::warn!("output reader for `{}` panicked", command);
            }
        }

        let status = child
            .wait()
            .with_context(|| format!("failed to wait for `{}`", command))?;
        let code = status.code().unwrap_or(-1);

        if code != 0 {
            tracing::error!("`{}` exited with code {}\n{}", command, code, captured);
        }

        Ok(code)
    }
}

fn forward_lines<R: Read + Send + 'static>(
    pipe: R,
    tx: mpsc::Sender<String>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        // Drain to EOF; closing the pipe early would kill the child with SIGPIPE.
        for line in BufReader::new(pipe).split(b'\n') {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    tracing::warn!("failed to read process output: {}", e);
                    break;
                }
            };
            if tx.send(decode_line(&line)).is_err() {
                break;
            }
        }
    })
}

/// Decode one output line, replacing invalid UTF-8 and dropping a trailing `\r`.
fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

/// Find an executable in PATH.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}

/// Find CMake.
pub fn find_cmake() -> Option<PathBuf> {
    find_executable("cmake")
}

/// Detect the version of a CMake executable (`cmake version 3.28.1`).
pub fn detect_cmake_version(program: &Path) -> Option<String> {
    let output = ProcessBuilder::new(program).arg("--version").exec().ok()?;
    if !output.status.success() {
        return None;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    stdout
        .lines()
        .find_map(|line| line.strip_prefix("cmake version "))
        .map(|v| v.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_command() {
        let pb = ProcessBuilder::new("cmake").args(["--build", "out", "--config", "Release"]);

        assert_eq!(pb.display_command(), "cmake --build out --config Release");
    }

    #[test]
    fn test_shell_selection() {
        assert_eq!(ShellRunner::new(Platform::Windows).shell(), ("cmd.exe", "/c"));
        assert_eq!(ShellRunner::new(Platform::Linux).shell(), ("sh", "-c"));
    }

    #[cfg(unix)]
    #[test]
    fn test_shell_runner_exit_codes() {
        let tmp = tempfile::TempDir::new().unwrap();
        let runner = ShellRunner::new(Platform::Linux);

        assert_eq!(runner.run("echo hello && echo oops 1>&2", tmp.path()).unwrap(), 0);
        assert_eq!(runner.run("exit 2", tmp.path()).unwrap(), 2);
    }

    #[test]
    fn test_decode_line() {
        assert_eq!(decode_line(b"hello\r"), "hello");
        assert_eq!(decode_line(b"caf\xe9"), "caf\u{fffd}");
    }

    #[cfg(unix)]
    #[test]
    fn test_shell_runner_survives_invalid_utf8() {
        let tmp = tempfile::TempDir::new().unwrap();
        let runner = ShellRunner::new(Platform::Linux);

        // Enough output after the bad line to overflow the pipe buffer.
        let code = runner
            .run("printf 'caf\\351\\n'; seq 1 200000; printf 'caf\\351\\n' 1>&2", tmp.path())
            .unwrap();
        assert_eq!(code, 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_shell_runner_uses_cwd() {
        let tmp = tempfile::TempDir::new().unwrap();
        let runner = ShellRunner::new(Platform::Linux);

        assert_eq!(runner.run("touch marker", tmp.path()).unwrap(), 0);
        assert!(tmp.path().join("marker").exists());
    }
}
