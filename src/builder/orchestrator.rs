//! Incremental configure/build state machine.
//!
//! ```text
//! Uninitialized -> PathsResolved -> ConfigureSkipped -> Built -> Success
//!                               \-> Configured -------/     \-> Failed
//! ```
//!
//! Configure is skipped when the built marker matches the wrapped project's
//! `CMakeLists.txt` modification time to the second. The marker is written
//! only after a fresh configure followed by a successful build that produced
//! a manifest, so a failed or partial run always reconfigures next time.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::Serialize;

use crate::builder::cmake::CmakeInvocation;
use crate::builder::error::BuildError;
use crate::builder::manifest::{
    read_built_marker, read_manifest, write_built_marker, BuiltTimestamp, Manifest,
};
use crate::builder::project::ProjectGenerator;
use crate::builder::toolchain::ToolchainSynthesizer;
use crate::core::context::{BuildContext, BuildType, Platform};
use crate::core::paths::BuildPaths;
use crate::core::target::BuildTarget;
use crate::util::config::DEFAULT_THIRD_PARTY_ROOT;
use crate::util::fs::FileTimes;
use crate::util::process::ProcessRunner;

/// Orchestrator states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BuildState {
    Uninitialized,
    PathsResolved,
    ConfigureSkipped,
    Configured,
    Built,
    Success,
    Failed,
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BuildState::Uninitialized => "uninitialized",
            BuildState::PathsResolved => "paths-resolved",
            BuildState::ConfigureSkipped => "configure-skipped",
            BuildState::Configured => "configured",
            BuildState::Built => "built",
            BuildState::Success => "success",
            BuildState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub paths: BuildPaths,
    pub build_type: BuildType,
    /// Whether this run configured (as opposed to skipping straight to build)
    pub configured: bool,
    pub manifest: Manifest,
}

/// Drives one target through configure and build.
pub struct BuildOrchestrator<'a> {
    runner: &'a dyn ProcessRunner,
    file_times: &'a dyn FileTimes,
    synthesizer: ToolchainSynthesizer<'a>,
    generator: ProjectGenerator,
    cmake_program: PathBuf,
    third_party_root: PathBuf,
    state: BuildState,
    history: Vec<BuildState>,
}

impl<'a> BuildOrchestrator<'a> {
    pub fn new(
        runner: &'a dyn ProcessRunner,
        file_times: &'a dyn FileTimes,
        synthesizer: ToolchainSynthesizer<'a>,
    ) -> Self {
        BuildOrchestrator {
            runner,
            file_times,
            synthesizer,
            generator: ProjectGenerator::default(),
            cmake_program: PathBuf::from(default_cmake_program(Platform::host())),
            third_party_root: PathBuf::from(DEFAULT_THIRD_PARTY_ROOT),
            state: BuildState::Uninitialized,
            history: vec![BuildState::Uninitialized],
        }
    }

    pub fn generator(mut self, generator: ProjectGenerator) -> Self {
        self.generator = generator;
        self
    }

    pub fn cmake_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.cmake_program = program.into();
        self
    }

    /// Third-party root, relative to the module directory unless absolute.
    pub fn third_party_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.third_party_root = root.into();
        self
    }

    pub fn state(&self) -> BuildState {
        self.state
    }

    /// States visited by the last run, starting with `Uninitialized`.
    pub fn history(&self) -> &[BuildState] {
        &self.history
    }

    /// Paths this orchestrator would use for `target`.
    pub fn paths_for(
        &self,
        target: &BuildTarget,
        ctx: &BuildContext,
        module_dir: &Path,
    ) -> BuildPaths {
        let build_type = target.build_type(ctx.configuration.build_type());
        BuildPaths::new(target, &build_type, module_dir, &self.third_party_root)
    }

    fn transition(&mut self, next: BuildState) {
        tracing::debug!("{} -> {}", self.state, next);
        self.state = next;
        self.history.push(next);
    }

    fn fail(&mut self, err: BuildError) -> BuildError {
        self.transition(BuildState::Failed);
        err
    }

    /// Run the pipeline for `target`.
    ///
    /// Never panics on external failures; every failure is a [`BuildError`]
    /// and leaves the orchestrator in [`BuildState::Failed`].
    pub fn run(
        &mut self,
        target: &BuildTarget,
        ctx: &BuildContext,
        module_dir: &Path,
    ) -> Result<BuildOutcome, BuildError> {
        self.state = BuildState::Uninitialized;
        self.history = vec![BuildState::Uninitialized];

        if !ctx.platform.is_supported() {
            return Err(self.fail(BuildError::UnsupportedPlatform(ctx.platform)));
        }

        let build_type = target.build_type(ctx.configuration.build_type());
        let paths = BuildPaths::new(target, &build_type, module_dir, &self.third_party_root);
        if let Err(e) = paths.ensure_dirs() {
            return Err(self.fail(BuildError::Generate(e)));
        }
        self.transition(BuildState::PathsResolved);

        let descriptor = paths.authoring_descriptor();
        let descriptor_time = self.file_times.modified(&descriptor);
        let invocation = CmakeInvocation::new(
            &self.cmake_program,
            ctx.host_platform,
            &paths,
            &build_type,
        );

        let configured = if self.is_up_to_date(&paths, descriptor_time) {
            tracing::info!("{} is up to date, skipping configure", target.name());
            self.transition(BuildState::ConfigureSkipped);
            false
        } else {
            tracing::info!("{} is out of date, reconfiguring", target.name());
            self.configure(target, ctx, &paths, &build_type, &invocation)?;
            self.transition(BuildState::Configured);
            true
        };

        let build_line = invocation.build_line();
        let code = self.execute(&build_line, &paths.module_dir)?;
        if code != 0 {
            return Err(self.fail(BuildError::BuildFailed { code }));
        }
        self.transition(BuildState::Built);

        let manifest = match read_manifest(&paths.manifest) {
            Ok(Some(manifest)) => manifest,
            Ok(None) => {
                return Err(self.fail(BuildError::ManifestMissing {
                    path: paths.manifest.clone(),
                }))
            }
            Err(e) => {
                tracing::warn!("{:#}", e);
                return Err(self.fail(BuildError::ManifestMissing {
                    path: paths.manifest.clone(),
                }));
            }
        };

        if configured {
            self.record_configure(&paths, descriptor_time);
        }

        self.transition(BuildState::Success);
        Ok(BuildOutcome {
            paths,
            build_type,
            configured,
            manifest,
        })
    }

    fn is_up_to_date(&self, paths: &BuildPaths, descriptor_time: Option<SystemTime>) -> bool {
        let Some(current) = descriptor_time else {
            return false;
        };

        match read_built_marker(&paths.built_marker) {
            Ok(Some(marker)) => marker.matches(current),
            Ok(None) => false,
            Err(e) => {
                tracing::warn!("ignoring built marker: {:#}", e);
                false
            }
        }
    }

    fn configure(
        &mut self,
        target: &BuildTarget,
        ctx: &BuildContext,
        paths: &BuildPaths,
        build_type: &BuildType,
        invocation: &CmakeInvocation<'_>,
    ) -> Result<(), BuildError> {
        let descriptor = self.synthesizer.synthesize(ctx);

        if let Err(e) = self
            .generator
            .generate(ctx, target, paths, build_type, &descriptor)
        {
            return Err(self.fail(BuildError::Generate(e)));
        }

        if let Err(e) = paths.clear_built_markers() {
            tracing::warn!("{:#}", e);
        }

        let line =
            invocation.configure_line(&descriptor, ctx.use_system_compiler, target.extra_args());
        let code = self.execute(&line, &paths.module_dir)?;
        if code != 0 {
            return Err(self.fail(BuildError::ConfigureFailed { code }));
        }
        Ok(())
    }

    fn execute(&mut self, command: &str, cwd: &Path) -> Result<i32, BuildError> {
        tracing::info!("Running: {}", command);
        match self.runner.run(command, cwd) {
            Ok(code) => Ok(code),
            Err(reason) => Err(self.fail(BuildError::Spawn {
                command: command.to_string(),
                reason,
            })),
        }
    }

    fn record_configure(&self, paths: &BuildPaths, descriptor_time: Option<SystemTime>) {
        let Some(time) = descriptor_time else {
            tracing::debug!(
                "{} not found, built marker not written",
                paths.authoring_descriptor().display()
            );
            return;
        };

        let timestamp = BuiltTimestamp::from_system_time(time);
        if let Err(e) = write_built_marker(&paths.built_marker, timestamp) {
            tracing::warn!("failed to write built marker: {:#}", e);
        }
    }
}

/// CMake program name for a host platform.
pub fn default_cmake_program(host: Platform) -> &'static str {
    if host.is_windows() {
        "cmake.exe"
    } else {
        "cmake"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::toolchain::{NoHostFlags, StaticSdk};
    use crate::core::context::Configuration;
    use crate::test_support::{FakeFileTimes, MockRun, MockRunner};
    use std::time::{Duration, UNIX_EPOCH};
    use tempfile::TempDir;

    struct Fixture {
        tmp: TempDir,
        runner: MockRunner,
        times: FakeFileTimes,
        sdk: StaticSdk,
    }

    impl Fixture {
        fn new() -> Self {
            Fixture {
                tmp: TempDir::new().unwrap(),
                runner: MockRunner::new(),
                times: FakeFileTimes::new(),
                sdk: StaticSdk::default(),
            }
        }

        fn module_dir(&self) -> PathBuf {
            self.tmp.path().join("Source/Game")
        }

        fn orchestrator(&self) -> BuildOrchestrator<'_> {
            BuildOrchestrator::new(
                &self.runner,
                &self.times,
                ToolchainSynthesizer::new(&self.sdk, &NoHostFlags),
            )
            .cmake_program("cmake")
            .third_party_root("../ThirdParty")
        }

        fn ctx(&self) -> BuildContext {
            BuildContext::host(Configuration::Development).with_platform(Platform::Linux)
        }

        /// Script a successful configure and a build that writes `manifest`.
        fn expect_success(&self, paths: &BuildPaths, manifest: &str) {
            self.runner.expect_contains(" -S ", MockRun::success());
            self.runner.expect_contains(
                " --build ",
                MockRun::success().writes(&paths.manifest, manifest),
            );
        }
    }

    fn at(secs: u64, millis: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs) + Duration::from_millis(millis)
    }

    #[test]
    fn test_first_run_configures_and_writes_marker() {
        let fx = Fixture::new();
        let target = BuildTarget::new("zlib", "../ThirdParty/zlib", "");
        let mut orch = fx.orchestrator();
        let paths = orch.paths_for(&target, &fx.ctx(), &fx.module_dir());
        fx.times.set(paths.authoring_descriptor(), at(1_000, 250));
        fx.expect_success(&paths, "includes=/a\n");

        let outcome = orch.run(&target, &fx.ctx(), &fx.module_dir()).unwrap();

        assert!(outcome.configured);
        assert_eq!(
            orch.history(),
            &[
                BuildState::Uninitialized,
                BuildState::PathsResolved,
                BuildState::Configured,
                BuildState::Built,
                BuildState::Success,
            ]
        );
        assert!(paths.project_descriptor.is_file());
        assert!(paths.toolchain_file.is_file());
        let marker = read_built_marker(&paths.built_marker).unwrap().unwrap();
        assert!(marker.matches(at(1_000, 0)));
        assert_eq!(outcome.manifest.list("includes"), vec!["/a"]);
    }

    #[test]
    fn test_second_run_skips_configure() {
        let fx = Fixture::new();
        let target = BuildTarget::new("zlib", "zlib", "");
        let mut orch = fx.orchestrator();
        let paths = orch.paths_for(&target, &fx.ctx(), &fx.module_dir());
        fx.times.set(paths.authoring_descriptor(), at(1_000, 250));
        fx.expect_success(&paths, "includes=/a\n");

        orch.run(&target, &fx.ctx(), &fx.module_dir()).unwrap();
        let marker_before = std::fs::read_to_string(&paths.built_marker).unwrap();

        // Sub-second change within the same second.
        fx.times.set(paths.authoring_descriptor(), at(1_000, 900));
        let outcome = orch.run(&target, &fx.ctx(), &fx.module_dir()).unwrap();

        assert!(!outcome.configured);
        assert_eq!(orch.state(), BuildState::Success);
        assert!(orch.history().contains(&BuildState::ConfigureSkipped));
        assert_eq!(fx.runner.count_containing(" -S "), 1);
        assert_eq!(fx.runner.count_containing(" --build "), 2);
        assert_eq!(
            std::fs::read_to_string(&paths.built_marker).unwrap(),
            marker_before
        );
    }

    #[test]
    fn test_crossing_second_boundary_reconfigures() {
        let fx = Fixture::new();
        let target = BuildTarget::new("zlib", "zlib", "");
        let mut orch = fx.orchestrator();
        let paths = orch.paths_for(&target, &fx.ctx(), &fx.module_dir());
        fx.times.set(paths.authoring_descriptor(), at(1_000, 900));
        fx.expect_success(&paths, "includes=/a\n");

        orch.run(&target, &fx.ctx(), &fx.module_dir()).unwrap();

        fx.times.set(paths.authoring_descriptor(), at(1_001, 100));
        let outcome = orch.run(&target, &fx.ctx(), &fx.module_dir()).unwrap();

        assert!(outcome.configured);
        assert_eq!(fx.runner.count_containing(" -S "), 2);
        let marker = read_built_marker(&paths.built_marker).unwrap().unwrap();
        assert!(marker.matches(at(1_001, 0)));
    }

    #[test]
    fn test_switching_build_type_invalidates_other_markers() {
        let fx = Fixture::new();
        let target = BuildTarget::new("zlib", "zlib", "");
        let release_ctx = fx.ctx();
        let debug_ctx = BuildContext::host(Configuration::Debug).with_platform(Platform::Linux);
        let mut orch = fx.orchestrator();
        let release = orch.paths_for(&target, &release_ctx, &fx.module_dir());
        let debug = orch.paths_for(&target, &debug_ctx, &fx.module_dir());
        fx.times.set(release.authoring_descriptor(), at(1_000, 0));
        fx.runner.expect_contains(" -S ", MockRun::success());
        fx.runner.expect_contains(
            "--config Release",
            MockRun::success().writes(&release.manifest, "includes=/a\n"),
        );
        fx.runner.expect_contains(
            "--config Debug",
            MockRun::success().writes(&debug.manifest, "includes=/a\n"),
        );

        orch.run(&target, &release_ctx, &fx.module_dir()).unwrap();
        assert!(release.built_marker.exists());

        orch.run(&target, &debug_ctx, &fx.module_dir()).unwrap();
        assert!(debug.built_marker.exists());
        assert!(!release.built_marker.exists());

        // The shared cache now holds Debug, so Release must configure again.
        let outcome = orch.run(&target, &release_ctx, &fx.module_dir()).unwrap();
        assert!(outcome.configured);
        assert_eq!(fx.runner.count_containing(" -S "), 3);
        assert!(!debug.built_marker.exists());
    }

    #[test]
    fn test_configure_failure_skips_build() {
        let fx = Fixture::new();
        let target = BuildTarget::new("zlib", "zlib", "");
        let mut orch = fx.orchestrator();
        let paths = orch.paths_for(&target, &fx.ctx(), &fx.module_dir());
        fx.times.set(paths.authoring_descriptor(), at(1_000, 0));
        fx.runner.expect_contains(" -S ", MockRun::exit(2));

        let err = orch.run(&target, &fx.ctx(), &fx.module_dir()).unwrap_err();

        assert!(matches!(err, BuildError::ConfigureFailed { code: 2 }));
        assert_eq!(orch.state(), BuildState::Failed);
        assert_eq!(fx.runner.count_containing(" --build "), 0);
        assert!(!paths.built_marker.exists());
    }

    #[test]
    fn test_build_failure_leaves_marker_untouched() {
        let fx = Fixture::new();
        let target = BuildTarget::new("zlib", "zlib", "");
        let mut orch = fx.orchestrator();
        let paths = orch.paths_for(&target, &fx.ctx(), &fx.module_dir());
        fx.times.set(paths.authoring_descriptor(), at(1_000, 0));
        fx.runner.expect_contains(" -S ", MockRun::success());
        fx.runner.expect_contains(" --build ", MockRun::exit(1));

        let err = orch.run(&target, &fx.ctx(), &fx.module_dir()).unwrap_err();

        assert!(matches!(err, BuildError::BuildFailed { code: 1 }));
        assert!(!paths.built_marker.exists());
    }

    #[test]
    fn test_missing_manifest_fails() {
        let fx = Fixture::new();
        let target = BuildTarget::new("zlib", "zlib", "");
        let mut orch = fx.orchestrator();
        let paths = orch.paths_for(&target, &fx.ctx(), &fx.module_dir());
        fx.times.set(paths.authoring_descriptor(), at(1_000, 0));
        fx.runner.set_default(MockRun::success());

        let err = orch.run(&target, &fx.ctx(), &fx.module_dir()).unwrap_err();

        assert!(matches!(err, BuildError::ManifestMissing { .. }));
        assert!(!paths.built_marker.exists());
    }

    #[test]
    fn test_unsupported_platform_runs_nothing() {
        let fx = Fixture::new();
        let target = BuildTarget::new("zlib", "zlib", "");
        let ctx = fx.ctx().with_platform(Platform::Android);
        let mut orch = fx.orchestrator();

        let err = orch.run(&target, &ctx, &fx.module_dir()).unwrap_err();

        assert!(matches!(err, BuildError::UnsupportedPlatform(Platform::Android)));
        assert!(fx.runner.calls().is_empty());
        assert_eq!(
            orch.history(),
            &[BuildState::Uninitialized, BuildState::Failed]
        );
    }

    #[test]
    fn test_forced_build_type_overrides_host() {
        let fx = Fixture::new();
        let target = BuildTarget::new("zlib", "zlib", "-DCMAKE_BUILD_TYPE=Release");
        let ctx = BuildContext::host(Configuration::Debug).with_platform(Platform::Linux);
        let mut orch = fx.orchestrator();
        let paths = orch.paths_for(&target, &ctx, &fx.module_dir());
        fx.times.set(paths.authoring_descriptor(), at(1_000, 0));
        fx.expect_success(&paths, "includes=/a\n");

        let outcome = orch.run(&target, &ctx, &fx.module_dir()).unwrap();

        assert_eq!(outcome.build_type, BuildType::Release);
        assert!(paths.manifest.ends_with("buildinfo_Release.output"));
        assert!(fx.runner.calls()[1].ends_with("--config Release"));
        assert!(fx.runner.calls()[0].contains("-DCMAKE_BUILD_TYPE=Release"));
    }

    #[test]
    fn test_missing_authoring_descriptor_always_reconfigures() {
        let fx = Fixture::new();
        let target = BuildTarget::new("zlib", "zlib", "");
        let mut orch = fx.orchestrator();
        let paths = orch.paths_for(&target, &fx.ctx(), &fx.module_dir());
        fx.expect_success(&paths, "includes=/a\n");

        orch.run(&target, &fx.ctx(), &fx.module_dir()).unwrap();
        orch.run(&target, &fx.ctx(), &fx.module_dir()).unwrap();

        assert_eq!(fx.runner.count_containing(" -S "), 2);
        assert!(!paths.built_marker.exists());
    }

    #[test]
    fn test_spawn_failure() {
        let fx = Fixture::new();
        let target = BuildTarget::new("zlib", "zlib", "");
        let mut orch = fx.orchestrator();
        fx.runner.set_default(MockRun::spawn_error());

        let err = orch.run(&target, &fx.ctx(), &fx.module_dir()).unwrap_err();
        assert!(matches!(err, BuildError::Spawn { .. }));
        assert_eq!(orch.state(), BuildState::Failed);
    }
}
