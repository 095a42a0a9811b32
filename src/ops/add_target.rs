//! Implementation of adding an external CMake target to a host module.

use std::path::{Path, PathBuf};

use crate::builder::error::BuildError;
use crate::builder::orchestrator::{BuildOrchestrator, BuildOutcome};
use crate::builder::project::{ProjectGenerator, Templates};
use crate::builder::projector::project;
use crate::builder::toolchain::{ConfiguredHostFlags, StaticSdk, ToolchainSynthesizer};
use crate::core::context::{BuildContext, Platform};
use crate::core::rules::ModuleRules;
use crate::core::target::BuildTarget;
use crate::util::config::Config;
use crate::util::fs::DiskFileTimes;
use crate::util::process::{ProcessRunner, ShellRunner};

/// Real collaborators for building targets, resolved from configuration.
pub struct BuildEnvironment {
    runner: Box<dyn ProcessRunner>,
    file_times: DiskFileTimes,
    sdk: StaticSdk,
    host_flags: ConfiguredHostFlags,
    libcxx_root: Option<PathBuf>,
    templates: Templates,
    cmake_program: PathBuf,
    third_party_root: PathBuf,
}

impl BuildEnvironment {
    pub fn from_config(config: &Config) -> Self {
        let host = Platform::host();
        BuildEnvironment {
            runner: Box::new(ShellRunner::new(host)),
            file_times: DiskFileTimes,
            sdk: StaticSdk::from_config(config),
            host_flags: ConfiguredHostFlags::from_config(config),
            libcxx_root: config.toolchain.libcxx_root.clone(),
            templates: Templates::new(config.paths.templates_dir.clone()),
            cmake_program: config.cmake_program(host),
            third_party_root: config.third_party_root(),
        }
    }

    /// Replace the process runner.
    pub fn with_runner(mut self, runner: Box<dyn ProcessRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn cmake_program(&self) -> &Path {
        &self.cmake_program
    }

    pub fn third_party_root(&self) -> &Path {
        &self.third_party_root
    }

    pub fn synthesizer(&self) -> ToolchainSynthesizer<'_> {
        ToolchainSynthesizer::new(&self.sdk, &self.host_flags).libcxx_root(self.libcxx_root.clone())
    }

    pub fn orchestrator(&self) -> BuildOrchestrator<'_> {
        BuildOrchestrator::new(self.runner.as_ref(), &self.file_times, self.synthesizer())
            .generator(ProjectGenerator::new(self.templates.clone()))
            .cmake_program(&self.cmake_program)
            .third_party_root(&self.third_party_root)
    }
}

/// Build `target` and splice its outputs into `rules`.
///
/// Returns `false` on any failure. A failed target also gets a sentinel
/// dependency that never exists on disk, so the host keeps treating the
/// module as stale and retries on its next build.
pub fn add_target(
    orchestrator: &mut BuildOrchestrator<'_>,
    target: &BuildTarget,
    ctx: &BuildContext,
    module_dir: &Path,
    rules: &mut dyn ModuleRules,
) -> bool {
    try_add_target(orchestrator, target, ctx, module_dir, rules).is_ok()
}

/// [`add_target`], keeping the failure reason for the caller to report.
///
/// The sink is updated the same way: projected outputs on success, the
/// sentinel dependency on failure.
pub fn try_add_target(
    orchestrator: &mut BuildOrchestrator<'_>,
    target: &BuildTarget,
    ctx: &BuildContext,
    module_dir: &Path,
    rules: &mut dyn ModuleRules,
) -> Result<BuildOutcome, BuildError> {
    tracing::info!("Building external target {}", target.name());

    match orchestrator.run(target, ctx, module_dir) {
        Ok(outcome) => {
            project(&outcome.manifest, ctx, rules);
            tracing::info!(
                "{} built ({}{})",
                target.name(),
                outcome.build_type,
                if outcome.configured { ", reconfigured" } else { "" }
            );
            Ok(outcome)
        }
        Err(err) => {
            tracing::error!("{}: {}", target.name(), err);
            let sentinel = orchestrator
                .paths_for(target, ctx, module_dir)
                .failed_sentinel();
            rules.add_external_dependency(&sentinel);
            Err(err)
        }
    }
}
