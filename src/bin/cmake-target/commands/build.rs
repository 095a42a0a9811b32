//! `cmake-target build` command

use std::path::Path;

use anyhow::{bail, Result};
use serde::Serialize;

use crate::cli::BuildArgs;
use crate::commands::{host_context, print_description};
use cmake_target::builder::BuildState;
use cmake_target::core::{BuildTarget, ModuleDescription};
use cmake_target::ops::{try_add_target, BuildEnvironment};
use cmake_target::util::GlobalContext;

#[derive(Serialize)]
struct BuildReport<'a> {
    target: &'a str,
    success: bool,
    states: &'a [BuildState],
    module: &'a ModuleDescription,
}

pub fn execute(args: BuildArgs) -> Result<()> {
    let gctx = GlobalContext::new()?;
    let mut config = gctx.config();

    if let Some(cmake) = args.cmake {
        config.cmake.program = Some(cmake);
    }
    if let Some(root) = args.third_party_root {
        config.paths.third_party_root = Some(root);
    }

    let module_dir = gctx.resolve(args.module_dir.as_deref().unwrap_or(Path::new(".")));
    let ctx = host_context(&args.host, &config);
    let target = BuildTarget::new(args.name, args.location, &args.args);

    let env = BuildEnvironment::from_config(&config);
    let mut orchestrator = env.orchestrator();
    let mut module = ModuleDescription::new();

    let result = try_add_target(&mut orchestrator, &target, &ctx, &module_dir, &mut module);

    if args.json {
        let report = BuildReport {
            target: target.name(),
            success: result.is_ok(),
            states: orchestrator.history(),
            module: &module,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if result.is_ok() {
        if orchestrator.history().contains(&BuildState::ConfigureSkipped) {
            println!("{:>14}: {} (configure skipped)", "Built", target.name());
        } else {
            println!("{:>14}: {}", "Built", target.name());
        }
        print_description(&module);
    }

    if let Err(err) = result {
        eprintln!("{:?}", miette::Report::new(err));
        bail!("external target `{}` failed", target.name());
    }

    Ok(())
}
