//! Command implementations

pub mod build;
pub mod clean;
pub mod completions;
pub mod manifest;
pub mod toolchain;

use cmake_target::core::{BuildContext, ModuleDescription};
use cmake_target::util::Config;

use crate::cli::HostArgs;

/// Host context from command line flags layered over configuration.
pub fn host_context(host: &HostArgs, config: &Config) -> BuildContext {
    let mut ctx = BuildContext::host(host.configuration)
        .with_compiler(host.compiler)
        .with_system_compiler(host.use_system_compiler || config.use_system_compiler())
        .with_debug_crt(config.debug_crt());

    if let Some(platform) = host.platform {
        ctx = ctx.with_platform(platform);
    }
    if let Some(arch) = host.arch {
        ctx = ctx.with_architecture(arch);
    }
    ctx
}

pub fn print_description(desc: &ModuleDescription) {
    print_list("Includes", &desc.public_include_paths);
    print_list("Libraries", &desc.additional_libraries);
    print_list("Runtime paths", &desc.runtime_library_paths);

    let deps: Vec<String> = desc
        .external_dependencies
        .iter()
        .map(|p| p.display().to_string())
        .collect();
    print_list("Dependencies", &deps);

    if let Some(std) = desc.cpp_standard {
        println!("{:>14}: c++{}", "C++ standard", std);
    }
    print_list("System libs", &desc.system_libraries);
}

fn print_list(label: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    println!("{:>14}:", label);
    for item in items {
        println!("{:>14}  {}", "", item);
    }
}
