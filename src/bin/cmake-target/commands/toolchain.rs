//! `cmake-target toolchain` command

use anyhow::Result;

use crate::cli::ToolchainArgs;
use crate::commands::host_context;
use cmake_target::core::Platform;
use cmake_target::ops::BuildEnvironment;
use cmake_target::util::process::detect_cmake_version;
use cmake_target::util::GlobalContext;

pub fn execute(args: ToolchainArgs) -> Result<()> {
    let gctx = GlobalContext::new()?;
    let config = gctx.config();
    let ctx = host_context(&args.host, &config);

    let env = BuildEnvironment::from_config(&config);
    let descriptor = env.synthesizer().synthesize(&ctx);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&descriptor)?);
        return Ok(());
    }

    println!("Toolchain:");
    println!();
    println!("  Platform:  {}", ctx.platform);
    println!("  Build:     {}", ctx.configuration.build_type());
    println!("  Generator: {}", or_default(&descriptor.name));
    println!("  Options:   {}", or_default(&descriptor.options));
    println!("  CC:        {}", or_system(&descriptor.c_compiler));
    println!("  CXX:       {}", or_system(&descriptor.cpp_compiler));
    println!("  Linker:    {}", or_system(&descriptor.linker));
    println!();

    let cmake = config.cmake_program(Platform::host());
    match detect_cmake_version(&cmake) {
        Some(version) => println!("  CMake:     {} ({})", cmake.display(), version),
        None => println!("  CMake:     {} (not runnable)", cmake.display()),
    }

    Ok(())
}

fn or_default(value: &str) -> &str {
    if value.is_empty() {
        "(cmake default)"
    } else {
        value
    }
}

fn or_system(value: &str) -> &str {
    if value.is_empty() {
        "(system)"
    } else {
        value
    }
}
