//! `cmake-target manifest` command

use anyhow::{bail, Result};

use crate::cli::ManifestArgs;
use crate::commands::{host_context, print_description};
use cmake_target::builder::manifest::read_manifest;
use cmake_target::builder::projector::project;
use cmake_target::core::ModuleDescription;
use cmake_target::util::GlobalContext;

pub fn execute(args: ManifestArgs) -> Result<()> {
    let gctx = GlobalContext::new()?;
    let config = gctx.config();
    let path = gctx.resolve(&args.path);

    let Some(manifest) = read_manifest(&path)? else {
        bail!("build info file not found: {}", path.display());
    };

    let ctx = host_context(&args.host, &config);
    let mut module = ModuleDescription::new();
    project(&manifest, &ctx, &mut module);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&module)?);
    } else {
        print_description(&module);
        if manifest.skipped_lines() > 0 {
            eprintln!("warning: {} malformed line(s) skipped", manifest.skipped_lines());
        }
    }

    Ok(())
}
