//! `cmake-target clean` command

use std::path::Path;

use anyhow::Result;

use crate::cli::CleanArgs;
use cmake_target::ops::clean_target;
use cmake_target::util::GlobalContext;

pub fn execute(args: CleanArgs) -> Result<()> {
    let gctx = GlobalContext::new()?;
    let config = gctx.config();

    let module_dir = gctx.resolve(args.module_dir.as_deref().unwrap_or(Path::new(".")));
    let third_party_root = args
        .third_party_root
        .unwrap_or_else(|| config.third_party_root());

    if clean_target(&args.name, &module_dir, &third_party_root)? {
        eprintln!("     Removed generated project for {}", args.name);
    } else {
        eprintln!("     Nothing to clean for {}", args.name);
    }

    Ok(())
}
