//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use cmake_target::core::{Architecture, CompilerFamily, Configuration, Platform};

/// cmake-target - build a CMake subtree and splice its outputs into a module
#[derive(Parser)]
#[command(name = "cmake-target")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Configure (if needed) and build a CMake target, then print the module description
    Build(BuildArgs),

    /// Parse a build info manifest and print its projection
    Manifest(ManifestArgs),

    /// Show the synthesized generator and compiler selection
    Toolchain(ToolchainArgs),

    /// Remove the generated project for a target
    Clean(CleanArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Host selection shared by commands that synthesize a context.
#[derive(Args, Clone)]
pub struct HostArgs {
    /// Target platform (defaults to the running host)
    #[arg(long)]
    pub platform: Option<Platform>,

    /// Host build configuration
    #[arg(long, default_value = "development")]
    pub configuration: Configuration,

    /// Target architecture (defaults to the running host)
    #[arg(long)]
    pub arch: Option<Architecture>,

    /// Compiler family (Windows targets)
    #[arg(long, default_value = "default")]
    pub compiler: CompilerFamily,

    /// Let CMake find its own compiler
    #[arg(long)]
    pub use_system_compiler: bool,
}

#[derive(Args)]
pub struct BuildArgs {
    /// Target name
    pub name: String,

    /// CMake project location, relative to the module directory
    pub location: PathBuf,

    /// Host module directory (defaults to current directory)
    #[arg(long)]
    pub module_dir: Option<PathBuf>,

    /// Extra configure arguments, passed through to CMake
    #[arg(long, allow_hyphen_values = true, default_value = "")]
    pub args: String,

    /// Third-party root, relative to the module directory
    #[arg(long)]
    pub third_party_root: Option<PathBuf>,

    /// CMake executable
    #[arg(long, env = "CMAKE_TARGET_CMAKE")]
    pub cmake: Option<PathBuf>,

    #[command(flatten)]
    pub host: HostArgs,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct ManifestArgs {
    /// Path to a buildinfo_<BuildType>.output file
    pub path: PathBuf,

    #[command(flatten)]
    pub host: HostArgs,

    /// Print the projection as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct ToolchainArgs {
    #[command(flatten)]
    pub host: HostArgs,

    /// Print the descriptor as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct CleanArgs {
    /// Target name
    pub name: String,

    /// Host module directory (defaults to current directory)
    #[arg(long)]
    pub module_dir: Option<PathBuf>,

    /// Third-party root, relative to the module directory
    #[arg(long)]
    pub third_party_root: Option<PathBuf>,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
