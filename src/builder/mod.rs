//! External CMake build orchestration.
//!
//! This module decides whether a wrapped CMake project needs to be
//! reconfigured, drives configure and build, and reads back what it produced.

pub mod cmake;
pub mod error;
pub mod manifest;
pub mod orchestrator;
pub mod project;
pub mod projector;
pub mod toolchain;

pub use error::BuildError;
pub use manifest::{BuiltTimestamp, Manifest};
pub use orchestrator::{BuildOrchestrator, BuildOutcome, BuildState};
pub use project::{ProjectGenerator, Templates};
pub use toolchain::{
    ConfiguredHostFlags, GeneratorDescriptor, HostFlagProvider, NoHostFlags, SdkLocator, StaticSdk,
    ToolchainSynthesizer,
};
