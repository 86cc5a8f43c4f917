//! # forge_runner
//!
//! Compiler toolchain collaborator for RustForge: wraps `cargo build` and
//! `cargo run` as subprocesses with captured output and timing, implementing
//! [`forge_core::ProjectCompiler`].

pub mod cargo;
pub mod error;

pub use cargo::{CargoRunner, ExecutionResult};
pub use error::{RunnerError, RunnerResult};
