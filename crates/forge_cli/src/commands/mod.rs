//! CLI command definitions.
//!
//! This module defines the command structure for the RustForge CLI.
//! Each subcommand maps to one workflow of the generation service.

use clap::{Parser, Subcommand};

pub mod compile;
pub mod generate;
pub mod seed;

/// RustForge - LLM-driven Rust project generation
#[derive(Parser)]
#[command(name = "forge")]
#[command(version, about = "RustForge - LLM-driven Rust project generation")]
#[command(long_about = r#"
RustForge turns a natural-language description into a compilable Cargo
project. A generative model drafts the sources, the toolchain compiles
them, and compile errors are fed back to the model in a bounded fix loop
augmented with similar past fixes from a vector store.

WORKFLOWS:
  generate  → Generate a project from a description and repair it until it builds
  compile   → Compile existing sources in wire format, repairing on failure
  seed      → Load example datasets into the vector store

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments
  3 - Generation failure (attempt budget exhausted)
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a project from a natural-language description
    Generate(generate::GenerateArgs),

    /// Compile wire-format sources, repairing compile errors
    Compile(compile::CompileArgs),

    /// Seed the vector store with example datasets
    Seed(seed::SeedArgs),
}
