//! fnrunner-core - Rust language runtime for a local serverless dev orchestrator
//!
//! This crate provides functionality to:
//! - Build a function's handler into a `bootstrap` executable with `cargo lambda`
//! - Run that executable as a local worker against an invocation API endpoint
//! - Decide whether a changed file should trigger a rebuild of a function
pub mod build;
pub mod command;
pub mod config;
pub mod error;
pub mod manifest;
pub mod project;
pub mod properties;
pub mod registry;
pub mod runtime;
pub mod state;
pub mod worker;

// Re-export commonly used types and traits
pub use error::{Error, Result};

pub use build::{BuildInput, BuildOutput};
pub use config::RustRuntimeConfig;
pub use registry::RuntimeRegistry;
pub use runtime::{Runtime, RustRuntime};
pub use state::ProjectDirectories;
pub use worker::{LogStream, RunInput, Worker};
