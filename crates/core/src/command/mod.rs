//! Toolchain command composition and execution

pub mod cargo_command;
pub(crate) mod group;
pub mod lambda_build;

pub use cargo_command::{CargoCommand, CombinedOutput};
pub use lambda_build::LambdaBuildArgs;
