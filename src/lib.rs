//! fnrunner - local build and run support for Rust serverless functions
//!
//! Re-exports [`fnrunner_core`]; see that crate for the adapter itself.
pub use fnrunner_core::*;
