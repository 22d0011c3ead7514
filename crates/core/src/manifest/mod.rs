//! Build metadata recovered from the cargo project
//!
//! Two sources feed a build:
//! - `Cargo.toml`, for the `[[bin]]` targets and their `required-features`
//! - `.cargo/config.toml` (or `.cargo/config`), for a custom `build.target-dir`
//!
//! Both are read leniently. A file that is missing or fails to parse is logged
//! and treated as if it declared nothing, since a build can still proceed with
//! default features and the default target directory.

pub mod cargo_config;

pub use cargo_config::{CargoConfig, find_cargo_config, read_cargo_config};

use std::path::Path;

use crate::project::MANIFEST_FILE;

/// A `[[bin]]` entry from `Cargo.toml`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinTarget {
    pub name: String,
    pub required_features: Vec<String>,
}

/// The subset of `Cargo.toml` the adapter cares about
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    /// Binary targets in declaration order
    pub bins: Vec<BinTarget>,
}

impl Manifest {
    /// Parse manifest contents.
    ///
    /// Entries without an explicit `name` are skipped: cargo would infer one
    /// from the path, but the lookup here is by declared name only.
    pub fn from_slice(contents: &[u8]) -> Result<Self, cargo_toml::Error> {
        let manifest = cargo_toml::Manifest::from_slice(contents)?;

        let bins = manifest
            .bin
            .into_iter()
            .filter_map(|product| {
                let name = product.name?;
                Some(BinTarget {
                    name,
                    required_features: product.required_features,
                })
            })
            .collect();

        Ok(Self { bins })
    }

    pub fn bin(&self, name: &str) -> Option<&BinTarget> {
        self.bins.iter().find(|bin| bin.name == name)
    }

    /// Features the named binary requires, empty when it is not declared
    pub fn required_features(&self, name: &str) -> &[String] {
        self.bin(name)
            .map(|bin| bin.required_features.as_slice())
            .unwrap_or(&[])
    }
}

/// Read `<project_root>/Cargo.toml`, degrading to an empty manifest.
pub fn read_manifest(project_root: &Path) -> Manifest {
    let path = project_root.join(MANIFEST_FILE);

    let contents = match std::fs::read(&path) {
        Ok(contents) => contents,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to read manifest");
            return Manifest::default();
        }
    };

    match Manifest::from_slice(&contents) {
        Ok(manifest) => manifest,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to parse manifest");
            Manifest::default()
        }
    }
}
