use serde::Deserialize;
use std::path::{Path, PathBuf};

const CARGO_DIR: &str = ".cargo";

/// File names accepted inside `.cargo/`, in priority order
const CONFIG_FILES: [&str; 2] = ["config.toml", "config"];

const DEFAULT_TARGET_DIR: &str = "target";

/// The `[build]` table of a cargo config file
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CargoBuildConfig {
    #[serde(default)]
    pub target_dir: Option<String>,
}

/// Cargo configuration override; unknown tables are ignored
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CargoConfig {
    #[serde(default)]
    pub build: CargoBuildConfig,
}

impl CargoConfig {
    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Directory cargo writes build output to for a project at `project_root`.
    ///
    /// A relative `target-dir` is taken relative to the project root.
    pub fn target_dir(&self, project_root: &Path) -> PathBuf {
        match &self.build.target_dir {
            Some(dir) => project_root.join(dir),
            None => project_root.join(DEFAULT_TARGET_DIR),
        }
    }
}

/// Find the closest cargo config file, starting at `start` and walking up.
///
/// The first `.cargo` directory holding either accepted file name wins. A
/// `.cargo` directory with neither file does not stop the walk.
pub fn find_cargo_config(start: &Path) -> Option<PathBuf> {
    let mut current = start;

    loop {
        let cargo_dir = current.join(CARGO_DIR);
        if cargo_dir.is_dir() {
            for name in CONFIG_FILES {
                let config_path = cargo_dir.join(name);
                if config_path.is_file() {
                    return Some(config_path);
                }
            }
        }

        current = current.parent()?;
    }
}

/// Read a cargo config file, degrading to no override on any failure.
pub fn read_cargo_config(path: &Path) -> CargoConfig {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to read cargo config");
            return CargoConfig::default();
        }
    };

    CargoConfig::from_toml(&contents).unwrap_or_else(|e| {
        tracing::warn!(path = %path.display(), error = %e, "failed to parse cargo config");
        CargoConfig::default()
    })
}

/// Resolve the override that applies to `project_root`, if any.
pub fn resolve(project_root: &Path) -> CargoConfig {
    match find_cargo_config(project_root) {
        Some(path) => {
            tracing::debug!("Using cargo config {:?}", path);
            read_cargo_config(&path)
        }
        None => CargoConfig::default(),
    }
}
