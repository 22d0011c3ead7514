//! Adapter configuration

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Environment variable that overrides the cargo program
pub const CARGO_ENV: &str = "FNRUNNER_CARGO";

/// Environment variable the worker reads to find the invocation endpoint
pub const RUNTIME_API_ENV: &str = "AWS_LAMBDA_RUNTIME_API";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct RustRuntimeConfig {
    /// Program invoked as `<cargo> lambda build ...`
    pub cargo: String,
    /// Variable the worker is given with the invocation endpoint
    pub runtime_api_env: String,
    /// Added to the inherited environment of every build
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub extra_build_env: HashMap<String, String>,
}

impl Default for RustRuntimeConfig {
    fn default() -> Self {
        Self {
            cargo: "cargo".to_string(),
            runtime_api_env: RUNTIME_API_ENV.to_string(),
            extra_build_env: HashMap::new(),
        }
    }
}

impl RustRuntimeConfig {
    /// Defaults, with `FNRUNNER_CARGO` replacing the cargo program when set
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(cargo) = std::env::var(CARGO_ENV) {
            if !cargo.is_empty() {
                config.cargo = cargo;
            }
        }
        config
    }

    pub fn with_cargo(mut self, cargo: impl Into<String>) -> Self {
        self.cargo = cargo.into();
        self
    }

    pub fn with_build_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_build_env.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RustRuntimeConfig::default();
        assert_eq!(config.cargo, "cargo");
        assert_eq!(config.runtime_api_env, "AWS_LAMBDA_RUNTIME_API");
        assert!(config.extra_build_env.is_empty());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: RustRuntimeConfig =
            serde_json::from_str(r#"{"cargo": "/opt/cargo/bin/cargo"}"#).unwrap();
        assert_eq!(config.cargo, "/opt/cargo/bin/cargo");
        assert_eq!(config.runtime_api_env, RUNTIME_API_ENV);
    }

    #[test]
    fn test_builder() {
        let config = RustRuntimeConfig::default()
            .with_cargo("cross")
            .with_build_env("CARGO_TERM_COLOR", "never");
        assert_eq!(config.cargo, "cross");
        assert_eq!(
            config.extra_build_env.get("CARGO_TERM_COLOR").map(String::as_str),
            Some("never")
        );
    }
}
