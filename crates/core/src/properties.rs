//! Build-time properties passed through from the function definition

use serde::Deserialize;

/// Target CPU architecture of the deployed function
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum Architecture {
    #[default]
    #[serde(rename = "x86_64")]
    X86_64,
    #[serde(rename = "arm_64")]
    Arm64,
    /// Anything we don't recognize builds for the default target
    #[serde(other)]
    Unknown,
}

impl Architecture {
    pub fn is_arm64(self) -> bool {
        self == Architecture::Arm64
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Properties {
    #[serde(default)]
    pub architecture: Architecture,
}

impl Properties {
    /// Parse the raw properties blob.
    ///
    /// Malformed or empty input yields the defaults; the blob is owned by the
    /// orchestrator and not worth failing a build over.
    pub fn parse(raw: &[u8]) -> Self {
        if raw.is_empty() {
            return Self::default();
        }

        serde_json::from_slice(raw).unwrap_or_else(|e| {
            tracing::debug!(error = %e, "ignoring malformed build properties");
            Self::default()
        })
    }
}
