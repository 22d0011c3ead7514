//! Building a function with `cargo lambda`

mod copy;

pub use copy::copy_artifact;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{
    command::{CargoCommand, LambdaBuildArgs},
    config::RustRuntimeConfig,
    error::Result,
    manifest::{self, cargo_config},
    project,
    properties::Properties,
    state::ProjectDirectories,
};

/// Name of the executable `cargo lambda` produces, and the handler the
/// worker is started as
pub const BOOTSTRAP: &str = "bootstrap";

/// Subdirectory of the target dir where `cargo lambda` places binaries
const LAMBDA_TARGET_SUBDIR: &str = "lambda";

/// A request to build one function
#[derive(Debug, Clone, Default)]
pub struct BuildInput {
    pub function_id: String,
    /// Source entry point, e.g. `src/bin/orders.rs`
    pub handler: PathBuf,
    /// Raw JSON properties; see [`Properties`]
    pub properties: Vec<u8>,
    pub dev: bool,
    /// Directory the artifact is placed in
    pub out: PathBuf,
}

impl BuildInput {
    pub fn new(
        function_id: impl Into<String>,
        handler: impl Into<PathBuf>,
        out: impl Into<PathBuf>,
    ) -> Self {
        Self {
            function_id: function_id.into(),
            handler: handler.into(),
            out: out.into(),
            ..Default::default()
        }
    }

    pub fn with_properties(mut self, properties: impl Into<Vec<u8>>) -> Self {
        self.properties = properties.into();
        self
    }

    pub fn with_dev(mut self, dev: bool) -> Self {
        self.dev = dev;
        self
    }
}

/// Outcome of a build that ran.
///
/// A failed build is still an `Ok` result: `errors` then holds the
/// toolchain's output and the remaining fields are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildOutput {
    pub handler: String,
    pub sourcemaps: Vec<PathBuf>,
    pub errors: Vec<String>,
    pub out: PathBuf,
}

impl BuildOutput {
    pub fn failed(errors: Vec<String>) -> Self {
        Self {
            errors,
            ..Default::default()
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Path of the built executable
    pub fn artifact_path(&self) -> PathBuf {
        self.out.join(&self.handler)
    }
}

/// Where `cargo lambda build --bin <artifact>` leaves its binary
pub fn artifact_source(target_dir: &Path, artifact: &str) -> PathBuf {
    target_dir
        .join(LAMBDA_TARGET_SUBDIR)
        .join(artifact)
        .join(BOOTSTRAP)
}

/// Compose the toolchain command for `input`.
///
/// Returns the command together with the project root and artifact name it
/// was derived from.
pub fn plan(config: &RustRuntimeConfig, input: &BuildInput) -> Result<BuildPlan> {
    let project_root = project::locate(&input.handler)?;
    let artifact = project::artifact_name(&input.handler)?;
    let properties = Properties::parse(&input.properties);

    tracing::info!(
        handler = %input.handler.display(),
        artifact = %artifact,
        out = %input.out.display(),
        "got handler"
    );

    let manifest = manifest::read_manifest(&project_root);
    let features = manifest.required_features(&artifact);
    let target_dir = cargo_config::resolve(&project_root).target_dir(&project_root);

    let args = LambdaBuildArgs {
        bin: &artifact,
        release: !input.dev,
        architecture: properties.architecture,
        features,
    }
    .to_args();

    let mut command = CargoCommand::new(config.cargo.clone(), args).with_working_dir(&project_root);
    for (key, value) in &config.extra_build_env {
        command = command.with_env(key.clone(), value.clone());
    }

    Ok(BuildPlan {
        source: artifact_source(&target_dir, &artifact),
        command,
        project_root,
        artifact,
    })
}

/// Everything resolved before the toolchain runs
#[derive(Debug, Clone)]
pub struct BuildPlan {
    pub command: CargoCommand,
    pub project_root: PathBuf,
    pub artifact: String,
    /// Binary location once the command succeeds
    pub source: PathBuf,
}

/// Build `input`, copy the artifact into `input.out` and record the
/// function's project root in `dirs`.
pub async fn build(
    config: &RustRuntimeConfig,
    dirs: &ProjectDirectories,
    input: &BuildInput,
) -> Result<BuildOutput> {
    let plan = plan(config, input)?;

    tracing::info!(cmd = %plan.command.to_shell_command(), "running cargo build");
    let result = plan.command.output_combined().await?;

    if !result.success() {
        tracing::debug!(status = %result.status, "cargo build failed");
        return Ok(BuildOutput::failed(vec![result.output_lossy()]));
    }

    let dst = input.out.join(BOOTSTRAP);
    if let Err(e) = copy_artifact(&plan.source, &dst).await {
        tracing::error!(error = %e, "failed to copy bootstrap file");
        return Ok(BuildOutput::failed(vec![e.to_string()]));
    }

    dirs.record(&input.function_id, &plan.project_root);

    Ok(BuildOutput {
        handler: BOOTSTRAP.to_string(),
        sourcemaps: Vec::new(),
        errors: Vec::new(),
        out: input.out.clone(),
    })
}
