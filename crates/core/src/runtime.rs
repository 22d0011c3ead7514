//! The contract every language runtime adapter implements, and the Rust one

use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;

use crate::{
    build::{self, BuildInput, BuildOutput},
    config::RustRuntimeConfig,
    error::Result,
    project,
    state::ProjectDirectories,
    worker::{RunInput, Worker},
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A language runtime the orchestrator can build and run functions with.
///
/// Cancelling a returned future (dropping it, e.g. through a timeout) must
/// abort whatever external process it started.
pub trait Runtime: Send + Sync {
    /// Whether this adapter handles the runtime identifier of a function
    fn matches(&self, runtime: &str) -> bool;

    /// Build a function. Toolchain failures are reported in
    /// [`BuildOutput::errors`]; `Err` means the build could not be attempted.
    fn build<'a>(&'a self, input: &'a BuildInput) -> BoxFuture<'a, Result<BuildOutput>>;

    /// Start a built function as a local worker
    fn run<'a>(&'a self, input: &'a RunInput) -> BoxFuture<'a, Result<Worker>>;

    /// Whether a change to `file` should trigger a rebuild of `function_id`
    fn should_rebuild(&self, function_id: &str, file: &Path) -> bool;
}

/// Source file extension the Rust adapter watches
pub const SOURCE_EXTENSION: &str = "rs";

/// Builds functions with `cargo lambda` and runs the resulting `bootstrap`
#[derive(Debug)]
pub struct RustRuntime {
    config: RustRuntimeConfig,
    directories: Arc<ProjectDirectories>,
}

impl RustRuntime {
    /// Default configuration, honoring `FNRUNNER_CARGO`
    pub fn new() -> Self {
        Self::with_config(RustRuntimeConfig::from_env())
    }

    pub fn with_config(config: RustRuntimeConfig) -> Self {
        Self {
            config,
            directories: Arc::default(),
        }
    }

    /// Share an existing directory store instead of starting empty
    pub fn with_directories(mut self, directories: Arc<ProjectDirectories>) -> Self {
        self.directories = directories;
        self
    }

    pub fn config(&self) -> &RustRuntimeConfig {
        &self.config
    }

    pub fn directories(&self) -> &Arc<ProjectDirectories> {
        &self.directories
    }

    pub async fn build(&self, input: &BuildInput) -> Result<BuildOutput> {
        build::build(&self.config, &self.directories, input).await
    }

    pub fn run(&self, input: &RunInput) -> Result<Worker> {
        Worker::spawn(&self.config, input)
    }

    /// A `.rs` change inside the project last built for `function_id`.
    ///
    /// This is scoped by directory only: any Rust file under the project root
    /// counts, whether or not the function's binary depends on it.
    pub fn should_rebuild(&self, function_id: &str, file: &Path) -> bool {
        if file.extension().and_then(|e| e.to_str()) != Some(SOURCE_EXTENSION) {
            return false;
        }

        let Some(root) = self.directories.get(function_id) else {
            return false;
        };

        tracing::debug!(file = %file.display(), root = %root.display(), "checking if file needs to be rebuilt");

        let root = project::normalize(&root);
        let file = project::normalize(file);

        match relative_path(&root, &file) {
            Some(rel) => !rel.starts_with(".."),
            None => false,
        }
    }
}

impl Default for RustRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime for RustRuntime {
    fn matches(&self, runtime: &str) -> bool {
        runtime == "rust"
    }

    fn build<'a>(&'a self, input: &'a BuildInput) -> BoxFuture<'a, Result<BuildOutput>> {
        Box::pin(RustRuntime::build(self, input))
    }

    fn run<'a>(&'a self, input: &'a RunInput) -> BoxFuture<'a, Result<Worker>> {
        Box::pin(async move { RustRuntime::run(self, input) })
    }

    fn should_rebuild(&self, function_id: &str, file: &Path) -> bool {
        RustRuntime::should_rebuild(self, function_id, file)
    }
}

/// `path` expressed relative to `base`, lexically.
///
/// Both must be absolute (or both relative); `None` otherwise. The result may
/// start with `..` components when `path` is outside `base`.
fn relative_path(base: &Path, path: &Path) -> Option<std::path::PathBuf> {
    use std::path::Component;

    if base.is_absolute() != path.is_absolute() {
        return None;
    }

    let base: Vec<Component> = base.components().filter(|c| *c != Component::CurDir).collect();
    let path: Vec<Component> = path.components().filter(|c| *c != Component::CurDir).collect();

    let common = base
        .iter()
        .zip(path.iter())
        .take_while(|(a, b)| a == b)
        .count();

    // Can't climb out of a `..` we don't know the name of
    if base[common..].contains(&Component::ParentDir) {
        return None;
    }

    let mut rel = std::path::PathBuf::new();
    for _ in common..base.len() {
        rel.push(Component::ParentDir);
    }
    for component in &path[common..] {
        rel.push(component);
    }
    Some(rel)
}
