//! Project root discovery
//!
//! A function's handler lives somewhere inside a cargo project. The project
//! root is the nearest ancestor directory holding a `Cargo.toml`.

use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

pub const MANIFEST_FILE: &str = "Cargo.toml";

/// Find the project root for `handler`.
///
/// The walk starts at the handler's parent directory; the handler itself does
/// not have to exist. Relative paths are resolved against the current
/// working directory and `..` is folded away, so the returned root is always
/// absolute and clean.
pub fn locate(handler: &Path) -> Result<PathBuf> {
    let handler = normalize(&std::path::absolute(handler)?);
    let mut current = match handler.parent() {
        Some(parent) => parent.to_path_buf(),
        None => {
            return Err(Error::ManifestNotFound {
                path: handler.clone(),
            });
        }
    };

    loop {
        if current.join(MANIFEST_FILE).is_file() {
            tracing::debug!("Found {} in {:?}", MANIFEST_FILE, current);
            return Ok(current);
        }

        if !current.pop() {
            break;
        }
    }

    Err(Error::ManifestNotFound { path: handler })
}

/// Lexically clean `path`: drop `.` and fold each `..` into the component
/// before it.
///
/// Symlinks are not resolved. A `..` directly under the root stays at the
/// root; leading `..` of a relative path are kept.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(Component::ParentDir),
            },
            other => out.push(other),
        }
    }
    out
}

/// Artifact name for a handler: its file name with the extension stripped.
pub fn artifact_name(handler: &Path) -> Result<String> {
    handler
        .file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
        .ok_or_else(|| Error::InvalidHandler(handler.display().to_string()))
}
