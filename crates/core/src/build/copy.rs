use std::io;
use std::path::Path;

/// Copy the built artifact into place and flush it to stable storage.
///
/// Missing parent directories of `dst` are created. Permissions are copied
/// along with the contents so the artifact stays executable.
pub async fn copy_artifact(src: &Path, dst: &Path) -> io::Result<()> {
    tracing::info!(src = %src.display(), dst = %dst.display(), "copying bootstrap file");

    if let Some(parent) = dst.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(|e| {
            io::Error::new(
                e.kind(),
                format!("failed to create destination directories for {}: {e}", dst.display()),
            )
        })?;
    }

    tokio::fs::copy(src, dst).await.map_err(|e| {
        io::Error::new(
            e.kind(),
            format!("failed to copy {} to {}: {e}", src.display(), dst.display()),
        )
    })?;

    let file = tokio::fs::File::open(dst).await?;
    file.sync_all().await?;

    Ok(())
}
