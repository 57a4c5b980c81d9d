//! Filesystem convenience helpers returning `tbl_errors::Error`.

use std::io::Write;
use std::path::{Path, PathBuf};

use tbl_errors::{Error, StorageError};
use tokio::fs;
use tokio::task;

/// Result type for filesystem operations
pub type Result<T> = std::result::Result<T, Error>;

/// Permission bits for every directory the launcher creates.
pub const PRIVATE_DIR_MODE: u32 = 0o700;

/// Create `path` and any missing parents with owner-only permissions.
///
/// Existing directories are left untouched, including their mode.
///
/// # Errors
///
/// Returns `StorageError::CreateDirFailed` if any component cannot be created.
pub async fn create_private_dir(path: &Path) -> Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(PRIVATE_DIR_MODE);

    builder.create(path).await.map_err(|e| {
        StorageError::CreateDirFailed {
            path: path.display().to_string(),
            message: e.to_string(),
        }
        .into()
    })
}

/// Check that the current process can create files inside `dir`.
///
/// Probes with a real temporary file instead of inspecting mode bits, so ACLs,
/// read-only mounts and ownership are all accounted for.
///
/// # Errors
///
/// Returns `StorageError::NotWritable` if the probe file cannot be created.
pub async fn check_writable(dir: &Path) -> Result<()> {
    let owned = dir.to_path_buf();
    let probe = task::spawn_blocking(move || {
        tempfile::Builder::new()
            .prefix(".tbl-probe")
            .tempfile_in(&owned)
            .map(drop)
    })
    .await
    .map_err(|e| Error::internal(format!("writability probe panicked: {e}")))?;

    probe.map_err(|_| {
        StorageError::NotWritable {
            path: dir.display().to_string(),
        }
        .into()
    })
}

/// Create a private directory if needed and verify it is writable.
///
/// # Errors
///
/// Returns the creation or writability error for `path`.
pub async fn ensure_private_dir(path: &Path) -> Result<()> {
    create_private_dir(path).await?;
    check_writable(path).await
}

/// Replace the contents of `path` without exposing a partially written file.
///
/// The bytes are written to a temporary sibling, flushed to disk, and renamed
/// over the destination. The resulting file is readable only by the owner.
///
/// # Errors
///
/// Returns an error if the parent directory is missing or unwritable, or if
/// the final rename fails.
pub async fn atomic_write(path: &Path, contents: &[u8]) -> Result<()> {
    let dest = path.to_path_buf();
    let parent = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let contents = contents.to_vec();

    task::spawn_blocking(move || -> Result<()> {
        let mut tmp = tempfile::Builder::new()
            .prefix(".tbl-write")
            .tempfile_in(&parent)
            .map_err(|e| StorageError::from_io_with_path(&e, &parent))?;
        tmp.write_all(&contents)
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| StorageError::from_io_with_path(&e, tmp.path()))?;
        tmp.persist(&dest).map_err(|e| StorageError::AtomicRenameFailed {
            message: format!("{}: {}", dest.display(), e.error),
        })?;
        Ok(())
    })
    .await
    .map_err(|e| Error::internal(format!("atomic write panicked: {e}")))?
}

/// Remove a directory and all its contents
///
/// # Errors
///
/// Returns an error if the directory cannot be removed.
pub async fn remove_dir_all(path: &Path) -> Result<()> {
    fs::remove_dir_all(path)
        .await
        .map_err(|e| StorageError::from_io_with_path(&e, path).into())
}

/// Remove a single file
///
/// # Errors
///
/// Returns an error if the file cannot be removed.
pub async fn remove_file(path: &Path) -> Result<()> {
    fs::remove_file(path)
        .await
        .map_err(|e| StorageError::from_io_with_path(&e, path).into())
}

/// Rename `src` to `dst` on the same filesystem
///
/// # Errors
///
/// Returns an error if the rename fails (permissions, cross-device, etc.)
pub async fn rename(src: &Path, dst: &Path) -> Result<()> {
    fs::rename(src, dst).await.map_err(|e| {
        StorageError::AtomicRenameFailed {
            message: format!("{} -> {}: {e}", src.display(), dst.display()),
        }
        .into()
    })
}

/// Check if a path exists
pub async fn exists(path: &Path) -> bool {
    fs::try_exists(path).await.unwrap_or(false)
}

/// Check if a path is a regular file
pub async fn is_file(path: &Path) -> bool {
    fs::metadata(path).await.is_ok_and(|m| m.is_file())
}

/// Check if a path is a directory
pub async fn is_dir(path: &Path) -> bool {
    fs::metadata(path).await.is_ok_and(|m| m.is_dir())
}
