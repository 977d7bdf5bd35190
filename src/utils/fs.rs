//! File system helpers for recipes and artifacts
//!
//! Recipes must never be observed half-written, so every write goes through
//! [`atomic_write`]: content lands in a temporary file in the destination
//! directory, is synced, and is renamed over the target in one step. The
//! renamed file keeps the mode of the file it replaces; a new file gets the
//! umask default, as if created with [`fs::File::create`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use aur_updater::utils::fs::{atomic_write, ensure_dir};
//! use std::path::Path;
//!
//! # fn example() -> anyhow::Result<()> {
//! ensure_dir(Path::new("downloads"))?;
//! atomic_write(Path::new("linuxqq/PKGBUILD"), b"pkgver=3.2.1\n")?;
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Ensures a directory exists, creating it and all parent directories if necessary.
///
/// # Errors
///
/// Fails if the path exists but is not a directory, or if creation fails.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {}", path.display()))?;
    } else if !path.is_dir() {
        return Err(anyhow::anyhow!("Path exists but is not a directory: {}", path.display()));
    }
    Ok(())
}

/// Creates a temporary file in `dir` that is ready to be renamed over `target`.
///
/// The file carries `target`'s permissions when `target` exists and the
/// process umask default otherwise.
pub fn sibling_temp_file(
    dir: &Path,
    prefix: &str,
    suffix: &str,
    target: &Path,
) -> std::io::Result<tempfile::NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(prefix).suffix(suffix);
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        // Masked by the umask at creation
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    let temp = builder.tempfile_in(dir)?;

    if let Ok(metadata) = fs::metadata(target) {
        temp.as_file().set_permissions(metadata.permissions())?;
    }
    Ok(temp)
}

/// Atomically writes bytes to a file using a write-then-rename strategy.
///
/// 1. Creates a uniquely named temporary file next to `path` (see [`sibling_temp_file`])
/// 2. Writes and syncs the content
/// 3. Renames it over `path`
///
/// The temporary file is removed if any step fails, so the target either keeps
/// its old content or receives the complete new content.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    ensure_dir(parent)?;

    let mut temp = sibling_temp_file(parent, ".tmp", "", path)
        .with_context(|| format!("Failed to create temp file in: {}", parent.display()))?;

    temp.write_all(content)
        .with_context(|| format!("Failed to write temp file for: {}", path.display()))?;
    temp.as_file().sync_all().context("Failed to sync file to disk")?;

    temp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to rename temp file to: {}", path.display()))?;

    Ok(())
}

/// Removes a file if it exists, treating "already gone" as success.
pub fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to remove file: {}", path.display())),
    }
}
