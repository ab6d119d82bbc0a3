//! Copying between live locations and the workspace
//!
//! Each [`StageItem`] pairs a live path with a stable name inside the
//! workspace. `stage_in` copies live to workspace, `stage_out` the reverse.

use std::fs::{self, File, FileTimes};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use super::workspace::Workspace;
use crate::error::{SaveError, SaveResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Dir,
    File,
}

/// A live resource and its name inside the workspace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageItem {
    pub name: String,
    pub live: PathBuf,
    pub kind: ItemKind,
}

impl StageItem {
    pub fn dir(name: impl Into<String>, live: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            live: live.into(),
            kind: ItemKind::Dir,
        }
    }

    pub fn file(name: impl Into<String>, live: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            live: live.into(),
            kind: ItemKind::File,
        }
    }
}

/// Copy one live resource into the workspace
pub fn copy_in(item: &StageItem, workspace: &Workspace) -> SaveResult<()> {
    copy_item(item.kind, &item.live, &workspace.join(&item.name))
}

/// Copy one workspace entry back to its live location
pub fn copy_out(item: &StageItem, workspace: &Workspace) -> SaveResult<()> {
    copy_item(item.kind, &workspace.join(&item.name), &item.live)
}

pub fn stage_in(items: &[StageItem], workspace: &Workspace) -> SaveResult<()> {
    items.iter().try_for_each(|item| copy_in(item, workspace))
}

pub fn stage_out(items: &[StageItem], workspace: &Workspace) -> SaveResult<()> {
    items.iter().try_for_each(|item| copy_out(item, workspace))
}

fn copy_item(kind: ItemKind, src: &Path, dst: &Path) -> SaveResult<()> {
    require_parent(dst)?;
    match kind {
        ItemKind::Dir => copy_dir(src, dst).map(|files| {
            debug!(src = %src.display(), dst = %dst.display(), files, "copied directory");
        }),
        ItemKind::File => copy_file(src, dst),
    }
}

fn require_parent(dst: &Path) -> SaveResult<()> {
    match dst.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.is_dir() => {
            Err(SaveError::path_not_found(parent))
        }
        _ => Ok(()),
    }
}

/// Recursively copy a directory tree, returning the number of files copied
///
/// Symbolic links are skipped.
pub fn copy_dir(src: &Path, dst: &Path) -> SaveResult<usize> {
    if !src.is_dir() {
        return Err(SaveError::path_not_found(src));
    }

    let mut files = 0;
    for entry in WalkDir::new(src).follow_links(false) {
        let entry = entry?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| SaveError::Io(format!("Failed to relativize path: {}", e)))?;
        let out = dst.join(rel);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&out).map_err(|e| {
                SaveError::Io(format!("Failed to create {}: {}", out.display(), e))
            })?;
        } else if entry.file_type().is_symlink() {
            warn!(path = %entry.path().display(), "skipping symbolic link");
        } else {
            copy_file(entry.path(), &out)?;
            files += 1;
        }
    }
    Ok(files)
}

/// Copy a single file, carrying over its modification time
pub fn copy_file(src: &Path, dst: &Path) -> SaveResult<()> {
    if !src.is_file() {
        return Err(SaveError::path_not_found(src));
    }

    fs::copy(src, dst).map_err(|e| {
        SaveError::Io(format!(
            "Failed to copy {} to {}: {}",
            src.display(),
            dst.display(),
            e
        ))
    })?;

    if let Err(e) = preserve_mtime(src, dst) {
        warn!(path = %dst.display(), error = %e, "could not preserve modification time");
    }
    Ok(())
}

/// Remove a file or directory tree; a missing path is not an error
pub fn remove_path(path: &Path) -> SaveResult<()> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path)?,
        Ok(_) => fs::remove_file(path)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

fn preserve_mtime(src: &Path, dst: &Path) -> std::io::Result<()> {
    let modified = fs::metadata(src)?.modified()?;
    let file = File::options().write(true).open(dst)?;
    file.set_times(FileTimes::new().set_modified(modified))
}
