//! Zip packing and unpacking of a workspace
//!
//! Entries are stored relative to the workspace root with `/` separators, in
//! sorted order, so the same tree always produces the same entry list.

use std::fs::{self, File};
use std::io;
use std::path::{Component, Path};

use tracing::debug;
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::workspace::Workspace;
use crate::error::{SaveError, SaveResult};
use crate::models::Manifest;
use crate::storage::{read_json_required, write_atomic, write_json_atomic};

/// What `pack` does when the destination archive already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExistingArchive {
    Refuse,
    Replace,
}

/// Pack the whole workspace into `destination`
///
/// The archive is written to a temp sibling and renamed into place, so a
/// failure leaves any previous archive untouched.
pub fn pack(workspace: &Workspace, destination: &Path, existing: ExistingArchive) -> SaveResult<()> {
    if existing == ExistingArchive::Refuse && destination.exists() {
        return Err(SaveError::Collision {
            entity_type: "Archive",
            identifier: destination.display().to_string(),
        });
    }

    let root = workspace.path();
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    write_atomic(destination, |writer| {
        let mut zip = ZipWriter::new(writer);

        for entry in WalkDir::new(root).sort_by_file_name().follow_links(false) {
            let entry = entry?;
            let rel = entry
                .path()
                .strip_prefix(root)
                .map_err(|e| SaveError::Archive(format!("Failed to relativize path: {}", e)))?;
            if rel.as_os_str().is_empty() {
                continue;
            }
            let name = entry_name(rel)?;

            if entry.file_type().is_dir() {
                zip.add_directory(name, options)?;
            } else if entry.file_type().is_file() {
                zip.start_file(name, options)?;
                let mut file = File::open(entry.path())?;
                io::copy(&mut file, &mut zip)?;
            }
        }

        zip.finish()?;
        Ok(())
    })?;

    debug!(archive = %destination.display(), "archive written");
    Ok(())
}

/// Extract `archive` into the workspace
pub fn unpack(archive: &Path, workspace: &Workspace) -> SaveResult<()> {
    if !archive.is_file() {
        return Err(SaveError::path_not_found(archive));
    }

    let file = File::open(archive)?;
    let mut zip = ZipArchive::new(file)
        .map_err(|e| SaveError::Archive(format!("{}: {}", archive.display(), e)))?;

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;
        let rel = entry
            .enclosed_name()
            .map(Path::to_path_buf)
            .ok_or_else(|| {
                SaveError::Archive(format!("unsafe entry name: {}", entry.name()))
            })?;
        let out = workspace.join(&rel);

        if entry.is_dir() {
            fs::create_dir_all(&out)?;
        } else {
            if let Some(parent) = out.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut dest = File::create(&out)?;
            io::copy(&mut entry, &mut dest)?;
        }
    }

    debug!(archive = %archive.display(), entries = zip.len(), "archive unpacked");
    Ok(())
}

/// Entry names in archive order
pub fn list_entries(archive: &Path) -> SaveResult<Vec<String>> {
    if !archive.is_file() {
        return Err(SaveError::path_not_found(archive));
    }
    let mut zip = ZipArchive::new(File::open(archive)?)?;
    (0..zip.len())
        .map(|i| -> SaveResult<String> { Ok(zip.by_index(i)?.name().to_string()) })
        .collect()
}

pub fn write_manifest(workspace: &Workspace, file_name: &str, manifest: &Manifest) -> SaveResult<()> {
    write_json_atomic(workspace.join(file_name), manifest)
}

pub fn read_manifest(workspace: &Workspace, file_name: &str) -> SaveResult<Manifest> {
    read_json_required(workspace.join(file_name))
}

fn entry_name(rel: &Path) -> SaveResult<String> {
    let mut parts = Vec::new();
    for component in rel.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str().ok_or_else(|| {
                SaveError::Archive(format!("non UTF-8 path: {}", rel.display()))
            })?),
            _ => {
                return Err(SaveError::Archive(format!(
                    "unexpected path component in {}",
                    rel.display()
                )))
            }
        }
    }
    Ok(parts.join("/"))
}
