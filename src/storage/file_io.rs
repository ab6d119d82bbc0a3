//! File I/O utilities with atomic writes
//!
//! Provides safe file operations that won't leave half-written files behind.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::SaveError;

/// Read JSON from a file, returning an error if file doesn't exist
pub fn read_json_required<T, P>(path: P) -> Result<T, SaveError>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    if !path.is_file() {
        return Err(SaveError::path_not_found(path));
    }

    let file = File::open(path)
        .map_err(|e| SaveError::Io(format!("Failed to open {}: {}", path.display(), e)))?;

    let reader = BufReader::new(file);
    serde_json::from_reader(reader)
        .map_err(|e| SaveError::Json(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Write compact JSON to a file atomically (write to temp, then rename)
///
/// The parent directory must already exist.
pub fn write_json_atomic<T, P>(path: P, data: &T) -> Result<(), SaveError>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    write_atomic(path, |writer| {
        serde_json::to_writer(writer, data)
            .map_err(|e| SaveError::Json(format!("Failed to serialize data: {}", e)))
    })
}

/// Write a file through a temp sibling and rename it into place
///
/// `fill` receives a buffered writer for the temp file. On any failure the
/// temp file is removed and `path` is left as it was.
pub fn write_atomic<P, F>(path: P, fill: F) -> Result<(), SaveError>
where
    P: AsRef<Path>,
    F: FnOnce(&mut BufWriter<File>) -> Result<(), SaveError>,
{
    let path = path.as_ref();

    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.is_dir() => {
            return Err(SaveError::path_not_found(parent));
        }
        _ => {}
    }

    let temp_path = temp_sibling(path);
    let result = (|| {
        let file = File::create(&temp_path)
            .map_err(|e| SaveError::Io(format!("Failed to create temp file: {}", e)))?;

        let mut writer = BufWriter::new(file);
        fill(&mut writer)?;

        writer
            .flush()
            .map_err(|e| SaveError::Io(format!("Failed to flush data: {}", e)))?;

        writer
            .get_ref()
            .sync_all()
            .map_err(|e| SaveError::Io(format!("Failed to sync data: {}", e)))?;

        fs::rename(&temp_path, path)
            .map_err(|e| SaveError::Io(format!("Failed to rename temp file: {}", e)))
    })();

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

/// `name.ext` -> `name.ext.tmp` in the same directory (same filesystem for rename)
fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
