//! Registry access for bwsave
//!
//! The game keeps its profile list, per-profile settings and the last used
//! profile in the Windows registry. Everything in the crate talks to the
//! registry through the [`Registry`] trait so that the pipelines can run
//! against [`MemoryRegistry`] in tests.
//!
//! Absent keys and values are reported as [`SaveError::NotFound`]; callers
//! treat those as benign where "nothing there" is a valid answer.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{SaveError, SaveResult};

mod memory;
#[cfg(windows)]
mod windows;

pub use memory::{MemoryRegistry, RegData};
#[cfg(windows)]
pub use windows::WindowsRegistry;

/// Top-level registry hive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum Hive {
    #[default]
    #[serde(rename = "HKEY_CURRENT_USER")]
    CurrentUser,
    #[serde(rename = "HKEY_LOCAL_MACHINE")]
    LocalMachine,
}

impl Hive {
    pub fn as_str(&self) -> &'static str {
        match self {
            Hive::CurrentUser => "HKEY_CURRENT_USER",
            Hive::LocalMachine => "HKEY_LOCAL_MACHINE",
        }
    }

    /// Parse a hive name, long or abbreviated, ignoring case
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "HKEY_CURRENT_USER" | "HKCU" => Some(Hive::CurrentUser),
            "HKEY_LOCAL_MACHINE" | "HKLM" => Some(Hive::LocalMachine),
            _ => None,
        }
    }
}

impl fmt::Display for Hive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A key inside a hive, e.g. `HKEY_CURRENT_USER\Software\Vendor\Game`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryPath {
    hive: Hive,
    key: String,
}

impl RegistryPath {
    pub fn new(hive: Hive, key: impl AsRef<str>) -> Self {
        Self {
            hive,
            key: normalize_key(key.as_ref()),
        }
    }

    /// Append one or more `\`-separated components
    pub fn join(&self, sub: impl AsRef<str>) -> Self {
        let sub = normalize_key(sub.as_ref());
        let key = match (self.key.is_empty(), sub.is_empty()) {
            (_, true) => self.key.clone(),
            (true, false) => sub,
            (false, false) => format!("{}\\{}", self.key, sub),
        };
        Self {
            hive: self.hive,
            key,
        }
    }

    pub fn hive(&self) -> Hive {
        self.hive
    }

    /// Key path below the hive
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Parse a full path such as `HKEY_CURRENT_USER\Software\Game`
    pub fn parse(full: &str) -> Option<Self> {
        let full = full.trim();
        let (hive, key) = full.split_once('\\').unwrap_or((full, ""));
        Hive::from_name(hive).map(|hive| Self::new(hive, key))
    }

    /// Whether `other` is this key or one of its subkeys
    ///
    /// Key names compare case-insensitively, as they do in the registry.
    pub fn contains(&self, other: &RegistryPath) -> bool {
        if self.hive != other.hive {
            return false;
        }
        if self.key.is_empty() {
            return true;
        }
        let own = self.key.to_lowercase();
        let theirs = other.key.to_lowercase();
        theirs == own || theirs.starts_with(&format!("{}\\", own))
    }
}

impl fmt::Display for RegistryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.key.is_empty() {
            write!(f, "{}", self.hive)
        } else {
            write!(f, "{}\\{}", self.hive, self.key)
        }
    }
}

fn normalize_key(key: &str) -> String {
    key.split(['\\', '/'])
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("\\")
}

/// Capability interface over a hierarchical key/value registry
pub trait Registry {
    /// Read a string value
    fn read_string(&self, path: &RegistryPath, value: &str) -> SaveResult<String>;

    /// Read a string value holding a path, expanding `%VAR%` references
    fn read_expanded_path(&self, path: &RegistryPath, value: &str) -> SaveResult<PathBuf> {
        let raw = self.read_string(path, value)?;
        Ok(PathBuf::from(expand_env_vars(&raw)))
    }

    /// Write a binary value, creating nothing: the key must already exist
    fn write_binary(&self, path: &RegistryPath, value: &str, data: &[u8]) -> SaveResult<()>;

    /// Whether the key exists; any error counts as "no"
    fn key_exists(&self, path: &RegistryPath) -> bool;

    /// Delete a key with all its subkeys; a missing key is not an error
    fn delete_key(&self, path: &RegistryPath) -> SaveResult<()>;

    /// Names of the direct subkeys
    fn enumerate_subkeys(&self, path: &RegistryPath) -> SaveResult<Vec<String>>;

    /// Export a key tree into a file that [`Registry::import_file`] accepts
    fn export_key(&self, path: &RegistryPath, file: &Path) -> SaveResult<()>;

    /// Import a file written by [`Registry::export_key`]
    fn import_file(&self, file: &Path) -> SaveResult<()>;

    /// Every key an import of `file` would write, without importing it
    fn exported_keys(&self, file: &Path) -> SaveResult<Vec<RegistryPath>>;
}

/// Fail unless every key in the export `file` lies at or below `root`
///
/// An export that names no keys at all is rejected too.
pub fn ensure_export_within(
    registry: &dyn Registry,
    file: &Path,
    root: &RegistryPath,
) -> SaveResult<()> {
    let keys = registry.exported_keys(file)?;
    if keys.is_empty() {
        return Err(SaveError::Validation(format!(
            "{} contains no registry keys",
            file.display()
        )));
    }
    match keys.iter().find(|key| !root.contains(key)) {
        Some(outside) => Err(SaveError::Validation(format!(
            "{} writes {}, which is outside {}",
            file.display(),
            outside,
            root
        ))),
        None => Ok(()),
    }
}

/// Section headers of a `.reg` file as registry paths
///
/// Accepts the UTF-16LE files `reg export` writes as well as UTF-8. Deletion
/// sections (`[-HKEY_...]`) count as keys the import touches.
pub fn reg_file_keys(bytes: &[u8]) -> SaveResult<Vec<RegistryPath>> {
    let text = match bytes {
        [0xFF, 0xFE, rest @ ..] => {
            let units: Vec<u16> = rest
                .chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16(&units)
                .map_err(|e| SaveError::Registry(format!("Invalid UTF-16 in .reg file: {}", e)))?
        }
        [0xEF, 0xBB, 0xBF, rest @ ..] => String::from_utf8(rest.to_vec())
            .map_err(|e| SaveError::Registry(format!("Invalid UTF-8 in .reg file: {}", e)))?,
        _ => String::from_utf8(bytes.to_vec())
            .map_err(|e| SaveError::Registry(format!("Invalid UTF-8 in .reg file: {}", e)))?,
    };

    let mut keys = Vec::new();
    for line in text.lines().map(str::trim) {
        let Some(section) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) else {
            continue;
        };
        let section = section.strip_prefix('-').unwrap_or(section);
        let path = RegistryPath::parse(section).ok_or_else(|| {
            SaveError::Validation(format!("Unsupported registry section [{}]", section))
        })?;
        keys.push(path);
    }
    Ok(keys)
}

/// Registry of the running system
#[cfg(windows)]
pub fn system_registry() -> SaveResult<Box<dyn Registry>> {
    Ok(Box::new(WindowsRegistry::new()))
}

/// Registry of the running system
#[cfg(not(windows))]
pub fn system_registry() -> SaveResult<Box<dyn Registry>> {
    Err(SaveError::Unsupported(
        "the Windows registry is only available on Windows".into(),
    ))
}

/// Encode the last-used-profile marker the way the game stores it
///
/// Underscores are dropped, a trailing `.` is appended and the result is
/// stored as UTF-16LE bytes.
pub fn encode_profile_marker(profile_name: &str) -> Vec<u8> {
    let marker = format!("{}.", profile_name.replace('_', ""));
    marker.encode_utf16().flat_map(u16::to_le_bytes).collect()
}

/// Expand `%NAME%` references from the environment
///
/// Unknown variables are left untouched, as is an unmatched `%`.
pub fn expand_env_vars(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(start) = rest.find('%') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('%') {
            Some(end) => {
                let name = &after[..end];
                match std::env::var(name) {
                    Ok(value) if !name.is_empty() => out.push_str(&value),
                    _ => {
                        out.push('%');
                        out.push_str(name);
                        out.push('%');
                    }
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push('%');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}
