//! In-memory registry backend
//!
//! Holds keys and values in a map. Export and import go through a small JSON
//! document, so a key tree exported here can be archived and imported again
//! just like a `.reg` file on Windows.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{Hive, Registry, RegistryPath};
use crate::error::{SaveError, SaveResult};
use crate::storage::{read_json_required, write_json_atomic};

/// A registry value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum RegData {
    String(String),
    Binary(Vec<u8>),
}

type Values = BTreeMap<String, RegData>;

/// Exported key tree; subkey paths are relative to `root`
#[derive(Debug, Serialize, Deserialize)]
struct ExportDocument {
    hive: Hive,
    root: String,
    keys: BTreeMap<String, Values>,
}

/// One key of a persisted registry file
#[derive(Debug, Serialize, Deserialize)]
struct StoredKey {
    hive: Hive,
    key: String,
    values: Values,
}

/// Registry held entirely in memory
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    keys: RefCell<BTreeMap<(Hive, String), Values>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a key (and implicitly its parents) without values
    pub fn create_key(&self, path: &RegistryPath) {
        self.keys
            .borrow_mut()
            .entry(map_key(path))
            .or_default();
    }

    /// Set a value, creating the key if needed
    pub fn set_value(&self, path: &RegistryPath, value: &str, data: RegData) {
        self.keys
            .borrow_mut()
            .entry(map_key(path))
            .or_default()
            .insert(value.to_string(), data);
    }

    /// Read any value as stored
    pub fn value(&self, path: &RegistryPath, value: &str) -> Option<RegData> {
        self.keys
            .borrow()
            .get(&map_key(path))
            .and_then(|values| values.get(value))
            .cloned()
    }

    /// Copy of the full contents, for before/after comparisons
    pub fn snapshot(&self) -> BTreeMap<(Hive, String), BTreeMap<String, RegData>> {
        self.keys.borrow().clone()
    }

    /// Load a registry persisted with [`MemoryRegistry::save`]
    ///
    /// A missing file yields an empty registry.
    pub fn load(file: &Path) -> SaveResult<Self> {
        let registry = Self::new();
        if !file.exists() {
            return Ok(registry);
        }

        let stored: Vec<StoredKey> = read_json_required(file)?;
        {
            let mut keys = registry.keys.borrow_mut();
            for entry in stored {
                let path = RegistryPath::new(entry.hive, &entry.key);
                keys.insert(map_key(&path), entry.values);
            }
        }
        Ok(registry)
    }

    /// Persist every key and value to `file`
    pub fn save(&self, file: &Path) -> SaveResult<()> {
        let stored: Vec<StoredKey> = self
            .keys
            .borrow()
            .iter()
            .map(|((hive, key), values)| StoredKey {
                hive: *hive,
                key: key.clone(),
                values: values.clone(),
            })
            .collect();
        write_json_atomic(file, &stored)
    }

    /// Keys equal to `path` or below it
    fn subtree(&self, path: &RegistryPath) -> Vec<(String, Values)> {
        let prefix = format!("{}\\", path.key());
        self.keys
            .borrow()
            .iter()
            .filter(|((hive, key), _)| {
                *hive == path.hive() && (key == path.key() || key.starts_with(&prefix))
            })
            .map(|((_, key), values)| (key.clone(), values.clone()))
            .collect()
    }
}

fn map_key(path: &RegistryPath) -> (Hive, String) {
    (path.hive(), path.key().to_string())
}

impl Registry for MemoryRegistry {
    fn read_string(&self, path: &RegistryPath, value: &str) -> SaveResult<String> {
        if !self.key_exists(path) {
            return Err(SaveError::key_not_found(path.to_string()));
        }
        match self.value(path, value) {
            Some(RegData::String(s)) => Ok(s),
            Some(RegData::Binary(_)) => Err(SaveError::Registry(format!(
                "{}\\{} is not a string value",
                path, value
            ))),
            None => Err(SaveError::value_not_found(format!("{}\\{}", path, value))),
        }
    }

    fn write_binary(&self, path: &RegistryPath, value: &str, data: &[u8]) -> SaveResult<()> {
        if !self.key_exists(path) {
            return Err(SaveError::key_not_found(path.to_string()));
        }
        self.set_value(path, value, RegData::Binary(data.to_vec()));
        Ok(())
    }

    fn key_exists(&self, path: &RegistryPath) -> bool {
        !self.subtree(path).is_empty()
    }

    fn delete_key(&self, path: &RegistryPath) -> SaveResult<()> {
        let doomed = self.subtree(path);
        let mut keys = self.keys.borrow_mut();
        for (key, _) in doomed {
            keys.remove(&(path.hive(), key));
        }
        Ok(())
    }

    fn enumerate_subkeys(&self, path: &RegistryPath) -> SaveResult<Vec<String>> {
        if !self.key_exists(path) {
            return Err(SaveError::key_not_found(path.to_string()));
        }

        let prefix = format!("{}\\", path.key());
        let mut names: Vec<String> = self
            .subtree(path)
            .into_iter()
            .filter_map(|(key, _)| {
                key.strip_prefix(&prefix)
                    .and_then(|rest| rest.split('\\').next())
                    .map(str::to_string)
            })
            .collect();
        names.sort();
        names.dedup();
        Ok(names)
    }

    fn export_key(&self, path: &RegistryPath, file: &Path) -> SaveResult<()> {
        let subtree = self.subtree(path);
        if subtree.is_empty() {
            return Err(SaveError::key_not_found(path.to_string()));
        }

        let root_prefix = format!("{}\\", path.key());
        let keys = subtree
            .into_iter()
            .map(|(key, values)| {
                let relative = key
                    .strip_prefix(&root_prefix)
                    .map(str::to_string)
                    .unwrap_or_default();
                (relative, values)
            })
            .collect();

        let document = ExportDocument {
            hive: path.hive(),
            root: path.key().to_string(),
            keys,
        };
        write_json_atomic(file, &document)
    }

    fn import_file(&self, file: &Path) -> SaveResult<()> {
        let document: ExportDocument = read_json_required(file)?;
        let root = RegistryPath::new(document.hive, &document.root);

        for (relative, values) in document.keys {
            let path = root.join(&relative);
            self.create_key(&path);
            for (name, data) in values {
                self.set_value(&path, &name, data);
            }
        }
        Ok(())
    }

    fn exported_keys(&self, file: &Path) -> SaveResult<Vec<RegistryPath>> {
        let document: ExportDocument = read_json_required(file)?;
        let root = RegistryPath::new(document.hive, &document.root);
        Ok(document
            .keys
            .keys()
            .map(|relative| root.join(relative))
            .collect())
    }
}
