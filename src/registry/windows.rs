//! Windows registry backend
//!
//! Values and keys go through `winreg`. Key trees are exported to and imported
//! from `.reg` files with `reg.exe`, which is what the game's own tooling
//! produces and what users can inspect by hand.

use std::fs;
use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

use tracing::debug;
use winreg::enums::{HKEY_CURRENT_USER, HKEY_LOCAL_MACHINE, KEY_SET_VALUE, REG_BINARY};
use winreg::{RegKey, RegValue};

use super::{reg_file_keys, Hive, Registry, RegistryPath};
use crate::error::{SaveError, SaveResult};

/// The live registry of the current Windows user
#[derive(Debug, Default)]
pub struct WindowsRegistry;

impl WindowsRegistry {
    pub fn new() -> Self {
        Self
    }

    fn root(hive: Hive) -> RegKey {
        match hive {
            Hive::CurrentUser => RegKey::predef(HKEY_CURRENT_USER),
            Hive::LocalMachine => RegKey::predef(HKEY_LOCAL_MACHINE),
        }
    }

    fn open(path: &RegistryPath) -> SaveResult<RegKey> {
        Self::root(path.hive())
            .open_subkey(path.key())
            .map_err(|e| key_error(path, e))
    }
}

fn key_error(path: &RegistryPath, err: io::Error) -> SaveError {
    if err.kind() == io::ErrorKind::NotFound {
        SaveError::key_not_found(path.to_string())
    } else {
        SaveError::Registry(format!("{}: {}", path, err))
    }
}

fn run_reg(args: &[&str]) -> SaveResult<()> {
    debug!(?args, "running reg.exe");
    let status = Command::new("reg")
        .args(args)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map_err(|e| SaveError::Registry(format!("Failed to run reg.exe: {}", e)))?;

    if status.success() {
        Ok(())
    } else {
        Err(SaveError::Registry(format!(
            "reg {} exited with {}",
            args.first().copied().unwrap_or_default(),
            status
        )))
    }
}

impl Registry for WindowsRegistry {
    fn read_string(&self, path: &RegistryPath, value: &str) -> SaveResult<String> {
        Self::open(path)?
            .get_value::<String, _>(value)
            .map_err(|e| {
                if e.kind() == io::ErrorKind::NotFound {
                    SaveError::value_not_found(format!("{}\\{}", path, value))
                } else {
                    SaveError::Registry(format!("{}\\{}: {}", path, value, e))
                }
            })
    }

    fn write_binary(&self, path: &RegistryPath, value: &str, data: &[u8]) -> SaveResult<()> {
        let key = Self::root(path.hive())
            .open_subkey_with_flags(path.key(), KEY_SET_VALUE)
            .map_err(|e| key_error(path, e))?;

        let raw = RegValue {
            bytes: data.to_vec(),
            vtype: REG_BINARY,
        };
        key.set_raw_value(value, &raw)
            .map_err(|e| SaveError::Registry(format!("{}\\{}: {}", path, value, e)))
    }

    fn key_exists(&self, path: &RegistryPath) -> bool {
        Self::open(path).is_ok()
    }

    fn delete_key(&self, path: &RegistryPath) -> SaveResult<()> {
        match Self::root(path.hive()).delete_subkey_all(path.key()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(key_error(path, e)),
        }
    }

    fn enumerate_subkeys(&self, path: &RegistryPath) -> SaveResult<Vec<String>> {
        Self::open(path)?
            .enum_keys()
            .collect::<io::Result<Vec<String>>>()
            .map_err(|e| SaveError::Registry(format!("{}: {}", path, e)))
    }

    fn export_key(&self, path: &RegistryPath, file: &Path) -> SaveResult<()> {
        if !self.key_exists(path) {
            return Err(SaveError::key_not_found(path.to_string()));
        }
        let key = path.to_string();
        let file = file.to_string_lossy();
        run_reg(&["export", &key, &file, "/y"])
    }

    fn import_file(&self, file: &Path) -> SaveResult<()> {
        if !file.is_file() {
            return Err(SaveError::path_not_found(file));
        }
        let file = file.to_string_lossy();
        run_reg(&["import", &file])
    }

    fn exported_keys(&self, file: &Path) -> SaveResult<Vec<RegistryPath>> {
        if !file.is_file() {
            return Err(SaveError::path_not_found(file));
        }
        let bytes = fs::read(file)
            .map_err(|e| SaveError::Io(format!("Failed to read {}: {}", file.display(), e)))?;
        reg_file_keys(&bytes)
    }
}
