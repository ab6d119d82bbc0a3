//! Path management for bwsave
//!
//! Resolves where bwsave keeps its own configuration and where transient
//! workspaces are created.
//!
//! ## Path Resolution Order
//!
//! 1. `BWSAVE_CONFIG_DIR` environment variable (if set)
//! 2. Platform config directory from `directories` (`%APPDATA%\bwsave\config`
//!    on Windows, `~/.config/bwsave` on Linux)

use std::path::{Path, PathBuf};

use directories::{ProjectDirs, UserDirs};

use crate::error::SaveError;

/// Manages all paths used by bwsave itself (not the game's paths)
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Base directory for the configuration file
    base_dir: PathBuf,
    /// Directory under which the workspace is created
    temp_root: PathBuf,
}

impl AppPaths {
    /// Create a new AppPaths instance
    ///
    /// # Errors
    ///
    /// Returns an error if no home directory can be determined.
    pub fn new() -> Result<Self, SaveError> {
        let base_dir = if let Ok(custom) = std::env::var("BWSAVE_CONFIG_DIR") {
            PathBuf::from(custom)
        } else {
            ProjectDirs::from("", "", "bwsave")
                .map(|dirs| dirs.config_dir().to_path_buf())
                .ok_or_else(|| {
                    SaveError::Config("Could not determine the configuration directory".into())
                })?
        };

        Ok(Self {
            base_dir,
            temp_root: std::env::temp_dir(),
        })
    }

    /// Create AppPaths with custom directories (useful for testing)
    pub fn with_dirs(base_dir: PathBuf, temp_root: PathBuf) -> Self {
        Self {
            base_dir,
            temp_root,
        }
    }

    /// Get the base directory
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the directory the workspace is created in
    pub fn temp_root(&self) -> &Path {
        &self.temp_root
    }

    /// Desktop directory as known to the OS user-dirs database
    ///
    /// Used when the registry does not yield a desktop path.
    pub fn fallback_desktop(&self) -> Option<PathBuf> {
        UserDirs::new().and_then(|dirs| dirs.desktop_dir().map(Path::to_path_buf))
    }

    /// Ensure the configuration directory exists
    pub fn ensure_directories(&self) -> Result<(), SaveError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| SaveError::Io(format!("Failed to create config directory: {}", e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_custom_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let paths = AppPaths::with_dirs(
            temp_dir.path().join("config"),
            temp_dir.path().join("tmp"),
        );

        assert_eq!(paths.base_dir(), temp_dir.path().join("config"));
        assert_eq!(paths.temp_root(), temp_dir.path().join("tmp"));
        assert_eq!(
            paths.settings_file(),
            temp_dir.path().join("config").join("config.json")
        );
    }

    #[test]
    fn test_env_var_override() {
        let temp_dir = TempDir::new().unwrap();

        std::env::set_var("BWSAVE_CONFIG_DIR", temp_dir.path());
        let paths = AppPaths::new().unwrap();
        std::env::remove_var("BWSAVE_CONFIG_DIR");

        assert_eq!(paths.base_dir(), temp_dir.path());
    }

    #[test]
    fn test_ensure_directories() {
        let temp_dir = TempDir::new().unwrap();
        let paths = AppPaths::with_dirs(
            temp_dir.path().join("nested").join("config"),
            temp_dir.path().to_path_buf(),
        );

        paths.ensure_directories().unwrap();
        assert!(paths.base_dir().exists());
    }
}
