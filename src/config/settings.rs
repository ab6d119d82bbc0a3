//! User configuration for bwsave
//!
//! Describes where the game keeps its state (registry layout, directories
//! relative to the install directory, file naming) and how bwsave lays out
//! its workspace and archive. Built once at startup and passed by reference.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::paths::AppPaths;
use crate::error::SaveError;
use crate::i18n::Language;
use crate::registry::Hive;

/// A registry key plus the name of one value under it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueLocation {
    /// Key path below the hive
    pub key: String,
    /// Value name
    pub value: String,
}

impl ValueLocation {
    fn new(key: &str, value: &str) -> Self {
        Self {
            key: key.to_string(),
            value: value.to_string(),
        }
    }
}

/// Where the game stores its registry state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryLayout {
    /// Hive holding every key below
    #[serde(default)]
    pub hive: Hive,

    /// Install directory of the game
    #[serde(default = "default_game_dir")]
    pub game_dir: ValueLocation,

    /// The user's desktop (archive destination)
    #[serde(default = "default_desktop_dir")]
    pub desktop_dir: ValueLocation,

    /// Key holding the profile container and the last-profile value
    #[serde(default = "default_profiles_base")]
    pub profiles_base: String,

    /// Container key below `profiles_base`; one subkey per profile
    #[serde(default = "default_profiles_subpath")]
    pub profiles_subpath: String,

    /// Value under a profile key naming its creature mind file
    #[serde(default = "default_mind_value")]
    pub mind_value: String,

    /// Binary value under `profiles_base` naming the last used profile
    #[serde(default = "default_last_profile_value")]
    pub last_profile_value: String,
}

/// Where the game stores its files, relative to the install directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameLayout {
    /// Directory containing one subdirectory per profile
    #[serde(default = "default_profile_dir")]
    pub profile_dir: String,

    /// Directory containing mind and physique files
    #[serde(default = "default_mind_dir")]
    pub mind_dir: String,

    /// Prefix put in front of the mind filename to form the physique filename
    #[serde(default = "default_physique_prefix")]
    pub physique_prefix: String,

    /// Replaces the mind file's extension in the physique filename when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physique_extension: Option<String>,
}

/// Names used inside the workspace and archive
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceLayout {
    /// Fixed subdirectory of the platform temp dir
    #[serde(default = "default_workspace_dir")]
    pub workspace_dir: String,

    /// Manifest file name
    #[serde(default = "default_manifest_file")]
    pub manifest_file: String,

    /// Exported registry key file name
    #[serde(default = "default_registry_file")]
    pub registry_file: String,
}

/// Complete bwsave configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    #[serde(default)]
    pub registry: RegistryLayout,

    #[serde(default)]
    pub game: GameLayout,

    #[serde(default)]
    pub workspace: WorkspaceLayout,

    /// Archive destination; the desktop is used when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,

    /// Forces a message language instead of detecting it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
}

fn default_schema_version() -> u32 {
    1
}

fn default_game_dir() -> ValueLocation {
    ValueLocation::new(r"Software\Lionhead Studios Ltd\Black & White", "GameDir")
}

fn default_desktop_dir() -> ValueLocation {
    ValueLocation::new(
        r"Software\Microsoft\Windows\CurrentVersion\Explorer\User Shell Folders",
        "Desktop",
    )
}

fn default_profiles_base() -> String {
    r"Software\Lionhead Studios Ltd\Black & White".to_string()
}

fn default_profiles_subpath() -> String {
    "Profiles".to_string()
}

fn default_mind_value() -> String {
    "CreatureMind".to_string()
}

fn default_last_profile_value() -> String {
    "LastProfile".to_string()
}

fn default_profile_dir() -> String {
    "Profiles".to_string()
}

fn default_mind_dir() -> String {
    "Creatures".to_string()
}

fn default_physique_prefix() -> String {
    "Physique".to_string()
}

fn default_workspace_dir() -> String {
    "bw_savegame_backup".to_string()
}

fn default_manifest_file() -> String {
    "backup_info.json".to_string()
}

fn default_registry_file() -> String {
    "profile.reg".to_string()
}

impl Default for RegistryLayout {
    fn default() -> Self {
        Self {
            hive: Hive::default(),
            game_dir: default_game_dir(),
            desktop_dir: default_desktop_dir(),
            profiles_base: default_profiles_base(),
            profiles_subpath: default_profiles_subpath(),
            mind_value: default_mind_value(),
            last_profile_value: default_last_profile_value(),
        }
    }
}

impl Default for GameLayout {
    fn default() -> Self {
        Self {
            profile_dir: default_profile_dir(),
            mind_dir: default_mind_dir(),
            physique_prefix: default_physique_prefix(),
            physique_extension: None,
        }
    }
}

impl Default for WorkspaceLayout {
    fn default() -> Self {
        Self {
            workspace_dir: default_workspace_dir(),
            manifest_file: default_manifest_file(),
            registry_file: default_registry_file(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            registry: RegistryLayout::default(),
            game: GameLayout::default(),
            workspace: WorkspaceLayout::default(),
            output_dir: None,
            language: None,
        }
    }
}

impl GameLayout {
    /// Derive the physique filename that belongs to a mind file
    pub fn physique_for(&self, mind_file: &str) -> String {
        let base = match &self.physique_extension {
            Some(ext) => {
                let stem = mind_file
                    .rsplit_once('.')
                    .map_or(mind_file, |(stem, _)| stem);
                format!("{}.{}", stem, ext.trim_start_matches('.'))
            }
            None => mind_file.to_string(),
        };
        format!("{}{}", self.physique_prefix, base)
    }
}

impl Config {
    /// Load configuration from disk, or defaults if the file doesn't exist
    pub fn load_or_create(paths: &AppPaths) -> Result<Self, SaveError> {
        let settings_path = paths.settings_file();

        let config = if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path).map_err(|e| {
                SaveError::Io(format!("Failed to read settings file: {}", e))
            })?;

            serde_json::from_str(&contents).map_err(|e| {
                SaveError::Config(format!("Failed to parse settings file: {}", e))
            })?
        } else {
            // Don't save yet - let caller decide when to persist
            Config::default()
        };

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to disk
    pub fn save(&self, paths: &AppPaths) -> Result<(), SaveError> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self).map_err(|e| {
            SaveError::Config(format!("Failed to serialize settings: {}", e))
        })?;

        std::fs::write(paths.settings_file(), contents).map_err(|e| {
            SaveError::Io(format!("Failed to write settings file: {}", e))
        })?;

        Ok(())
    }

    /// Reject configurations that would produce ambiguous workspace layouts
    pub fn validate(&self) -> Result<(), SaveError> {
        let names = [
            ("workspace.workspace_dir", &self.workspace.workspace_dir),
            ("workspace.manifest_file", &self.workspace.manifest_file),
            ("workspace.registry_file", &self.workspace.registry_file),
        ];
        for (field, name) in names {
            if !is_plain_file_name(name) {
                return Err(SaveError::Config(format!(
                    "{} must be a plain file name, got '{}'",
                    field, name
                )));
            }
        }

        if self.workspace.manifest_file == self.workspace.registry_file {
            return Err(SaveError::Config(
                "manifest_file and registry_file must differ".into(),
            ));
        }

        if self.registry.profiles_base.trim().is_empty() {
            return Err(SaveError::Config("registry.profiles_base is empty".into()));
        }

        if self.game.physique_prefix.is_empty() && self.game.physique_extension.is_none() {
            return Err(SaveError::Config(
                "physique_prefix and physique_extension cannot both be empty; \
                 the physique file would collide with the mind file"
                    .into(),
            ));
        }

        Ok(())
    }
}

/// A non-empty name with no path separators or parent references
pub(crate) fn is_plain_file_name(name: &str) -> bool {
    !name.trim().is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
}
