//! Resource lookup
//!
//! Turns the symbolic resources of a profile (install directory, desktop,
//! profile list, creature files, registry keys) into concrete paths. Nothing
//! here mutates state.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::{AppPaths, Config};
use crate::error::{SaveError, SaveResult};
use crate::models::ProfileRef;
use crate::registry::{Registry, RegistryPath};

/// Live locations of everything that belongs to one profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LivePaths {
    pub profile_dir: PathBuf,
    pub mind_file: PathBuf,
    pub physique_file: PathBuf,
    pub registry_key: RegistryPath,
}

/// Resolves named resources through the registry and configuration
pub struct ResourceLocator<'a> {
    config: &'a Config,
    registry: &'a dyn Registry,
    paths: &'a AppPaths,
}

impl<'a> ResourceLocator<'a> {
    pub fn new(config: &'a Config, registry: &'a dyn Registry, paths: &'a AppPaths) -> Self {
        Self {
            config,
            registry,
            paths,
        }
    }

    pub fn config(&self) -> &'a Config {
        self.config
    }

    pub fn registry(&self) -> &'a dyn Registry {
        self.registry
    }

    /// The game's install directory
    pub fn game_dir(&self) -> SaveResult<PathBuf> {
        let location = &self.config.registry.game_dir;
        let key = RegistryPath::new(self.config.registry.hive, &location.key);
        let dir = self.registry.read_expanded_path(&key, &location.value)?;
        debug!(game_dir = %dir.display(), "located game directory");
        Ok(dir)
    }

    /// Where archives are written: configured dir, registry desktop, OS desktop
    pub fn output_dir(&self) -> SaveResult<PathBuf> {
        if let Some(dir) = &self.config.output_dir {
            return Ok(dir.clone());
        }

        let location = &self.config.registry.desktop_dir;
        let key = RegistryPath::new(self.config.registry.hive, &location.key);
        match self.registry.read_expanded_path(&key, &location.value) {
            Ok(dir) => Ok(dir),
            Err(e) if e.is_not_found() => self
                .paths
                .fallback_desktop()
                .ok_or_else(|| SaveError::NotFound {
                    entity_type: "Directory",
                    identifier: "desktop".into(),
                }),
            Err(e) => Err(e),
        }
    }

    /// Fixed directory the workspace lives in
    pub fn workspace_dir(&self) -> PathBuf {
        self.paths
            .temp_root()
            .join(&self.config.workspace.workspace_dir)
    }

    /// `{output_dir}/{profile}.zip`
    pub fn archive_path(&self, output_dir: &Path, profile: &ProfileRef) -> PathBuf {
        output_dir.join(format!("{}.zip", profile.name()))
    }

    /// Key that holds the profile container and the last-profile value
    pub fn profiles_base_key(&self) -> RegistryPath {
        RegistryPath::new(self.config.registry.hive, &self.config.registry.profiles_base)
    }

    /// Container key with one subkey per profile
    pub fn profiles_key(&self) -> RegistryPath {
        self.profiles_base_key()
            .join(&self.config.registry.profiles_subpath)
    }

    /// `hive \ base \ subpath \ profile_name`
    pub fn profile_key(&self, profile_name: &str) -> RegistryPath {
        self.profiles_key().join(profile_name)
    }

    /// Names of all profiles known to the game
    pub fn list_profiles(&self) -> SaveResult<Vec<String>> {
        let profiles = self.registry.enumerate_subkeys(&self.profiles_key())?;
        if profiles.is_empty() {
            return Err(SaveError::NotFound {
                entity_type: "Profile",
                identifier: self.profiles_key().to_string(),
            });
        }
        Ok(profiles)
    }

    /// Creature mind filename recorded for a profile
    pub fn mind_file(&self, profile_name: &str) -> SaveResult<String> {
        self.registry
            .read_string(&self.profile_key(profile_name), &self.config.registry.mind_value)
    }

    /// Build a full profile reference from the registry
    pub fn resolve_profile(&self, profile_name: &str) -> SaveResult<ProfileRef> {
        let mind = self.mind_file(profile_name)?;
        ProfileRef::with_layout(profile_name, mind, &self.config.game)
    }

    /// Live locations for a profile
    pub fn live_paths(&self, profile: &ProfileRef) -> SaveResult<LivePaths> {
        let game_dir = self.game_dir()?;
        let mind_dir = game_dir.join(&self.config.game.mind_dir);

        Ok(LivePaths {
            profile_dir: game_dir
                .join(&self.config.game.profile_dir)
                .join(profile.name()),
            mind_file: mind_dir.join(profile.mind_file()),
            physique_file: mind_dir.join(profile.physique_file()),
            registry_key: self.profile_key(profile.name()),
        })
    }
}
