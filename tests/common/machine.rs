//! A temporary game installation
//!
//! Each `Machine` has its own game directory, temp root, output directory and
//! in-memory registry, so a test can back up on one machine and restore on
//! another.

use std::fs;
use std::path::{Path, PathBuf};

use bwsave::config::{AppPaths, Config};
use bwsave::i18n::{Language, Messages};
use bwsave::locator::ResourceLocator;
use bwsave::registry::{Hive, MemoryRegistry, RegData, RegistryPath};
use tempfile::TempDir;
use walkdir::WalkDir;

pub struct Machine {
    pub dir: TempDir,
    pub paths: AppPaths,
    pub config: Config,
    pub registry: MemoryRegistry,
    pub messages: Messages,
}

impl Machine {
    /// Empty installation: profile and creature directories exist, no profiles
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let paths = AppPaths::with_dirs(dir.path().join("config"), dir.path().join("tmp"));
        fs::create_dir_all(paths.temp_root()).unwrap();
        fs::create_dir_all(dir.path().join("desktop")).unwrap();

        let mut config = Config::default();
        config.game.physique_prefix = String::new();
        config.game.physique_extension = Some("phy".into());
        config.output_dir = Some(dir.path().join("desktop"));
        config.validate().unwrap();

        let machine = Self {
            dir,
            paths,
            config,
            registry: MemoryRegistry::new(),
            messages: Messages::load(Language::En).unwrap(),
        };

        fs::create_dir_all(machine.game_dir().join("Profiles")).unwrap();
        fs::create_dir_all(machine.game_dir().join("Creatures")).unwrap();
        machine.registry.set_value(
            &RegistryPath::new(Hive::CurrentUser, &machine.config.registry.game_dir.key),
            &machine.config.registry.game_dir.value,
            RegData::String(machine.game_dir().display().to_string()),
        );
        machine
    }

    pub fn game_dir(&self) -> PathBuf {
        self.dir.path().join("game")
    }

    pub fn out_dir(&self) -> PathBuf {
        self.dir.path().join("desktop")
    }

    pub fn profile_dir(&self, name: &str) -> PathBuf {
        self.game_dir().join("Profiles").join(name)
    }

    pub fn creature_file(&self, name: &str) -> PathBuf {
        self.game_dir().join("Creatures").join(name)
    }

    pub fn locator(&self) -> ResourceLocator<'_> {
        ResourceLocator::new(&self.config, &self.registry, &self.paths)
    }

    pub fn workspace_dir(&self) -> PathBuf {
        self.locator().workspace_dir()
    }

    /// Create a profile with the given files, creature files and registry key
    pub fn install_profile(&self, name: &str, mind: &str, files: &[(&str, &[u8])], tag: &[u8]) {
        let profile_dir = self.profile_dir(name);
        for (rel, bytes) in files {
            let path = profile_dir.join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, bytes).unwrap();
        }
        fs::create_dir_all(&profile_dir).unwrap();

        let physique = self.config.game.physique_for(mind);
        fs::write(self.creature_file(mind), [b"mind:".as_slice(), tag].concat()).unwrap();
        fs::write(self.creature_file(&physique), [b"phy:".as_slice(), tag].concat()).unwrap();

        let key = self.locator().profile_key(name);
        self.registry.set_value(
            &key,
            &self.config.registry.mind_value,
            RegData::String(mind.into()),
        );
        self.registry
            .set_value(&key.join("Stats"), "Level", RegData::Binary(tag.to_vec()));
    }
}

/// Relative paths and contents of every file below `root`, sorted
pub fn tree(root: &Path) -> Vec<(PathBuf, Vec<u8>)> {
    let mut entries: Vec<_> = WalkDir::new(root)
        .into_iter()
        .map(|e| e.unwrap())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            (
                e.path().strip_prefix(root).unwrap().to_path_buf(),
                fs::read(e.path()).unwrap(),
            )
        })
        .collect();
    entries.sort();
    entries
}

/// Names in a directory that carry the displaced-copy suffix
pub fn displaced_leftovers(dir: &Path) -> Vec<String> {
    fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .filter(|name| name.ends_with(".bwsave-displaced"))
        .collect()
}
