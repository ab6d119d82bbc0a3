//! User-facing message catalogs
//!
//! Messages are loaded from JSON catalogs compiled into the binary. Each
//! catalog deserializes into [`Messages`], so a missing entry is caught when
//! the catalog is loaded rather than when the message is first needed.

use serde::{Deserialize, Serialize};

use crate::backup::StageId;
use crate::error::{SaveError, SaveResult};
use crate::registry::{Hive, Registry, RegistryPath};

const LANG_EN: &str = include_str!("../../data/lang_en.json");
const LANG_DE: &str = include_str!("../../data/lang_de.json");

/// Supported message languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    De,
}

impl Language {
    /// Pick the message language
    ///
    /// Order: explicit override, the Windows locale in the registry, `LANG`.
    pub fn detect(preferred: Option<Language>, registry: Option<&dyn Registry>) -> Self {
        if let Some(language) = preferred {
            return language;
        }

        let locale_key = RegistryPath::new(Hive::CurrentUser, r"Control Panel\International");
        let from_registry = registry.and_then(|r| r.read_string(&locale_key, "LocaleName").ok());
        let locale = from_registry.or_else(|| std::env::var("LANG").ok());

        locale.map_or(Language::En, |tag| Self::from_locale(&tag))
    }

    /// Map a locale tag such as `de-DE` or `de_AT.UTF-8`
    pub fn from_locale(tag: &str) -> Self {
        let primary = tag
            .split(['-', '_', '.'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match primary.as_str() {
            "de" => Language::De,
            _ => Language::En,
        }
    }
}

/// A prompt asking for a yes/no decision, with the two follow-up lines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateText {
    pub prompt: String,
    pub accepted: String,
    pub declined: String,
}

/// Success and failure line for one pipeline stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageText {
    pub done: String,
    pub failed: String,
}

/// One entry per pipeline stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageTexts {
    pub create_workspace: StageText,
    pub copy_profile: StageText,
    pub copy_mind: StageText,
    pub copy_physique: StageText,
    pub export_registry: StageText,
    pub write_manifest: StageText,
    pub pack_archive: StageText,
    pub unpack_archive: StageText,
    pub read_manifest: StageText,
    pub resolve_paths: StageText,
    pub check_collision: StageText,
    pub purge_live: StageText,
    pub restore_profile: StageText,
    pub restore_mind: StageText,
    pub restore_physique: StageText,
    pub import_registry: StageText,
    pub write_last_profile: StageText,
    pub discard_displaced: StageText,
    pub remove_workspace: StageText,
}

impl StageTexts {
    pub fn get(&self, stage: StageId) -> &StageText {
        match stage {
            StageId::CreateWorkspace => &self.create_workspace,
            StageId::CopyProfile => &self.copy_profile,
            StageId::CopyMind => &self.copy_mind,
            StageId::CopyPhysique => &self.copy_physique,
            StageId::ExportRegistry => &self.export_registry,
            StageId::WriteManifest => &self.write_manifest,
            StageId::PackArchive => &self.pack_archive,
            StageId::UnpackArchive => &self.unpack_archive,
            StageId::ReadManifest => &self.read_manifest,
            StageId::ResolvePaths => &self.resolve_paths,
            StageId::CheckCollision => &self.check_collision,
            StageId::PurgeLive => &self.purge_live,
            StageId::RestoreProfile => &self.restore_profile,
            StageId::RestoreMind => &self.restore_mind,
            StageId::RestorePhysique => &self.restore_physique,
            StageId::ImportRegistry => &self.import_registry,
            StageId::WriteLastProfile => &self.write_last_profile,
            StageId::DiscardDisplaced => &self.discard_displaced,
            StageId::RemoveWorkspace => &self.remove_workspace,
        }
    }
}

/// Complete message catalog for one language
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Messages {
    /// Main menu: choose backup or restore
    pub action_prompt: String,
    pub action_invalid: String,

    /// Accepted answers for yes/no prompts (compared case-insensitively)
    pub yes_answers: Vec<String>,
    pub no_answers: Vec<String>,
    pub answer_invalid: String,

    pub select_profile_header: String,
    pub select_profile_prompt: String,
    pub select_profile_invalid: String,

    pub restore_file_prompt: String,
    pub restore_file_missing: String,

    pub profile_clear: String,
    pub profile_exists: GateText,
    pub backup_exists: GateText,

    pub stages: StageTexts,

    pub backup_success: String,
    pub restore_success: String,
    pub process_failure: String,
    pub process_declined: String,
}

impl Messages {
    pub fn load(language: Language) -> SaveResult<Self> {
        let source = match language {
            Language::En => LANG_EN,
            Language::De => LANG_DE,
        };
        serde_json::from_str(source).map_err(|e| {
            SaveError::Config(format!("Failed to load {:?} message catalog: {}", language, e))
        })
    }

    /// Classify an answer to a yes/no prompt; `None` means ask again
    pub fn parse_answer(&self, answer: &str) -> Option<bool> {
        let answer = answer.trim();
        if answer.is_empty() {
            return None;
        }
        if self.yes_answers.iter().any(|y| y.eq_ignore_ascii_case(answer)) {
            Some(true)
        } else if self.no_answers.iter().any(|n| n.eq_ignore_ascii_case(answer)) {
            Some(false)
        } else {
            None
        }
    }
}
