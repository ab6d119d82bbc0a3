//! Restore pipeline
//!
//! Unpacks an archive into a fresh workspace and copies its contents over the
//! live profile. Nothing live is touched before the collision check passes.
//!
//! Existing live state is moved aside rather than deleted: files and
//! directories are renamed to a `.bwsave-displaced` sibling and the registry
//! key is exported into the workspace before it is removed. If a later stage
//! fails, the rollback deletes whatever was written and moves the old state
//! back. After a successful restore the displaced copies are discarded. A
//! displaced copy left over from an earlier run stops the restore instead of
//! being replaced.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::archiver;
use super::collision::{CollisionGuard, Consent, Decision};
use super::pipeline::{
    Pipeline, PipelineContext, PipelineRun, Stage, StageFailure, StageId, StageOutcome,
    StageResult,
};
use super::stager::{self, remove_path};
use super::workspace::Workspace;
use super::{ensure_fits_workspace, missing, profile_items, release_workspace};
use crate::error::{SaveError, SaveResult};
use crate::i18n::Messages;
use crate::locator::{LivePaths, ResourceLocator};
use crate::models::ProfileRef;
use crate::prompt::Prompt;
use crate::registry::{encode_profile_marker, ensure_export_within};

const DISPLACED_SUFFIX: &str = ".bwsave-displaced";
const DISPLACED_DIR: &str = ".bwsave-displaced";

/// Restores profiles from backup archives
pub struct RestoreOrchestrator<'a> {
    locator: &'a ResourceLocator<'a>,
    messages: &'a Messages,
    consent: Consent,
}

struct RestoreContext<'r> {
    locator: &'r ResourceLocator<'r>,
    messages: &'r Messages,
    consent: Consent,
    prompt: &'r mut dyn Prompt,
    archive: &'r Path,
    workspace: Option<Workspace>,
    profile: Option<ProfileRef>,
    live: Option<LivePaths>,
    decision: Option<Decision>,
    /// `(live, aside)` pairs moved out of the way
    displaced: Vec<(PathBuf, PathBuf)>,
    /// Export of the registry key as it was before the restore
    registry_backup: Option<PathBuf>,
    /// Live paths the restore has written to
    written: Vec<PathBuf>,
    registry_touched: bool,
}

impl<'a> RestoreOrchestrator<'a> {
    pub fn new(locator: &'a ResourceLocator<'a>, messages: &'a Messages, consent: Consent) -> Self {
        Self {
            locator,
            messages,
            consent,
        }
    }

    fn pipeline<'r>() -> Pipeline<RestoreContext<'r>> {
        Pipeline::new(vec![
            Stage::new(StageId::CreateWorkspace, create_workspace),
            Stage::new(StageId::UnpackArchive, unpack_archive),
            Stage::new(StageId::ReadManifest, read_manifest),
            Stage::new(StageId::ResolvePaths, resolve_paths),
            Stage::new(StageId::CheckCollision, check_collision),
            Stage::new(StageId::PurgeLive, purge_live),
            Stage::new(StageId::RestoreProfile, restore_profile),
            Stage::new(StageId::RestoreMind, restore_mind),
            Stage::new(StageId::RestorePhysique, restore_physique),
            Stage::new(StageId::ImportRegistry, import_registry),
            Stage::new(StageId::WriteLastProfile, write_last_profile),
            Stage::new(StageId::DiscardDisplaced, discard_displaced),
        ])
    }

    pub fn run(&self, archive: &Path, prompt: &mut dyn Prompt) -> Result<PipelineRun, StageFailure> {
        info!(archive = %archive.display(), "starting restore");
        let mut ctx = RestoreContext {
            locator: self.locator,
            messages: self.messages,
            consent: self.consent,
            prompt,
            archive,
            workspace: None,
            profile: None,
            live: None,
            decision: None,
            displaced: Vec::new(),
            registry_backup: None,
            written: Vec::new(),
            registry_touched: false,
        };
        Self::pipeline().run(&mut ctx)
    }
}

impl RestoreContext<'_> {
    fn workspace(&self) -> SaveResult<&Workspace> {
        self.workspace.as_ref().ok_or_else(|| missing("workspace"))
    }

    fn profile(&self) -> SaveResult<&ProfileRef> {
        self.profile.as_ref().ok_or_else(|| missing("profile"))
    }

    fn live(&self) -> SaveResult<&LivePaths> {
        self.live.as_ref().ok_or_else(|| missing("live paths"))
    }

    fn copy_out(&mut self, index: usize) -> StageResult {
        let item = profile_items(self.profile()?, self.live()?)[index].clone();
        self.written.push(item.live.clone());
        stager::copy_out(&item, self.workspace()?)?;
        Ok(StageOutcome::Continue)
    }
}

impl PipelineContext for RestoreContext<'_> {
    fn rollback(&mut self, failed: StageId) -> Vec<SaveError> {
        if !self.registry_touched && self.written.is_empty() && self.displaced.is_empty() {
            return Vec::new();
        }
        warn!(stage = %failed, "rolling back live profile state");

        let mut errors = Vec::new();
        let registry = self.locator.registry();

        if self.registry_touched {
            if let Some(live) = &self.live {
                if let Err(e) = registry.delete_key(&live.registry_key) {
                    errors.push(e);
                }
            }
            if let Some(file) = &self.registry_backup {
                if let Err(e) = registry.import_file(file) {
                    errors.push(e);
                }
            }
        }

        for path in self.written.drain(..).rev() {
            if let Err(e) = remove_path(&path) {
                errors.push(e);
            }
        }

        for (live, aside) in self.displaced.drain(..).rev() {
            if let Err(e) = fs::rename(&aside, &live) {
                errors.push(SaveError::Io(format!(
                    "Failed to move {} back to {}: {}",
                    aside.display(),
                    live.display(),
                    e
                )));
            }
        }

        for e in &errors {
            warn!(error = %e, "rollback step failed");
        }
        errors
    }

    fn teardown(&mut self) -> SaveResult<()> {
        release_workspace(&mut self.workspace)
    }
}

fn displaced_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(DISPLACED_SUFFIX);
    path.with_file_name(name)
}

fn create_workspace(ctx: &mut RestoreContext<'_>) -> StageResult {
    ctx.workspace = Some(Workspace::create(ctx.locator.workspace_dir())?);
    Ok(StageOutcome::Continue)
}

fn unpack_archive(ctx: &mut RestoreContext<'_>) -> StageResult {
    archiver::unpack(ctx.archive, ctx.workspace()?)?;
    Ok(StageOutcome::Continue)
}

fn read_manifest(ctx: &mut RestoreContext<'_>) -> StageResult {
    let layout = &ctx.locator.config().workspace;
    let manifest = archiver::read_manifest(ctx.workspace()?, &layout.manifest_file)?;
    let profile = manifest.to_profile()?;
    ensure_fits_workspace(&profile, layout)?;

    info!(profile = %profile, "archive holds profile");
    ctx.profile = Some(profile);
    Ok(StageOutcome::Continue)
}

fn resolve_paths(ctx: &mut RestoreContext<'_>) -> StageResult {
    let live = ctx.locator.live_paths(ctx.profile()?)?;

    // Every key the import writes must lie under the profile's live key
    let file = ctx
        .workspace()?
        .join(&ctx.locator.config().workspace.registry_file);
    if !file.is_file() {
        return Err(SaveError::path_not_found(&file));
    }
    ensure_export_within(ctx.locator.registry(), &file, &live.registry_key)?;

    ctx.live = Some(live);
    Ok(StageOutcome::Continue)
}

fn check_collision(ctx: &mut RestoreContext<'_>) -> StageResult {
    let guard = CollisionGuard::new(ctx.locator.registry(), ctx.messages, ctx.consent);
    let live = ctx.live.as_ref().ok_or_else(|| missing("live paths"))?;
    let decision = guard.check(live, &mut *ctx.prompt)?;
    ctx.decision = Some(decision);

    Ok(match decision {
        Decision::Declined => StageOutcome::Decline,
        Decision::Clear | Decision::ConfirmedOverwrite => StageOutcome::Continue,
    })
}

fn purge_live(ctx: &mut RestoreContext<'_>) -> StageResult {
    if ctx.decision != Some(Decision::ConfirmedOverwrite) {
        debug!("nothing to move aside");
        return Ok(StageOutcome::Continue);
    }

    let live = ctx.live()?.clone();
    let registry = ctx.locator.registry();

    let present: Vec<PathBuf> = [live.profile_dir, live.mind_file, live.physique_file]
        .into_iter()
        .filter(|path| fs::symlink_metadata(path).is_ok())
        .collect();
    if let Some(leftover) = present
        .iter()
        .map(|path| displaced_sibling(path))
        .find(|aside| fs::symlink_metadata(aside).is_ok())
    {
        return Err(SaveError::Collision {
            entity_type: "Displaced copy",
            identifier: leftover.display().to_string(),
        });
    }

    if registry.key_exists(&live.registry_key) {
        let dir = ctx.workspace()?.join(DISPLACED_DIR);
        fs::create_dir_all(&dir)?;
        let file = dir.join(&ctx.locator.config().workspace.registry_file);

        registry.export_key(&live.registry_key, &file)?;
        ctx.registry_backup = Some(file);
        ctx.registry_touched = true;
        registry.delete_key(&live.registry_key)?;
    }

    for path in present {
        let aside = displaced_sibling(&path);
        fs::rename(&path, &aside).map_err(|e| {
            SaveError::Io(format!("Failed to move {} aside: {}", path.display(), e))
        })?;
        debug!(path = %path.display(), "moved aside");
        ctx.displaced.push((path, aside));
    }

    Ok(StageOutcome::Continue)
}

fn restore_profile(ctx: &mut RestoreContext<'_>) -> StageResult {
    ctx.copy_out(0)
}

fn restore_mind(ctx: &mut RestoreContext<'_>) -> StageResult {
    ctx.copy_out(1)
}

fn restore_physique(ctx: &mut RestoreContext<'_>) -> StageResult {
    ctx.copy_out(2)
}

fn import_registry(ctx: &mut RestoreContext<'_>) -> StageResult {
    let file = ctx
        .workspace()?
        .join(&ctx.locator.config().workspace.registry_file);

    ctx.registry_touched = true;
    ctx.locator.registry().import_file(&file)?;
    Ok(StageOutcome::Continue)
}

fn write_last_profile(ctx: &mut RestoreContext<'_>) -> StageResult {
    let marker = encode_profile_marker(ctx.profile()?.name());
    ctx.locator.registry().write_binary(
        &ctx.locator.profiles_base_key(),
        &ctx.locator.config().registry.last_profile_value,
        &marker,
    )?;
    Ok(StageOutcome::Continue)
}

fn discard_displaced(ctx: &mut RestoreContext<'_>) -> StageResult {
    for (_, aside) in ctx.displaced.drain(..) {
        if let Err(e) = remove_path(&aside) {
            warn!(path = %aside.display(), error = %e, "could not remove displaced copy");
        }
    }
    Ok(StageOutcome::Continue)
}
