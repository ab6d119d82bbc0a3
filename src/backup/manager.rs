//! Backup pipeline
//!
//! Copies a profile into a fresh workspace and packs it into
//! `{output_dir}/{profile}.zip`.

use std::path::{Path, PathBuf};

use tracing::info;

use super::archiver::{self, ExistingArchive};
use super::collision::{gate, Consent};
use super::pipeline::{
    Pipeline, PipelineContext, PipelineRun, Stage, StageFailure, StageId, StageOutcome,
    StageResult,
};
use super::stager::{self, StageItem};
use super::workspace::Workspace;
use super::{ensure_fits_workspace, missing, profile_items, release_workspace};
use crate::error::SaveResult;
use crate::i18n::Messages;
use crate::locator::{LivePaths, ResourceLocator};
use crate::models::{Manifest, ProfileRef};
use crate::prompt::Prompt;

/// Creates backup archives of single profiles
pub struct BackupOrchestrator<'a> {
    locator: &'a ResourceLocator<'a>,
    messages: &'a Messages,
    consent: Consent,
}

struct BackupContext<'r> {
    locator: &'r ResourceLocator<'r>,
    messages: &'r Messages,
    consent: Consent,
    prompt: &'r mut dyn Prompt,
    profile: &'r ProfileRef,
    destination: PathBuf,
    workspace: Option<Workspace>,
    live: Option<LivePaths>,
}

impl<'a> BackupOrchestrator<'a> {
    pub fn new(locator: &'a ResourceLocator<'a>, messages: &'a Messages, consent: Consent) -> Self {
        Self {
            locator,
            messages,
            consent,
        }
    }

    /// Stage order of a backup run
    fn pipeline<'r>() -> Pipeline<BackupContext<'r>> {
        Pipeline::new(vec![
            Stage::new(StageId::CreateWorkspace, create_workspace),
            Stage::new(StageId::ResolvePaths, resolve_paths),
            Stage::new(StageId::CopyProfile, copy_profile),
            Stage::new(StageId::CopyMind, copy_mind),
            Stage::new(StageId::CopyPhysique, copy_physique),
            Stage::new(StageId::ExportRegistry, export_registry),
            Stage::new(StageId::WriteManifest, write_manifest),
            Stage::new(StageId::PackArchive, pack_archive),
        ])
    }

    /// Where the archive for `profile` ends up
    pub fn archive_path(&self, profile: &ProfileRef, output_dir: &Path) -> PathBuf {
        self.locator.archive_path(output_dir, profile)
    }

    pub fn run(
        &self,
        profile: &ProfileRef,
        output_dir: &Path,
        prompt: &mut dyn Prompt,
    ) -> Result<PipelineRun, StageFailure> {
        info!(profile = %profile, "starting backup");
        let mut ctx = BackupContext {
            locator: self.locator,
            messages: self.messages,
            consent: self.consent,
            prompt,
            profile,
            destination: self.archive_path(profile, output_dir),
            workspace: None,
            live: None,
        };
        Self::pipeline().run(&mut ctx)
    }
}

impl BackupContext<'_> {
    fn workspace(&self) -> SaveResult<&Workspace> {
        self.workspace.as_ref().ok_or_else(|| missing("workspace"))
    }

    fn item(&self, index: usize) -> SaveResult<StageItem> {
        let live = self.live.as_ref().ok_or_else(|| missing("live paths"))?;
        Ok(profile_items(self.profile, live)[index].clone())
    }

    fn copy_in(&self, index: usize) -> StageResult {
        stager::copy_in(&self.item(index)?, self.workspace()?)?;
        Ok(StageOutcome::Continue)
    }
}

impl PipelineContext for BackupContext<'_> {
    fn teardown(&mut self) -> SaveResult<()> {
        release_workspace(&mut self.workspace)
    }
}

fn create_workspace(ctx: &mut BackupContext<'_>) -> StageResult {
    ctx.workspace = Some(Workspace::create(ctx.locator.workspace_dir())?);
    Ok(StageOutcome::Continue)
}

fn resolve_paths(ctx: &mut BackupContext<'_>) -> StageResult {
    ensure_fits_workspace(ctx.profile, &ctx.locator.config().workspace)?;
    ctx.live = Some(ctx.locator.live_paths(ctx.profile)?);
    Ok(StageOutcome::Continue)
}

fn copy_profile(ctx: &mut BackupContext<'_>) -> StageResult {
    ctx.copy_in(0)
}

fn copy_mind(ctx: &mut BackupContext<'_>) -> StageResult {
    ctx.copy_in(1)
}

fn copy_physique(ctx: &mut BackupContext<'_>) -> StageResult {
    ctx.copy_in(2)
}

fn export_registry(ctx: &mut BackupContext<'_>) -> StageResult {
    let key = ctx.locator.profile_key(ctx.profile.name());
    let file = ctx
        .workspace()?
        .join(&ctx.locator.config().workspace.registry_file);
    ctx.locator.registry().export_key(&key, &file)?;
    Ok(StageOutcome::Continue)
}

fn write_manifest(ctx: &mut BackupContext<'_>) -> StageResult {
    let manifest = Manifest::from(ctx.profile);
    archiver::write_manifest(
        ctx.workspace()?,
        &ctx.locator.config().workspace.manifest_file,
        &manifest,
    )?;
    Ok(StageOutcome::Continue)
}

fn pack_archive(ctx: &mut BackupContext<'_>) -> StageResult {
    let existing = if ctx.destination.exists() {
        let messages = ctx.messages;
        if !gate(&mut *ctx.prompt, messages, &messages.backup_exists, ctx.consent)? {
            return Ok(StageOutcome::Decline);
        }
        ExistingArchive::Replace
    } else {
        ExistingArchive::Refuse
    };

    archiver::pack(ctx.workspace()?, &ctx.destination, existing)?;
    info!(archive = %ctx.destination.display(), "backup archive written");
    Ok(StageOutcome::Continue)
}
