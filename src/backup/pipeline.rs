//! Stage driver shared by backup and restore
//!
//! A pipeline is an ordered list of [`Stage`]s over a mutable context. The
//! driver runs them in order, stops at the first failure or decline, asks the
//! context to roll back after a failure and tears the context down exactly
//! once at the end.

use std::fmt;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::error::SaveError;

/// Every stage either pipeline can run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageId {
    CreateWorkspace,
    CopyProfile,
    CopyMind,
    CopyPhysique,
    ExportRegistry,
    WriteManifest,
    PackArchive,
    UnpackArchive,
    ReadManifest,
    ResolvePaths,
    CheckCollision,
    PurgeLive,
    RestoreProfile,
    RestoreMind,
    RestorePhysique,
    ImportRegistry,
    WriteLastProfile,
    DiscardDisplaced,
    RemoveWorkspace,
}

impl StageId {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageId::CreateWorkspace => "create_workspace",
            StageId::CopyProfile => "copy_profile",
            StageId::CopyMind => "copy_mind",
            StageId::CopyPhysique => "copy_physique",
            StageId::ExportRegistry => "export_registry",
            StageId::WriteManifest => "write_manifest",
            StageId::PackArchive => "pack_archive",
            StageId::UnpackArchive => "unpack_archive",
            StageId::ReadManifest => "read_manifest",
            StageId::ResolvePaths => "resolve_paths",
            StageId::CheckCollision => "check_collision",
            StageId::PurgeLive => "purge_live",
            StageId::RestoreProfile => "restore_profile",
            StageId::RestoreMind => "restore_mind",
            StageId::RestorePhysique => "restore_physique",
            StageId::ImportRegistry => "import_registry",
            StageId::WriteLastProfile => "write_last_profile",
            StageId::DiscardDisplaced => "discard_displaced",
            StageId::RemoveWorkspace => "remove_workspace",
        }
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a stage tells the driver after it ran successfully
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    Continue,
    /// The user chose not to proceed
    Decline,
}

pub type StageResult = Result<StageOutcome, SaveError>;

/// One named step
pub struct Stage<C> {
    pub id: StageId,
    pub run: fn(&mut C) -> StageResult,
}

impl<C> Stage<C> {
    pub const fn new(id: StageId, run: fn(&mut C) -> StageResult) -> Self {
        Self { id, run }
    }
}

/// Hooks the driver calls around the stages
pub trait PipelineContext {
    /// Undo live changes after `failed` returned an error
    ///
    /// Returns the errors hit while undoing; they are reported next to the
    /// original failure.
    fn rollback(&mut self, _failed: StageId) -> Vec<SaveError> {
        Vec::new()
    }

    /// Release the workspace; called exactly once per run
    fn teardown(&mut self) -> Result<(), SaveError>;
}

/// How a run ended when nothing failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Declined { at: StageId },
}

/// A run that did not fail
#[derive(Debug)]
pub struct PipelineRun {
    pub outcome: Outcome,
    /// Stages that finished, in order
    pub completed: Vec<StageId>,
}

/// A run that stopped at a failing stage
#[derive(Debug, Error)]
#[error("stage {stage} failed: {error}")]
pub struct StageFailure {
    pub stage: StageId,
    #[source]
    pub error: SaveError,
    /// Stages that finished before the failure
    pub completed: Vec<StageId>,
    /// Rollback and teardown problems; never replace `error`
    pub cleanup_errors: Vec<SaveError>,
}

/// Ordered list of stages driven by one loop
pub struct Pipeline<C> {
    stages: Vec<Stage<C>>,
}

impl<C: PipelineContext> Pipeline<C> {
    pub fn new(stages: Vec<Stage<C>>) -> Self {
        Self { stages }
    }

    pub fn stage_ids(&self) -> Vec<StageId> {
        self.stages.iter().map(|s| s.id).collect()
    }

    /// Run every stage in order against `ctx`
    pub fn run(&self, ctx: &mut C) -> Result<PipelineRun, StageFailure> {
        let mut completed = Vec::with_capacity(self.stages.len() + 1);
        let mut halted = None;

        for stage in &self.stages {
            debug!(stage = %stage.id, "running stage");
            match (stage.run)(ctx) {
                Ok(StageOutcome::Continue) => {
                    info!(stage = %stage.id, "stage done");
                    completed.push(stage.id);
                }
                Ok(StageOutcome::Decline) => {
                    info!(stage = %stage.id, "declined by user");
                    completed.push(stage.id);
                    halted = Some(Ok(stage.id));
                    break;
                }
                Err(error) => {
                    warn!(stage = %stage.id, %error, "stage failed");
                    halted = Some(Err((stage.id, error)));
                    break;
                }
            }
        }

        match halted {
            Some(Err((stage, error))) => {
                let mut cleanup_errors = ctx.rollback(stage);
                if let Err(e) = ctx.teardown() {
                    warn!(error = %e, "teardown after failure also failed");
                    cleanup_errors.push(e);
                }
                Err(StageFailure {
                    stage,
                    error,
                    completed,
                    cleanup_errors,
                })
            }
            other => {
                let outcome = match other {
                    Some(Ok(at)) => Outcome::Declined { at },
                    _ => Outcome::Completed,
                };
                match ctx.teardown() {
                    Ok(()) => {
                        completed.push(StageId::RemoveWorkspace);
                        Ok(PipelineRun { outcome, completed })
                    }
                    Err(error) => Err(StageFailure {
                        stage: StageId::RemoveWorkspace,
                        error,
                        completed,
                        cleanup_errors: Vec::new(),
                    }),
                }
            }
        }
    }
}
