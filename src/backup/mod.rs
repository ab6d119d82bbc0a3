//! Backup and restore pipelines
//!
//! Both operations run as a [`Pipeline`] of named stages over a context that
//! owns a scratch [`Workspace`]:
//!
//! - `BackupOrchestrator`: copies a profile's directory, creature files and
//!   registry key into the workspace, writes the manifest and packs it all
//!   into `{profile}.zip`.
//! - `RestoreOrchestrator`: unpacks an archive, checks for existing live
//!   state, moves that state aside and copies the archive contents into place.
//!   Any failure after live state was touched puts the old state back.
//!
//! # Archive layout
//!
//! ```text
//! Save1.zip
//! ├── Save1/            profile directory
//! ├── M1.mind           creature mind
//! ├── PhysiqueM1.mind   creature physique
//! ├── profile.reg       exported registry key
//! └── backup_info.json  manifest
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use bwsave::backup::{BackupOrchestrator, Consent};
//!
//! let locator = ResourceLocator::new(&config, registry.as_ref(), &paths);
//! let backup = BackupOrchestrator::new(&locator, &messages, Consent::Ask);
//! let profile = locator.resolve_profile("Save1")?;
//! let run = backup.run(&profile, &locator.output_dir()?, &mut prompt)?;
//! ```

pub mod archiver;
mod collision;
mod manager;
mod pipeline;
mod restore;
pub mod stager;
mod workspace;

pub use collision::{gate, CollisionGuard, Consent, Decision, Probe};
pub use manager::BackupOrchestrator;
pub use pipeline::{
    Outcome, Pipeline, PipelineContext, PipelineRun, Stage, StageFailure, StageId, StageOutcome,
    StageResult,
};
pub use restore::RestoreOrchestrator;
pub use workspace::Workspace;

use crate::config::WorkspaceLayout;
use crate::error::{SaveError, SaveResult};
use crate::locator::LivePaths;
use crate::models::ProfileRef;
use stager::StageItem;

/// The three filesystem items that make up a profile, in staging order
fn profile_items(profile: &ProfileRef, live: &LivePaths) -> [StageItem; 3] {
    [
        StageItem::dir(profile.name(), &live.profile_dir),
        StageItem::file(profile.mind_file(), &live.mind_file),
        StageItem::file(profile.physique_file(), &live.physique_file),
    ]
}

/// Profile entries share the workspace root with the manifest and registry file
fn ensure_fits_workspace(profile: &ProfileRef, layout: &WorkspaceLayout) -> SaveResult<()> {
    let reserved = [&layout.manifest_file, &layout.registry_file];
    for name in [profile.name(), profile.mind_file(), profile.physique_file()] {
        if reserved.iter().any(|r| r.eq_ignore_ascii_case(name)) {
            return Err(SaveError::Validation(format!(
                "'{}' clashes with a reserved workspace file",
                name
            )));
        }
    }
    Ok(())
}

/// Take the workspace out of its slot and remove it
fn release_workspace(slot: &mut Option<Workspace>) -> SaveResult<()> {
    slot.take().map_or(Ok(()), Workspace::destroy)
}

fn missing(what: &str) -> SaveError {
    SaveError::Validation(format!("{} not available at this stage", what))
}
