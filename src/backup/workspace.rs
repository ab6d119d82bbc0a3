//! Ephemeral workspace directory
//!
//! A [`Workspace`] owns a fixed directory under the temp root for the length of
//! one operation. It is removed by [`Workspace::destroy`] or, if that never
//! happens, when the guard is dropped.
//!
//! Exclusivity is tracked per directory: a path can be held by one guard at a
//! time within the process. Backup and restore both claim the single
//! configured workspace directory, so while one operation runs any other
//! fails at its first stage instead of sharing the directory.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, info, warn};

use crate::error::{SaveError, SaveResult};

/// Workspace directories currently owned by a guard in this process
static LIVE: Mutex<BTreeSet<PathBuf>> = Mutex::new(BTreeSet::new());

fn live() -> MutexGuard<'static, BTreeSet<PathBuf>> {
    LIVE.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Exclusively owned scratch directory
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
    released: bool,
}

impl Workspace {
    /// Claim `root`, clearing out anything a previous run left there
    pub fn create(root: impl Into<PathBuf>) -> SaveResult<Self> {
        let root = root.into();

        if !live().insert(root.clone()) {
            return Err(SaveError::Collision {
                entity_type: "Workspace",
                identifier: root.display().to_string(),
            });
        }

        match prepare(&root) {
            Ok(()) => {
                debug!(workspace = %root.display(), "workspace created");
                Ok(Self {
                    root,
                    released: false,
                })
            }
            Err(e) => {
                live().remove(&root);
                Err(e)
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Path of an entry inside the workspace
    pub fn join(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.root.join(relative)
    }

    /// Remove the directory tree and release the claim
    pub fn destroy(mut self) -> SaveResult<()> {
        self.release()
    }

    fn release(&mut self) -> SaveResult<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        live().remove(&self.root);

        if self.root.exists() {
            fs::remove_dir_all(&self.root).map_err(|e| SaveError::Teardown {
                path: self.root.display().to_string(),
                reason: e.to_string(),
            })?;
        }
        debug!(workspace = %self.root.display(), "workspace removed");
        Ok(())
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            warn!(error = %e, "workspace left behind");
        }
    }
}

fn prepare(root: &Path) -> SaveResult<()> {
    if root.exists() {
        info!(workspace = %root.display(), "removing stale workspace");
        if root.is_dir() {
            fs::remove_dir_all(root)?;
        } else {
            fs::remove_file(root)?;
        }
    }

    fs::create_dir_all(root).map_err(|e| {
        SaveError::Io(format!(
            "Failed to create workspace {}: {}",
            root.display(),
            e
        ))
    })
}
