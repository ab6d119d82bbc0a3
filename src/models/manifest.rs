//! Backup manifest
//!
//! The manifest is the only structured record inside an archive. It names the
//! profile and its creature files so a restore knows what the archive holds.

use serde::{Deserialize, Serialize};

use super::profile::ProfileRef;
use crate::error::SaveResult;

/// Contents record written as `backup_info.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(rename = "backup_profile")]
    pub profile_name: String,
    #[serde(rename = "creature_mind")]
    pub mind_filename: String,
    #[serde(rename = "creature_physique")]
    pub physique_filename: String,
}

impl Manifest {
    /// Convert back into a validated profile reference
    ///
    /// Manifests come from archives on disk, so they are validated again
    /// before any name is joined onto a live path.
    pub fn to_profile(&self) -> SaveResult<ProfileRef> {
        ProfileRef::new(
            &self.profile_name,
            &self.mind_filename,
            &self.physique_filename,
        )
    }
}

impl From<&ProfileRef> for Manifest {
    fn from(profile: &ProfileRef) -> Self {
        Self {
            profile_name: profile.name().to_string(),
            mind_filename: profile.mind_file().to_string(),
            physique_filename: profile.physique_file().to_string(),
        }
    }
}
