//! Profile reference model
//!
//! A profile spans a directory under the game's profile folder, a registry
//! subkey of the same name, and a pair of creature files.

use std::fmt;

use crate::config::GameLayout;
use crate::config::settings::is_plain_file_name;
use crate::error::{SaveError, SaveResult};

/// Identifies one save profile and its two creature files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileRef {
    name: String,
    mind_file: String,
    physique_file: String,
}

impl ProfileRef {
    /// Create a validated profile reference
    ///
    /// All three names end up as path components and as a registry subkey,
    /// so none may be empty or contain path separators.
    pub fn new(
        name: impl Into<String>,
        mind_file: impl Into<String>,
        physique_file: impl Into<String>,
    ) -> SaveResult<Self> {
        let profile = Self {
            name: name.into(),
            mind_file: mind_file.into(),
            physique_file: physique_file.into(),
        };
        profile.validate()?;
        Ok(profile)
    }

    /// Create a profile reference deriving the physique filename from the layout
    pub fn with_layout(
        name: impl Into<String>,
        mind_file: impl Into<String>,
        layout: &GameLayout,
    ) -> SaveResult<Self> {
        let mind_file = mind_file.into();
        let physique_file = layout.physique_for(&mind_file);
        Self::new(name, mind_file, physique_file)
    }

    fn validate(&self) -> SaveResult<()> {
        for (label, value) in [
            ("profile name", &self.name),
            ("mind filename", &self.mind_file),
            ("physique filename", &self.physique_file),
        ] {
            if !is_plain_file_name(value) {
                return Err(SaveError::Validation(format!(
                    "invalid {}: '{}'",
                    label, value
                )));
            }
        }

        if self.mind_file == self.physique_file {
            return Err(SaveError::Validation(format!(
                "mind and physique filenames are identical: '{}'",
                self.mind_file
            )));
        }

        if self.name == self.mind_file || self.name == self.physique_file {
            return Err(SaveError::Validation(format!(
                "profile name '{}' clashes with a creature filename",
                self.name
            )));
        }

        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mind_file(&self) -> &str {
        &self.mind_file
    }

    pub fn physique_file(&self) -> &str {
        &self.physique_file
    }
}

impl fmt::Display for ProfileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, {})",
            self.name, self.mind_file, self.physique_file
        )
    }
}
