//! Overwrite protection for restores
//!
//! Before a restore touches anything live, [`CollisionGuard`] checks whether
//! the profile already has state on this machine and, if so, asks before
//! letting the restore replace it.

use tracing::{debug, info};

use crate::error::SaveResult;
use crate::i18n::{GateText, Messages};
use crate::locator::LivePaths;
use crate::prompt::{self, Prompt};
use crate::registry::Registry;

/// Whether overwriting needs to be confirmed interactively
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Consent {
    #[default]
    Ask,
    /// Given up front, e.g. with `--yes`
    Granted,
}

/// Result of the collision check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Nothing to overwrite
    Clear,
    ConfirmedOverwrite,
    Declined,
}

/// Which pieces of live state already exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Probe {
    pub registry_key: bool,
    pub profile_dir: bool,
    pub mind_file: bool,
    pub physique_file: bool,
}

impl Probe {
    pub fn any(&self) -> bool {
        self.registry_key || self.profile_dir || self.mind_file || self.physique_file
    }
}

pub struct CollisionGuard<'a> {
    registry: &'a dyn Registry,
    messages: &'a Messages,
    consent: Consent,
}

impl<'a> CollisionGuard<'a> {
    pub fn new(registry: &'a dyn Registry, messages: &'a Messages, consent: Consent) -> Self {
        Self {
            registry,
            messages,
            consent,
        }
    }

    pub fn probe(&self, live: &LivePaths) -> Probe {
        Probe {
            registry_key: self.registry.key_exists(&live.registry_key),
            profile_dir: live.profile_dir.exists(),
            mind_file: live.mind_file.exists(),
            physique_file: live.physique_file.exists(),
        }
    }

    pub fn check(&self, live: &LivePaths, prompt: &mut dyn Prompt) -> SaveResult<Decision> {
        let probe = self.probe(live);
        debug!(?probe, "probed live profile state");

        if !probe.any() {
            prompt.say(&self.messages.profile_clear)?;
            return Ok(Decision::Clear);
        }

        let overwrite = gate(prompt, self.messages, &self.messages.profile_exists, self.consent)?;
        Ok(if overwrite {
            Decision::ConfirmedOverwrite
        } else {
            Decision::Declined
        })
    }
}

/// Ask a yes/no overwrite question unless consent was given up front
///
/// Prints the gate's follow-up line either way.
pub fn gate(
    prompt: &mut dyn Prompt,
    messages: &Messages,
    text: &GateText,
    consent: Consent,
) -> SaveResult<bool> {
    let accepted = match consent {
        Consent::Granted => true,
        Consent::Ask => prompt::confirm(prompt, messages, &text.prompt)?,
    };

    if accepted {
        prompt.say(&text.accepted)?;
    } else {
        info!("overwrite declined");
        prompt.say(&text.declined)?;
    }
    Ok(accepted)
}
