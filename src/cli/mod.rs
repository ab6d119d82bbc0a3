//! CLI command handlers
//!
//! This module bridges clap argument parsing with the backup and restore
//! pipelines. Handlers talk to the user only through a [`Prompt`], so the
//! whole command layer can be driven by a scripted prompt in tests.

pub mod backup;
pub mod config;
pub mod interactive;
pub mod profiles;
pub mod restore;

pub use backup::{handle_backup_command, BackupArgs};
pub use config::handle_config_command;
pub use interactive::handle_interactive;
pub use profiles::handle_profiles_command;
pub use restore::{handle_restore_command, RestoreArgs};

use tracing::error;

use crate::backup::{Consent, Outcome, PipelineRun, StageFailure};
use crate::config::{AppPaths, Config};
use crate::error::{SaveError, SaveResult};
use crate::i18n::Messages;
use crate::locator::ResourceLocator;
use crate::prompt::Prompt;
use crate::registry::Registry;

/// How a command ended, mapped to the process exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    Success,
    Declined,
    Failed,
}

impl CommandStatus {
    pub fn is_failure(&self) -> bool {
        matches!(self, CommandStatus::Failed)
    }
}

/// Everything a command handler needs, built once in `main`
pub struct Session<'a> {
    pub paths: &'a AppPaths,
    pub config: &'a Config,
    pub registry: &'a dyn Registry,
    pub messages: &'a Messages,
    /// Print every finished stage, not just the final line
    pub verbose: bool,
}

impl<'a> Session<'a> {
    pub fn locator(&self) -> ResourceLocator<'a> {
        ResourceLocator::new(self.config, self.registry, self.paths)
    }
}

pub(crate) fn consent(yes: bool) -> Consent {
    if yes {
        Consent::Granted
    } else {
        Consent::Ask
    }
}

/// Print the localized result of a pipeline run
pub(crate) fn report(
    session: &Session<'_>,
    prompt: &mut dyn Prompt,
    result: Result<PipelineRun, StageFailure>,
    success: &str,
) -> SaveResult<CommandStatus> {
    let stages = &session.messages.stages;

    match result {
        Ok(run) => {
            if session.verbose {
                for stage in &run.completed {
                    prompt.say(&stages.get(*stage).done)?;
                }
            }
            match run.outcome {
                Outcome::Completed => {
                    prompt.say(success)?;
                    Ok(CommandStatus::Success)
                }
                Outcome::Declined { .. } => {
                    prompt.say(&session.messages.process_declined)?;
                    Ok(CommandStatus::Declined)
                }
            }
        }
        Err(failure) => {
            if session.verbose {
                for stage in &failure.completed {
                    prompt.say(&stages.get(*stage).done)?;
                }
            }
            prompt.say(&stages.get(failure.stage).failed)?;
            prompt.say(&format!("  {}", failure.error))?;
            for e in &failure.cleanup_errors {
                prompt.say(&format!("  {}", e))?;
            }
            prompt.say(&session.messages.process_failure)?;
            Ok(CommandStatus::Failed)
        }
    }
}

/// Turn an error raised outside a pipeline into a failure report
pub(crate) fn report_error(
    session: &Session<'_>,
    prompt: &mut dyn Prompt,
    err: SaveError,
) -> SaveResult<CommandStatus> {
    error!(error = %err, "command failed");
    prompt.say(&format!("  {}", err))?;
    prompt.say(&session.messages.process_failure)?;
    Ok(CommandStatus::Failed)
}
