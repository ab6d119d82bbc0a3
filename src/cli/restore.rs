//! Restore CLI command
//!
//! Implements `bwsave restore`.

use clap::Args;
use std::path::PathBuf;

use super::{consent, report, CommandStatus, Session};
use crate::backup::RestoreOrchestrator;
use crate::error::SaveResult;
use crate::i18n::Messages;
use crate::prompt::Prompt;

/// Arguments of `bwsave restore`
#[derive(Args, Debug, Default, Clone)]
pub struct RestoreArgs {
    /// Backup archive to restore; asks for a path when omitted
    pub archive: Option<PathBuf>,

    /// Overwrite existing profile data without asking
    #[arg(short, long)]
    pub yes: bool,
}

/// Handle a restore command
pub fn handle_restore_command(
    session: &Session<'_>,
    args: RestoreArgs,
    prompt: &mut dyn Prompt,
) -> SaveResult<CommandStatus> {
    let archive = match args.archive {
        Some(archive) => archive,
        None => ask_archive_path(prompt, session.messages)?,
    };

    let locator = session.locator();
    let orchestrator = RestoreOrchestrator::new(&locator, session.messages, consent(args.yes));
    let result = orchestrator.run(&archive, prompt);
    report(session, prompt, result, &session.messages.restore_success)
}

/// Ask for an archive path until an existing file is named
///
/// Surrounding quotes are stripped, since pasted or dragged-in paths often
/// carry them.
pub fn ask_archive_path(prompt: &mut dyn Prompt, messages: &Messages) -> SaveResult<PathBuf> {
    loop {
        let answer = prompt.ask(&messages.restore_file_prompt)?;
        let path = PathBuf::from(answer.trim().trim_matches('"'));
        if !path.as_os_str().is_empty() && path.is_file() {
            return Ok(path);
        }
        prompt.say(&messages.restore_file_missing)?;
    }
}
