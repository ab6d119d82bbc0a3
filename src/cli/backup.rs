//! Backup CLI command
//!
//! Implements `bwsave backup`.

use clap::Args;
use std::path::PathBuf;

use super::{consent, report, report_error, CommandStatus, Session};
use crate::backup::BackupOrchestrator;
use crate::error::SaveResult;
use crate::locator::ResourceLocator;
use crate::models::ProfileRef;
use crate::prompt::{self, Prompt};

/// Arguments of `bwsave backup`
#[derive(Args, Debug, Default, Clone)]
pub struct BackupArgs {
    /// Profile to back up; asks with a numbered list when omitted
    #[arg(short, long)]
    pub profile: Option<String>,

    /// Directory the archive is written to (default: desktop)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Overwrite an existing archive without asking
    #[arg(short, long)]
    pub yes: bool,
}

/// Handle a backup command
pub fn handle_backup_command(
    session: &Session<'_>,
    args: BackupArgs,
    prompt: &mut dyn Prompt,
) -> SaveResult<CommandStatus> {
    let locator = session.locator();

    let (profile, output) = match prepare(session, &locator, args.profile, args.output, prompt) {
        Ok(prepared) => prepared,
        Err(e) => return report_error(session, prompt, e),
    };

    let orchestrator = BackupOrchestrator::new(&locator, session.messages, consent(args.yes));
    let result = orchestrator.run(&profile, &output, prompt);
    let status = report(session, prompt, result, &session.messages.backup_success)?;

    if status == CommandStatus::Success {
        prompt.say(&orchestrator.archive_path(&profile, &output).display().to_string())?;
    }
    Ok(status)
}

/// Pick the profile and the output directory
fn prepare(
    session: &Session<'_>,
    locator: &ResourceLocator<'_>,
    profile: Option<String>,
    output: Option<PathBuf>,
    prompt: &mut dyn Prompt,
) -> SaveResult<(ProfileRef, PathBuf)> {
    let name = match profile {
        Some(name) => name,
        None => {
            let profiles = locator.list_profiles()?;
            let index = prompt::choose(prompt, session.messages, &profiles)?;
            profiles[index].clone()
        }
    };

    let profile = locator.resolve_profile(&name)?;
    let output = match output {
        Some(dir) => dir,
        None => locator.output_dir()?,
    };
    Ok((profile, output))
}
