//! Interactive action menu
//!
//! Runs when `bwsave` is started without a subcommand: asks whether to back
//! up or restore, then walks through the same prompts as the subcommands.

use super::{
    handle_backup_command, handle_restore_command, BackupArgs, CommandStatus, RestoreArgs, Session,
};
use crate::error::SaveResult;
use crate::prompt::Prompt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Backup,
    Restore,
}

fn parse_action(answer: &str) -> Option<Action> {
    match answer.trim().to_ascii_lowercase().as_str() {
        "b" => Some(Action::Backup),
        "r" => Some(Action::Restore),
        _ => None,
    }
}

pub fn handle_interactive(session: &Session<'_>, prompt: &mut dyn Prompt) -> SaveResult<CommandStatus> {
    let action = loop {
        let answer = prompt.ask(&session.messages.action_prompt)?;
        match parse_action(&answer) {
            Some(action) => break action,
            None => prompt.say(&session.messages.action_invalid)?,
        }
    };

    match action {
        Action::Backup => handle_backup_command(session, BackupArgs::default(), prompt),
        Action::Restore => handle_restore_command(session, RestoreArgs::default(), prompt),
    }
}
