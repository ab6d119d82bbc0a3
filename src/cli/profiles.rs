//! Profile listing
//!
//! Implements `bwsave profiles`.

use super::{report_error, CommandStatus, Session};
use crate::error::SaveResult;
use crate::prompt::Prompt;

/// List the game's profiles with their creature files
pub fn handle_profiles_command(
    session: &Session<'_>,
    prompt: &mut dyn Prompt,
) -> SaveResult<CommandStatus> {
    let locator = session.locator();
    let profiles = match locator.list_profiles() {
        Ok(profiles) => profiles,
        Err(e) => return report_error(session, prompt, e),
    };

    prompt.say(&session.messages.select_profile_header)?;
    for name in profiles {
        let line = match locator.resolve_profile(&name) {
            Ok(profile) => format!(
                "  {:<20} {} / {}",
                profile.name(),
                profile.mind_file(),
                profile.physique_file()
            ),
            Err(_) => format!("  {}", name),
        };
        prompt.say(&line)?;
    }
    Ok(CommandStatus::Success)
}
