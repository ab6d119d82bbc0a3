//! Configuration CLI command
//!
//! Implements `bwsave config`. Works without registry access.

use crate::config::{AppPaths, Config};
use crate::error::SaveResult;
use crate::prompt::Prompt;

use super::CommandStatus;

/// Show paths and settings; with `init`, write the settings file first
pub fn handle_config_command(
    paths: &AppPaths,
    config: &Config,
    init: bool,
    out: &mut dyn Prompt,
) -> SaveResult<CommandStatus> {
    if init {
        config.save(paths)?;
        out.say(&format!(
            "Settings written to {}",
            paths.settings_file().display()
        ))?;
    }

    out.say("bwsave Configuration")?;
    out.say("====================")?;
    out.say(&format!("Config directory: {}", paths.base_dir().display()))?;
    out.say(&format!("Settings file:    {}", paths.settings_file().display()))?;
    out.say(&format!(
        "Workspace:        {}",
        paths
            .temp_root()
            .join(&config.workspace.workspace_dir)
            .display()
    ))?;
    out.say("")?;
    out.say("Settings:")?;
    out.say(&serde_json::to_string_pretty(config)?)?;
    Ok(CommandStatus::Success)
}
