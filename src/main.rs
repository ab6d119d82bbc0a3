use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::EnvFilter;

use bwsave::cli::{
    handle_backup_command, handle_config_command, handle_interactive, handle_profiles_command,
    handle_restore_command, BackupArgs, CommandStatus, RestoreArgs, Session,
};
use bwsave::config::{AppPaths, Config};
use bwsave::i18n::{Language, Messages};
use bwsave::prompt::ConsolePrompt;
use bwsave::registry::{system_registry, MemoryRegistry, Registry};

#[derive(Parser)]
#[command(
    name = "bwsave",
    version,
    about = "Back up and restore Black & White savegame profiles",
    long_about = "bwsave packs a Black & White profile (profile directory, creature \
                  files and registry key) into a single zip archive and restores \
                  such archives, asking before anything existing is overwritten. \
                  Run without a subcommand for an interactive menu."
)]
struct Cli {
    /// Show every pipeline stage and debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use a JSON registry file instead of the system registry
    #[arg(long, global = true, env = "BWSAVE_REGISTRY_FILE", value_name = "FILE")]
    registry_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Back up a profile into {profile}.zip
    Backup(BackupArgs),

    /// Restore a profile from a backup archive
    Restore(RestoreArgs),

    /// List the game's profiles
    Profiles,

    /// Show configuration and paths
    Config {
        /// Write the settings file with the current values
        #[arg(long)]
        init: bool,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let paths = AppPaths::new()?;
    let config = Config::load_or_create(&paths)?;
    let mut prompt = ConsolePrompt::stdio();

    if let Some(Commands::Config { init }) = cli.command {
        let status = handle_config_command(&paths, &config, init, &mut prompt)?;
        return Ok(exit_code(status));
    }

    let memory = cli
        .registry_file
        .as_deref()
        .map(MemoryRegistry::load)
        .transpose()?;
    let system;
    let registry: &dyn Registry = match &memory {
        Some(memory) => memory,
        None => {
            system = system_registry()?;
            system.as_ref()
        }
    };

    let language = Language::detect(config.language, Some(registry));
    let messages = Messages::load(language)?;
    let session = Session {
        paths: &paths,
        config: &config,
        registry,
        messages: &messages,
        verbose: cli.verbose,
    };

    let status = match cli.command {
        Some(Commands::Backup(args)) => handle_backup_command(&session, args, &mut prompt)?,
        Some(Commands::Restore(args)) => handle_restore_command(&session, args, &mut prompt)?,
        Some(Commands::Profiles) => handle_profiles_command(&session, &mut prompt)?,
        Some(Commands::Config { .. }) | None => handle_interactive(&session, &mut prompt)?,
    };

    if let (Some(memory), Some(file)) = (&memory, &cli.registry_file) {
        memory.save(file)?;
    }

    Ok(exit_code(status))
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::builder()
            .with_default_directive(Level::WARN.into())
            .from_env_lossy()
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn exit_code(status: CommandStatus) -> ExitCode {
    if status.is_failure() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
