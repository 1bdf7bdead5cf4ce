//! Team keyring CLI commands

use std::path::PathBuf;

use clap::{ArgGroup, Args, Subcommand};
use console::style;
use tracing::info;

use lockbox_core::RootLocator;
use lockbox_keyring::{GpgKeystore, KeyReference, KeyringError, TeamKeyManager};

use crate::cli::prompt::TerminalPrompt;
use crate::cli::{output, Cli, OutputFormat};

/// Team keyring commands
#[derive(Debug, Args)]
pub struct TeamCommand {
    #[command(subcommand)]
    pub command: TeamSubcommand,
}

/// Team keyring subcommands
#[derive(Debug, Subcommand)]
pub enum TeamSubcommand {
    /// Add a team member's public key.
    ///
    /// Without options, searches your keyring interactively.
    Add(TeamAddCommand),

    /// Remove a team member's public key.
    ///
    /// Without options, asks which team member to remove.
    Remove(TeamRemoveCommand),

    /// List all team members' public keys
    List(TeamListCommand),
}

/// Add a key to the team
#[derive(Debug, Args)]
#[command(group(ArgGroup::new("key").multiple(false)))]
pub struct TeamAddCommand {
    /// Add your own public key to the team
    #[arg(long, group = "key")]
    pub me: bool,

    /// Import public key from a file
    #[arg(long, group = "key", value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Import public key by key ID
    #[arg(long, group = "key", value_name = "KEY_ID")]
    pub id: Option<String>,

    /// Import public key by fingerprint
    #[arg(long, group = "key", value_name = "FINGERPRINT")]
    pub fingerprint: Option<String>,
}

/// Remove a key from the team
#[derive(Debug, Args)]
#[command(group(ArgGroup::new("key").multiple(false)))]
pub struct TeamRemoveCommand {
    /// Remove your own public key from the team
    #[arg(long, group = "key")]
    pub me: bool,

    /// Remove public key by key ID
    #[arg(long, group = "key", value_name = "KEY_ID")]
    pub id: Option<String>,

    /// Remove public key by fingerprint
    #[arg(long, group = "key", value_name = "FINGERPRINT")]
    pub fingerprint: Option<String>,
}

/// List team members
#[derive(Debug, Args)]
pub struct TeamListCommand {}

impl TeamAddCommand {
    fn reference(&self) -> Result<KeyReference, KeyringError> {
        KeyReference::from_flags(
            self.me,
            self.file.clone(),
            self.id.clone(),
            self.fingerprint.clone(),
        )
    }
}

impl TeamRemoveCommand {
    fn reference(&self) -> Result<KeyReference, KeyringError> {
        KeyReference::from_flags(self.me, None, self.id.clone(), self.fingerprint.clone())
    }
}

impl TeamCommand {
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        let subcommand_name = match &self.command {
            TeamSubcommand::Add(_) => "add",
            TeamSubcommand::Remove(_) => "remove",
            TeamSubcommand::List(_) => "list",
        };
        info!(subcommand = subcommand_name, "executing team command");
        match &self.command {
            TeamSubcommand::Add(cmd) => cmd.execute(cli),
            TeamSubcommand::Remove(cmd) => cmd.execute(cli),
            TeamSubcommand::List(cmd) => cmd.execute(cli),
        }
    }
}

/// Personal and project keystores for the current repository
fn open_keystores(cli: &Cli) -> anyhow::Result<(GpgKeystore, GpgKeystore)> {
    let cwd = std::env::current_dir()?;
    let config = cli.load_config(&cwd)?;
    let store = RootLocator::from_config(&config.store)
        .locate_trust_store(&cwd)
        .map_err(KeyringError::from)?;

    let personal = GpgKeystore::personal(&config.gpg.program, config.gpg.personal_home.clone());
    let project = GpgKeystore::project(&config.gpg.program, store.path());
    if !project.is_available() {
        return Err(KeyringError::ToolNotFound {
            tool: config.gpg.program.clone(),
            hint: "Install GnuPG or set gpg.program in lockbox.toml".to_string(),
        }
        .into());
    }
    Ok((personal, project))
}

impl TeamAddCommand {
    fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        let reference = self.reference()?;
        let (personal, project) = open_keystores(cli)?;
        let manager = TeamKeyManager::new(&personal, &project);

        let outcome = manager.add(&reference, &mut TerminalPrompt::new())?;

        match cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            }
            OutputFormat::Text if !cli.quiet => {
                output::success(&outcome.message());
                if !outcome.newly_added {
                    output::info("Key was already a team member");
                }
            }
            OutputFormat::Text => {}
        }

        Ok(())
    }
}

impl TeamRemoveCommand {
    fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        let reference = self.reference()?;
        let (personal, project) = open_keystores(cli)?;
        let manager = TeamKeyManager::new(&personal, &project);

        let outcome = manager.remove(&reference, &mut TerminalPrompt::new())?;

        match cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            }
            OutputFormat::Text if !cli.quiet => output::success(&outcome.message()),
            OutputFormat::Text => {}
        }

        Ok(())
    }
}

impl TeamListCommand {
    fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        let (personal, project) = open_keystores(cli)?;
        let members = TeamKeyManager::new(&personal, &project).list()?;

        match cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&members)?);
            }
            OutputFormat::Text => {
                if members.is_empty() {
                    println!("No team members found");
                    return Ok(());
                }

                println!("{}", output::header("Team members:"));
                for member in &members {
                    println!("- {}: {}", style(&member.key_id).cyan(), member.label);
                }
            }
        }

        Ok(())
    }
}
