//! CLI definition and command handling

pub mod commands;
pub mod output;
pub mod prompt;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use lockbox_core::config::{load_config_for, Config};

use commands::{CompletionsCommand, InitCommand, TeamCommand};

/// Lockbox - secure team secret management
#[derive(Debug, Parser)]
#[command(name = "lockbox")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Working directory
    #[arg(short = 'C', long, global = true)]
    pub directory: Option<PathBuf>,

    /// Configuration file (default: nearest lockbox.toml or lockbox.yaml)
    #[arg(long, global = true, env = "LOCKBOX_CONFIG")]
    pub config: Option<PathBuf>,

    /// gpg executable, overriding the configuration
    #[arg(long, global = true, env = "LOCKBOX_GPG")]
    pub gpg: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for CLI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output
    Json,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Initialize the lockbox directory in the current git repository
    Init(InitCommand),

    /// Manage team members' public keys
    Team(TeamCommand),

    /// Generate shell completions
    Completions(CompletionsCommand),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(&self) -> anyhow::Result<()> {
        // Change to specified directory if provided
        if let Some(dir) = &self.directory {
            std::env::set_current_dir(dir)?;
        }

        match &self.command {
            Commands::Init(cmd) => cmd.execute(self),
            Commands::Team(cmd) => cmd.execute(self),
            Commands::Completions(cmd) => cmd.execute(self),
        }
    }

    /// Load configuration for `dir`, applying command-line overrides
    pub fn load_config(&self, dir: &Path) -> anyhow::Result<Config> {
        let (mut config, path) = load_config_for(self.config.as_deref(), dir)?;
        if let Some(path) = path {
            tracing::debug!(path = %path.display(), "using configuration file");
        }
        if let Some(gpg) = &self.gpg {
            config.gpg.program = gpg.clone();
        }
        Ok(config)
    }
}
