//! Init command

use clap::Args;
use console::style;
use tracing::info;

use lockbox_core::RootLocator;

use crate::cli::{output, Cli, OutputFormat};

/// Create the trust store directory at the repository root
#[derive(Debug, Args)]
pub struct InitCommand {}

impl InitCommand {
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        let cwd = std::env::current_dir()?;
        let config = cli.load_config(&cwd)?;
        let locator = RootLocator::from_config(&config.store);
        let root = locator.locate_root(&cwd)?;
        let store = root.join(locator.store_dir());

        let created = !store.exists();
        if created {
            std::fs::create_dir_all(&store)?;
            // gpg refuses home directories readable by others
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                std::fs::set_permissions(&store, std::fs::Permissions::from_mode(0o700))?;
            }
            info!(path = %store.display(), "created trust store");
        } else if !store.is_dir() {
            anyhow::bail!("{} exists and is not a directory", store.display());
        }

        match cli.format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "path": store.to_string_lossy(),
                    "created": created,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Text if cli.quiet => {}
            OutputFormat::Text if created => output::success(&format!(
                "Created Lockbox directory at '{}'",
                style(store.display()).cyan()
            )),
            OutputFormat::Text => output::info(&format!(
                "Lockbox directory already exists at '{}'",
                style(store.display()).cyan()
            )),
        }

        Ok(())
    }
}
