//! Configuration validation

use std::path::Component;

use tracing::debug;

use crate::error::{ConfigError, Result};

use super::types::Config;

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    debug!("validating configuration");
    validate_store(config)?;
    validate_gpg(config)?;
    debug!("configuration validation passed");
    Ok(())
}

fn validate_store(config: &Config) -> Result<()> {
    let dir = &config.store.dir;
    if dir.as_os_str().is_empty() {
        return Err(ConfigError::InvalidValue {
            field: "store.dir".to_string(),
            message: "directory cannot be empty".to_string(),
        }
        .into());
    }

    if dir
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return Err(ConfigError::InvalidValue {
            field: "store.dir".to_string(),
            message: "must be a relative path inside the repository".to_string(),
        }
        .into());
    }

    if config.store.marker.is_empty() {
        return Err(ConfigError::InvalidValue {
            field: "store.marker".to_string(),
            message: "marker cannot be empty".to_string(),
        }
        .into());
    }

    Ok(())
}

fn validate_gpg(config: &Config) -> Result<()> {
    if config.gpg.program.trim().is_empty() {
        return Err(ConfigError::InvalidValue {
            field: "gpg.program".to_string(),
            message: "program cannot be empty".to_string(),
        }
        .into());
    }

    Ok(())
}
