//! Configuration types

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::defaults::{DEFAULT_GPG_PROGRAM, DEFAULT_REPOSITORY_MARKER, DEFAULT_STORE_DIR};

/// Main configuration for Lockbox
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Trust store configuration
    pub store: StoreConfig,

    /// GnuPG configuration
    pub gpg: GpgConfig,
}

/// Where the project trust store lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Trust store directory, relative to the repository root
    pub dir: PathBuf,

    /// File or directory that marks the repository root
    pub marker: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_STORE_DIR),
            marker: DEFAULT_REPOSITORY_MARKER.to_string(),
        }
    }
}

/// GnuPG invocation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GpgConfig {
    /// Path or name of the gpg executable
    pub program: String,

    /// Home directory of the personal keystore (gpg default when unset)
    pub personal_home: Option<PathBuf>,
}

impl Default for GpgConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_GPG_PROGRAM.to_string(),
            personal_home: None,
        }
    }
}
