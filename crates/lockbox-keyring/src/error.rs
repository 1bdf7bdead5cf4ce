//! Error types for keyring operations

use std::path::PathBuf;
use thiserror::Error;

use lockbox_core::LocateError;

/// Result type alias for keyring operations
pub type Result<T> = std::result::Result<T, KeyringError>;

/// Keyring-related errors
#[derive(Debug, Error)]
pub enum KeyringError {
    /// Repository or trust store could not be located
    #[error(transparent)]
    Locate(#[from] LocateError),

    /// More than one key reference supplied
    #[error("Only one of --me, --file, --id, or --fingerprint can be used")]
    ConflictingReferences,

    /// Personal keystore has no secret keys
    #[error("No private keys found in your keyring")]
    NoSecretKeys,

    /// Personal keystore has no public keys
    #[error("No public keys found in your keyring")]
    NoPublicKeys,

    /// Interactive search matched nothing
    #[error("No matching keys found for '{0}'")]
    NoMatchingKeys(String),

    /// Project keyring is empty
    #[error("No team members found")]
    NoTeamMembers,

    /// None of the operator's keys are in the project keyring
    #[error("None of your keys were found in the team")]
    NotATeamMember,

    /// Import reported zero keys
    #[error("Failed to import key: {0}")]
    ImportFailed(String),

    /// Export produced no material
    #[error("Failed to export key {0}")]
    ExportFailed(String),

    /// Delete did not succeed
    #[error("Failed to remove key {key_id}: {reason}")]
    DeleteFailed { key_id: String, reason: String },

    /// File does not contain usable public key material
    #[error("No valid key material found in {0}")]
    InvalidKeyMaterial(PathBuf),

    /// Reference variant not valid for the requested operation
    #[error("Key reference '{reference}' cannot be used to {operation}")]
    UnsupportedReference {
        reference: String,
        operation: &'static str,
    },

    /// Choice outside the presented range
    #[error("Invalid choice {choice}, expected 1-{max}")]
    InvalidChoice { choice: usize, max: usize },

    /// Prompt interaction failed
    #[error("Prompt failed: {0}")]
    Prompt(String),

    /// Keystore tool not installed
    #[error("Keystore tool not found: {tool}. {hint}")]
    ToolNotFound { tool: String, hint: String },

    /// Keystore tool exited unsuccessfully
    #[error("Keystore tool failed: {tool} - {reason}")]
    ToolFailed { tool: String, reason: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl KeyringError {
    /// Whether the error comes from looking for keys that are not there
    pub fn is_selection(&self) -> bool {
        matches!(
            self,
            Self::NoSecretKeys
                | Self::NoPublicKeys
                | Self::NoMatchingKeys(_)
                | Self::NoTeamMembers
                | Self::NotATeamMember
                | Self::InvalidChoice { .. }
        )
    }
}
