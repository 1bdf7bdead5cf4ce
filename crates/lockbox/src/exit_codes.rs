//! Exit codes for the CLI

use lockbox_core::error::{ConfigError, CoreError, LocateError};
use lockbox_keyring::KeyringError;

/// General error
pub const ERROR: i32 = 1;

/// Configuration or usage error
pub const CONFIG_ERROR: i32 = 2;

/// Repository or trust store not found
pub const LOCATE_ERROR: i32 = 3;

/// Keyring operation failed
pub const KEYRING_ERROR: i32 = 4;

/// No key could be selected
pub const SELECTION_ERROR: i32 = 5;

/// Map a command error to its exit code
pub fn for_error(err: &anyhow::Error) -> i32 {
    if let Some(e) = err.downcast_ref::<KeyringError>() {
        return match e {
            KeyringError::Locate(_) => LOCATE_ERROR,
            KeyringError::ConflictingReferences => CONFIG_ERROR,
            e if e.is_selection() => SELECTION_ERROR,
            _ => KEYRING_ERROR,
        };
    }
    if err.downcast_ref::<LocateError>().is_some() {
        return LOCATE_ERROR;
    }
    if let Some(e) = err.downcast_ref::<CoreError>() {
        return match e {
            CoreError::Config(_) => CONFIG_ERROR,
            CoreError::Io(_) => ERROR,
        };
    }
    if err.downcast_ref::<ConfigError>().is_some() {
        return CONFIG_ERROR;
    }
    ERROR
}
