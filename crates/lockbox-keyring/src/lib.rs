//! Lockbox Keyring - team keyring management
//!
//! This crate curates the set of public keys trusted by a project. It
//! provides:
//! - [`Keystore`]: the seam over a keyring backend, implemented by
//!   [`GpgKeystore`] and the in-memory [`MemoryKeyring`]
//! - [`KeySelector`]: resolves a [`KeyReference`] to exactly one key
//! - [`TeamKeyManager`]: add, remove and list team members
//!
//! Interactive disambiguation goes through the [`Prompt`] trait so callers
//! decide how choices are presented.

pub mod error;
pub mod gpg;
pub mod key;
pub mod keystore;
pub mod manager;
pub mod memory;
pub mod prompt;
pub mod selector;

pub use error::{KeyringError, Result};
pub use gpg::GpgKeystore;
pub use key::{ImportSummary, KeyReference, KeyringKind, PublicKey, SelectionResult};
pub use keystore::Keystore;
pub use manager::{AddOutcome, RemoveOutcome, TeamKeyManager, TeamMember};
pub use memory::MemoryKeyring;
pub use prompt::{Prompt, ScriptedPrompt};
pub use selector::KeySelector;
