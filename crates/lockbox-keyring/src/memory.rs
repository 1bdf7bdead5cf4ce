//! In-memory keystore

use std::cell::RefCell;
use std::collections::BTreeSet;

use tracing::debug;

use crate::error::{KeyringError, Result};
use crate::key::{ImportSummary, KeyringKind, PublicKey};
use crate::keystore::Keystore;

/// A keystore held in memory.
///
/// Exported material is a JSON array of public key records; importing
/// anything else counts as zero keys, the way gpg treats non-OpenPGP input.
#[derive(Debug)]
pub struct MemoryKeyring {
    kind: KeyringKind,
    keys: RefCell<Vec<PublicKey>>,
}

impl MemoryKeyring {
    /// Create an empty keyring
    pub fn new(kind: KeyringKind) -> Self {
        Self::with_keys(kind, Vec::new())
    }

    /// Create a keyring holding `keys`, later duplicates dropped
    pub fn with_keys(kind: KeyringKind, keys: Vec<PublicKey>) -> Self {
        let mut unique: Vec<PublicKey> = Vec::with_capacity(keys.len());
        for key in keys {
            if !unique.iter().any(|k| k.same_fingerprint(&key.fingerprint)) {
                unique.push(key);
            }
        }
        Self {
            kind,
            keys: RefCell::new(unique),
        }
    }

    /// Snapshot of the held keys
    pub fn keys(&self) -> Vec<PublicKey> {
        self.keys.borrow().clone()
    }

    /// Held fingerprints, upper-cased
    pub fn fingerprints(&self) -> BTreeSet<String> {
        self.keys
            .borrow()
            .iter()
            .map(|k| k.fingerprint.to_ascii_uppercase())
            .collect()
    }

    /// Serialize keys as exportable public material
    pub fn encode(keys: &[PublicKey]) -> Result<Vec<u8>> {
        let public: Vec<PublicKey> = keys
            .iter()
            .cloned()
            .map(|mut k| {
                k.has_secret = false;
                k
            })
            .collect();
        Ok(serde_json::to_vec_pretty(&public)?)
    }
}

impl Keystore for MemoryKeyring {
    fn kind(&self) -> KeyringKind {
        self.kind
    }

    fn list_keys(&self, secret: bool) -> Result<Vec<PublicKey>> {
        Ok(self
            .keys
            .borrow()
            .iter()
            .filter(|k| !secret || k.has_secret)
            .cloned()
            .collect())
    }

    fn import_keys(&self, material: &[u8]) -> Result<ImportSummary> {
        let incoming: Vec<PublicKey> = match serde_json::from_slice(material) {
            Ok(keys) => keys,
            Err(e) => {
                debug!(error = %e, "material holds no key records");
                return Ok(ImportSummary::default());
            }
        };

        let mut summary = ImportSummary {
            considered: incoming.len(),
            ..ImportSummary::default()
        };
        let mut keys = self.keys.borrow_mut();
        for mut key in incoming {
            if key.fingerprint.is_empty() {
                continue;
            }
            if keys.iter().any(|k| k.same_fingerprint(&key.fingerprint)) {
                summary.unchanged += 1;
            } else {
                key.has_secret = false;
                keys.push(key);
                summary.imported += 1;
            }
        }
        Ok(summary)
    }

    fn export_public(&self, key_id: &str) -> Result<Vec<u8>> {
        let matching: Vec<PublicKey> = self
            .keys
            .borrow()
            .iter()
            .filter(|k| k.matches_id(key_id))
            .cloned()
            .collect();
        if matching.is_empty() {
            return Ok(Vec::new());
        }
        Self::encode(&matching)
    }

    fn delete_public(&self, key_id: &str) -> Result<()> {
        let mut keys = self.keys.borrow_mut();
        let position = keys
            .iter()
            .position(|k| k.matches_id(key_id))
            .ok_or_else(|| KeyringError::DeleteFailed {
                key_id: key_id.to_string(),
                reason: "key not found".to_string(),
            })?;
        keys.remove(position);
        Ok(())
    }
}
