//! Keystore trait

use crate::error::Result;
use crate::key::{ImportSummary, KeyringKind, PublicKey};

/// A keyring backend holding public (and possibly secret) keys.
///
/// Methods take `&self`; each call is one atomic operation against the
/// backing store.
pub trait Keystore {
    /// Which keyring this is
    fn kind(&self) -> KeyringKind;

    /// List keys in enumeration order. With `secret`, only keys whose
    /// secret material is present.
    fn list_keys(&self, secret: bool) -> Result<Vec<PublicKey>>;

    /// Import key material, reporting what changed
    fn import_keys(&self, material: &[u8]) -> Result<ImportSummary>;

    /// Export the public material of a key. Unknown keys yield empty output.
    fn export_public(&self, key_id: &str) -> Result<Vec<u8>>;

    /// Delete a public key by id or fingerprint
    fn delete_public(&self, key_id: &str) -> Result<()>;

    /// Find a key by id or fingerprint
    fn find_key(&self, query: &str) -> Result<Option<PublicKey>> {
        Ok(self
            .list_keys(false)?
            .into_iter()
            .find(|key| key.matches_id(query)))
    }
}
