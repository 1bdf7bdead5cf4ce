//! Key records and references

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::error::{KeyringError, Result};

/// Label shown for keys without any user id
pub const NO_UID: &str = "No UID";

/// A public key as listed by a keystore
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKey {
    /// Short key id (lookup alias, not guaranteed unique)
    pub key_id: String,

    /// Full fingerprint (canonical identity)
    pub fingerprint: String,

    /// User ids in keystore order
    #[serde(default)]
    pub uids: Vec<String>,

    /// Whether the keystore also holds the secret key
    #[serde(default)]
    pub has_secret: bool,
}

impl PublicKey {
    /// Create a key record without secret material
    pub fn new(key_id: impl Into<String>, fingerprint: impl Into<String>) -> Self {
        Self {
            key_id: key_id.into(),
            fingerprint: fingerprint.into(),
            uids: Vec::new(),
            has_secret: false,
        }
    }

    /// Add a user id
    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        self.uids.push(uid.into());
        self
    }

    /// Mark the key as having secret material
    pub fn with_secret(mut self) -> Self {
        self.has_secret = true;
        self
    }

    /// First user id, if any
    pub fn primary_uid(&self) -> Option<&str> {
        self.uids.first().map(String::as_str)
    }

    /// First user id, or the placeholder
    pub fn label(&self) -> &str {
        self.primary_uid().unwrap_or(NO_UID)
    }

    /// Whether `fingerprint` identifies this key
    pub fn same_fingerprint(&self, fingerprint: &str) -> bool {
        self.fingerprint.eq_ignore_ascii_case(fingerprint)
    }

    /// Whether a user-supplied id or fingerprint refers to this key.
    ///
    /// Accepts an optional `0x` prefix and any 8+ digit tail of the
    /// fingerprint, the way gpg resolves short and long key ids.
    pub fn matches_id(&self, query: &str) -> bool {
        let query = normalize_id(query);
        if query.is_empty() {
            return false;
        }
        if self.key_id.eq_ignore_ascii_case(&query) || self.same_fingerprint(&query) {
            return true;
        }
        query.len() >= 8
            && self
                .fingerprint
                .len()
                .checked_sub(query.len())
                .and_then(|start| self.fingerprint.get(start..))
                .is_some_and(|tail| tail.eq_ignore_ascii_case(&query))
    }

    /// Case-insensitive substring search over all user ids.
    ///
    /// An empty (or whitespace-only) term matches every key.
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        term.is_empty() || self.uids.iter().any(|uid| uid.to_lowercase().contains(&term))
    }

    /// Most precise handle to pass to a keystore
    pub fn handle(&self) -> &str {
        if self.fingerprint.is_empty() {
            &self.key_id
        } else {
            &self.fingerprint
        }
    }

    /// One-line description used in numbered choices
    pub fn display_line(&self) -> String {
        format!("{} ({})", self.label(), self.key_id)
    }
}

fn normalize_id(query: &str) -> String {
    let trimmed = query.trim();
    let without_prefix = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    without_prefix.chars().filter(|c| !c.is_whitespace()).collect()
}

/// How the operator identified a key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyReference {
    /// The operator's own secret-capable key
    Me,
    /// Armored or binary key material in a file
    File(PathBuf),
    /// Key id
    Id(String),
    /// Fingerprint
    Fingerprint(String),
    /// Search and pick interactively
    Interactive,
}

impl KeyReference {
    /// Build a reference from CLI flags, rejecting more than one selector
    pub fn from_flags(
        me: bool,
        file: Option<PathBuf>,
        id: Option<String>,
        fingerprint: Option<String>,
    ) -> Result<Self> {
        let set = [me, file.is_some(), id.is_some(), fingerprint.is_some()]
            .iter()
            .filter(|s| **s)
            .count();
        if set > 1 {
            return Err(KeyringError::ConflictingReferences);
        }

        Ok(match (me, file, id, fingerprint) {
            (true, ..) => Self::Me,
            (_, Some(path), ..) => Self::File(path),
            (_, _, Some(id), _) => Self::Id(id),
            (_, _, _, Some(fp)) => Self::Fingerprint(fp),
            _ => Self::Interactive,
        })
    }
}

impl fmt::Display for KeyReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Me => write!(f, "--me"),
            Self::File(path) => write!(f, "--file {}", path.display()),
            Self::Id(id) => write!(f, "--id {id}"),
            Self::Fingerprint(fp) => write!(f, "--fingerprint {fp}"),
            Self::Interactive => write!(f, "interactive"),
        }
    }
}

/// Which keyring a key was selected from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyringKind {
    /// The operator's own keystore
    Personal,
    /// The project trust store
    Project,
}

impl fmt::Display for KeyringKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Personal => write!(f, "personal"),
            Self::Project => write!(f, "project"),
        }
    }
}

/// The key chosen by the selector and where it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionResult {
    pub key: PublicKey,
    pub source: KeyringKind,
}

/// Counts reported by a keystore import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    /// Keys found in the material
    pub considered: usize,
    /// Keys that were new to the keyring
    pub imported: usize,
    /// Keys already present and left as they were
    pub unchanged: usize,
}

impl ImportSummary {
    /// Keys the keyring now holds from this material
    pub fn count(&self) -> usize {
        self.imported + self.unchanged
    }
}
