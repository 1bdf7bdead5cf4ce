//! Key selection and disambiguation

use tracing::{debug, instrument};

use crate::error::{KeyringError, Result};
use crate::key::{KeyReference, PublicKey, SelectionResult};
use crate::keystore::Keystore;
use crate::prompt::Prompt;

/// Prompt shown before the interactive search
pub const SEARCH_MESSAGE: &str = "Enter name or email to search (or press Enter to list all)";

/// Prompt shown when several keys match during add
pub const ADD_CHOICE_MESSAGE: &str = "Enter the number of the key to add";

/// Resolves a [`KeyReference`] to exactly one key
pub struct KeySelector<'a> {
    prompt: &'a mut dyn Prompt,
}

impl<'a> KeySelector<'a> {
    /// Create a selector that disambiguates through `prompt`
    pub fn new(prompt: &'a mut dyn Prompt) -> Self {
        Self { prompt }
    }

    /// Resolve `reference` against `source`
    #[instrument(skip(self, reference, source), fields(reference = %reference, keyring = %source.kind()))]
    pub fn select(
        &mut self,
        reference: &KeyReference,
        source: &dyn Keystore,
    ) -> Result<SelectionResult> {
        let key = match reference {
            // existence is checked by the keystore at export/delete time
            KeyReference::Id(id) => PublicKey::new(id.clone(), ""),
            KeyReference::Fingerprint(fp) => PublicKey::new(fp.clone(), fp.clone()),
            KeyReference::Me => Self::first_secret_key(source)?,
            KeyReference::Interactive => self.interactive(source)?,
            KeyReference::File(_) => {
                return Err(KeyringError::UnsupportedReference {
                    reference: reference.to_string(),
                    operation: "select a key",
                })
            }
        };

        debug!(key_id = %key.key_id, "selected key");
        Ok(SelectionResult {
            key,
            source: source.kind(),
        })
    }

    fn first_secret_key(source: &dyn Keystore) -> Result<PublicKey> {
        let mut secret = source.list_keys(true)?.into_iter();
        let first = secret.next().ok_or(KeyringError::NoSecretKeys)?;
        let skipped: Vec<String> = secret.map(|k| k.key_id).collect();
        if !skipped.is_empty() {
            debug!(chosen = %first.key_id, ?skipped, "several secret keys, using the first");
        }
        Ok(first)
    }

    fn interactive(&mut self, source: &dyn Keystore) -> Result<PublicKey> {
        let keys = source.list_keys(false)?;
        if keys.is_empty() {
            return Err(KeyringError::NoPublicKeys);
        }

        let term = self.prompt.search_term(SEARCH_MESSAGE)?;
        let matching = search(&keys, &term);
        debug!(term = %term, matches = matching.len(), "searched keys");
        if matching.is_empty() {
            return Err(KeyringError::NoMatchingKeys(term.trim().to_string()));
        }

        self.choose_one(matching, ADD_CHOICE_MESSAGE)
    }

    /// Pick one of `keys`: a single key is taken as is, otherwise the
    /// operator chooses from a numbered list.
    pub fn choose_one(&mut self, keys: Vec<PublicKey>, message: &str) -> Result<PublicKey> {
        if keys.len() == 1 {
            return keys.into_iter().next().ok_or(KeyringError::NoPublicKeys);
        }
        self.choose_from(keys, message)
    }

    /// Always ask the operator to pick from a numbered list, even for one key
    pub fn choose_from(&mut self, keys: Vec<PublicKey>, message: &str) -> Result<PublicKey> {
        let items: Vec<String> = keys.iter().map(PublicKey::display_line).collect();
        let index = self.prompt.choose(message, &items)?;
        let max = keys.len();
        keys.into_iter()
            .nth(index)
            .ok_or(KeyringError::InvalidChoice {
                choice: index.wrapping_add(1),
                max,
            })
    }
}

/// Keys with a user id containing `term`, case-insensitively, in order.
/// An empty term keeps every key.
pub fn search(keys: &[PublicKey], term: &str) -> Vec<PublicKey> {
    keys.iter()
        .filter(|k| k.matches_search(term))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::KeyringKind;
    use crate::memory::MemoryKeyring;
    use crate::prompt::ScriptedPrompt;

    fn key(id: &str, uid: &str) -> PublicKey {
        PublicKey::new(id, format!("FP{id}")).with_uid(uid)
    }

    fn personal() -> MemoryKeyring {
        MemoryKeyring::with_keys(
            KeyringKind::Personal,
            vec![
                key("K1", "alice <alice@x.com>"),
                key("K2", "Bob <bob@x.com>"),
                key("K3", "Alicia <alicia@x.com>"),
            ],
        )
    }

    #[test]
    fn test_interactive_single_match_skips_prompt() {
        let source = personal();
        let mut prompt = ScriptedPrompt::new().with_term("bob");
        let result = KeySelector::new(&mut prompt)
            .select(&KeyReference::Interactive, &source)
            .unwrap();
        assert_eq!(result.key.key_id, "K2");
        assert_eq!(result.source, KeyringKind::Personal);
        assert!(!prompt.was_asked());
    }

    #[test]
    fn test_interactive_multiple_matches_numbered_in_order() {
        let source = personal();
        let mut prompt = ScriptedPrompt::new().with_term("ALI").with_choice(2);
        let result = KeySelector::new(&mut prompt)
            .select(&KeyReference::Interactive, &source)
            .unwrap();
        assert_eq!(result.key.key_id, "K3");
        assert_eq!(
            prompt.presented,
            vec![vec![
                "alice <alice@x.com> (K1)".to_string(),
                "Alicia <alicia@x.com> (K3)".to_string(),
            ]]
        );
    }

    #[test]
    fn test_interactive_empty_term_lists_all() {
        let source = personal();
        let mut prompt = ScriptedPrompt::new().with_term("").with_choice(1);
        KeySelector::new(&mut prompt)
            .select(&KeyReference::Interactive, &source)
            .unwrap();
        assert_eq!(prompt.presented[0].len(), 3);
    }

    #[test]
    fn test_interactive_no_match() {
        let source = personal();
        let mut prompt = ScriptedPrompt::new().with_term("carol");
        let err = KeySelector::new(&mut prompt)
            .select(&KeyReference::Interactive, &source)
            .unwrap_err();
        assert!(matches!(err, KeyringError::NoMatchingKeys(t) if t == "carol"));
    }

    #[test]
    fn test_interactive_empty_keyring() {
        let source = MemoryKeyring::new(KeyringKind::Personal);
        let mut prompt = ScriptedPrompt::new();
        let err = KeySelector::new(&mut prompt)
            .select(&KeyReference::Interactive, &source)
            .unwrap_err();
        assert!(matches!(err, KeyringError::NoPublicKeys));
        assert_eq!(prompt.searches, 0);
    }

    #[test]
    fn test_out_of_range_choice_is_rejected() {
        let source = personal();
        let mut prompt = ScriptedPrompt::new().with_term("").with_choice(7);
        let err = KeySelector::new(&mut prompt)
            .select(&KeyReference::Interactive, &source)
            .unwrap_err();
        assert!(matches!(err, KeyringError::InvalidChoice { choice: 7, max: 3 }));
    }

    #[test]
    fn test_me_requires_secret_key() {
        let source = personal();
        let mut prompt = ScriptedPrompt::new();
        let err = KeySelector::new(&mut prompt)
            .select(&KeyReference::Me, &source)
            .unwrap_err();
        assert!(matches!(err, KeyringError::NoSecretKeys));
    }

    #[test]
    fn test_me_takes_first_secret_key() {
        let source = MemoryKeyring::with_keys(
            KeyringKind::Personal,
            vec![
                key("K1", "public only"),
                key("K2", "first secret").with_secret(),
                key("K3", "second secret").with_secret(),
            ],
        );
        let mut prompt = ScriptedPrompt::new();
        let result = KeySelector::new(&mut prompt)
            .select(&KeyReference::Me, &source)
            .unwrap();
        assert_eq!(result.key.key_id, "K2");
        assert!(result.key.has_secret);
    }

    #[test]
    fn test_id_and_fingerprint_pass_through() {
        let source = MemoryKeyring::new(KeyringKind::Personal);
        let mut prompt = ScriptedPrompt::new();
        let mut selector = KeySelector::new(&mut prompt);

        let by_id = selector
            .select(&KeyReference::Id("DEADBEEF".into()), &source)
            .unwrap();
        assert_eq!(by_id.key.handle(), "DEADBEEF");

        let by_fp = selector
            .select(&KeyReference::Fingerprint("F00D".into()), &source)
            .unwrap();
        assert_eq!(by_fp.key.fingerprint, "F00D");
    }

    #[test]
    fn test_file_reference_not_selectable() {
        let source = personal();
        let mut prompt = ScriptedPrompt::new();
        let err = KeySelector::new(&mut prompt)
            .select(&KeyReference::File("key.asc".into()), &source)
            .unwrap_err();
        assert!(matches!(err, KeyringError::UnsupportedReference { .. }));
    }

    #[test]
    fn test_search_property() {
        let keys = personal().keys();
        for term in ["ali", "x.com", "BOB", "zzz", ""] {
            let found = search(&keys, term);
            for k in &keys {
                let expected = term.is_empty()
                    || k.uids.iter().any(|u| u.to_lowercase().contains(&term.to_lowercase()));
                assert_eq!(found.contains(k), expected, "term {term:?} key {}", k.key_id);
            }
        }
    }
}
