//! Team membership operations

use std::path::PathBuf;

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::error::{KeyringError, Result};
use crate::key::{KeyReference, PublicKey};
use crate::keystore::Keystore;
use crate::prompt::Prompt;
use crate::selector::KeySelector;

/// Prompt shown when choosing a key to remove
pub const REMOVE_CHOICE_MESSAGE: &str = "Enter the number of the key to remove";

/// Result of adding a key to the team
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddOutcome {
    /// Key id of the added key, unknown for file imports
    pub key_id: Option<String>,
    /// Primary user id found in the project keyring after import
    pub label: Option<String>,
    /// False when the key was already a team member
    pub newly_added: bool,
    /// Source file for `--file` imports
    pub file: Option<PathBuf>,
}

impl AddOutcome {
    /// Human-readable confirmation
    pub fn message(&self) -> String {
        match (&self.file, &self.label, &self.key_id) {
            (Some(_), ..) => "Successfully added key from file".to_string(),
            (None, Some(label), _) => format!("Successfully added key for {label}"),
            (None, None, Some(key_id)) => format!("Successfully added key {key_id}"),
            (None, None, None) => "Successfully added key".to_string(),
        }
    }
}

/// Result of removing a key from the team
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoveOutcome {
    /// Key id that was removed
    pub key_id: String,
    /// Primary user id recorded before deletion
    pub label: Option<String>,
}

impl RemoveOutcome {
    /// Human-readable confirmation
    pub fn message(&self) -> String {
        match &self.label {
            Some(label) => format!("Successfully removed key for {label}"),
            None => format!("Successfully removed key {}", self.key_id),
        }
    }
}

/// A key in the project keyring
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamMember {
    pub key_id: String,
    pub fingerprint: String,
    /// First user id or the placeholder
    pub label: String,
    pub uids: Vec<String>,
}

impl From<PublicKey> for TeamMember {
    fn from(key: PublicKey) -> Self {
        Self {
            label: key.label().to_string(),
            key_id: key.key_id,
            fingerprint: key.fingerprint,
            uids: key.uids,
        }
    }
}

/// Curates the project keyring using keys from the personal keystore
pub struct TeamKeyManager<'a> {
    personal: &'a dyn Keystore,
    project: &'a dyn Keystore,
}

impl<'a> TeamKeyManager<'a> {
    /// Create a manager over the two keyrings
    pub fn new(personal: &'a dyn Keystore, project: &'a dyn Keystore) -> Self {
        Self { personal, project }
    }

    /// Add a key to the project keyring.
    ///
    /// Adding a key that is already present succeeds with
    /// `newly_added == false`.
    #[instrument(skip(self, reference, prompt), fields(reference = %reference))]
    pub fn add(&self, reference: &KeyReference, prompt: &mut dyn Prompt) -> Result<AddOutcome> {
        if let KeyReference::File(path) = reference {
            return self.add_from_file(path);
        }

        let selection = KeySelector::new(prompt).select(reference, self.personal)?;
        let key = selection.key;
        let handle = key.handle();

        let material = self.personal.export_public(handle)?;
        if material.iter().all(u8::is_ascii_whitespace) {
            return Err(KeyringError::ExportFailed(key.key_id.clone()));
        }

        let summary = self.project.import_keys(&material)?;
        if summary.count() == 0 {
            return Err(KeyringError::ImportFailed(format!(
                "project keyring accepted no keys for {}",
                key.key_id
            )));
        }

        let imported = self.project.find_key(handle)?;
        if imported.is_none() {
            warn!(key_id = %key.key_id, "imported key not found in project keyring");
        }
        info!(
            key_id = %key.key_id,
            imported = summary.imported,
            unchanged = summary.unchanged,
            "added team key"
        );

        Ok(AddOutcome {
            key_id: Some(
                imported
                    .as_ref()
                    .map(|k| k.key_id.clone())
                    .unwrap_or_else(|| key.key_id.clone()),
            ),
            label: imported.and_then(|k| k.primary_uid().map(str::to_string)),
            newly_added: summary.imported > 0,
            file: None,
        })
    }

    fn add_from_file(&self, path: &std::path::Path) -> Result<AddOutcome> {
        let data = std::fs::read(path)?;
        if data.iter().all(u8::is_ascii_whitespace) {
            return Err(KeyringError::InvalidKeyMaterial(path.to_path_buf()));
        }

        let summary = self.project.import_keys(&data)?;
        if summary.count() == 0 {
            return Err(KeyringError::InvalidKeyMaterial(path.to_path_buf()));
        }

        info!(
            path = %path.display(),
            imported = summary.imported,
            unchanged = summary.unchanged,
            "added team key from file"
        );
        Ok(AddOutcome {
            key_id: None,
            label: None,
            newly_added: summary.imported > 0,
            file: Some(path.to_path_buf()),
        })
    }

    /// Remove a key from the project keyring
    #[instrument(skip(self, reference, prompt), fields(reference = %reference))]
    pub fn remove(
        &self,
        reference: &KeyReference,
        prompt: &mut dyn Prompt,
    ) -> Result<RemoveOutcome> {
        let snapshot = self.project.list_keys(false)?;
        let mut selector = KeySelector::new(prompt);

        let (key_id, target) = match reference {
            KeyReference::Me => {
                let own = self.own_team_keys(&snapshot)?;
                let chosen = selector.choose_one(own, REMOVE_CHOICE_MESSAGE)?;
                (chosen.key_id.clone(), chosen.handle().to_string())
            }
            KeyReference::Id(id) | KeyReference::Fingerprint(id) => (id.clone(), id.clone()),
            KeyReference::Interactive => {
                if snapshot.is_empty() {
                    return Err(KeyringError::NoTeamMembers);
                }
                let chosen = selector.choose_from(snapshot.clone(), REMOVE_CHOICE_MESSAGE)?;
                (chosen.key_id.clone(), chosen.handle().to_string())
            }
            KeyReference::File(_) => {
                return Err(KeyringError::UnsupportedReference {
                    reference: reference.to_string(),
                    operation: "remove a key",
                })
            }
        };

        self.project
            .delete_public(&target)
            .map_err(|e| match e {
                KeyringError::ToolFailed { reason, .. } => KeyringError::DeleteFailed {
                    key_id: key_id.clone(),
                    reason,
                },
                other => other,
            })?;

        let label = snapshot
            .iter()
            .find(|k| k.matches_id(&target))
            .and_then(|k| k.primary_uid().map(str::to_string));

        info!(key_id = %key_id, "removed team key");
        Ok(RemoveOutcome { key_id, label })
    }

    /// Team keys whose fingerprint is also in the personal keystore, in
    /// project keyring order
    fn own_team_keys(&self, team: &[PublicKey]) -> Result<Vec<PublicKey>> {
        let own = self.personal.list_keys(false)?;
        if own.is_empty() {
            return Err(KeyringError::NoPublicKeys);
        }

        let matching: Vec<PublicKey> = team
            .iter()
            .filter(|t| own.iter().any(|o| o.same_fingerprint(&t.fingerprint)))
            .cloned()
            .collect();
        if matching.is_empty() {
            return Err(KeyringError::NotATeamMember);
        }
        Ok(matching)
    }

    /// List team members in keyring order. An empty team is not an error.
    pub fn list(&self) -> Result<Vec<TeamMember>> {
        Ok(self
            .project
            .list_keys(false)?
            .into_iter()
            .map(TeamMember::from)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{ImportSummary, KeyringKind};
    use crate::memory::MemoryKeyring;
    use crate::prompt::ScriptedPrompt;
    use tempfile::TempDir;

    fn key(id: &str, uid: &str) -> PublicKey {
        PublicKey::new(id, format!("FPR{id}")).with_uid(uid)
    }

    /// Project keyring whose imports never take
    struct RejectingImports(MemoryKeyring);

    impl Keystore for RejectingImports {
        fn kind(&self) -> KeyringKind {
            self.0.kind()
        }
        fn list_keys(&self, secret: bool) -> Result<Vec<PublicKey>> {
            self.0.list_keys(secret)
        }
        fn import_keys(&self, _material: &[u8]) -> Result<ImportSummary> {
            Ok(ImportSummary::default())
        }
        fn export_public(&self, key_id: &str) -> Result<Vec<u8>> {
            self.0.export_public(key_id)
        }
        fn delete_public(&self, key_id: &str) -> Result<()> {
            self.0.delete_public(key_id)
        }
    }

    /// Project keyring that imports but lists nothing back
    struct UnlistedImports(MemoryKeyring);

    impl Keystore for UnlistedImports {
        fn kind(&self) -> KeyringKind {
            self.0.kind()
        }
        fn list_keys(&self, _secret: bool) -> Result<Vec<PublicKey>> {
            Ok(Vec::new())
        }
        fn import_keys(&self, material: &[u8]) -> Result<ImportSummary> {
            self.0.import_keys(material)
        }
        fn export_public(&self, key_id: &str) -> Result<Vec<u8>> {
            self.0.export_public(key_id)
        }
        fn delete_public(&self, key_id: &str) -> Result<()> {
            self.0.delete_public(key_id)
        }
    }

    #[test]
    fn test_add_by_id() {
        let personal = MemoryKeyring::with_keys(KeyringKind::Personal, vec![key("K1", "Alice")]);
        let project = MemoryKeyring::new(KeyringKind::Project);
        let manager = TeamKeyManager::new(&personal, &project);

        let outcome = manager
            .add(&KeyReference::Id("K1".into()), &mut ScriptedPrompt::new())
            .unwrap();
        assert_eq!(outcome.message(), "Successfully added key for Alice");
        assert!(outcome.newly_added);
        assert_eq!(project.fingerprints().len(), 1);
    }

    #[test]
    fn test_add_unknown_id_fails_at_export() {
        let personal = MemoryKeyring::new(KeyringKind::Personal);
        let project = MemoryKeyring::new(KeyringKind::Project);
        let manager = TeamKeyManager::new(&personal, &project);

        let err = manager
            .add(&KeyReference::Id("NOPE".into()), &mut ScriptedPrompt::new())
            .unwrap_err();
        assert!(matches!(err, KeyringError::ExportFailed(id) if id == "NOPE"));
        assert!(project.keys().is_empty());
    }

    #[test]
    fn test_add_import_accepting_nothing_fails() {
        let personal = MemoryKeyring::with_keys(KeyringKind::Personal, vec![key("K1", "Alice")]);
        let project = RejectingImports(MemoryKeyring::with_keys(
            KeyringKind::Project,
            vec![key("K2", "Bob")],
        ));

        let err = TeamKeyManager::new(&personal, &project)
            .add(&KeyReference::Id("K1".into()), &mut ScriptedPrompt::new())
            .unwrap_err();
        assert!(matches!(err, KeyringError::ImportFailed(ref reason) if reason.contains("K1")));
        assert_eq!(project.0.keys(), vec![key("K2", "Bob")]);
    }

    #[test]
    fn test_add_reports_key_id_when_not_found_after_import() {
        let personal = MemoryKeyring::with_keys(KeyringKind::Personal, vec![key("K1", "Alice")]);
        let project = UnlistedImports(MemoryKeyring::new(KeyringKind::Project));

        let outcome = TeamKeyManager::new(&personal, &project)
            .add(&KeyReference::Id("K1".into()), &mut ScriptedPrompt::new())
            .unwrap();
        assert_eq!(outcome.label, None);
        assert_eq!(outcome.key_id.as_deref(), Some("K1"));
        assert_eq!(outcome.message(), "Successfully added key K1");
        assert!(outcome.newly_added);
        assert_eq!(project.0.fingerprints().len(), 1);
    }

    #[test]
    fn test_add_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bob.asc");
        std::fs::write(&path, MemoryKeyring::encode(&[key("K2", "Bob")]).unwrap()).unwrap();

        let personal = MemoryKeyring::new(KeyringKind::Personal);
        let project = MemoryKeyring::new(KeyringKind::Project);
        let manager = TeamKeyManager::new(&personal, &project);

        let outcome = manager
            .add(&KeyReference::File(path.clone()), &mut ScriptedPrompt::new())
            .unwrap();
        assert_eq!(outcome.file, Some(path));
        assert_eq!(outcome.message(), "Successfully added key from file");
        assert_eq!(project.keys()[0].label(), "Bob");
    }

    #[test]
    fn test_add_from_empty_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("empty.asc");
        std::fs::write(&path, "\n\n").unwrap();

        let personal = MemoryKeyring::new(KeyringKind::Personal);
        let project = MemoryKeyring::new(KeyringKind::Project);
        let err = TeamKeyManager::new(&personal, &project)
            .add(&KeyReference::File(path), &mut ScriptedPrompt::new())
            .unwrap_err();
        assert!(matches!(err, KeyringError::InvalidKeyMaterial(_)));
    }

    #[test]
    fn test_add_from_missing_file() {
        let personal = MemoryKeyring::new(KeyringKind::Personal);
        let project = MemoryKeyring::new(KeyringKind::Project);
        let err = TeamKeyManager::new(&personal, &project)
            .add(
                &KeyReference::File("/nonexistent/lockbox/key.asc".into()),
                &mut ScriptedPrompt::new(),
            )
            .unwrap_err();
        assert!(matches!(err, KeyringError::Io(_)));
    }

    #[test]
    fn test_remove_by_fingerprint_uses_snapshot_label() {
        let personal = MemoryKeyring::new(KeyringKind::Personal);
        let project = MemoryKeyring::with_keys(
            KeyringKind::Project,
            vec![key("K1", "Alice"), key("K2", "Bob")],
        );
        let outcome = TeamKeyManager::new(&personal, &project)
            .remove(&KeyReference::Fingerprint("FPRK2".into()), &mut ScriptedPrompt::new())
            .unwrap();
        assert_eq!(outcome.message(), "Successfully removed key for Bob");
        assert_eq!(project.keys().len(), 1);
    }

    #[test]
    fn test_remove_unknown_id_fails() {
        let personal = MemoryKeyring::new(KeyringKind::Personal);
        let project = MemoryKeyring::with_keys(KeyringKind::Project, vec![key("K1", "Alice")]);
        let err = TeamKeyManager::new(&personal, &project)
            .remove(&KeyReference::Id("NOPE".into()), &mut ScriptedPrompt::new())
            .unwrap_err();
        assert!(matches!(err, KeyringError::DeleteFailed { .. }));
        assert_eq!(project.keys().len(), 1);
    }

    #[test]
    fn test_remove_key_without_uid_reports_id() {
        let personal = MemoryKeyring::new(KeyringKind::Personal);
        let project = MemoryKeyring::with_keys(
            KeyringKind::Project,
            vec![PublicKey::new("K9", "FPRK9")],
        );
        let outcome = TeamKeyManager::new(&personal, &project)
            .remove(&KeyReference::Id("K9".into()), &mut ScriptedPrompt::new())
            .unwrap();
        assert_eq!(outcome.message(), "Successfully removed key K9");
    }

    #[test]
    fn test_remove_interactive_always_prompts() {
        let personal = MemoryKeyring::new(KeyringKind::Personal);
        let project = MemoryKeyring::with_keys(KeyringKind::Project, vec![key("K1", "Alice")]);
        let mut prompt = ScriptedPrompt::new().with_choice(1);
        TeamKeyManager::new(&personal, &project)
            .remove(&KeyReference::Interactive, &mut prompt)
            .unwrap();
        assert!(prompt.was_asked());
        assert_eq!(prompt.searches, 0);
        assert!(project.keys().is_empty());
    }

    #[test]
    fn test_remove_me_not_a_member() {
        let personal = MemoryKeyring::with_keys(KeyringKind::Personal, vec![key("K3", "Carol")]);
        let project = MemoryKeyring::with_keys(KeyringKind::Project, vec![key("K1", "Alice")]);
        let err = TeamKeyManager::new(&personal, &project)
            .remove(&KeyReference::Me, &mut ScriptedPrompt::new())
            .unwrap_err();
        assert!(matches!(err, KeyringError::NotATeamMember));
        assert_eq!(project.keys().len(), 1);
    }

    #[test]
    fn test_remove_me_empty_personal() {
        let personal = MemoryKeyring::new(KeyringKind::Personal);
        let project = MemoryKeyring::with_keys(KeyringKind::Project, vec![key("K1", "Alice")]);
        let err = TeamKeyManager::new(&personal, &project)
            .remove(&KeyReference::Me, &mut ScriptedPrompt::new())
            .unwrap_err();
        assert!(matches!(err, KeyringError::NoPublicKeys));
    }

    #[test]
    fn test_remove_me_disambiguates_intersection() {
        let personal = MemoryKeyring::with_keys(
            KeyringKind::Personal,
            vec![key("K2", "Me laptop"), key("K3", "Me desktop"), key("K5", "Not in team")],
        );
        let project = MemoryKeyring::with_keys(
            KeyringKind::Project,
            vec![key("K1", "Alice"), key("K3", "Me desktop"), key("K2", "Me laptop")],
        );
        let mut prompt = ScriptedPrompt::new().with_choice(2);
        let outcome = TeamKeyManager::new(&personal, &project)
            .remove(&KeyReference::Me, &mut prompt)
            .unwrap();

        // numbered in project keyring order
        assert_eq!(
            prompt.presented[0],
            vec!["Me desktop (K3)".to_string(), "Me laptop (K2)".to_string()]
        );
        assert_eq!(outcome.key_id, "K2");
        assert_eq!(
            project.fingerprints().into_iter().collect::<Vec<_>>(),
            vec!["FPRK1".to_string(), "FPRK3".to_string()]
        );
    }

    #[test]
    fn test_remove_file_reference_rejected() {
        let personal = MemoryKeyring::new(KeyringKind::Personal);
        let project = MemoryKeyring::with_keys(KeyringKind::Project, vec![key("K1", "Alice")]);
        let err = TeamKeyManager::new(&personal, &project)
            .remove(&KeyReference::File("k.asc".into()), &mut ScriptedPrompt::new())
            .unwrap_err();
        assert!(matches!(err, KeyringError::UnsupportedReference { .. }));
    }

    #[test]
    fn test_list_members_in_order() {
        let personal = MemoryKeyring::new(KeyringKind::Personal);
        let project = MemoryKeyring::with_keys(
            KeyringKind::Project,
            vec![key("K1", "Alice"), PublicKey::new("K2", "FPRK2")],
        );
        let members = TeamKeyManager::new(&personal, &project).list().unwrap();
        let labels: Vec<_> = members.iter().map(|m| (m.key_id.as_str(), m.label.as_str())).collect();
        assert_eq!(labels, vec![("K1", "Alice"), ("K2", "No UID")]);
    }

    #[test]
    fn test_add_outcome_messages() {
        let outcome = AddOutcome {
            key_id: Some("K1".into()),
            label: None,
            newly_added: true,
            file: None,
        };
        assert_eq!(outcome.message(), "Successfully added key K1");
    }
}
