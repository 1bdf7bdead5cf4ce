//! Repository root and trust store discovery

use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use crate::config::{StoreConfig, DEFAULT_REPOSITORY_MARKER, DEFAULT_STORE_DIR};
use crate::error::LocateError;

/// A located, initialized trust store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustStore {
    root: PathBuf,
    path: PathBuf,
}

impl TrustStore {
    /// Repository root containing the marker
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Trust store directory
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Finds the repository root and its trust store by walking parent directories
#[derive(Debug, Clone)]
pub struct RootLocator {
    marker: String,
    store_dir: PathBuf,
}

impl RootLocator {
    /// Create a locator for the given marker and store directory
    pub fn new(marker: impl Into<String>, store_dir: impl Into<PathBuf>) -> Self {
        Self {
            marker: marker.into(),
            store_dir: store_dir.into(),
        }
    }

    /// Create a locator from store configuration
    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(config.marker.clone(), config.dir.clone())
    }

    /// Trust store directory name, relative to the root
    pub fn store_dir(&self) -> &Path {
        &self.store_dir
    }

    /// Walk upward from `start` to the nearest directory containing the marker
    #[instrument(skip(self), fields(start = %start.display(), marker = %self.marker))]
    pub fn locate_root(&self, start: &Path) -> Result<PathBuf, LocateError> {
        let mut current = start.to_path_buf();
        loop {
            if current.join(&self.marker).exists() {
                debug!(root = %current.display(), "found repository root");
                return Ok(current);
            }
            if !current.pop() {
                return Err(LocateError::NotInRepository(start.to_path_buf()));
            }
        }
    }

    /// Locate the repository root and require its trust store to exist
    pub fn locate_trust_store(&self, start: &Path) -> Result<TrustStore, LocateError> {
        let root = self.locate_root(start)?;
        let path = root.join(&self.store_dir);
        if !path.is_dir() {
            return Err(LocateError::NotInitialized(path));
        }
        debug!(store = %path.display(), "found trust store");
        Ok(TrustStore { root, path })
    }
}

impl Default for RootLocator {
    fn default() -> Self {
        Self::new(DEFAULT_REPOSITORY_MARKER, DEFAULT_STORE_DIR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn repo() -> TempDir {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join(".git")).unwrap();
        temp
    }

    #[test]
    fn test_locate_trust_store_from_subdir() {
        let temp = repo();
        std::fs::create_dir(temp.path().join(".lockbox")).unwrap();
        let subdir = temp.path().join("src").join("deep");
        std::fs::create_dir_all(&subdir).unwrap();

        let store = RootLocator::default().locate_trust_store(&subdir).unwrap();
        assert_eq!(store.root(), temp.path());
        assert_eq!(store.path(), temp.path().join(".lockbox"));
    }

    #[test]
    fn test_not_initialized() {
        let temp = repo();
        let err = RootLocator::default()
            .locate_trust_store(temp.path())
            .unwrap_err();
        assert!(matches!(err, LocateError::NotInitialized(p) if p == temp.path().join(".lockbox")));
    }

    #[test]
    fn test_not_in_repository() {
        let temp = TempDir::new().unwrap();
        let locator = RootLocator::new(".lockbox-test-marker-absent", ".lockbox");
        let err = locator.locate_trust_store(temp.path()).unwrap_err();
        assert!(matches!(err, LocateError::NotInRepository(_)));
    }

    #[test]
    fn test_marker_file_counts() {
        // git worktrees use a `.git` file instead of a directory
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(".git"), "gitdir: /elsewhere").unwrap();
        let root = RootLocator::default().locate_root(temp.path()).unwrap();
        assert_eq!(root, temp.path());
    }

    #[test]
    fn test_store_file_is_not_a_store() {
        let temp = repo();
        std::fs::write(temp.path().join(".lockbox"), "").unwrap();
        let err = RootLocator::default()
            .locate_trust_store(temp.path())
            .unwrap_err();
        assert!(matches!(err, LocateError::NotInitialized(_)));
    }

    #[test]
    fn test_custom_store_dir() {
        let temp = repo();
        std::fs::create_dir_all(temp.path().join("ops").join("keys")).unwrap();
        let locator = RootLocator::new(".git", "ops/keys");
        let store = locator.locate_trust_store(temp.path()).unwrap();
        assert!(store.path().ends_with("ops/keys"));
    }
}
