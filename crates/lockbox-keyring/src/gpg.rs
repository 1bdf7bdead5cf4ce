//! GnuPG keystore adapter

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, info, instrument};

use crate::error::{KeyringError, Result};
use crate::key::{ImportSummary, KeyringKind, PublicKey};
use crate::keystore::Keystore;

const GPG_INSTALL_HINT: &str = "Install GnuPG from https://gnupg.org/download/";

/// Keystore backed by a gpg home directory
#[derive(Debug, Clone)]
pub struct GpgKeystore {
    /// Path to gpg binary
    gpg_path: String,
    /// Home directory; gpg's default when `None`
    home: Option<PathBuf>,
    kind: KeyringKind,
}

struct GpgOutput {
    success: bool,
    stdout: Vec<u8>,
    stderr: String,
}

impl GpgKeystore {
    /// The operator's keystore, in `home` or gpg's default location
    pub fn personal(gpg_path: impl Into<String>, home: Option<PathBuf>) -> Self {
        Self {
            gpg_path: gpg_path.into(),
            home,
            kind: KeyringKind::Personal,
        }
    }

    /// The project trust store at `store`
    pub fn project(gpg_path: impl Into<String>, store: &Path) -> Self {
        Self {
            gpg_path: gpg_path.into(),
            home: Some(store.to_path_buf()),
            kind: KeyringKind::Project,
        }
    }

    /// Home directory passed to gpg, if any
    pub fn home(&self) -> Option<&Path> {
        self.home.as_deref()
    }

    /// Whether the gpg binary can be found
    pub fn is_available(&self) -> bool {
        which::which(&self.gpg_path).is_ok()
    }

    fn base_command(&self) -> Command {
        let mut command = Command::new(&self.gpg_path);
        if let Some(home) = &self.home {
            command.arg("--homedir").arg(home);
        }
        command.args(["--batch", "--no-tty"]);
        command
    }

    /// Run gpg, feeding `input` on stdin
    fn run_gpg(&self, args: &[&str], input: Option<&[u8]>) -> Result<GpgOutput> {
        debug!(keyring = %self.kind, home = ?self.home, "Running gpg with args: {:?}", args);

        let mut command = self.base_command();
        command
            .args(args)
            .stdin(if input.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = command.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                KeyringError::ToolNotFound {
                    tool: self.gpg_path.clone(),
                    hint: GPG_INSTALL_HINT.to_string(),
                }
            } else {
                KeyringError::Io(e)
            }
        })?;

        if let Some(data) = input {
            if let Some(mut stdin) = child.stdin.take() {
                stdin.write_all(data)?;
            }
        }

        let output = child.wait_with_output()?;
        Ok(GpgOutput {
            success: output.status.success(),
            stdout: output.stdout,
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }

    fn tool_failed(&self, output: &GpgOutput) -> KeyringError {
        let reason = if output.stderr.trim().is_empty() {
            String::from_utf8_lossy(&output.stdout).trim().to_string()
        } else {
            output.stderr.trim().to_string()
        };
        KeyringError::ToolFailed {
            tool: self.gpg_path.clone(),
            reason,
        }
    }

    /// Parse a `--with-colons --fixed-list-mode` key listing
    fn parse_colon_listing(output: &str, secret_listing: bool) -> Vec<PublicKey> {
        let mut keys = Vec::new();
        let mut current: Option<PublicKey> = None;
        // Only the first fpr record after a primary key belongs to it
        let mut awaiting_fpr = false;

        for line in output.lines() {
            let fields: Vec<&str> = line.split(':').collect();
            match fields.first().copied() {
                Some("pub") | Some("sec") => {
                    if let Some(key) = current.take() {
                        keys.push(key);
                    }
                    let key_id = fields.get(4).copied().unwrap_or_default();
                    let has_secret = secret_listing
                        || fields.get(14).map(|f| f.starts_with('+')).unwrap_or(false);
                    let mut key = PublicKey::new(key_id, "");
                    key.has_secret = has_secret;
                    current = Some(key);
                    awaiting_fpr = true;
                }
                Some("fpr") if awaiting_fpr => {
                    if let Some(key) = current.as_mut() {
                        key.fingerprint = fields.get(9).copied().unwrap_or_default().to_string();
                    }
                    awaiting_fpr = false;
                }
                Some("uid") => {
                    // every user id is kept, whatever its validity
                    if let (Some(key), Some(raw)) = (current.as_mut(), fields.get(9)) {
                        key.uids.push(unescape_colon_field(raw));
                    }
                }
                Some("sub") | Some("ssb") => awaiting_fpr = false,
                _ => {}
            }
        }

        if let Some(key) = current {
            keys.push(key);
        }

        keys.retain(|k| !k.fingerprint.is_empty());
        keys
    }

    /// Parse the `IMPORT_RES` status line from `--status-fd` output
    fn parse_import_status(output: &str) -> Option<ImportSummary> {
        let line = output
            .lines()
            .find_map(|l| l.strip_prefix("[GNUPG:] IMPORT_RES "))?;
        let counts: Vec<usize> = line
            .split_whitespace()
            .map(|n| n.parse().unwrap_or(0))
            .collect();
        Some(ImportSummary {
            considered: counts.first().copied().unwrap_or(0),
            imported: counts.get(2).copied().unwrap_or(0),
            unchanged: counts.get(4).copied().unwrap_or(0),
        })
    }
}

/// Name passed to `--delete-keys`. Batch-mode deletion requires a full
/// fingerprint, so a reference matching exactly one key is expanded. Anything
/// else goes through unchanged and gpg rejects it.
fn deletion_target(keys: &[PublicKey], key_id: &str) -> String {
    let mut matches = keys.iter().filter(|key| key.matches_id(key_id));
    match (matches.next(), matches.next()) {
        (Some(key), None) => key.fingerprint.clone(),
        _ => key_id.to_string(),
    }
}

/// Decode the `\xHH` escapes gpg uses inside colon-listing fields
fn unescape_colon_field(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && bytes.get(i + 1) == Some(&b'x') {
            let byte = raw
                .get(i + 2..i + 4)
                .and_then(|hex| u8::from_str_radix(hex, 16).ok());
            if let Some(byte) = byte {
                out.push(byte);
                i += 4;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).to_string()
}

impl Keystore for GpgKeystore {
    fn kind(&self) -> KeyringKind {
        self.kind
    }

    #[instrument(skip(self), fields(keyring = %self.kind))]
    fn list_keys(&self, secret: bool) -> Result<Vec<PublicKey>> {
        let listing = if secret {
            "--list-secret-keys"
        } else {
            "--list-keys"
        };
        let mut args = vec!["--with-colons", "--fixed-list-mode", listing];
        if !secret {
            args.push("--with-secret");
        }

        let output = self.run_gpg(&args, None)?;
        if !output.success {
            return Err(self.tool_failed(&output));
        }

        let keys = Self::parse_colon_listing(&String::from_utf8_lossy(&output.stdout), secret);
        debug!(count = keys.len(), secret, "listed keys");
        Ok(keys)
    }

    #[instrument(skip(self, material), fields(keyring = %self.kind, bytes = material.len()))]
    fn import_keys(&self, material: &[u8]) -> Result<ImportSummary> {
        let output = self.run_gpg(&["--status-fd", "1", "--import"], Some(material))?;
        let status = String::from_utf8_lossy(&output.stdout);

        match Self::parse_import_status(&status) {
            Some(summary) => {
                info!(
                    imported = summary.imported,
                    unchanged = summary.unchanged,
                    "imported keys"
                );
                Ok(summary)
            }
            // gpg emits no IMPORT_RES when the input holds no OpenPGP packets
            None if status.contains("NODATA") || output.stderr.contains("no valid OpenPGP data") => {
                Ok(ImportSummary::default())
            }
            None if output.success => Ok(ImportSummary::default()),
            None => Err(self.tool_failed(&output)),
        }
    }

    #[instrument(skip(self), fields(keyring = %self.kind))]
    fn export_public(&self, key_id: &str) -> Result<Vec<u8>> {
        let output = self.run_gpg(&["--armor", "--export", key_id], None)?;
        if !output.success {
            return Err(self.tool_failed(&output));
        }
        Ok(output.stdout)
    }

    #[instrument(skip(self), fields(keyring = %self.kind))]
    fn delete_public(&self, key_id: &str) -> Result<()> {
        let target = deletion_target(&self.list_keys(false)?, key_id);

        let output = self.run_gpg(&["--yes", "--delete-keys", &target], None)?;
        if !output.success {
            return Err(KeyringError::DeleteFailed {
                key_id: key_id.to_string(),
                reason: output.stderr.trim().to_string(),
            });
        }

        info!(key_id, fingerprint = %target, "deleted key");
        Ok(())
    }
}
