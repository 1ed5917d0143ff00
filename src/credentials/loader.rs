//! SSH private key loading and detection

use super::error::{KeyLoadError, KeyResult};
use ssh_key::{Algorithm, HashAlg, PrivateKey};
use std::path::{Path, PathBuf};

const PKCS1_RSA_TAG: &str = "RSA PRIVATE KEY";
const OPENSSH_TAG: &str = "OPENSSH PRIVATE KEY";

// ssh gives up on an unresponsive remote on its own, even if orphaned
const SSH_CONNECT_TIMEOUT_SECS: u32 = 30;
const SSH_ALIVE_INTERVAL_SECS: u32 = 15;
const SSH_ALIVE_COUNT_MAX: u32 = 2;

/// Key algorithms usable for cloning
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum KeyAlgorithm {
    #[strum(serialize = "ssh-ed25519")]
    Ed25519,
    #[strum(serialize = "ssh-rsa")]
    Rsa,
}

/// On-disk container the key was read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum KeyEncoding {
    #[strum(serialize = "openssh")]
    OpenSsh,
    #[strum(serialize = "pkcs1-pem")]
    Pkcs1Pem,
}

/// A verified, unencrypted private key on disk
///
/// Immutable once constructed. Cloning is cheap and the handle is safe to
/// share between concurrent requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyHandle {
    path: PathBuf,
    algorithm: KeyAlgorithm,
    encoding: KeyEncoding,
    fingerprint: Option<String>,
}

impl KeyHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn algorithm(&self) -> KeyAlgorithm {
        self.algorithm
    }

    pub fn encoding(&self) -> KeyEncoding {
        self.encoding
    }

    /// SHA-256 fingerprint, available for OpenSSH-encoded keys
    pub fn fingerprint(&self) -> Option<&str> {
        self.fingerprint.as_deref()
    }

    /// The `GIT_SSH_COMMAND` value that restricts ssh to this key only
    pub fn ssh_command(&self) -> String {
        format!(
            "ssh -i {} -o IdentitiesOnly=yes -o BatchMode=yes -o StrictHostKeyChecking=accept-new \
             -o ConnectTimeout={} -o ServerAliveInterval={} -o ServerAliveCountMax={}",
            shell_quote(&self.path.to_string_lossy()),
            SSH_CONNECT_TIMEOUT_SECS,
            SSH_ALIVE_INTERVAL_SECS,
            SSH_ALIVE_COUNT_MAX
        )
    }
}

/// Load and validate the private key at `path`
///
/// OpenSSH containers are tried first, then legacy PKCS#1 PEM RSA keys.
/// Passphrase-protected keys are rejected since clones run non-interactively.
pub fn load_key(path: impl AsRef<Path>) -> KeyResult<KeyHandle> {
    let path = expand_tilde(path.as_ref());

    let bytes = std::fs::read(&path).map_err(|source| match source.kind() {
        std::io::ErrorKind::NotFound => KeyLoadError::NotFound { path: path.clone() },
        _ => KeyLoadError::Unreadable {
            path: path.clone(),
            source,
        },
    })?;

    #[cfg(unix)]
    warn_if_shared(&path);

    match PrivateKey::from_openssh(&bytes) {
        Ok(key) => from_openssh_key(path, &key),
        Err(openssh_err) => from_pem_key(path, &bytes, openssh_err),
    }
}

fn from_openssh_key(path: PathBuf, key: &PrivateKey) -> KeyResult<KeyHandle> {
    if key.is_encrypted() {
        return Err(KeyLoadError::Encrypted { path });
    }

    let algorithm = match key.algorithm() {
        Algorithm::Ed25519 => KeyAlgorithm::Ed25519,
        Algorithm::Rsa { .. } => KeyAlgorithm::Rsa,
        other => {
            return Err(KeyLoadError::Unsupported {
                path,
                algorithm: other.as_str().to_string(),
            })
        }
    };

    Ok(KeyHandle {
        path,
        algorithm,
        encoding: KeyEncoding::OpenSsh,
        fingerprint: Some(key.fingerprint(HashAlg::Sha256).to_string()),
    })
}

fn from_pem_key(path: PathBuf, bytes: &[u8], openssh_err: ssh_key::Error) -> KeyResult<KeyHandle> {
    let parsed = pem::parse(bytes).map_err(|e| KeyLoadError::Malformed {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    match parsed.tag() {
        PKCS1_RSA_TAG => {
            let encrypted = parsed
                .headers()
                .get("Proc-Type")
                .is_some_and(|value| value.contains("ENCRYPTED"));
            if encrypted {
                return Err(KeyLoadError::Encrypted { path });
            }

            // PKCS#1 RSAPrivateKey is a DER SEQUENCE
            if parsed.contents().first() != Some(&0x30) {
                return Err(KeyLoadError::Malformed {
                    path,
                    reason: "RSA key body is not a DER sequence".to_string(),
                });
            }

            Ok(KeyHandle {
                path,
                algorithm: KeyAlgorithm::Rsa,
                encoding: KeyEncoding::Pkcs1Pem,
                fingerprint: None,
            })
        }
        OPENSSH_TAG => Err(KeyLoadError::Malformed {
            path,
            reason: openssh_err.to_string(),
        }),
        other => Err(KeyLoadError::Unsupported {
            path,
            algorithm: other.to_lowercase(),
        }),
    }
}

// ssh itself refuses keys other users can read
#[cfg(unix)]
fn warn_if_shared(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    if let Ok(meta) = std::fs::metadata(path) {
        let mode = meta.permissions().mode() & 0o777;
        if mode & 0o077 != 0 {
            log::warn!(
                "SSH key {} has permissions {:o}; ssh may refuse it (expected 600)",
                path.display(),
                mode
            );
        }
    }
}

/// Expand a leading `~/` against the home directory
pub fn expand_tilde(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}

fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}
