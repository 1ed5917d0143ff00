//! Key loading errors

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum KeyLoadError {
    #[error("SSH key not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("SSH key {} is not readable: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("SSH key {} is passphrase-protected", path.display())]
    Encrypted { path: PathBuf },

    #[error("SSH key {} uses unsupported algorithm '{algorithm}'", path.display())]
    Unsupported { path: PathBuf, algorithm: String },

    #[error("SSH key {} could not be parsed: {reason}", path.display())]
    Malformed { path: PathBuf, reason: String },
}

/// Result type for key loading
pub type KeyResult<T> = Result<T, KeyLoadError>;

impl crate::core::error_handling::ContextualError for KeyLoadError {
    fn is_user_actionable(&self) -> bool {
        !matches!(self, KeyLoadError::Unreadable { .. })
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            KeyLoadError::NotFound { .. } => {
                Some("SSH_KEY_PATH does not point to an existing private key file")
            }
            KeyLoadError::Encrypted { .. } => {
                Some("the SSH key must not be protected by a passphrase")
            }
            KeyLoadError::Unsupported { .. } => {
                Some("only Ed25519 and RSA private keys are supported")
            }
            KeyLoadError::Malformed { .. } => {
                Some("the SSH key file is not a valid OpenSSH or PEM private key")
            }
            KeyLoadError::Unreadable { .. } => None,
        }
    }
}
