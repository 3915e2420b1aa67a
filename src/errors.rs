use thiserror::Error;

/// All errors that can occur in the community vault.
#[derive(Debug, Error)]
pub enum VaultError {
    // --- Request errors ---
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Vault item '{0}' not found")]
    NotFound(String),

    #[error("Access denied: {0}")]
    Forbidden(String),

    #[error("Not a member of community '{0}'")]
    NotMember(String),

    #[error("Vault item '{0}' has expired")]
    Gone(String),

    // --- Crypto errors ---
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed — stored content is corrupted or was sealed with another key")]
    DecryptionFailed,

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    // --- Persistence errors ---
    #[error("Access log write failed: {0}")]
    AuditLogWrite(String),

    #[error("Storage error: {0}")]
    Storage(String),

    // --- Config errors ---
    #[error("Config error: {0}")]
    ConfigError(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),
}

impl From<rusqlite::Error> for VaultError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for VaultError {
    fn from(e: serde_json::Error) -> Self {
        Self::SerializationError(e.to_string())
    }
}

/// Convenience type alias for vault results.
pub type Result<T> = std::result::Result<T, VaultError>;
