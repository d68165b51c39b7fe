use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("missing env file: {path} (resolved to {resolved})")]
    MissingEnvFile { path: PathBuf, resolved: PathBuf },

    #[error("invalid key pattern: {0}")]
    Pattern(#[from] globset::Error),

    #[error("malformed env line {line}: {content}")]
    Parse { line: usize, content: String },

    #[error("decryption failed for {key}: {reason}")]
    Decryption { key: String, reason: String },

    #[error("no private key found: set {name} or add it to the keys file")]
    DecryptionKeyMissing { name: String },

    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
