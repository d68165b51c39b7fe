//! Cryptographic operations using age encryption.
//!
//! Values are encrypted with age (x25519) and carried inline in env files as
//! single-line `encrypted:<base64>` markers, so a ciphertext fits the value
//! slot of a normal `KEY=value` assignment. Public keys are `age1...`
//! recipient strings; private keys are `AGE-SECRET-KEY-1...` identities.

use std::io::{Read, Write};

use age::secrecy::ExposeSecret;
use age::x25519;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

use crate::error::{Error, Result};

/// Marker prefix identifying an encrypted value.
pub const ENCRYPTED_PREFIX: &str = "encrypted:";

/// Check whether a value is shaped as ciphertext.
///
/// Recognizes the `encrypted:` marker with a non-empty payload. Plaintext
/// values and bare markers are not encrypted.
pub fn is_encrypted(value: &str) -> bool {
    value
        .trim()
        .strip_prefix(ENCRYPTED_PREFIX)
        .is_some_and(|payload| !payload.is_empty())
}

/// Generate a fresh age keypair.
///
/// Returns `(public_key, private_key)` strings. Each call is independent;
/// no state is retained.
pub fn generate_keypair() -> (String, String) {
    let identity = x25519::Identity::generate();
    let public_key = identity.to_public().to_string();
    let private_key = identity.to_string().expose_secret().to_string();
    (public_key, private_key)
}

/// Encrypt a plaintext value under a public key.
///
/// Produces an `encrypted:<base64>` marker value consumable by
/// [`is_encrypted`] and [`decrypt_value`].
pub fn encrypt_value(plaintext: &str, public_key: &str) -> Result<String> {
    let recipient = public_key
        .trim()
        .parse::<x25519::Recipient>()
        .map_err(|_| Error::InvalidKey(format!("invalid age public key: {}", public_key)))?;

    let encryptor = age::Encryptor::with_recipients(std::iter::once(&recipient as &dyn age::Recipient))
        .map_err(|e| Error::Encryption(format!("{}", e)))?;

    let mut ciphertext = Vec::new();
    let mut writer = encryptor
        .wrap_output(&mut ciphertext)
        .map_err(|e| Error::Encryption(format!("{}", e)))?;
    writer.write_all(plaintext.as_bytes())?;
    writer
        .finish()
        .map_err(|e| Error::Encryption(format!("{}", e)))?;

    Ok(format!("{}{}", ENCRYPTED_PREFIX, BASE64.encode(&ciphertext)))
}

/// Decrypt an `encrypted:` marker value with an existing private key.
///
/// `key` and `private_key_name` only provide context for error messages;
/// the ciphertext itself is self-describing.
pub fn decrypt_value(
    key: &str,
    value: &str,
    private_key_name: &str,
    private_key: &str,
) -> Result<String> {
    let payload = value.trim().strip_prefix(ENCRYPTED_PREFIX).ok_or_else(|| {
        Error::Decryption {
            key: key.to_string(),
            reason: "value is not an encrypted marker".to_string(),
        }
    })?;

    let ciphertext = BASE64.decode(payload).map_err(|e| Error::Decryption {
        key: key.to_string(),
        reason: format!("invalid base64 payload: {}", e),
    })?;

    let identity = private_key
        .trim()
        .parse::<x25519::Identity>()
        .map_err(|e: &str| {
            Error::InvalidKey(format!("invalid private key {}: {}", private_key_name, e))
        })?;

    let decryptor = age::Decryptor::new(&ciphertext[..]).map_err(|e| Error::Decryption {
        key: key.to_string(),
        reason: format!("{}", e),
    })?;

    let mut plaintext = Vec::new();
    let mut reader = decryptor
        .decrypt(std::iter::once(&identity as &dyn age::Identity))
        .map_err(|e| Error::Decryption {
            key: key.to_string(),
            reason: format!("{} (tried {})", e, private_key_name),
        })?;
    reader.read_to_end(&mut plaintext)?;

    String::from_utf8(plaintext).map_err(|e| Error::Decryption {
        key: key.to_string(),
        reason: format!("UTF-8 error: {}", e),
    })
}
