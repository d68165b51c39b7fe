//! Test support utilities for rekey integration tests.
//!
//! Provides reusable env-file fixtures with real encrypted values.

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use rekey::core::{cipher, keys};

/// An env file fixture: embedded public key, encrypted and plaintext
/// values, and a companion `.env.keys` holding the private key.
pub struct EncryptedEnv {
    pub path: PathBuf,
    pub public_key: String,
    pub private_key: String,
    pub public_key_name: String,
    pub private_key_name: String,
}

/// Isolated temp directory for one test.
pub struct Fixture {
    pub dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path(name);
        fs::write(&path, contents).expect("failed to write fixture file");
        path
    }

    pub fn read(&self, name: &str) -> String {
        fs::read_to_string(self.path(name)).expect("failed to read fixture file")
    }

    /// Build an env file named `name` containing a fresh public key, the
    /// given plaintext pairs, and the given secret pairs encrypted under
    /// that key. Writes the matching private key to `.env.keys`.
    pub fn encrypted_env(
        &self,
        name: &str,
        secrets: &[(&str, &str)],
        plain: &[(&str, &str)],
    ) -> EncryptedEnv {
        let (public_key, private_key) = cipher::generate_keypair();
        let path = self.path(name);
        let public_key_name = keys::public_key_name(&path);
        let private_key_name = keys::private_key_name(&path);

        let mut src = String::new();
        src.push_str("# fixture env file\n");
        src.push_str(&format!("{}=\"{}\"\n\n", public_key_name, public_key));
        for (key, value) in plain {
            src.push_str(&format!("{}={}\n", key, value));
        }
        for (key, value) in secrets {
            let encrypted = cipher::encrypt_value(value, &public_key).unwrap();
            src.push_str(&format!("{}=\"{}\"\n", key, encrypted));
        }
        fs::write(&path, &src).expect("failed to write env file");

        self.write(
            ".env.keys",
            &format!("{}=\"{}\"\n", private_key_name, private_key),
        );

        EncryptedEnv {
            path,
            public_key,
            private_key,
            public_key_name,
            private_key_name,
        }
    }
}

#[cfg(unix)]
impl Fixture {
    /// Whether read-only mode bits are enforced for this process.
    ///
    /// Root bypasses permission checks, which defeats tests that rely on
    /// a write failing; callers skip in that case.
    pub fn readonly_enforced(&self) -> bool {
        use std::os::unix::fs::PermissionsExt;

        let check = self.write("write_check", "x");
        fs::set_permissions(&check, fs::Permissions::from_mode(0o444)).unwrap();
        fs::write(&check, "y").is_err()
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}
