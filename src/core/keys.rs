//! Key-name derivation and private key lookup.
//!
//! Every env file owns a public/private key name pair derived from its
//! filename: `.env` maps to `DOTENV_PUBLIC_KEY` / `DOTENV_PRIVATE_KEY`,
//! `.env.production` to `DOTENV_PUBLIC_KEY_PRODUCTION` and so on. Private
//! keys live in a companion keys file (`.env.keys` next to the env file by
//! default) or in the process environment.

use std::path::{Path, PathBuf};

use crate::core::env;

/// Default companion keys file name, resolved as a sibling of the env file.
pub const KEYS_FILE_NAME: &str = ".env.keys";

const PUBLIC_KEY_PREFIX: &str = "DOTENV_PUBLIC_KEY";
const PRIVATE_KEY_PREFIX: &str = "DOTENV_PRIVATE_KEY";

/// Derive the public-key variable name for an env file path.
pub fn public_key_name(path: &Path) -> String {
    derived_name(PUBLIC_KEY_PREFIX, path)
}

/// Derive the private-key variable name for an env file path.
pub fn private_key_name(path: &Path) -> String {
    derived_name(PRIVATE_KEY_PREFIX, path)
}

/// Resolve the companion keys file for a resolved env file path.
///
/// The override, when given, applies to every env file in the run.
pub fn keys_file_for(resolved_env: &Path, override_path: Option<&Path>) -> PathBuf {
    match override_path {
        Some(path) => path.to_path_buf(),
        None => resolved_env
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(KEYS_FILE_NAME),
    }
}

/// Look up an existing private key by derived name.
///
/// Checks the companion keys file text first, then the process environment.
/// Unparseable lines in the keys text are skipped; a lookup never fails,
/// it only comes back empty.
pub fn find_private_key(keys_src: &str, name: &str) -> Option<String> {
    if let Ok(entries) = env::parse(keys_src) {
        if let Some((_, value)) = entries.iter().find(|(k, _)| k == name) {
            if !value.is_empty() {
                return Some(value.clone());
            }
        }
    }
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Build `PREFIX` or `PREFIX_SUFFIX` from the env file's name.
///
/// The suffix is the filename with a leading `.env` (and separator dot)
/// removed, uppercased, with non-alphanumerics mapped to `_`.
fn derived_name(prefix: &str, path: &Path) -> String {
    let filename = path
        .file_name()
        .and_then(|f| f.to_str())
        .unwrap_or_default();

    let remainder = filename.strip_prefix(".env").unwrap_or(filename);
    let remainder = remainder.strip_prefix('.').unwrap_or(remainder);

    if remainder.is_empty() {
        return prefix.to_string();
    }

    let suffix: String = remainder
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();

    format!("{}_{}", prefix, suffix)
}
