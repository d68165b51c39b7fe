//! The rotation pipeline.
//!
//! A run takes a list of env files and, for each one: generates a fresh
//! keypair, replaces the embedded public key, re-encrypts every qualifying
//! `encrypted:` value (decrypting with the old private key first), and
//! appends the new private key to the companion keys file text. All results
//! are held in memory; nothing is persisted here. The caller reviews the
//! report and decides what to write, which makes a dry run the default
//! library behavior.
//!
//! Failures are isolated per file: a broken env file lands in its own
//! record's `error` field and the batch moves on.

use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Serialize, Serializer};
use tracing::{debug, info};
use zeroize::Zeroize;

use crate::core::{cipher, env, keys};
use crate::core::matcher::KeyMatcher;
use crate::error::{Error, Result};

/// Input for one rotation run.
///
/// Include/exclude keys accept plain names or glob patterns. The
/// single-value methods (`env_file`, `include_key`, `exclude_key`) wrap
/// into one-element lists, so the pipeline always sees sequences.
#[derive(Debug, Clone, Default)]
pub struct RotationRequest {
    env_files: Vec<PathBuf>,
    include_keys: Vec<String>,
    exclude_keys: Vec<String>,
    keys_file: Option<PathBuf>,
}

impl RotationRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one env file target.
    pub fn env_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.env_files.push(path.into());
        self
    }

    /// Add several env file targets, preserving order.
    pub fn env_files<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.env_files.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Restrict rotation to keys matching this pattern.
    pub fn include_key(mut self, pattern: impl Into<String>) -> Self {
        self.include_keys.push(pattern.into());
        self
    }

    /// Restrict rotation to keys matching these patterns.
    pub fn include_keys<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include_keys.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Never rotate keys matching this pattern.
    pub fn exclude_key(mut self, pattern: impl Into<String>) -> Self {
        self.exclude_keys.push(pattern.into());
        self
    }

    /// Never rotate keys matching these patterns.
    pub fn exclude_keys<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_keys.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Override the companion keys file for every target in the run.
    pub fn keys_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.keys_file = Some(path.into());
        self
    }
}

/// One env file to rotate, with its resolved paths.
#[derive(Debug, Clone)]
pub struct EnvTarget {
    /// Path as given by the caller.
    pub env_filepath: PathBuf,
    /// Resolved absolute path.
    pub filepath: PathBuf,
    /// Resolved companion keys file path.
    pub keys_filepath: PathBuf,
}

impl EnvTarget {
    fn resolve(declared: &Path, keys_override: Option<&Path>) -> Self {
        let filepath = absolute(declared);
        let keys_filepath = keys_file_path(&filepath, keys_override);
        Self {
            env_filepath: declared.to_path_buf(),
            filepath,
            keys_filepath,
        }
    }
}

/// Per-file outcome record.
///
/// Exactly one is emitted per target. Either the rotation artifacts are
/// fully populated (`error` is `None`) or `error` carries the failure and
/// no rewritten text is exposed. There is no third outcome.
#[derive(Debug, Serialize)]
pub struct ProcessedEnv {
    /// Path as given by the caller.
    pub env_filepath: PathBuf,
    /// Resolved absolute path.
    pub filepath: PathBuf,
    /// Resolved companion keys file path.
    pub keys_filepath: PathBuf,
    /// Names of keys that were re-encrypted.
    pub keys: Vec<String>,
    /// Whether the file was rewritten. True for every successfully
    /// processed file -- the public key is always replaced, even when zero
    /// keys were re-encrypted. "Changed" means "public key replaced", not
    /// "at least one secret rotated".
    pub changed: bool,
    /// Derived private-key variable name (on success).
    pub private_key_name: Option<String>,
    /// The new private key (on success).
    pub private_key: Option<String>,
    /// Rewritten env file text, not yet persisted.
    #[serde(skip)]
    pub env_src: Option<String>,
    /// Rewritten companion keys file text, not yet persisted.
    #[serde(skip)]
    pub keys_src: Option<String>,
    /// The failure that stopped this file, if any.
    #[serde(serialize_with = "serialize_error")]
    pub error: Option<Error>,
}

fn serialize_error<S: Serializer>(
    error: &Option<Error>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match error {
        Some(e) => serializer.serialize_some(&e.to_string()),
        None => serializer.serialize_none(),
    }
}

/// Aggregate output of one run.
#[derive(Debug, Serialize)]
pub struct RotationReport {
    /// One record per target, in request order.
    pub processed_envs: Vec<ProcessedEnv>,
    /// Declared paths of files whose text changed.
    pub changed_filepaths: BTreeSet<PathBuf>,
    /// Declared paths of files left untouched. Disjoint from the changed
    /// set; errored files appear in neither.
    pub unchanged_filepaths: BTreeSet<PathBuf>,
}

impl RotationReport {
    /// Fold per-file records into the changed/unchanged sets.
    fn from_records(processed_envs: Vec<ProcessedEnv>) -> Self {
        let mut changed_filepaths = BTreeSet::new();
        let mut unchanged_filepaths = BTreeSet::new();

        for record in &processed_envs {
            if record.error.is_some() {
                continue;
            }
            if record.changed {
                changed_filepaths.insert(record.env_filepath.clone());
            } else {
                unchanged_filepaths.insert(record.env_filepath.clone());
            }
        }

        Self {
            processed_envs,
            changed_filepaths,
            unchanged_filepaths,
        }
    }
}

/// Artifacts of one successful per-file rotation.
struct Rotation {
    keys: Vec<String>,
    private_key_name: String,
    private_key: String,
    env_src: String,
    keys_src: String,
}

/// Sequences a rotation run over a list of env files.
pub struct Rotator {
    targets: Vec<EnvTarget>,
    matcher: KeyMatcher,
}

impl Rotator {
    /// Build a rotator from a request.
    ///
    /// Compiles the include/exclude matcher up front: an invalid pattern
    /// aborts the whole run here, before any file is touched.
    pub fn new(request: &RotationRequest) -> Result<Self> {
        let matcher = KeyMatcher::new(&request.include_keys, &request.exclude_keys)?;
        let targets = request
            .env_files
            .iter()
            .map(|declared| EnvTarget::resolve(declared, request.keys_file.as_deref()))
            .collect();

        Ok(Self { targets, matcher })
    }

    /// The resolved targets of this run, in request order.
    pub fn targets(&self) -> &[EnvTarget] {
        &self.targets
    }

    /// Rotate every target, one file at a time.
    ///
    /// Never fails for file-local problems: each target yields exactly one
    /// record, errored or changed.
    pub fn run(&self) -> RotationReport {
        let mut processed = Vec::with_capacity(self.targets.len());

        for target in &self.targets {
            debug!(file = %target.env_filepath.display(), "rotating env file");
            processed.push(self.process(target));
        }

        let report = RotationReport::from_records(processed);
        info!(
            changed = report.changed_filepaths.len(),
            errored = report
                .processed_envs
                .iter()
                .filter(|r| r.error.is_some())
                .count(),
            "rotation run finished"
        );
        report
    }

    /// Run one target, catching its failure into the record.
    fn process(&self, target: &EnvTarget) -> ProcessedEnv {
        let mut record = ProcessedEnv {
            env_filepath: target.env_filepath.clone(),
            filepath: target.filepath.clone(),
            keys_filepath: target.keys_filepath.clone(),
            keys: Vec::new(),
            changed: false,
            private_key_name: None,
            private_key: None,
            env_src: None,
            keys_src: None,
            error: None,
        };

        match self.rotate_env_file(target) {
            Ok(rotation) => {
                record.keys = rotation.keys;
                record.changed = true;
                record.private_key_name = Some(rotation.private_key_name);
                record.private_key = Some(rotation.private_key);
                record.env_src = Some(rotation.env_src);
                record.keys_src = Some(rotation.keys_src);
            }
            Err(error) => {
                debug!(
                    file = %target.env_filepath.display(),
                    %error,
                    "env file rotation failed"
                );
                record.error = Some(error);
            }
        }

        record
    }

    /// The per-file rotation pipeline.
    fn rotate_env_file(&self, target: &EnvTarget) -> Result<Rotation> {
        let mut env_src = read_required(&target.filepath, &target.env_filepath)?;
        let parsed = env::parse(&env_src)?;

        let public_key_name = keys::public_key_name(&target.env_filepath);
        let private_key_name = keys::private_key_name(&target.env_filepath);

        // The companion keys file is read the same way as the primary file;
        // a missing one is fatal to this file's rotation.
        let mut keys_src = read_required(&target.keys_filepath, &target.keys_filepath)?;
        let mut existing_private_key = keys::find_private_key(&keys_src, &private_key_name);

        let (new_public_key, new_private_key) = cipher::generate_keypair();

        env_src = env::replace(&env_src, &public_key_name, &new_public_key);

        let mut rotated = Vec::new();
        for (key, value) in &parsed {
            if !self.matcher.participates(key) {
                continue;
            }
            if !cipher::is_encrypted(value) {
                continue;
            }

            let Some(private_key) = existing_private_key.as_deref() else {
                return Err(Error::DecryptionKeyMissing {
                    name: private_key_name.clone(),
                });
            };

            let mut plaintext = cipher::decrypt_value(key, value, &private_key_name, private_key)?;
            let reencrypted = cipher::encrypt_value(&plaintext, &new_public_key);
            plaintext.zeroize();

            env_src = env::replace(&env_src, key, &reencrypted?);
            rotated.push(key.clone());
        }

        if let Some(key) = existing_private_key.as_mut() {
            key.zeroize();
        }

        keys_src = env::append(&keys_src, &private_key_name, &new_private_key);

        debug!(
            file = %target.env_filepath.display(),
            rotated = rotated.len(),
            "re-encrypted values under new public key"
        );

        Ok(Rotation {
            keys: rotated,
            private_key_name,
            private_key: new_private_key,
            env_src,
            keys_src,
        })
    }
}

/// Read a file that must exist, mapping absence to `MissingEnvFile`.
fn read_required(resolved: &Path, declared: &Path) -> Result<String> {
    match env::read_text(resolved) {
        Ok(text) => Ok(text),
        Err(Error::Io(e)) if e.kind() == ErrorKind::NotFound => Err(Error::MissingEnvFile {
            path: declared.to_path_buf(),
            resolved: resolved.to_path_buf(),
        }),
        Err(e) => Err(e),
    }
}

/// Resolve a path against the current directory without touching the
/// filesystem (the target may not exist yet).
fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path.to_path_buf(),
    }
}

fn keys_file_path(resolved_env: &Path, keys_override: Option<&Path>) -> PathBuf {
    match keys_override {
        Some(path) => absolute(path),
        None => keys::keys_file_for(resolved_env, None),
    }
}
