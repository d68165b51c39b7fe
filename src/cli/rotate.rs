//! Rotate command - run a rotation and persist the rewritten files.
//!
//! The pipeline computes everything in memory; this command is the caller
//! that reviews the report and writes results back to disk. With
//! `--dry-run` the review happens but nothing is written.

use std::fs;
use std::io;

use tracing::info;

use crate::cli::{output, Cli};
use crate::core::rotate::{ProcessedEnv, RotationRequest, Rotator};
use crate::error::{Error, Result};

/// Execute a rotation run. Returns the number of files that failed.
pub fn execute(cli: &Cli) -> Result<usize> {
    let mut request = RotationRequest::new()
        .env_files(cli.env_file.iter().cloned())
        .include_keys(cli.key.iter().cloned())
        .exclude_keys(cli.exclude_key.iter().cloned());
    if let Some(keys_file) = &cli.env_keys_file {
        request = request.keys_file(keys_file.clone());
    }

    let rotator = Rotator::new(&request)?;
    info!(files = cli.env_file.len(), dry_run = cli.dry_run, "starting rotation");
    let report = rotator.run();

    let mut failed = 0;
    for record in &report.processed_envs {
        if record.error.is_some() {
            failed += 1;
        } else if !cli.dry_run {
            persist(record)?;
        }
    }

    if cli.json {
        let rendered = serde_json::to_string_pretty(&report)
            .map_err(|e| Error::Io(io::Error::other(e)))?;
        println!("{}", rendered);
        return Ok(failed);
    }

    for record in &report.processed_envs {
        let shown = record.env_filepath.display().to_string();
        match &record.error {
            Some(err) => {
                output::error(&format!("{}: {}", shown, err));
                if matches!(err, Error::MissingEnvFile { .. }) {
                    output::hint("check the path passed with --env-file");
                }
            }
            None => {
                let action = if cli.dry_run { "would rotate" } else { "rotated" };
                output::success(&format!(
                    "{} {} ({} key{})",
                    action,
                    output::path(&shown),
                    record.keys.len(),
                    if record.keys.len() == 1 { "" } else { "s" }
                ));
                if let Some(name) = &record.private_key_name {
                    output::dimmed(&format!(
                        "  appended {} to {}",
                        name,
                        record.keys_filepath.display()
                    ));
                }
            }
        }
    }

    if cli.dry_run {
        output::dimmed("dry run: no files were written");
    }

    Ok(failed)
}

/// Write a successful record's rewritten texts back to disk.
///
/// The keys file must land first: once the env file references the new
/// public key, losing the new private key makes those values
/// unrecoverable. Failing after the keys write only leaves an extra
/// unused key behind.
fn persist(record: &ProcessedEnv) -> Result<()> {
    if let Some(keys_src) = &record.keys_src {
        fs::write(&record.keys_filepath, keys_src)?;

        // Keys file holds private keys; restrict permissions (Unix only)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&record.keys_filepath, fs::Permissions::from_mode(0o600))?;
        }
    }
    if let Some(env_src) = &record.env_src {
        fs::write(&record.filepath, env_src)?;
    }
    Ok(())
}
