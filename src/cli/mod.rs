//! Command-line interface.

pub mod output;
pub mod rotate;

use std::path::PathBuf;

use clap::Parser;

/// Rekey - rotate the encryption keypair protecting secrets in dotenv files.
#[derive(Parser)]
#[command(
    name = "rekey",
    about = "Rotate the encryption keypair protecting secrets in dotenv files",
    version,
    after_help = "New keys, same secrets."
)]
pub struct Cli {
    /// Env file(s) to rotate
    #[arg(
        short = 'f',
        long = "env-file",
        value_name = "PATH",
        default_value = ".env"
    )]
    pub env_file: Vec<PathBuf>,

    /// Only rotate keys matching this name or glob (repeatable)
    #[arg(short = 'k', long = "key", value_name = "PATTERN")]
    pub key: Vec<String>,

    /// Never rotate keys matching this name or glob (repeatable)
    #[arg(short = 'x', long = "exclude-key", value_name = "PATTERN")]
    pub exclude_key: Vec<String>,

    /// Companion keys file (defaults to a .env.keys sibling of each env file)
    #[arg(long = "env-keys-file", value_name = "PATH")]
    pub env_keys_file: Option<PathBuf>,

    /// Compute and report the rotation without writing any file
    #[arg(long)]
    pub dry_run: bool,

    /// Print the full report as JSON
    #[arg(long)]
    pub json: bool,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
