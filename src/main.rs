//! Rekey - keypair rotation for encrypted dotenv files.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use rekey::cli::{output, rotate, Cli};
use rekey::error::Error;

fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber with env-filter support
    let filter = EnvFilter::try_from_env("REKEY_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("rekey=debug")
        } else {
            EnvFilter::new("rekey=warn")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).without_time())
        .init();

    match rotate::execute(&cli) {
        Ok(0) => {}
        Ok(failed) => {
            output::error(&format!("{} env file(s) failed to rotate", failed));
            std::process::exit(1);
        }
        Err(e) => {
            output::error(&e.to_string());
            if matches!(e, Error::Pattern(_)) {
                output::hint("check the globs passed with --key / --exclude-key");
            }
            std::process::exit(1);
        }
    }
}
