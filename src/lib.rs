//! Rekey - keypair rotation for encrypted dotenv files.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── cli/              # Command-line interface
//! │   ├── rotate        # Execute a rotation run and persist results
//! │   └── output        # Terminal output helpers
//! └── core/             # Core library components
//!     ├── cipher        # age keypair generation + encrypted-value codec
//!     ├── env           # dotenv parsing and surgical text edits
//!     ├── keys          # key-name derivation and private key lookup
//!     ├── matcher       # include/exclude key glob matching
//!     └── rotate        # the rotation pipeline itself
//! ```
//!
//! # Features
//!
//! - Age-based encryption with x25519 keys
//! - Inline `encrypted:` values that stay on one dotenv line
//! - Selective rotation with include/exclude key globs
//! - Per-file failure isolation: one broken env file never aborts the batch
//! - In-memory results: callers decide when (and whether) to persist

pub mod cli;
pub mod core;
pub mod error;
