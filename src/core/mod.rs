//! Core library components.
//!
//! This module contains the reusable business logic for env-file rotation:
//! parsing, key handling, encryption, and the rotation pipeline.

pub mod cipher;
pub mod env;
pub mod keys;
pub mod matcher;
pub mod rotate;
