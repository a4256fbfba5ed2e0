//! Command line front end for attestation generation
//!
//! The profile lives in a JSON file store between runs; `generate` reads it,
//! applies any flags, renders the attestation into the output directory and
//! then clears the store.

pub mod commands;
pub mod config;
pub mod delivery;

pub use commands::{GenerateOptions, Generated, ProfileArgs};
pub use config::{CliConfig, ConfigError};
