//! Runtime configuration for the attestation CLI
//!
//! Values come from the environment (optionally seeded from a `.env` file)
//! and are overridden by command line flags.

use std::path::{Path, PathBuf};

use thiserror::Error;

pub const ENV_TEMPLATE: &str = "ATTESTATION_TEMPLATE";
pub const ENV_OUTPUT_DIR: &str = "ATTESTATION_OUTPUT_DIR";
pub const ENV_STORE: &str = "ATTESTATION_STORE";
pub const ENV_LAYOUT: &str = "ATTESTATION_LAYOUT";

const APP_DIR: &str = "attestation";
const STORE_FILE: &str = "profile.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("No template given: pass --template or set ATTESTATION_TEMPLATE")]
    MissingTemplate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CliConfig {
    pub template: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub store: PathBuf,
    pub layout: Option<PathBuf>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            template: None,
            output_dir: PathBuf::from("."),
            store: default_store_path(&env_lookup),
            layout: None,
        }
    }
}

impl CliConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(env_lookup)
    }

    /// Read configuration through `lookup`, falling back to defaults for
    /// unset or empty values
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| non_blank(&lookup, key);
        Self {
            template: get(ENV_TEMPLATE),
            output_dir: get(ENV_OUTPUT_DIR).unwrap_or_else(|| PathBuf::from(".")),
            store: get(ENV_STORE).unwrap_or_else(|| default_store_path(&lookup)),
            layout: get(ENV_LAYOUT),
        }
    }

    /// Apply command line overrides on top of the environment
    pub fn with_overrides(
        mut self,
        template: Option<PathBuf>,
        output_dir: Option<PathBuf>,
        store: Option<PathBuf>,
        layout: Option<PathBuf>,
    ) -> Self {
        if template.is_some() {
            self.template = template;
        }
        if let Some(dir) = output_dir {
            self.output_dir = dir;
        }
        if let Some(store) = store {
            self.store = store;
        }
        if layout.is_some() {
            self.layout = layout;
        }
        self
    }

    pub fn template_path(&self) -> Result<&Path, ConfigError> {
        self.template.as_deref().ok_or(ConfigError::MissingTemplate)
    }
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn non_blank<F>(lookup: &F, key: &str) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).filter(|v| !v.trim().is_empty()).map(PathBuf::from)
}

/// `<data home>/attestation/profile.json`, relative to the working
/// directory when the platform gives no data home
fn default_store_path<F>(lookup: &F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    data_home(lookup)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join(STORE_FILE)
}

/// Per-user data directory: `%APPDATA%` on Windows,
/// `~/Library/Application Support` on macOS, `$XDG_DATA_HOME` or
/// `~/.local/share` elsewhere
fn data_home<F>(lookup: &F) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    if cfg!(target_os = "windows") {
        non_blank(lookup, "APPDATA")
    } else if cfg!(target_os = "macos") {
        non_blank(lookup, "HOME").map(|home| home.join("Library/Application Support"))
    } else {
        non_blank(lookup, "XDG_DATA_HOME")
            .or_else(|| non_blank(lookup, "HOME").map(|home| home.join(".local/share")))
    }
}
