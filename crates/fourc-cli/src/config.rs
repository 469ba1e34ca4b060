//! # Config Subcommand
//!
//! Schema profiles: named pairs of a metadata artifact and an optional
//! derived JSON schema, stored in `fourc.yaml`.
//!
//! ```yaml
//! profile: default
//! profiles:
//!   default:
//!     description: "4C nightly"
//!     metadata_path: metadata.yaml
//!     json_schema_path: schema.json
//! ```
//!
//! Relative paths are resolved against the directory of the config file.
//! The file is located with `--config`, then `FOURC_CONFIG`, then
//! `./fourc.yaml`. `FOURC_PROFILE` overrides the active profile.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Args, Subcommand};
use fourc_core::{DocPath, PathError};
use fourc_document::{Document, DocumentError, DocumentNode};
use serde::Deserialize;
use tracing::{debug, warn};

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "fourc.yaml";
/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "FOURC_CONFIG";
/// Environment variable overriding the active profile.
pub const PROFILE_ENV: &str = "FOURC_PROFILE";

/// One schema profile.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub description: Option<String>,
    /// Metadata artifact the schema model is loaded from.
    pub metadata_path: PathBuf,
    /// Derived JSON schema, if the profile ships one.
    #[serde(default)]
    pub json_schema_path: Option<PathBuf>,
}

/// Parsed `fourc.yaml`.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Name of the active profile.
    pub profile: String,
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
    #[serde(skip)]
    path: PathBuf,
}

impl Config {
    /// Where to read the configuration from, if anywhere.
    pub fn locate(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Some(PathBuf::from(path));
        }
        let local = PathBuf::from(CONFIG_FILE_NAME);
        local.is_file().then_some(local)
    }

    /// Read a config file and resolve its relative paths.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] or [`ConfigError::Yaml`] if the file cannot be
    /// read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let mut config: Config = serde_yaml::from_str(&text).map_err(|source| ConfigError::Yaml {
            path: path.display().to_string(),
            source,
        })?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        for profile in config.profiles.values_mut() {
            profile.metadata_path = base.join(&profile.metadata_path);
            profile.json_schema_path = profile.json_schema_path.as_ref().map(|p| base.join(p));
        }
        config.path = path.to_path_buf();
        debug!(path = %path.display(), profiles = config.profiles.len(), "loaded configuration");
        Ok(config)
    }

    /// The file this configuration was read from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A profile by name.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownProfile`] if no profile has that name.
    pub fn lookup_profile(&self, name: &str) -> Result<(&str, &Profile), ConfigError> {
        self.profiles
            .get_key_value(name)
            .map(|(name, profile)| (name.as_str(), profile))
            .ok_or_else(|| ConfigError::UnknownProfile {
                name: name.to_string(),
                available: self.profiles.keys().cloned().collect(),
            })
    }

    /// The profile to use: `requested` if given, else the one named by
    /// `FOURC_PROFILE` if it exists, else the configured one.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownProfile`] if the requested or configured
    /// profile does not exist.
    pub fn select(&self, requested: Option<&str>) -> Result<(&str, &Profile), ConfigError> {
        if let Some(name) = requested {
            return self.lookup_profile(name);
        }
        if let Ok(name) = std::env::var(PROFILE_ENV) {
            match self.lookup_profile(&name) {
                Ok(found) => return Ok(found),
                Err(_) => warn!(profile = %name, "ignoring unknown profile from {PROFILE_ENV}"),
            }
        }
        self.lookup_profile(&self.profile)
    }
}

/// Make `name` the active profile of the config file at `path`. Only the
/// `profile` line changes; comments and layout are kept.
///
/// # Errors
///
/// [`ConfigError::UnknownProfile`] if the file declares no such profile,
/// otherwise as [`Config::load`] and for writing the file.
pub fn set_active_profile(path: &Path, name: &str) -> Result<(), ConfigError> {
    let config = Config::load(path)?;
    config.lookup_profile(name)?;

    let mut document = Document::read(path)?;
    document.set(&DocPath::root().child("profile"), DocumentNode::scalar(name))?;
    document.write(path)?;
    debug!(path = %path.display(), profile = name, "switched profile");
    Ok(())
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no configuration found: pass --config, set FOURC_CONFIG, or create ./fourc.yaml")]
    NotFound,

    #[error("cannot read configuration '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration '{path}': {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("unknown profile '{name}' (available: {})", .available.join(", "))]
    UnknownProfile { name: String, available: Vec<String> },

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Edit(#[from] PathError),
}

/// Arguments for the `fourc config` subcommand.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the active profile and its resolved paths.
    Show,
    /// List all profiles; the active one is marked with '*'.
    Profiles,
    /// Make a profile the active one.
    Use {
        /// Profile name.
        name: String,
    },
}

/// Execute the config subcommand.
///
/// Returns exit code: 0 on success. Missing or unreadable configuration is
/// an operational error.
pub fn run_config(args: &ConfigArgs, config: Option<&Path>) -> Result<u8> {
    let path = Config::locate(config).ok_or(ConfigError::NotFound)?;

    match &args.command {
        ConfigCommand::Show => {
            let config = Config::load(&path)?;
            let (name, profile) = config.select(None)?;
            println!("config: {}", config.path().display());
            println!("profile: {name}");
            if let Some(description) = &profile.description {
                println!("  description: {description}");
            }
            println!("  metadata: {}", profile.metadata_path.display());
            match &profile.json_schema_path {
                Some(schema) => println!("  json schema: {}", schema.display()),
                None => println!("  json schema: (none)"),
            }
        }
        ConfigCommand::Profiles => {
            let config = Config::load(&path)?;
            let (active, _) = config.select(None)?;
            for (name, profile) in &config.profiles {
                let marker = if name == active { '*' } else { ' ' };
                match &profile.description {
                    Some(description) => println!("{marker} {name}: {description}"),
                    None => println!("{marker} {name}"),
                }
            }
        }
        ConfigCommand::Use { name } => {
            set_active_profile(&path, name)?;
            println!("active profile: {name}");
        }
    }
    Ok(0)
}
