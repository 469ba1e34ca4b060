//! # Schema Selection
//!
//! Shared `--metadata`, `--json-schema`, and `--profile` flags, resolved
//! against the configuration when no metadata path is given directly.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use fourc_schema::{load_path, JsonSchemaCheck, SchemaModel};
use tracing::{debug, info};

use crate::config::{Config, ConfigError};

/// Where the schema artifacts come from.
#[derive(Args, Debug, Default, Clone)]
pub struct SchemaArgs {
    /// Metadata artifact to validate against (overrides the profile).
    #[arg(long, value_name = "PATH")]
    pub metadata: Option<PathBuf>,

    /// Derived JSON schema to check against as well (overrides the profile).
    #[arg(long, value_name = "PATH")]
    pub json_schema: Option<PathBuf>,

    /// Configuration profile to take the artifacts from.
    #[arg(long)]
    pub profile: Option<String>,
}

/// Resolved artifact paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaSources {
    pub metadata: PathBuf,
    pub json_schema: Option<PathBuf>,
}

impl SchemaArgs {
    /// Resolve the artifact paths: explicit flags win, the rest comes from
    /// the selected profile.
    ///
    /// # Errors
    ///
    /// Configuration errors when no `--metadata` is given and the
    /// configuration is missing, unreadable, or lacks the profile.
    pub fn resolve(&self, config: Option<&Path>) -> Result<SchemaSources, ConfigError> {
        if let Some(metadata) = &self.metadata {
            return Ok(SchemaSources {
                metadata: metadata.clone(),
                json_schema: self.json_schema.clone(),
            });
        }
        let path = Config::locate(config).ok_or(ConfigError::NotFound)?;
        let config = Config::load(&path)?;
        let (name, profile) = config.select(self.profile.as_deref())?;
        debug!(profile = name, "using configuration profile");
        Ok(SchemaSources {
            metadata: profile.metadata_path.clone(),
            json_schema: self
                .json_schema
                .clone()
                .or_else(|| profile.json_schema_path.clone()),
        })
    }
}

impl SchemaSources {
    /// Load the schema model.
    pub fn load_model(&self) -> Result<Arc<SchemaModel>> {
        let model = load_path(&self.metadata)
            .with_context(|| format!("failed to load metadata '{}'", self.metadata.display()))?;
        info!(
            entries = model.len(),
            version = model.version().unwrap_or("unversioned"),
            "loaded schema model"
        );
        Ok(Arc::new(model))
    }

    /// Compile the derived JSON schema, if one is configured.
    pub fn load_json_schema(&self) -> Result<Option<JsonSchemaCheck>> {
        let Some(path) = &self.json_schema else {
            return Ok(None);
        };
        let check = JsonSchemaCheck::from_path(path)
            .with_context(|| format!("failed to load JSON schema '{}'", path.display()))?;
        Ok(Some(check))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_metadata_skips_config() {
        let args = SchemaArgs {
            metadata: Some(PathBuf::from("m.yaml")),
            json_schema: None,
            profile: Some("ignored".into()),
        };
        let sources = args.resolve(Some(Path::new("does/not/exist.yaml"))).unwrap();
        assert_eq!(sources.metadata, PathBuf::from("m.yaml"));
        assert_eq!(sources.json_schema, None);
    }

    #[test]
    fn test_profile_paths_with_override() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("fourc.yaml");
        std::fs::write(
            &config,
            "profile: a\nprofiles:\n  a:\n    metadata_path: meta.yaml\n    json_schema_path: schema.json\n",
        )
        .unwrap();

        let args = SchemaArgs {
            json_schema: Some(PathBuf::from("other.json")),
            ..SchemaArgs::default()
        };
        let sources = args.resolve(Some(&config)).unwrap();
        assert_eq!(sources.metadata, dir.path().join("meta.yaml"));
        assert_eq!(sources.json_schema, Some(PathBuf::from("other.json")));
    }
}
