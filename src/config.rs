//! Discovery configuration.
//!
//! Defaults work out of the box; override them from a TOML file and/or
//! `JOBROUTER__*` environment variables:
//!
//! ```toml
//! extension = "toml"
//! placeholder_file_names = ["mod.toml"]
//! max_depth = 8
//! follow_symlinks = false
//! duplicate_policy = "reject"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{JobError, Result};

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "JOBROUTER";

/// What to do when a job name is registered twice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Log a warning and keep both; lookup returns the first registered.
    #[default]
    Warn,
    /// Refuse the second registration.
    Reject,
}

/// Settings for walking a job directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Extension of job manifest files, without the dot.
    pub extension: String,
    /// File names skipped during the walk (package-entry placeholders).
    pub placeholder_file_names: Vec<String>,
    /// Maximum directory depth below the root; `None` for unlimited.
    pub max_depth: Option<usize>,
    /// Descend into symlinked directories.
    pub follow_symlinks: bool,
    pub duplicate_policy: DuplicatePolicy,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            extension: "toml".to_string(),
            placeholder_file_names: vec!["mod.toml".to_string()],
            max_depth: None,
            follow_symlinks: false,
            duplicate_policy: DuplicatePolicy::Warn,
        }
    }
}

impl DiscoveryConfig {
    /// Load defaults, then an optional TOML file, then environment overrides.
    ///
    /// Environment keys use a double underscore separator, e.g.
    /// `JOBROUTER__DUPLICATE_POLICY=reject`. A missing file is not an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }
        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("placeholder_file_names"),
            )
            .build()?;
        settings.try_deserialize().map_err(JobError::from)
    }

    /// Parse configuration from inline TOML. Missing keys take defaults.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|e| {
            JobError::Config(config::ConfigError::Message(format!(
                "invalid discovery configuration: {e}"
            )))
        })
    }

    /// Check if `file_name` is a placeholder that discovery skips.
    pub fn is_placeholder(&self, file_name: &str) -> bool {
        self.placeholder_file_names.iter().any(|p| p == file_name)
    }

    /// Check if `path` has the manifest extension.
    pub fn is_manifest(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == self.extension)
    }
}
