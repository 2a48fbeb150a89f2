//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/treeview/treeview.toml`
//! 3. Explicit config file (`--config`)
//! 4. Environment variables: `TREEVIEW_*` prefix, `__` between sections

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::domain::{TreeSettings, PATH_SEPARATOR, ROOT_KEY};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    #[error("config error: {message}")]
    Load { message: String },

    #[error("invalid setting '{field}': {reason}")]
    Invalid { field: String, reason: String },
}

/// Which tree variant the CLI builds.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    #[default]
    Keyed,
    Indexed,
}

/// `[tree]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TreeConfig {
    /// Key given to root nodes (default: "/")
    pub root_key: String,
    /// Single character between path segments (default: ".")
    pub path_separator: String,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            root_key: ROOT_KEY.to_string(),
            path_separator: PATH_SEPARATOR.to_string(),
        }
    }
}

/// Unified configuration for treeview.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub tree: TreeConfig,
    pub variant: Variant,
}

/// Get the XDG config directory for treeview.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "treeview").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("treeview.toml"))
}

impl Settings {
    /// Load settings with layered precedence.
    ///
    /// A missing global file is skipped; a missing explicit file is an error.
    /// The result is validated before it is returned.
    #[instrument(level = "debug")]
    pub fn load(config_file: Option<&Path>) -> Result<Self, SettingsError> {
        let defaults = Settings::default();
        let mut builder = Config::builder()
            .set_default("tree.root_key", defaults.tree.root_key)
            .map_err(config_err)?
            .set_default("tree.path_separator", defaults.tree.path_separator)
            .map_err(config_err)?
            .set_default("variant", "keyed")
            .map_err(config_err)?;

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                debug!(path = %global_path.display(), "global config");
                builder = builder.add_source(File::from(global_path).required(false));
            }
        }

        if let Some(path) = config_file {
            debug!(path = %path.display(), "explicit config");
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("TREEVIEW")
                .prefix_separator("_")
                .separator("__"),
        );

        let config = builder.build().map_err(config_err)?;
        let settings: Self = config.try_deserialize().map_err(config_err)?;
        settings.tree_settings()?;
        Ok(settings)
    }

    /// Validated tree settings for building a tree.
    pub fn tree_settings(&self) -> Result<TreeSettings, SettingsError> {
        let mut chars = self.tree.path_separator.chars();
        let path_separator = match (chars.next(), chars.next()) {
            (Some(c), None) => c,
            _ => {
                return Err(SettingsError::Invalid {
                    field: "tree.path_separator".into(),
                    reason: format!(
                        "must be a single character, got '{}'",
                        self.tree.path_separator
                    ),
                })
            }
        };
        if self.tree.root_key.is_empty() {
            return Err(SettingsError::Invalid {
                field: "tree.root_key".into(),
                reason: "must not be empty".into(),
            });
        }
        if self.tree.root_key.contains(path_separator) {
            return Err(SettingsError::Invalid {
                field: "tree.root_key".into(),
                reason: format!("must not contain the path separator '{}'", path_separator),
            });
        }
        Ok(TreeSettings {
            root_key: self.tree.root_key.clone(),
            path_separator,
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# treeview configuration
#
# Locations (by precedence, lowest to highest):
#   Global:   ~/.config/treeview/treeview.toml
#   Explicit: --config <FILE>
#   Env:      TREEVIEW_VARIANT, TREEVIEW_TREE__ROOT_KEY, TREEVIEW_TREE__PATH_SEPARATOR

# Tree variant: "keyed" (unique sibling keys) or "indexed" (ordered, positional)
# variant = "keyed"

[tree]
# Key of root nodes
# root_key = "/"

# Character between path segments
# path_separator = "."
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> SettingsError {
    SettingsError::Load {
        message: e.to_string(),
    }
}
