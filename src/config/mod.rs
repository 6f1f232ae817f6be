//! Configuration system for treequill.
//!
//! This module provides the configuration structure with sensible defaults and
//! support for serialization/deserialization via serde. Configuration is
//! loaded from a TOML file and can be overridden by command-line arguments.
//!
//! # Example
//!
//! ```
//! use treequill::config::Config;
//!
//! // Use default configuration
//! let config = Config::default();
//! assert!(config.enable_sorting);
//! assert_eq!(config.indent_size, 2);
//!
//! // Create custom configuration
//! let custom = Config {
//!     disable_item_deletion: true,
//!     ..Config::default()
//! };
//! assert!(custom.editor_options().disable_item_deletion);
//! ```

use crate::editor::EditorOptions;
use serde::{Deserialize, Serialize};

/// Configuration for treequill.
///
/// # Fields
///
/// * `enable_sorting` - Allow reordering items (default: true)
/// * `disable_item_deletion` - Forbid removing items (default: false)
/// * `disable_item_creation` - Forbid adding items (default: false)
/// * `create_backup` - Create .bak files before saving (default: false)
/// * `indent_size` - Spaces per indentation level in saved JSON (default: 2)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Allow reordering items
    #[serde(default = "default_enable_sorting")]
    pub enable_sorting: bool,

    /// Forbid removing items
    #[serde(default)]
    pub disable_item_deletion: bool,

    /// Forbid adding items
    #[serde(default)]
    pub disable_item_creation: bool,

    /// Create .bak files before saving
    #[serde(default)]
    pub create_backup: bool,

    /// Number of spaces per indentation level
    #[serde(default = "default_indent_size")]
    pub indent_size: usize,
}

fn default_enable_sorting() -> bool {
    true
}

fn default_indent_size() -> usize {
    2
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enable_sorting: default_enable_sorting(),
            disable_item_deletion: false,
            disable_item_creation: false,
            create_backup: false,
            indent_size: default_indent_size(),
        }
    }
}

impl Config {
    /// Returns the path to the config file.
    ///
    /// Uses `~/.config/treequill/config.toml` on all platforms.
    pub fn config_path() -> Option<std::path::PathBuf> {
        dirs::home_dir().map(|mut path| {
            path.push(".config");
            path.push("treequill");
            path.push("config.toml");
            path
        })
    }

    /// Loads configuration from the default config file.
    ///
    /// Returns the default configuration if the file doesn't exist or can't be read.
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Loads configuration from `path`, falling back to defaults.
    pub fn load_from(path: &std::path::Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|err| {
                tracing::warn!(path = %path.display(), %err, "ignoring malformed config");
                Self::default()
            }),
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "could not read config");
                Self::default()
            }
        }
    }

    /// Saves configuration to the default config file.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        self.save_to(&config_path)
    }

    /// Saves configuration to `path`, creating parent directories.
    pub fn save_to(&self, path: &std::path::Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// The editing switches carried by this configuration.
    pub fn editor_options(&self) -> EditorOptions {
        EditorOptions {
            enable_sorting: self.enable_sorting,
            disable_item_deletion: self.disable_item_deletion,
            disable_item_creation: self.disable_item_creation,
        }
    }
}
