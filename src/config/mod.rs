//! Configuration for `svgtint.toml`.
//!
//! The file is optional; every field has a default.
//!
//! # Sections
//!
//! | Section     | Purpose                                          |
//! |-------------|--------------------------------------------------|
//! | `[preview]` | Dimming opacities for hover and isolation        |
//! | `[output]`  | JSON formatting                                  |
//! | `[inspect]` | Defaults for the `inspect` command               |

mod error;
mod util;

pub use error::ConfigError;
pub use util::find_config_file;

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::log;
use crate::preview::PreviewOptions;

// ============================================================================
// root configuration
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// File the configuration was read from, if any.
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    pub preview: PreviewOptions,
    pub output: OutputConfig,
    pub inspect: InspectConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Pretty-print JSON output.
    pub pretty: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectConfig {
    /// List group members without `--members`.
    pub members: bool,
}

impl Config {
    /// Load `name`, searched upward from the working directory.
    ///
    /// A missing file yields the defaults.
    pub fn load(name: &Path) -> Result<Self, ConfigError> {
        let start = std::env::current_dir().map_err(|err| ConfigError::Io(PathBuf::from("."), err))?;
        match find_config_file(name, &start) {
            Some(path) => Self::from_path(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from file path with unknown field detection.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (mut config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        config.validate()?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warn"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {field}");
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let opacities = [
            ("preview.hover_opacity", self.preview.hover_opacity),
            ("preview.isolate_opacity", self.preview.isolate_opacity),
        ];
        for (field, value) in opacities {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Validation(format!(
                    "`{field}` must be within 0..=1, got {value}"
                )));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Test Helpers
// ============================================================================

/// Parse config content. Panics on unknown fields to catch typos in tests.
#[cfg(test)]
pub fn test_parse_config(content: &str) -> Config {
    let (parsed, ignored) = Config::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================
