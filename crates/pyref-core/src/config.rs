//! Generator configuration (`pyref.toml`) parsing and validation.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::registry::TieBreak;

/// Errors that can occur when loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for '{0}': {1}")]
    Invalid(&'static str, &'static str),
}

/// Settings for one generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
    /// Title written to the index page front matter.
    pub title: String,

    /// Document names with a single leading underscore.
    #[serde(rename = "include-private", alias = "include_private")]
    pub include_private: bool,

    /// Ask a Python interpreter about names the registry does not know.
    pub runtime: bool,

    /// Interpreter used for runtime lookup.
    pub python: String,

    /// Order of ambiguous registry candidates.
    #[serde(rename = "tie-break", alias = "tie_break")]
    pub tie_break: TieBreak,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            title: "API Reference".to_string(),
            include_private: false,
            runtime: true,
            python: "python3".to_string(),
            tie_break: TieBreak::default(),
        }
    }
}

impl Config {
    /// Load configuration from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or has unknown keys.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.title.trim().is_empty() {
            return Err(ConfigError::Invalid("title", "must not be empty"));
        }
        if self.title.contains('\n') {
            return Err(ConfigError::Invalid("title", "must be a single line"));
        }
        if self.python.trim().is_empty() {
            return Err(ConfigError::Invalid("python", "must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_empty_config() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.title, "API Reference");
        assert!(config.runtime);
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
title = "My Package"
include-private = true
runtime = false
python = "/usr/bin/python3.12"
tie-break = "insertion"
"#;
        let config = Config::from_toml_str(toml).unwrap();
        assert_eq!(config.title, "My Package");
        assert!(config.include_private);
        assert!(!config.runtime);
        assert_eq!(config.python, "/usr/bin/python3.12");
        assert_eq!(config.tie_break, TieBreak::Insertion);
    }

    #[test]
    fn reject_unknown_keys() {
        let err = Config::from_toml_str("colour = \"blue\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn reject_empty_title() {
        let err = Config::from_toml_str("title = \"  \"").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid("title", _)));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pyref.toml");
        std::fs::write(&path, "runtime = false\n").unwrap();
        assert!(!Config::load(&path).unwrap().runtime);
        assert!(matches!(
            Config::load(&dir.path().join("missing.toml")),
            Err(ConfigError::Io(_))
        ));
    }
}
