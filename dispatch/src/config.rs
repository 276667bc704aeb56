//! Dispatcher configuration.
//!
//! A small YAML file selecting the chat prefix and the parse options that
//! newly registered commands start with.
//!
//! # Example YAML
//!
//! ```yaml
//! prefix: "!"
//! options:
//!   java_flags: true
//! ```
//!
//! Omitted option fields keep their defaults.

use std::io::{BufReader, BufWriter};
use std::path::Path;

use command_grammar_core::ParseOptions;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Settings for a [`CommandRegistry`](crate::CommandRegistry).
///
/// # Examples
///
/// ```
/// use command_grammar_dispatch::DispatchConfig;
///
/// let config: DispatchConfig = serde_yaml::from_str("prefix: \"\\\\\"").unwrap();
/// assert_eq!(config.prefix, "\\");
/// assert!(config.options.parse_flags);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Messages must start with this to be treated as commands.
    pub prefix: String,
    /// Parse options applied to every command registered afterwards.
    #[serde(default)]
    pub options: ParseOptions,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            prefix: "!".to_string(),
            options: ParseOptions::default(),
        }
    }
}

impl DispatchConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::DispatchError::IoError) if the file cannot
    /// be read, or [`YamlError`](crate::DispatchError::YamlError) if parsing
    /// fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }
}
