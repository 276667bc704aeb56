//! Error types for command dispatch.
//!
//! Covers every way a message can fail to reach a callback: unknown command,
//! parse failure, failing callback, plus the I/O and schema errors raised
//! while loading configuration or registering declarations.

use command_grammar_core::{ParseError, SchemaError};
use thiserror::Error;

/// Failure reported by a command callback.
///
/// # Examples
///
/// ```
/// use command_grammar_dispatch::CallbackError;
///
/// let err = CallbackError::new("inventory is full");
/// assert_eq!(err.to_string(), "inventory is full");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CallbackError {
    message: String,
}

impl CallbackError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for CallbackError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

impl From<&str> for CallbackError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Errors that can occur while registering or dispatching commands.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No registered command has this name or alias.
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// The command line did not match the command's grammar.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The callback ran and failed.
    #[error("callback failed: {0}")]
    Callback(#[from] CallbackError),

    /// A declaration could not be compiled into a schema.
    #[error("invalid schema: {0}")]
    Schema(#[from] SchemaError),

    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

impl DispatchError {
    /// Text to send back to whoever issued the command.
    ///
    /// Parse errors produce the full report with column and excerpt;
    /// failures that are not the user's fault are labelled internal.
    pub fn feedback(&self) -> String {
        match self {
            Self::UnknownCommand(name) => format!(
                "Unknown command: {name}. Please check that the command exists and you have permission to use it."
            ),
            Self::Parse(err) => err.report(),
            Self::Callback(err) => format!("Internal error\n{err}"),
            other => format!("Internal error\n{other}"),
        }
    }
}

/// Convenience alias for results with [`DispatchError`].
pub type Result<T> = std::result::Result<T, DispatchError>;
