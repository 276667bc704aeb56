//! Parse-time switches.

use serde::{Deserialize, Serialize};

/// Flag-handling options for a parse.
///
/// Missing fields take their defaults when deserialized, so a config file
/// only needs to mention the switches it changes.
///
/// # Examples
///
/// ```
/// use command_grammar_core::ParseOptions;
///
/// let options: ParseOptions = serde_json::from_str(r#"{"java_flags": true}"#).unwrap();
/// assert!(options.java_flags);
/// assert!(options.parse_flags);
/// assert!(options.equals_in_short_flags);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Recognize tokens starting with `-` as flags.
    pub parse_flags: bool,
    /// A bare `--` turns flag parsing off for the rest of the line.
    pub breakable_flags: bool,
    /// Accept long flags written with one dash (`-verbose`).
    pub java_flags: bool,
    /// Allow `-abc=value` to pass `value` to the last packed short flag.
    pub equals_in_short_flags: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            parse_flags: true,
            breakable_flags: true,
            java_flags: false,
            equals_in_short_flags: true,
        }
    }
}
