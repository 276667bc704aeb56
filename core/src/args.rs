//! The flat result map produced by a parse.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Parsed values keyed by `dest`.
///
/// One map is shared by every level of a parse, so a sub-command can
/// overwrite a key written by its parent. Presence markers for commands,
/// sub-commands and flags are stored as `true`.
///
/// # Examples
///
/// ```
/// use command_grammar_core::ParsedArgs;
/// use serde_json::json;
///
/// let mut args = ParsedArgs::new();
/// args.insert("name", json!("Sam"));
/// args.set_present("greet");
///
/// assert_eq!(args.get_str("name"), Some("Sam"));
/// assert!(args.is_present("greet"));
/// assert!(!args.is_present("missing"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParsedArgs {
    values: BTreeMap<String, Value>,
}

impl ParsedArgs {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `dest`, replacing any earlier value.
    pub fn insert(&mut self, dest: impl Into<String>, value: Value) {
        self.values.insert(dest.into(), value);
    }

    /// Records that the command, sub-command or flag stored at `dest` was
    /// taken. Empty keys are ignored.
    pub fn set_present(&mut self, dest: &str) {
        if !dest.is_empty() {
            self.values.insert(dest.to_string(), Value::Bool(true));
        }
    }

    /// Copies every entry of `other` into `self`; `other` wins on collisions.
    pub fn merge(&mut self, other: ParsedArgs) {
        self.values.extend(other.values);
    }

    pub fn get(&self, dest: &str) -> Option<&Value> {
        self.values.get(dest)
    }

    pub fn get_str(&self, dest: &str) -> Option<&str> {
        self.get(dest).and_then(Value::as_str)
    }

    pub fn get_bool(&self, dest: &str) -> Option<bool> {
        self.get(dest).and_then(Value::as_bool)
    }

    pub fn get_i64(&self, dest: &str) -> Option<i64> {
        self.get(dest).and_then(Value::as_i64)
    }

    pub fn get_u64(&self, dest: &str) -> Option<u64> {
        self.get(dest).and_then(Value::as_u64)
    }

    pub fn get_f64(&self, dest: &str) -> Option<f64> {
        self.get(dest).and_then(Value::as_f64)
    }

    /// Returns `true` when `dest` holds the boolean `true`.
    pub fn is_present(&self, dest: &str) -> bool {
        self.get_bool(dest) == Some(true)
    }

    pub fn contains(&self, dest: &str) -> bool {
        self.values.contains_key(dest)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Consumes the map, returning the underlying storage.
    pub fn into_inner(self) -> BTreeMap<String, Value> {
        self.values
    }
}

impl From<BTreeMap<String, Value>> for ParsedArgs {
    fn from(values: BTreeMap<String, Value>) -> Self {
        Self { values }
    }
}
