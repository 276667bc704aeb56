//! Schema model: arguments, flags and command nodes.
//!
//! A schema is a tree of [`CommandNode`]s. Each node declares positional
//! [`Argument`]s, [`Flag`]s (which may carry their own arguments) and child
//! sub-commands. Nodes without a name are *unnamed* sub-commands: they are
//! never matched by text and are only tried as fallback grammars.
//!
//! Schemas are built with the fluent methods below or compiled from a
//! declarative [`CommandDecl`](crate::CommandDecl); both produce the same
//! representation.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::registry::{ConversionFn, Converted};
use crate::{ConversionError, Token};

/// How an argument's token is converted to a value.
#[derive(Clone)]
pub enum ArgType {
    /// Looked up by name in the [`TypeRegistry`](crate::TypeRegistry) at
    /// parse time.
    Named(String),
    /// Conversion supplied inline by the schema author.
    Custom(ConversionFn),
}

impl ArgType {
    /// Wraps a closure as an inline conversion.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&[Token], &Argument) -> Result<Converted, ConversionError> + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    /// The registry name, if this is a named type.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Named(name) => Some(name.as_str()),
            Self::Custom(_) => None,
        }
    }
}

impl fmt::Debug for ArgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.debug_tuple("Named").field(name).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl From<&str> for ArgType {
    fn from(name: &str) -> Self {
        Self::Named(name.to_string())
    }
}

impl From<String> for ArgType {
    fn from(name: String) -> Self {
        Self::Named(name)
    }
}

/// Inclusive bounds for the builtin `number` type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NumberRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Typed options understood by the builtin conversions. The two settings
/// are independent; each conversion reads the one it understands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ArgOptions {
    /// Range check for `number`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<NumberRange>,
    /// Signedness for `byte`, `short`, `int` and `long`.
    #[serde(default)]
    pub unsigned: bool,
}

/// A positional argument, or an argument carried by a flag.
///
/// # Examples
///
/// ```
/// use command_grammar_core::Argument;
/// use serde_json::json;
///
/// let age = Argument::new("age", "int").optional(json!(0));
/// assert_eq!(age.dest, "age");
/// assert!(!age.required);
/// assert_eq!(age.default, Some(json!(0)));
/// ```
#[derive(Debug, Clone)]
pub struct Argument {
    /// Display name used in help text.
    pub name: String,
    pub ty: ArgType,
    /// Result key; defaults to `name`.
    pub dest: String,
    pub required: bool,
    /// Value stored when an optional argument is absent.
    pub default: Option<Value>,
    pub help: Option<String>,
    pub options: ArgOptions,
    /// Free-form attributes for custom conversions.
    pub attrs: BTreeMap<String, Value>,
}

impl Argument {
    /// Creates a required argument stored under `name`.
    pub fn new(name: &str, ty: impl Into<ArgType>) -> Self {
        Self {
            name: name.to_string(),
            ty: ty.into(),
            dest: name.to_string(),
            required: true,
            default: None,
            help: None,
            options: ArgOptions::default(),
            attrs: BTreeMap::new(),
        }
    }

    pub fn with_dest(mut self, dest: &str) -> Self {
        self.dest = dest.to_string();
        self
    }

    /// Makes the argument optional with the given default.
    pub fn optional(mut self, default: Value) -> Self {
        self.required = false;
        self.default = Some(default);
        self
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_help(mut self, help: &str) -> Self {
        self.help = Some(help.to_string());
        self
    }

    /// Sets inclusive bounds checked by the `number` type.
    pub fn with_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.options.range = Some(NumberRange { min, max });
        self
    }

    /// Switches sized integer types to their unsigned range.
    pub fn unsigned(mut self) -> Self {
        self.options.unsigned = true;
        self
    }

    pub fn with_attr(mut self, key: &str, value: Value) -> Self {
        self.attrs.insert(key.to_string(), value);
        self
    }

    pub fn range(&self) -> Option<NumberRange> {
        self.options.range
    }

    pub fn is_unsigned(&self) -> bool {
        self.options.unsigned
    }

    pub fn attr(&self, key: &str) -> Option<&Value> {
        self.attrs.get(key)
    }
}

/// A flag with an optional long name (`--count`) and/or short code (`-c`).
///
/// A flag without arguments is a boolean presence flag. Either way its
/// `dest` is set to `true` when it appears.
///
/// # Examples
///
/// ```
/// use command_grammar_core::{Argument, Flag};
///
/// let count = Flag::new(Some("count"), Some('c'))
///     .with_dest("count_given")
///     .with_arg(Argument::new("count", "int"));
/// assert_eq!(count.canonical_name(), "--count");
/// assert!(count.takes_args());
///
/// let verbose = Flag::new(None, Some('v'));
/// assert_eq!(verbose.dest, "v");
/// ```
#[derive(Debug, Clone)]
pub struct Flag {
    /// Result key; defaults to the long name, then the short code.
    pub dest: String,
    pub long: Option<String>,
    pub short: Option<char>,
    pub help: Option<String>,
    pub args: Vec<Argument>,
}

impl Flag {
    pub fn new(long: Option<&str>, short: Option<char>) -> Self {
        let dest = long
            .map(String::from)
            .or_else(|| short.map(String::from))
            .unwrap_or_default();
        Self {
            dest,
            long: long.map(String::from),
            short,
            help: None,
            args: Vec::new(),
        }
    }

    pub fn with_dest(mut self, dest: &str) -> Self {
        self.dest = dest.to_string();
        self
    }

    pub fn with_help(mut self, help: &str) -> Self {
        self.help = Some(help.to_string());
        self
    }

    pub fn with_arg(mut self, arg: Argument) -> Self {
        self.args.push(arg);
        self
    }

    pub fn takes_args(&self) -> bool {
        !self.args.is_empty()
    }

    /// `--long` if present, else `-s`.
    pub fn canonical_name(&self) -> String {
        match (&self.long, self.short) {
            (Some(long), _) => format!("--{long}"),
            (None, Some(short)) => format!("-{short}"),
            (None, None) => self.dest.clone(),
        }
    }
}

/// A command or sub-command grammar.
///
/// # Examples
///
/// ```
/// use command_grammar_core::{Argument, CommandNode};
///
/// let todo = CommandNode::new("todo")
///     .with_subcommand(CommandNode::new("add").with_arg(Argument::new("item", "string")))
///     .with_subcommand(
///         CommandNode::new("remove")
///             .with_alias("rm")
///             .with_arg(Argument::new("index", "int")),
///     );
///
/// assert_eq!(todo.find_named_subcommand("rm").map(|s| s.dest.as_str()), Some("remove"));
/// assert!(todo.find_named_subcommand("list").is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CommandNode {
    /// `None` for an unnamed (fallback) sub-command.
    pub name: Option<String>,
    /// Presence key set when this node parses successfully.
    pub dest: String,
    pub aliases: Vec<String>,
    pub help: Option<String>,
    pub args: Vec<Argument>,
    pub flags: Vec<Flag>,
    pub subcommands: Vec<CommandNode>,
}

impl CommandNode {
    /// Creates a named node whose `dest` is its name.
    pub fn new(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            dest: name.to_string(),
            ..Default::default()
        }
    }

    /// Creates an unnamed fallback node.
    pub fn unnamed(dest: &str) -> Self {
        Self {
            name: None,
            dest: dest.to_string(),
            ..Default::default()
        }
    }

    pub fn with_dest(mut self, dest: &str) -> Self {
        self.dest = dest.to_string();
        self
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }

    pub fn with_help(mut self, help: &str) -> Self {
        self.help = Some(help.to_string());
        self
    }

    pub fn with_arg(mut self, arg: Argument) -> Self {
        self.args.push(arg);
        self
    }

    pub fn with_flag(mut self, flag: Flag) -> Self {
        self.flags.push(flag);
        self
    }

    pub fn with_subcommand(mut self, sub: CommandNode) -> Self {
        self.subcommands.push(sub);
        self
    }

    /// Unnamed nodes (and nodes with an empty name) are fallbacks.
    pub fn is_unnamed(&self) -> bool {
        self.name.as_deref().is_none_or(str::is_empty)
    }

    /// Exact match against the name or any alias. Unnamed nodes never match.
    pub fn matches_name(&self, text: &str) -> bool {
        !self.is_unnamed()
            && (self.name.as_deref() == Some(text) || self.aliases.iter().any(|a| a == text))
    }

    pub fn find_long_flag(&self, long: &str) -> Option<&Flag> {
        self.flags.iter().find(|f| f.long.as_deref() == Some(long))
    }

    pub fn find_short_flag(&self, short: char) -> Option<&Flag> {
        self.flags.iter().find(|f| f.short == Some(short))
    }

    /// First named sub-command, in declaration order, matching `text`.
    pub fn find_named_subcommand(&self, text: &str) -> Option<&CommandNode> {
        self.subcommands.iter().find(|s| s.matches_name(text))
    }

    /// Unnamed sub-commands in declaration order.
    pub fn unnamed_subcommands(&self) -> impl Iterator<Item = &CommandNode> {
        self.subcommands.iter().filter(|s| s.is_unnamed())
    }
}
