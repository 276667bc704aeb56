//! Declarative schema literals.
//!
//! [`CommandDecl`] mirrors the fluent schema model as plain data that can be
//! written in JSON or YAML. [`CommandDecl::compile`] normalizes it into a
//! fresh [`CommandNode`]; compiling the same declaration twice yields two
//! independent but equivalent trees.
//!
//! # Example
//!
//! ```
//! use command_grammar_core::{CommandDecl, Parser, TypeRegistry};
//!
//! let decl: CommandDecl = serde_json::from_str(r#"{
//!     "name": "roll",
//!     "args": [
//!         { "name": "sides", "type": "number", "range": [2, 100] }
//!     ],
//!     "flags": [
//!         { "long": "times", "short": "t", "dest": "repeated", "args": [
//!             { "name": "times", "type": "byte", "unsigned": true,
//!               "required": false, "default": 1 }
//!         ] }
//!     ]
//! }"#).unwrap();
//!
//! let schema = decl.compile().unwrap();
//! let registry = TypeRegistry::with_builtins();
//! let args = Parser::new(&registry).parse(&schema, "20 -t 3", 0).unwrap();
//! assert_eq!(args.get_i64("sides"), Some(20));
//! assert_eq!(args.get_i64("times"), Some(3));
//! assert!(args.is_present("repeated"));
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::types::{ArgOptions, ArgType, Argument, CommandNode, Flag, NumberRange};

/// Errors raised while compiling a declaration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// An argument declares neither `name` nor `dest`.
    #[error("argument must define name or dest")]
    MissingArgumentDest,
    /// A flag declares none of `dest`, `long` or `short`.
    #[error("flag must define dest, long or short form")]
    MissingFlagName,
    /// `short` is not exactly one character.
    #[error("invalid short flag: {0:?}")]
    InvalidShortFlag(String),
    /// `range` has more than two bounds.
    #[error("invalid range for argument {0}: expected [min, max]")]
    InvalidRange(String),
}

/// Declarative form of an [`Argument`].
///
/// Keys other than the ones below are kept in the argument's free-form
/// attribute map, where custom conversions can read them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgumentDecl {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest: Option<String>,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    /// `[min, max]`; either bound may be `null`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<Vec<Option<f64>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unsigned: Option<bool>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

fn default_required() -> bool {
    true
}

/// Declarative form of a [`Flag`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlagDecl {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<ArgumentDecl>,
}

/// Declarative form of a [`CommandNode`]. Omitting `name` declares an
/// unnamed fallback sub-command.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandDecl {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<ArgumentDecl>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<FlagDecl>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subcommands: Vec<CommandDecl>,
}

impl ArgumentDecl {
    /// Normalizes into an [`Argument`]: `dest` defaults to `name` and
    /// `range`/`unsigned` become typed options.
    pub fn compile(&self) -> Result<Argument, SchemaError> {
        let dest = self
            .dest
            .clone()
            .or_else(|| self.name.clone())
            .ok_or(SchemaError::MissingArgumentDest)?;
        let name = self.name.clone().unwrap_or_else(|| dest.clone());

        let range = match &self.range {
            Some(bounds) if bounds.len() > 2 => return Err(SchemaError::InvalidRange(dest)),
            Some(bounds) => Some(NumberRange {
                min: bounds.first().copied().flatten(),
                max: bounds.get(1).copied().flatten(),
            }),
            None => None,
        };
        let options = ArgOptions {
            range,
            unsigned: self.unsigned.unwrap_or(false),
        };

        Ok(Argument {
            name,
            ty: ArgType::Named(self.ty.clone()),
            dest,
            required: self.required,
            default: self.default.clone(),
            help: self.help.clone(),
            options,
            attrs: self.extra.clone(),
        })
    }
}

impl FlagDecl {
    /// Normalizes into a [`Flag`]: `dest` defaults to `long`, then `short`.
    pub fn compile(&self) -> Result<Flag, SchemaError> {
        let short = match self.short.as_deref() {
            None => None,
            Some(s) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(c),
                    _ => return Err(SchemaError::InvalidShortFlag(s.to_string())),
                }
            }
        };

        let dest = self
            .dest
            .clone()
            .or_else(|| self.long.clone())
            .or_else(|| short.map(String::from))
            .ok_or(SchemaError::MissingFlagName)?;

        Ok(Flag {
            dest,
            long: self.long.clone(),
            short,
            help: self.help.clone(),
            args: self
                .args
                .iter()
                .map(ArgumentDecl::compile)
                .collect::<Result<_, _>>()?,
        })
    }
}

impl CommandDecl {
    /// Compiles the declaration tree into a new [`CommandNode`] tree.
    pub fn compile(&self) -> Result<CommandNode, SchemaError> {
        let name = self.name.clone().filter(|n| !n.is_empty());
        let dest = self
            .dest
            .clone()
            .or_else(|| name.clone())
            .unwrap_or_default();

        Ok(CommandNode {
            name,
            dest,
            aliases: self.aliases.clone(),
            help: self.help.clone(),
            args: self
                .args
                .iter()
                .map(ArgumentDecl::compile)
                .collect::<Result<_, _>>()?,
            flags: self
                .flags
                .iter()
                .map(FlagDecl::compile)
                .collect::<Result<_, _>>()?,
            subcommands: self
                .subcommands
                .iter()
                .map(CommandDecl::compile)
                .collect::<Result<_, _>>()?,
        })
    }
}

impl TryFrom<&CommandDecl> for CommandNode {
    type Error = SchemaError;

    fn try_from(decl: &CommandDecl) -> Result<Self, Self::Error> {
        decl.compile()
    }
}

/// Compiles a declaration; equivalent to [`CommandDecl::compile`].
pub fn build_schema(decl: &CommandDecl) -> Result<CommandNode, SchemaError> {
    decl.compile()
}
