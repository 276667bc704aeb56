//! Author-time schema validation.
//!
//! Catches schema mistakes that would otherwise surface as confusing parse
//! results: unreachable duplicate flags, flag names the tokenizer can never
//! produce, argument types missing from the registry. The parse engine does
//! not require a schema to validate cleanly.
//!
//! # Examples
//!
//! ```
//! use command_grammar_core::*;
//!
//! let registry = TypeRegistry::with_builtins();
//!
//! let schema = CommandNode::new("todo")
//!     .with_flag(Flag::new(Some("all"), Some('a')))
//!     .with_subcommand(CommandNode::new("add").with_arg(Argument::new("item", "string")));
//! assert!(validate_schema(&schema, &registry).is_empty());
//!
//! let bad = CommandNode::new("todo")
//!     .with_flag(Flag::new(Some("all"), Some('a')))
//!     .with_flag(Flag::new(Some("any"), Some('a')));
//! assert_eq!(
//!     validate_schema(&bad, &registry),
//!     vec![ValidationError::DuplicateShortFlag { path: "todo".into(), short: 'a' }]
//! );
//! ```

use std::collections::HashSet;

use thiserror::Error;

use crate::{Argument, ArgType, CommandNode, Flag, TypeRegistry};

/// Schema validation errors. `path` is the space-separated chain of node
/// names from the root, with `<unnamed>` for fallback nodes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A named node below the root has an empty `dest`.
    #[error("{path}: command dest cannot be empty")]
    EmptyCommandDest { path: String },
    /// An argument has an empty `dest`.
    #[error("{path}: argument '{name}' has an empty dest")]
    EmptyArgumentDest { path: String, name: String },
    /// A flag has an empty `dest`.
    #[error("{path}: flag {flag} has an empty dest")]
    EmptyFlagDest { path: String, flag: String },
    /// A flag has neither long nor short form.
    #[error("{path}: flag must define a long or short form")]
    MissingFlagName { path: String },
    /// Long name that can never be matched (starts with `-`, contains `=`
    /// or whitespace, or is empty).
    #[error("{path}: invalid long flag '{long}'")]
    InvalidLongFlag { path: String, long: String },
    /// Short code that can never be matched (`-`, `=` or whitespace).
    #[error("{path}: invalid short flag '{short}'")]
    InvalidShortFlag { path: String, short: char },
    #[error("{path}: duplicate long flag --{long}")]
    DuplicateLongFlag { path: String, long: String },
    #[error("{path}: duplicate short flag -{short}")]
    DuplicateShortFlag { path: String, short: char },
    /// Two named sub-commands share a name or alias.
    #[error("{path}: duplicate sub-command name '{name}'")]
    DuplicateSubcommand { path: String, name: String },
    /// An argument names a type missing from the registry.
    #[error("{path}: argument '{name}' uses unregistered type '{ty}'")]
    UnknownType {
        path: String,
        name: String,
        ty: String,
    },
}

/// Validates a schema tree against `registry`, returning every problem found.
pub fn validate_schema(schema: &CommandNode, registry: &TypeRegistry) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut path = Vec::new();
    validate_node(schema, registry, &mut path, &mut errors);
    errors
}

fn segment(node: &CommandNode) -> String {
    match node.name.as_deref() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => "<unnamed>".to_string(),
    }
}

fn validate_node(
    node: &CommandNode,
    registry: &TypeRegistry,
    path: &mut Vec<String>,
    errors: &mut Vec<ValidationError>,
) {
    path.push(segment(node));
    let here = path.join(" ");

    // A root command may leave its dest empty to skip the presence marker.
    let is_root = path.len() == 1;
    if !is_root && !node.is_unnamed() && node.dest.trim().is_empty() {
        errors.push(ValidationError::EmptyCommandDest { path: here.clone() });
    }

    validate_args(&node.args, registry, &here, errors);
    validate_flags(&node.flags, registry, &here, errors);

    let mut seen: HashSet<&str> = HashSet::new();
    for sub in node.subcommands.iter().filter(|s| !s.is_unnamed()) {
        let names = sub.name.iter().chain(sub.aliases.iter());
        for name in names {
            if !seen.insert(name.as_str()) {
                errors.push(ValidationError::DuplicateSubcommand {
                    path: here.clone(),
                    name: name.clone(),
                });
            }
        }
    }

    for sub in &node.subcommands {
        validate_node(sub, registry, path, errors);
    }
    path.pop();
}

fn validate_args(
    args: &[Argument],
    registry: &TypeRegistry,
    path: &str,
    errors: &mut Vec<ValidationError>,
) {
    for arg in args {
        if arg.dest.trim().is_empty() {
            errors.push(ValidationError::EmptyArgumentDest {
                path: path.to_string(),
                name: arg.name.clone(),
            });
        }
        if let ArgType::Named(ty) = &arg.ty
            && !registry.contains(ty)
        {
            errors.push(ValidationError::UnknownType {
                path: path.to_string(),
                name: arg.name.clone(),
                ty: ty.clone(),
            });
        }
    }
}

fn validate_flags(
    flags: &[Flag],
    registry: &TypeRegistry,
    path: &str,
    errors: &mut Vec<ValidationError>,
) {
    let mut longs: HashSet<&str> = HashSet::new();
    let mut shorts: HashSet<char> = HashSet::new();

    for flag in flags {
        if flag.long.is_none() && flag.short.is_none() {
            errors.push(ValidationError::MissingFlagName {
                path: path.to_string(),
            });
        }
        if flag.dest.trim().is_empty() {
            errors.push(ValidationError::EmptyFlagDest {
                path: path.to_string(),
                flag: flag.canonical_name(),
            });
        }

        if let Some(long) = flag.long.as_deref() {
            if long.is_empty()
                || long.starts_with('-')
                || long.contains('=')
                || long.chars().any(char::is_whitespace)
            {
                errors.push(ValidationError::InvalidLongFlag {
                    path: path.to_string(),
                    long: long.to_string(),
                });
            }
            if !longs.insert(long) {
                errors.push(ValidationError::DuplicateLongFlag {
                    path: path.to_string(),
                    long: long.to_string(),
                });
            }
        }

        if let Some(short) = flag.short {
            if short == '-' || short == '=' || short.is_whitespace() {
                errors.push(ValidationError::InvalidShortFlag {
                    path: path.to_string(),
                    short,
                });
            }
            if !shorts.insert(short) {
                errors.push(ValidationError::DuplicateShortFlag {
                    path: path.to_string(),
                    short,
                });
            }
        }

        validate_args(&flag.args, registry, path, errors);
    }
}
