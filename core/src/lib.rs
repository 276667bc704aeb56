//! Tokenizer, schema model and parse engine for chat-style command grammars.
//!
//! This crate turns a single line of text, such as the body of a chat
//! message after its command name, into a map of named values according to a
//! declarative grammar:
//!
//! - [`tokenize`] splits a line into [`Token`]s that remember their byte
//!   offsets, honoring double quotes.
//! - [`TypeRegistry`] maps type names to conversion functions; the builtins
//!   cover `string`, `boolean`, `number`, the sized integers and the floats.
//! - [`CommandNode`], [`Flag`] and [`Argument`] model the grammar tree. Trees
//!   are built fluently or compiled from a [`CommandDecl`] read from JSON or
//!   YAML.
//! - [`Parser`] walks a tree over the tokens and produces [`ParsedArgs`], or
//!   a [`ParseError`] that can render the offending region of the input.
//!
//! Schema mistakes that the parser would silently tolerate are caught by
//! [`validate_schema`].
//!
//! # Example
//!
//! ```
//! use command_grammar_core::*;
//!
//! let schema = CommandNode::new("greet")
//!     .with_arg(Argument::new("name", "string"))
//!     .with_arg(Argument::new("age", "int").optional(serde_json::json!(18)));
//!
//! let args = parse(&schema, "alice", 0, ParseOptions::default()).unwrap();
//! assert_eq!(args.get_str("name"), Some("alice"));
//! assert_eq!(args.get_i64("age"), Some(18));
//! assert!(args.is_present("greet"));
//!
//! let err = parse(&schema, "alice thirty", 0, ParseOptions::default()).unwrap_err();
//! assert_eq!(err.render(10), "alice >>thirty<<");
//! ```

mod args;
mod builtins;
mod decl;
mod engine;
mod error;
mod options;
mod registry;
mod token;
mod types;
mod validate;

pub use args::ParsedArgs;
pub use decl::{ArgumentDecl, CommandDecl, FlagDecl, SchemaError, build_schema};
pub use engine::{Parser, parse};
pub use error::{
    ConversionError, DEFAULT_CONTEXT_WIDTH, ErrorKind, ParseError, Result, Signedness, TypeError,
};
pub use options::ParseOptions;
pub use registry::{ConversionFn, Converted, TypeRegistry};
pub use token::{Token, tokenize};
pub use types::{ArgOptions, ArgType, Argument, CommandNode, Flag, NumberRange};
pub use validate::{ValidationError, validate_schema};
