//! The parse engine.
//!
//! Walks a token sequence against a [`CommandNode`] tree and fills a single
//! flat [`ParsedArgs`] map. Each level of the tree consumes flags, then
//! positional arguments, then hands the remaining tokens to a sub-command:
//! first a named one matching the next token, otherwise each unnamed
//! fallback in turn until one parses.
//!
//! A parse is all-or-nothing: any failure aborts the call with a
//! [`ParseError`] that carries the raw command text.

use tracing::{debug, trace};

use crate::error::{ErrorKind, ParseError, Result};
use crate::registry::{ConversionFn, TypeRegistry};
use crate::types::{ArgType, Argument, CommandNode, Flag};
use crate::token::char_offsets;
use crate::{ConversionError, ParseOptions, ParsedArgs, Token, tokenize};

/// Parses command lines against a schema.
///
/// # Examples
///
/// ```
/// use command_grammar_core::{Argument, CommandNode, Flag, Parser, TypeRegistry};
/// use serde_json::json;
///
/// let schema = CommandNode::new("greet")
///     .with_arg(Argument::new("name", "string"))
///     .with_flag(Flag::new(Some("loud"), Some('l')));
///
/// let registry = TypeRegistry::with_builtins();
/// let parser = Parser::new(&registry);
///
/// let args = parser.parse(&schema, "Sam -l", 0).unwrap();
/// assert_eq!(args.get_str("name"), Some("Sam"));
/// assert!(args.is_present("loud"));
/// assert!(args.is_present("greet"));
///
/// let err = parser.parse(&schema, "Sam extra", 0).unwrap_err();
/// assert_eq!(err.to_string(), "Too many arguments");
/// assert_eq!(err.render(10), "Sam >>extra<<");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Parser<'r> {
    registry: &'r TypeRegistry,
    options: ParseOptions,
}

impl<'r> Parser<'r> {
    /// A parser using `registry` and default [`ParseOptions`].
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Self {
            registry,
            options: ParseOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Tokenizes `command` from byte `start_offset` and parses it.
    ///
    /// Diagnostics always refer to positions in the whole `command`, so a
    /// host can skip a prefix such as `!name ` and still report columns in
    /// the line the user typed.
    pub fn parse(
        &self,
        schema: &CommandNode,
        command: &str,
        start_offset: usize,
    ) -> Result<ParsedArgs> {
        self.parse_tokens(schema, command, tokenize(command, start_offset))
    }

    /// Parses an already tokenized `command`.
    pub fn parse_tokens(
        &self,
        schema: &CommandNode,
        command: &str,
        tokens: Vec<Token>,
    ) -> Result<ParsedArgs> {
        debug!(command = %schema.dest, tokens = tokens.len(), "Parsing command");
        let mut session = Session {
            registry: self.registry,
            options: self.options,
            command,
            tokens,
        };
        let mut result = ParsedArgs::new();
        session.parse_level(0, schema, self.options.parse_flags, &mut result)?;
        Ok(result)
    }
}

/// Parses `command` with the builtin types only.
///
/// # Examples
///
/// ```
/// use command_grammar_core::{Argument, CommandNode, ParseOptions, parse};
///
/// let schema = CommandNode::new("echo").with_arg(Argument::new("text", "string"));
/// let args = parse(&schema, "!echo hi", 6, ParseOptions::default()).unwrap();
/// assert_eq!(args.get_str("text"), Some("hi"));
/// ```
pub fn parse(
    schema: &CommandNode,
    command: &str,
    start_offset: usize,
    options: ParseOptions,
) -> Result<ParsedArgs> {
    Parser::new(TypeRegistry::builtins())
        .with_options(options)
        .parse(schema, command, start_offset)
}

/// State of one parse call. The token list is private to the call and may
/// grow when an inline `--flag=value` is split in two.
struct Session<'a> {
    registry: &'a TypeRegistry,
    options: ParseOptions,
    command: &'a str,
    tokens: Vec<Token>,
}

impl Session<'_> {
    fn error(&self, kind: ErrorKind) -> ParseError {
        ParseError::new(kind, self.command)
    }

    /// Parses one command level starting at token `idx`; returns the index
    /// of the first token not consumed.
    fn parse_level(
        &mut self,
        mut idx: usize,
        node: &CommandNode,
        mut flags_active: bool,
        result: &mut ParsedArgs,
    ) -> Result<usize> {
        let mut arg_idx = 0;

        while idx < self.tokens.len() {
            let token = &self.tokens[idx];
            let looks_like_flag =
                flags_active && !token.quoted && token.text.starts_with('-') && token.text != "-";

            if looks_like_flag {
                if self.options.breakable_flags && token.text == "--" {
                    trace!(position = token.start, "Flag parsing disabled by '--'");
                    flags_active = false;
                    idx += 1;
                    continue;
                }
                idx = self.parse_flag(idx, node, result)?;
                continue;
            }

            if let Some(arg) = node.args.get(arg_idx) {
                arg_idx += 1;
                idx = self.parse_argument(idx, arg, result)?;
                continue;
            }

            idx = self.parse_subcommand(idx, node, flags_active, result)?;
            break;
        }

        for arg in &node.args[arg_idx..] {
            if arg.required {
                return Err(self.error(ErrorKind::UnexpectedEndOfInput).at_end_of_input());
            }
            if let Some(default) = &arg.default {
                result.insert(arg.dest.clone(), default.clone());
            }
        }

        result.set_present(&node.dest);
        Ok(idx)
    }

    /// Converts the token at `idx` for `arg`; returns the index after the
    /// tokens it consumed.
    fn parse_argument(
        &self,
        idx: usize,
        arg: &Argument,
        result: &mut ParsedArgs,
    ) -> Result<usize> {
        let Some(token) = self.tokens.get(idx) else {
            return Err(self.error(ErrorKind::UnexpectedEndOfInput).at_end_of_input());
        };

        let registry = self.registry;
        let convert: &ConversionFn = match &arg.ty {
            ArgType::Named(name) => registry.resolve(name).ok_or_else(|| {
                self.error(ErrorKind::UnknownType(name.clone()))
                    .at(token.clone())
            })?,
            ArgType::Custom(f) => f,
        };

        let converted = convert(&self.tokens[idx..], arg).map_err(|err| match err {
            ConversionError::Type { kind, token } => self.error(ErrorKind::Type(kind)).at(token),
            ConversionError::Internal(detail) => self.error(ErrorKind::Internal(format!(
                "exception encountered while converting '{}': {detail}",
                arg.dest
            ))),
        })?;

        result.insert(arg.dest.clone(), converted.value);
        Ok(idx + converted.step.max(1))
    }

    /// Handles the flag token at `idx` and any arguments it takes; returns
    /// the index of the next unconsumed token.
    fn parse_flag(
        &mut self,
        idx: usize,
        node: &CommandNode,
        result: &mut ParsedArgs,
    ) -> Result<usize> {
        let token = self.tokens[idx].clone();
        let text = token.text.as_str();

        let mut is_short = !text.starts_with("--");
        let prefix_len = if is_short { 1 } else { 2 };
        let body = &text[prefix_len..];
        let (flag_name, inline) = match body.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (body, None),
        };

        // Escapes were stripped from `text`, so byte positions in it are
        // mapped back to the source through the token's character offsets.
        let offsets = char_offsets(self.command, &token);
        let source_at = |i: usize| -> usize {
            offsets
                .get(text[..i].chars().count())
                .copied()
                .unwrap_or(token.end)
        };
        let offset_of = |pos: usize| pos.saturating_sub(token.start) as isize;

        let long_flag = node.find_long_flag(flag_name);
        if !is_short && long_flag.is_none() {
            return Err(self
                .error(ErrorKind::UnrecognizedFlag(flag_name.to_string()))
                .at(token.clone())
                .with_offsets(offset_of(source_at(2)), 0));
        }
        if self.options.java_flags && long_flag.is_some() {
            is_short = false;
        }

        let mut current: Option<&Flag> = long_flag;
        if is_short {
            for (pos, ch) in body.char_indices() {
                if self.options.equals_in_short_flags
                    && ch == '='
                    && current.is_some_and(Flag::takes_args)
                {
                    break;
                }
                let Some(flag) = node.find_short_flag(ch) else {
                    let at = source_at(prefix_len + pos);
                    let end = token.end.saturating_sub(at + ch.len_utf8());
                    return Err(self
                        .error(ErrorKind::UnknownOption(ch))
                        .at(token.clone())
                        .with_offsets(offset_of(at), end as isize));
                };
                result.set_present(&flag.dest);
                current = Some(flag);
            }
        }

        let Some(flag) = current else {
            return Err(self
                .error(ErrorKind::UnrecognizedFlag(flag_name.to_string()))
                .at(token.clone()));
        };
        trace!(flag = %flag.dest, "Matched flag");

        if let Some(value) = inline {
            if !flag.takes_args() {
                let err = self.error(ErrorKind::FlagDisallowsArgument(format!(
                    "{}{flag_name}",
                    &text[..prefix_len]
                )));
                return Err(if value.is_empty() {
                    match self.tokens.get(idx + 1) {
                        Some(next) => err.at(next.clone()),
                        None => err.at_end_of_input(),
                    }
                } else {
                    let start = source_at(prefix_len + flag_name.len() + 1);
                    err.at(token.clone()).with_offsets(offset_of(start), 0)
                });
            }

            // The flag token keeps only `--name`; a non-empty value becomes
            // its own token starting right after the `=`.
            let flag_end = source_at(prefix_len + flag_name.len());
            self.tokens[idx].end = flag_end;
            if !value.is_empty() {
                self.tokens
                    .insert(idx + 1, Token::new(value, flag_end + 1, token.end));
            }
        }

        let mut last = idx;
        let mut failure: Option<ParseError> = None;
        for (i, arg) in flag.args.iter().enumerate() {
            if failure.is_none() {
                match self.parse_argument(last + 1, arg, result) {
                    Ok(next) => {
                        last = next - 1;
                        continue;
                    }
                    Err(err) => {
                        failure = Some(if self.tokens.len() <= last + 1 {
                            self.error(ErrorKind::FlagRequiresArgument)
                                .at_end_of_input()
                        } else {
                            err
                        });
                    }
                }
            }

            if arg.required || (i == 0 && inline.is_some()) {
                return Err(failure.take().unwrap_or_else(|| {
                    self.error(ErrorKind::FlagRequiresArgument)
                        .at_end_of_input()
                }));
            }
            if let Some(default) = &arg.default {
                result.insert(arg.dest.clone(), default.clone());
            }
        }

        result.set_present(&flag.dest);
        Ok(last + 1)
    }

    /// Resolves the sub-command starting at token `idx` once this level's
    /// positional arguments are used up.
    fn parse_subcommand(
        &mut self,
        idx: usize,
        node: &CommandNode,
        flags_active: bool,
        result: &mut ParsedArgs,
    ) -> Result<usize> {
        let token = self.tokens[idx].clone();

        if node.subcommands.is_empty() {
            return Err(self
                .error(ErrorKind::TooManyArguments)
                .at(token)
                .through_end_of_input());
        }

        if let Some(sub) = node.find_named_subcommand(&token.text) {
            debug!(subcommand = %sub.dest, alias = %token.text, "Matched sub-command");
            return self.parse_level(idx + 1, sub, flags_active, result);
        }

        let mut first_error: Option<ParseError> = None;
        for sub in node.unnamed_subcommands() {
            let snapshot = self.tokens.clone();
            let mut scratch = ParsedArgs::new();
            match self.parse_level(idx, sub, flags_active, &mut scratch) {
                Ok(next) => {
                    debug!(subcommand = %sub.dest, "Unnamed sub-command accepted");
                    result.merge(scratch);
                    return Ok(next);
                }
                Err(err) => {
                    debug!(subcommand = %sub.dest, error = %err, "Unnamed sub-command rejected");
                    self.tokens = snapshot;
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                }
            }
        }

        Err(first_error.unwrap_or_else(|| {
            self.error(ErrorKind::UnknownSubcommand(token.text.clone()))
                .at(token)
        }))
    }
}
