//! Structured parse errors and source-anchored diagnostics.
//!
//! Conversion functions report failures as [`ConversionError`], anchored at
//! the token they rejected. The parse engine, which owns the raw command
//! text, turns those (and its own grammar failures) into a complete
//! [`ParseError`] that can render an excerpt of the input:
//!
//! ```text
//! Type error: 'thirty' is not a valid int
//!     at column 5
//!     Sam >>thirty<<
//! ```

use std::fmt;

use thiserror::Error;

use crate::token::Token;

/// Default number of characters of context shown on each side of the
/// offending span.
pub const DEFAULT_CONTEXT_WIDTH: usize = 10;

/// Whether an integer type uses a signed or unsigned range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signedness {
    Signed,
    Unsigned,
}

impl fmt::Display for Signedness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signed => f.write_str("signed"),
            Self::Unsigned => f.write_str("unsigned"),
        }
    }
}

/// Why a token could not be converted to an argument's type.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TypeError {
    #[error("Type error: '{0}' is not a true or false")]
    NotBoolean(String),
    #[error("Type error: '{0}' is not a valid number")]
    InvalidNumber(String),
    #[error("Type error: {text} is too small, it must be at least {min}")]
    BelowRange { text: String, min: f64 },
    #[error("Type error: {text} is too big, it must be at most {max}")]
    AboveRange { text: String, max: f64 },
    #[error("Type error: '{text}' is not a valid {type_name}")]
    InvalidInteger { text: String, type_name: String },
    /// Integer literal outside the range of its sized type.
    #[error("{bits}-bit {signedness} overflow")]
    Overflow { bits: u32, signedness: Signedness },
    #[error("Type error: '{0}' is not a valid float")]
    InvalidFloat(String),
    #[error("Type error: '{0}' is not a valid double")]
    InvalidDouble(String),
    /// Rejection reported by a custom conversion.
    #[error("{0}")]
    Custom(String),
}

/// Failure returned by a conversion function.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    /// The token was rejected; the diagnostic points at `token`.
    #[error("{kind}")]
    Type { kind: TypeError, token: Token },
    /// Anything that is not a user-facing rejection, such as a bug in a
    /// custom conversion. Reported as an internal error without position.
    #[error("{0}")]
    Internal(String),
}

impl ConversionError {
    /// Shorthand for a token-anchored rejection.
    pub fn reject(kind: TypeError, token: &Token) -> Self {
        Self::Type {
            kind,
            token: token.clone(),
        }
    }
}

/// Every way a parse can fail.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ErrorKind {
    #[error("Unrecognized flag: {0}")]
    UnrecognizedFlag(String),
    #[error("Unknown option: {0}")]
    UnknownOption(char),
    #[error("Option '{0}' doesn't allow an argument")]
    FlagDisallowsArgument(String),
    #[error("Flag requires more argument")]
    FlagRequiresArgument,
    #[error("Too many arguments")]
    TooManyArguments,
    #[error("Unknown sub-command: {0}")]
    UnknownSubcommand(String),
    #[error("Unexpected end of input")]
    UnexpectedEndOfInput,
    #[error(transparent)]
    Type(#[from] TypeError),
    /// An argument names a type that is not in the registry.
    #[error("Internal error: type parser '{0}' is not registered")]
    UnknownType(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A parse failure carrying enough position data to render a diagnostic.
///
/// Errors with an offending [`Token`] are *syntax* errors: their span is
/// `token.start + start_offset .. token.end - end_offset` in the original
/// command. Errors without a token (internal failures) render as their
/// message only.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind}")]
pub struct ParseError {
    kind: ErrorKind,
    token: Option<Token>,
    command: String,
    start_offset: isize,
    end_offset: isize,
}

impl ParseError {
    /// Creates a positionless error for `command`.
    pub fn new(kind: ErrorKind, command: impl Into<String>) -> Self {
        Self {
            kind,
            token: None,
            command: command.into(),
            start_offset: 0,
            end_offset: 0,
        }
    }

    /// Anchors the error at `token`.
    pub fn at(mut self, token: Token) -> Self {
        self.token = Some(token);
        self
    }

    /// Narrows the anchored span: `start` is added to the token start and
    /// `end` subtracted from the token end.
    pub fn with_offsets(mut self, start: isize, end: isize) -> Self {
        self.start_offset = start;
        self.end_offset = end;
        self
    }

    /// Anchors the error at the zero-width end of the command.
    pub fn at_end_of_input(self) -> Self {
        let len = self.command.len();
        self.at(Token::end_of_input(len))
    }

    /// Stretches the span from its start to the end of the command.
    pub fn through_end_of_input(mut self) -> Self {
        self.end_offset = -(self.command.len() as isize);
        self
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn token(&self) -> Option<&Token> {
        self.token.as_ref()
    }

    /// The raw command text the error refers to.
    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn start_offset(&self) -> isize {
        self.start_offset
    }

    pub fn end_offset(&self) -> isize {
        self.end_offset
    }

    /// `true` when the error points at a location in the command.
    pub fn is_syntax(&self) -> bool {
        self.token.is_some()
    }

    /// Byte range of the offending text, clamped to the command.
    pub fn span(&self) -> Option<(usize, usize)> {
        let token = self.token.as_ref()?;
        let len = self.command.len() as isize;
        let start = (token.start as isize + self.start_offset).clamp(0, len) as usize;
        let end = (token.end as isize - self.end_offset).clamp(0, len) as usize;
        let start = floor_char_boundary(&self.command, start);
        let end = floor_char_boundary(&self.command, end).max(start);
        Some((start, end))
    }

    /// 1-based character column of the span start.
    pub fn column(&self) -> Option<usize> {
        let (start, _) = self.span()?;
        Some(self.command[..start].chars().count() + 1)
    }

    /// `<left>>>offending<<<right>` with up to `width` characters of context
    /// on each side, or `None` for a non-syntax error.
    pub fn excerpt(&self, width: usize) -> Option<String> {
        let (start, end) = self.span()?;
        let before = &self.command[..start];
        let left_from = before
            .char_indices()
            .rev()
            .take(width)
            .last()
            .map_or(start, |(i, _)| i);
        let after = &self.command[end..];
        let right_to = after
            .char_indices()
            .nth(width)
            .map_or(self.command.len(), |(i, _)| end + i);

        Some(format!(
            "{}>>{}<<{}",
            &self.command[left_from..start],
            &self.command[start..end],
            &self.command[end..right_to]
        ))
    }

    /// The excerpt for syntax errors, the plain message otherwise.
    pub fn render(&self, width: usize) -> String {
        self.excerpt(width)
            .unwrap_or_else(|| self.kind.to_string())
    }

    /// Full user-facing text: message, column and excerpt.
    pub fn report(&self) -> String {
        self.report_with(DEFAULT_CONTEXT_WIDTH)
    }

    /// [`report`](Self::report) with `width` characters of excerpt context.
    pub fn report_with(&self, width: usize) -> String {
        let mut msg = self.kind.to_string();
        if let (Some(column), Some(excerpt)) = (self.column(), self.excerpt(width)) {
            msg.push_str(&format!("\n    at column {column}\n    {excerpt}"));
        }
        msg
    }
}

fn floor_char_boundary(s: &str, mut idx: usize) -> usize {
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

/// Convenience alias for results with [`ParseError`].
pub type Result<T> = std::result::Result<T, ParseError>;
