//! Tokenizer for raw command lines.
//!
//! Splits a line into whitespace-separated [`Token`]s, honoring double
//! quotes and backslash escapes. Every token remembers where it came from in
//! the original string so diagnostics can point back at it even after quote
//! and escape characters have been stripped from its text.

use serde::{Deserialize, Serialize};

/// A positioned word of a command line.
///
/// `start`/`end` are byte offsets into the untouched source. For a quoted
/// token the span is widened to cover the delimiting quotes.
///
/// # Examples
///
/// ```
/// use command_grammar_core::tokenize;
///
/// let tokens = tokenize(r#"say "hello world""#, 0);
/// assert_eq!(tokens[1].text, "hello world");
/// assert!(tokens[1].quoted);
/// assert_eq!((tokens[1].start, tokens[1].end), (4, 17));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Token text with quotes and escapes removed. Never empty for tokens
    /// produced by [`tokenize`].
    pub text: String,
    /// Byte offset of the first character (or opening quote).
    pub start: usize,
    /// Byte offset one past the last character (or closing quote).
    pub end: usize,
    /// Whether the token was (at least partly) written inside quotes.
    pub quoted: bool,
}

impl Token {
    /// Creates an unquoted token.
    pub fn new(text: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            text: text.into(),
            start,
            end,
            quoted: false,
        }
    }

    /// Zero-width marker positioned at `offset`, used to anchor
    /// end-of-input diagnostics.
    pub fn end_of_input(offset: usize) -> Self {
        Self::new(String::new(), offset, offset)
    }
}

/// Splits `source` into tokens, starting the scan at byte `start_offset`.
///
/// Rules, applied left to right in one pass:
///
/// - a backslash makes the next character literal and is dropped;
/// - an unescaped `"` toggles quoted mode and is dropped; it also closes
///   any token in progress;
/// - outside quoted mode whitespace closes the token in progress.
///
/// An unterminated quote is not an error: the open token is closed at end
/// of input. An offset past the end (or inside a multi-byte character)
/// yields no tokens.
///
/// # Examples
///
/// ```
/// use command_grammar_core::tokenize;
///
/// let texts: Vec<_> = tokenize(r"a\ b c", 0).into_iter().map(|t| t.text).collect();
/// assert_eq!(texts, vec!["a b", "c"]);
/// ```
pub fn tokenize(source: &str, start_offset: usize) -> Vec<Token> {
    let Some(rest) = source.get(start_offset..) else {
        return Vec::new();
    };

    let mut scanner = Scanner::default();
    let mut escaped = false;

    for (rel, ch) in rest.char_indices() {
        let at = start_offset + rel;
        if scanner.text.is_empty() {
            scanner.start = at;
        }

        if escaped {
            escaped = false;
            scanner.text.push(ch);
            continue;
        }

        match ch {
            '\\' => escaped = true,
            '"' => {
                scanner.flush(at);
                scanner.quoted = !scanner.quoted;
            }
            c if c.is_whitespace() && !scanner.quoted => scanner.flush(at),
            c => scanner.text.push(c),
        }
    }

    scanner.flush(source.len());
    scanner.tokens
}

#[derive(Default)]
struct Scanner {
    tokens: Vec<Token>,
    text: String,
    start: usize,
    quoted: bool,
}

impl Scanner {
    /// Closes the token in progress at byte `at`, if it has any text.
    fn flush(&mut self, at: usize) {
        if self.text.is_empty() {
            return;
        }
        let (start, end) = if self.quoted {
            (self.start.saturating_sub(1), at + 1)
        } else {
            (self.start, at)
        };
        self.tokens.push(Token {
            text: std::mem::take(&mut self.text),
            start,
            end,
            quoted: self.quoted,
        });
    }
}

/// Byte offset in `source` of each character of `token.text`.
///
/// Rescans the token's span with the tokenizer's escape and quote rules, so
/// positions stay exact when escapes were stripped from the text. Tokens
/// whose span does not reproduce their text fall back to contiguous offsets
/// from `token.start`.
pub(crate) fn char_offsets(source: &str, token: &Token) -> Vec<usize> {
    let end = token.end.min(source.len());
    let span = source.get(token.start..end).unwrap_or_default();

    let mut offsets = Vec::with_capacity(token.text.len());
    let mut escaped = false;
    for (rel, ch) in span.char_indices() {
        if escaped {
            escaped = false;
            offsets.push(token.start + rel);
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '"' => {}
            _ => offsets.push(token.start + rel),
        }
    }

    if offsets.len() != token.text.chars().count() {
        return token
            .text
            .char_indices()
            .map(|(i, _)| token.start + i)
            .collect();
    }
    offsets
}
