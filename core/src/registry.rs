//! Type registry mapping type names to conversion functions.
//!
//! A [`TypeRegistry`] is populated during setup and then only read while
//! parsing. It is an ordinary value owned by whoever builds the parser, so
//! tests and hosts can hold differently-extended registries side by side.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

use serde_json::Value;

use crate::builtins;
use crate::{Argument, ConversionError, Token};

/// Output of a conversion: the value, and how many tokens it consumed.
#[derive(Debug, Clone, PartialEq)]
pub struct Converted {
    pub value: Value,
    /// Tokens consumed; values below 1 are treated as 1.
    pub step: usize,
}

impl Converted {
    /// A value that consumed exactly one token.
    pub fn new(value: Value) -> Self {
        Self { value, step: 1 }
    }

    pub fn with_step(mut self, step: usize) -> Self {
        self.step = step;
        self
    }
}

/// Conversion function signature.
///
/// Receives the not-yet-consumed tokens (never empty; the first one is the
/// token being converted) and the argument definition.
pub type ConversionFn =
    Arc<dyn Fn(&[Token], &Argument) -> Result<Converted, ConversionError> + Send + Sync>;

static BUILTINS: LazyLock<TypeRegistry> = LazyLock::new(TypeRegistry::with_builtins);

/// Name → conversion lookup.
///
/// # Examples
///
/// ```
/// use command_grammar_core::{Converted, ConversionError, TypeError, TypeRegistry};
/// use serde_json::json;
///
/// let mut registry = TypeRegistry::with_builtins();
/// registry.register("color", |tokens, _arg| {
///     let token = &tokens[0];
///     match token.text.as_str() {
///         "red" | "green" | "blue" => Ok(Converted::new(json!(token.text))),
///         other => Err(ConversionError::reject(
///             TypeError::Custom(format!("unknown color '{other}'")),
///             token,
///         )),
///     }
/// });
///
/// assert!(registry.contains("color"));
/// assert!(registry.contains("int"));
/// ```
#[derive(Clone, Default)]
pub struct TypeRegistry {
    parsers: HashMap<String, ConversionFn>,
}

impl TypeRegistry {
    /// A registry with no types at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A registry pre-seeded with `string`, `boolean`, `number`, `byte`,
    /// `short`, `int`, `long`, `float` and `double`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        builtins::register_all(&mut registry);
        registry
    }

    /// Shared read-only registry holding only the builtins.
    pub fn builtins() -> &'static TypeRegistry {
        &BUILTINS
    }

    /// Registers (or replaces) the conversion for `name`.
    pub fn register<F>(&mut self, name: &str, f: F)
    where
        F: Fn(&[Token], &Argument) -> Result<Converted, ConversionError> + Send + Sync + 'static,
    {
        self.parsers.insert(name.to_string(), Arc::new(f));
    }

    /// Registers an already shared conversion.
    pub fn register_shared(&mut self, name: &str, f: ConversionFn) {
        self.parsers.insert(name.to_string(), f);
    }

    pub fn resolve(&self, name: &str) -> Option<&ConversionFn> {
        self.parsers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.parsers.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.parsers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types", &self.type_names())
            .finish()
    }
}
