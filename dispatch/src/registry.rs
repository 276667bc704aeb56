//! Command registry and prefix dispatch.
//!
//! A [`CommandRegistry`] holds named commands, each a schema plus a
//! callback. [`CommandRegistry::dispatch`] takes a whole chat line such as
//! `!give steve 3`, strips the prefix, finds the command by name or alias,
//! parses the rest of the line and calls the callback.
//!
//! Parsing always sees the whole line with a start offset past the command
//! name, so error columns match what the user typed.

use std::fmt;
use std::sync::Arc;

use command_grammar_core::{
    CommandDecl, CommandNode, ParseOptions, ParsedArgs, Parser, SchemaError, TypeRegistry,
};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::DispatchConfig;
use crate::error::{CallbackError, DispatchError, Result};

/// What a callback sees.
#[derive(Debug)]
pub struct CommandContext<'a, I> {
    /// The full line as received, prefix included.
    pub raw_text: &'a str,
    pub args: ParsedArgs,
    /// Who issued the command; `None` for direct [`RegisteredCommand::call`]s.
    pub issuer: Option<&'a I>,
}

/// Command callback. The returned value is handed back to the caller of
/// [`CommandRegistry::dispatch`] or [`RegisteredCommand::call`].
pub type Callback<I> = Arc<
    dyn Fn(&CommandContext<'_, I>) -> std::result::Result<Option<Value>, CallbackError>
        + Send
        + Sync,
>;

/// Something that can receive feedback text, usually the player or user
/// that issued a command.
pub trait Feedback {
    fn send_feedback(&self, text: &str);
}

/// Anything [`CommandRegistry::register`] accepts as a command schema.
pub trait IntoSchema {
    fn into_schema(self) -> std::result::Result<CommandNode, SchemaError>;
}

impl IntoSchema for CommandNode {
    fn into_schema(self) -> std::result::Result<CommandNode, SchemaError> {
        Ok(self)
    }
}

impl IntoSchema for &CommandDecl {
    fn into_schema(self) -> std::result::Result<CommandNode, SchemaError> {
        self.compile()
    }
}

impl IntoSchema for CommandDecl {
    fn into_schema(self) -> std::result::Result<CommandNode, SchemaError> {
        self.compile()
    }
}

/// Result of a successful dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    /// Canonical name of the command that ran.
    pub command: String,
    /// Whatever the callback returned.
    pub value: Option<Value>,
}

/// A schema bound to its callback.
pub struct RegisteredCommand<I> {
    schema: CommandNode,
    types: Arc<TypeRegistry>,
    callback: Callback<I>,
    /// Flag handling for this command only.
    pub options: ParseOptions,
}

impl<I> RegisteredCommand<I> {
    pub fn schema(&self) -> &CommandNode {
        &self.schema
    }

    /// The command's canonical name; empty for an unnamed root.
    pub fn name(&self) -> &str {
        self.schema.name.as_deref().unwrap_or_default()
    }

    /// Name match, optionally also against the aliases.
    pub fn matches(&self, name: &str, include_aliases: bool) -> bool {
        self.name() == name || (include_aliases && self.schema.aliases.iter().any(|a| a == name))
    }

    /// Parses `raw` from byte `start_offset` with this command's options.
    pub fn parse(&self, raw: &str, start_offset: usize) -> command_grammar_core::Result<ParsedArgs> {
        Parser::new(&self.types)
            .with_options(self.options)
            .parse(&self.schema, raw, start_offset)
    }

    /// Parses `raw` as the argument list alone and runs the callback with
    /// no issuer.
    ///
    /// # Examples
    ///
    /// ```
    /// use command_grammar_core::{Argument, CommandNode};
    /// use command_grammar_dispatch::CommandRegistry;
    ///
    /// let mut registry: CommandRegistry<()> = CommandRegistry::new(None);
    /// let echo = registry
    ///     .register(
    ///         CommandNode::new("echo").with_arg(Argument::new("text", "string")),
    ///         |ctx| Ok(ctx.args.get("text").cloned()),
    ///     )
    ///     .unwrap();
    ///
    /// let value = echo.call("hello").unwrap();
    /// assert_eq!(value, Some(serde_json::json!("hello")));
    /// ```
    pub fn call(&self, raw: &str) -> Result<Option<Value>> {
        self.invoke(raw, 0, None)
    }

    fn invoke(&self, raw: &str, start_offset: usize, issuer: Option<&I>) -> Result<Option<Value>> {
        let args = self.parse(raw, start_offset)?;
        let ctx = CommandContext {
            raw_text: raw,
            args,
            issuer,
        };
        Ok((self.callback)(&ctx)?)
    }
}

impl<I> fmt::Debug for RegisteredCommand<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredCommand")
            .field("name", &self.name())
            .field("aliases", &self.schema.aliases)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Registered commands with an optional chat prefix.
///
/// Without a prefix the registry never claims chat lines; commands can still
/// be run directly with [`RegisteredCommand::call`].
///
/// # Examples
///
/// ```
/// use command_grammar_core::{Argument, CommandNode};
/// use command_grammar_dispatch::CommandRegistry;
///
/// let mut registry: CommandRegistry<String> = CommandRegistry::new(Some("!"));
/// registry
///     .register(
///         CommandNode::new("greet")
///             .with_alias("hi")
///             .with_arg(Argument::new("name", "string")),
///         |ctx| {
///             let who = ctx.issuer.map(String::as_str).unwrap_or("nobody");
///             let name = ctx.args.get_str("name").unwrap_or_default();
///             Ok(Some(format!("{who} greets {name}").into()))
///         },
///     )
///     .unwrap();
///
/// let issuer = "steve".to_string();
/// let done = registry.dispatch("!hi alex", &issuer).unwrap().unwrap();
/// assert_eq!(done.command, "greet");
/// assert_eq!(done.value, Some("steve greets alex".into()));
///
/// assert!(registry.dispatch("hi alex", &issuer).unwrap().is_none());
/// ```
pub struct CommandRegistry<I> {
    commands: Vec<RegisteredCommand<I>>,
    types: Arc<TypeRegistry>,
    prefix: Option<String>,
    defaults: ParseOptions,
}

impl<I> CommandRegistry<I> {
    /// An empty registry using the builtin types.
    pub fn new(prefix: Option<&str>) -> Self {
        Self::with_types(prefix, Arc::new(TypeRegistry::with_builtins()))
    }

    /// An empty registry using a custom type registry.
    pub fn with_types(prefix: Option<&str>, types: Arc<TypeRegistry>) -> Self {
        Self {
            commands: Vec::new(),
            types,
            prefix: prefix.map(str::to_string),
            defaults: ParseOptions::default(),
        }
    }

    /// An empty registry configured from `config`.
    pub fn from_config(config: &DispatchConfig, types: Arc<TypeRegistry>) -> Self {
        let mut registry = Self::with_types(Some(&config.prefix), types);
        registry.defaults = config.options;
        registry
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Changes the prefix; `None` stops the registry from claiming lines.
    pub fn set_prefix(&mut self, prefix: Option<&str>) {
        self.prefix = prefix.map(str::to_string);
    }

    pub fn types(&self) -> &Arc<TypeRegistry> {
        &self.types
    }

    /// Registers a command. The returned handle can adjust its
    /// [`ParseOptions`].
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Schema`] if a declaration fails to compile.
    pub fn register<S, F>(&mut self, schema: S, callback: F) -> Result<&mut RegisteredCommand<I>>
    where
        S: IntoSchema,
        F: Fn(&CommandContext<'_, I>) -> std::result::Result<Option<Value>, CallbackError>
            + Send
            + Sync
            + 'static,
    {
        let schema = schema.into_schema()?;
        let name = schema.name.as_deref().unwrap_or_default();
        debug!(command = %name, aliases = schema.aliases.len(), "Registering command");
        let index = self.commands.len();
        self.commands.push(RegisteredCommand {
            schema,
            types: Arc::clone(&self.types),
            callback: Arc::new(callback),
            options: self.defaults,
        });
        Ok(&mut self.commands[index])
    }

    /// First command, in registration order, named `name` (or aliased to it
    /// when `include_aliases` is set).
    pub fn get_command(&self, name: &str, include_aliases: bool) -> Option<&RegisteredCommand<I>> {
        self.commands.iter().find(|c| c.matches(name, include_aliases))
    }

    pub fn get_command_mut(
        &mut self,
        name: &str,
        include_aliases: bool,
    ) -> Option<&mut RegisteredCommand<I>> {
        self.commands
            .iter_mut()
            .find(|c| c.matches(name, include_aliases))
    }

    pub fn commands(&self) -> impl Iterator<Item = &RegisteredCommand<I>> {
        self.commands.iter()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Runs the command a chat line names.
    ///
    /// Returns `Ok(None)` when the registry has no prefix or the line does
    /// not start with it. Otherwise the first word after the prefix selects
    /// the command (aliases included) and the line is parsed from just past
    /// that word.
    ///
    /// # Errors
    ///
    /// [`DispatchError::UnknownCommand`] when no command matches,
    /// [`DispatchError::Parse`] when the line does not fit the grammar and
    /// [`DispatchError::Callback`] when the callback fails.
    pub fn dispatch(&self, message: &str, issuer: &I) -> Result<Option<Invocation>> {
        let Some(prefix) = self.prefix.as_deref() else {
            return Ok(None);
        };
        let Some(body) = message.strip_prefix(prefix) else {
            return Ok(None);
        };

        let name = body.split_whitespace().next().unwrap_or_default();
        let Some(command) = self.get_command(name, true) else {
            debug!(command = %name, "Unknown command");
            return Err(DispatchError::UnknownCommand(name.to_string()));
        };

        let leading = body.len() - body.trim_start().len();
        let start = prefix.len() + leading + name.len();
        debug!(command = %command.name(), alias = %name, start, "Dispatching command");

        let value = command.invoke(message, start, Some(issuer))?;
        Ok(Some(Invocation {
            command: command.name().to_string(),
            value,
        }))
    }
}

impl<I: Feedback> CommandRegistry<I> {
    /// Dispatches `message` and reports any failure back to `issuer`.
    ///
    /// Returns `true` when the line carried the prefix and was consumed,
    /// whether or not the command succeeded.
    pub fn handle_message(&self, message: &str, issuer: &I) -> bool {
        match self.dispatch(message, issuer) {
            Ok(None) => false,
            Ok(Some(_)) => true,
            Err(err) => {
                if !matches!(err, DispatchError::Parse(_) | DispatchError::UnknownCommand(_)) {
                    warn!(error = %err, "Command failed");
                }
                issuer.send_feedback(&err.feedback());
                true
            }
        }
    }
}

impl<I> fmt::Debug for CommandRegistry<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("prefix", &self.prefix)
            .field("commands", &self.commands)
            .field("types", &self.types)
            .finish()
    }
}
