//! Command registry and prefix dispatch for chat-style command lines.
//!
//! Builds on `command-grammar-core`: each registered command is a schema
//! plus a callback, and [`CommandRegistry::dispatch`] routes a prefixed line
//! (`!give steve 3`) to the right one. Failures come back as
//! [`DispatchError`], whose [`feedback`](DispatchError::feedback) text is
//! what the issuer should see; [`CommandRegistry::handle_message`] sends it
//! through the [`Feedback`] trait.
//!
//! # Quick start
//!
//! ```
//! use std::sync::Mutex;
//!
//! use command_grammar_core::{Argument, CommandNode};
//! use command_grammar_dispatch::{CommandRegistry, Feedback};
//!
//! struct Player(Mutex<Vec<String>>);
//!
//! impl Feedback for Player {
//!     fn send_feedback(&self, text: &str) {
//!         self.0.lock().unwrap().push(text.to_string());
//!     }
//! }
//!
//! let mut registry = CommandRegistry::new(Some("!"));
//! registry
//!     .register(
//!         CommandNode::new("roll").with_arg(Argument::new("sides", "int")),
//!         |ctx| Ok(ctx.args.get("sides").cloned()),
//!     )
//!     .unwrap();
//!
//! let player = Player(Mutex::new(Vec::new()));
//! assert!(registry.handle_message("!roll six", &player));
//! assert!(!registry.handle_message("just chatting", &player));
//!
//! let sent = player.0.lock().unwrap();
//! assert_eq!(
//!     sent[0],
//!     "Type error: 'six' is not a valid int\n    at column 7\n    !roll >>six<<"
//! );
//! ```
//!
//! Settings can come from a YAML [`DispatchConfig`].

mod config;
mod error;
mod registry;

pub use config::DispatchConfig;
pub use error::{CallbackError, DispatchError, Result};
pub use registry::{
    Callback, CommandContext, CommandRegistry, Feedback, IntoSchema, Invocation, RegisteredCommand,
};
