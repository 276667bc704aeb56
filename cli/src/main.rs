use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use command_grammar_core::{
    CommandDecl, CommandNode, DEFAULT_CONTEXT_WIDTH, ParseOptions, TypeRegistry,
    build_schema, tokenize, validate_schema,
};
use command_grammar_dispatch::{CommandRegistry, DispatchConfig, DispatchError};
use serde_json::json;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "grammar")]
#[command(about = "Tokenize, parse and validate chat-style command grammars")]
struct Cli {
    /// Log parser decisions to stderr (overridden by RUST_LOG).
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the tokens of a line as JSON.
    Tokenize(TokenizeArgs),
    /// Parse a line against a schema file and print the result as JSON.
    Parse(ParseArgs),
    /// Route a prefixed line to one of several schemas.
    Dispatch(DispatchArgs),
    /// Check schema files for problems.
    Validate(ValidateArgs),
}

#[derive(Debug, Args)]
struct TokenizeArgs {
    /// Line to tokenize.
    line: String,
    /// Byte offset to start tokenizing at.
    #[arg(long, default_value_t = 0)]
    offset: usize,
}

#[derive(Debug, Args)]
struct ParseArgs {
    /// Schema declaration (JSON, or YAML with a .yaml/.yml extension).
    #[arg(long)]
    schema: PathBuf,
    /// Line to parse.
    line: String,
    /// Byte offset to start parsing at.
    #[arg(long, default_value_t = 0)]
    offset: usize,
    /// Treat every token as positional.
    #[arg(long)]
    no_flags: bool,
    /// Do not let `--` end flag parsing.
    #[arg(long)]
    no_break: bool,
    /// Accept single-dash long flags (`-verbose`).
    #[arg(long)]
    java_flags: bool,
    /// Reject `=` inside packed short flags.
    #[arg(long)]
    no_short_equals: bool,
    /// Characters of context shown around an error.
    #[arg(long, default_value_t = DEFAULT_CONTEXT_WIDTH)]
    context: usize,
}

impl ParseArgs {
    fn options(&self) -> ParseOptions {
        ParseOptions {
            parse_flags: !self.no_flags,
            breakable_flags: !self.no_break,
            java_flags: self.java_flags,
            equals_in_short_flags: !self.no_short_equals,
        }
    }
}

#[derive(Debug, Args)]
struct DispatchArgs {
    /// Schema declarations to register, in order.
    #[arg(long = "schema", required = true)]
    schemas: Vec<PathBuf>,
    /// Dispatcher YAML config (prefix and parse options).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Prefix override.
    #[arg(long)]
    prefix: Option<String>,
    /// Line to dispatch, prefix included.
    line: String,
}

#[derive(Debug, Args)]
struct ValidateArgs {
    /// Schema declaration files.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Command::Tokenize(args) => run_tokenize(args),
        Command::Parse(args) => run_parse(args),
        Command::Dispatch(args) => run_dispatch(args),
        Command::Validate(args) => run_validate(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn run_tokenize(args: TokenizeArgs) -> Result<(), String> {
    let tokens = tokenize(&args.line, args.offset);
    let raw = serde_json::to_string_pretty(&tokens)
        .map_err(|err| format!("Failed to serialize tokens: {err}"))?;
    println!("{raw}");
    Ok(())
}

fn run_parse(args: ParseArgs) -> Result<(), String> {
    let schema = load_schema(&args.schema)?;
    let parsed = command_grammar_core::parse(&schema, &args.line, args.offset, args.options())
        .map_err(|err| err.report_with(args.context))?;

    let raw = serde_json::to_string_pretty(&parsed)
        .map_err(|err| format!("Failed to serialize result: {err}"))?;
    println!("{raw}");
    Ok(())
}

fn run_dispatch(args: DispatchArgs) -> Result<(), String> {
    let mut config = match &args.config {
        Some(path) => DispatchConfig::load(path)
            .map_err(|err| format!("Failed to load '{}': {err}", path.display()))?,
        None => DispatchConfig::default(),
    };
    if let Some(prefix) = args.prefix {
        config.prefix = prefix;
    }

    let mut registry: CommandRegistry<()> =
        CommandRegistry::from_config(&config, Arc::new(TypeRegistry::with_builtins()));
    for path in &args.schemas {
        let schema = load_schema(path)?;
        registry
            .register(schema, |ctx| Ok(Some(json!(ctx.args))))
            .map_err(|err| format!("Failed to register '{}': {err}", path.display()))?;
    }
    debug!(commands = registry.len(), prefix = %config.prefix, "Registry ready");

    match registry.dispatch(&args.line, &()) {
        Ok(Some(done)) => {
            let out = json!({"command": done.command, "args": done.value});
            let raw = serde_json::to_string_pretty(&out)
                .map_err(|err| format!("Failed to serialize result: {err}"))?;
            println!("{raw}");
            Ok(())
        }
        Ok(None) => Err(format!("line does not start with prefix '{}'", config.prefix)),
        Err(DispatchError::Parse(err)) => Err(err.report()),
        Err(err) => Err(err.feedback()),
    }
}

fn run_validate(args: ValidateArgs) -> Result<(), String> {
    let registry = TypeRegistry::builtins();
    let mut problems = 0;

    for path in &args.inputs {
        let schema = load_schema(path)?;
        for error in validate_schema(&schema, registry) {
            eprintln!("{}: {error}", path.display());
            problems += 1;
        }
    }

    if problems > 0 {
        return Err(format!("{problems} schema problem(s) found"));
    }
    println!("Validated {} schema file(s).", args.inputs.len());
    Ok(())
}

fn load_schema(path: &Path) -> Result<CommandNode, String> {
    let raw = fs::read_to_string(path)
        .map_err(|err| format!("Failed to read '{}': {err}", path.display()))?;

    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml")
    );
    let decl: CommandDecl = if is_yaml {
        serde_yaml::from_str(&raw).map_err(|err| err.to_string())
    } else {
        serde_json::from_str(&raw).map_err(|err| err.to_string())
    }
    .map_err(|err| format!("Failed to parse '{}': {err}", path.display()))?;

    build_schema(&decl).map_err(|err| format!("Invalid schema '{}': {err}", path.display()))
}
