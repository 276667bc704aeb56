use command_grammar_core::*;
use serde_json::{Value, json};

fn run(schema: &CommandNode, line: &str) -> Result<ParsedArgs> {
    parse(schema, line, 0, ParseOptions::default())
}

fn run_with(schema: &CommandNode, line: &str, options: ParseOptions) -> Result<ParsedArgs> {
    parse(schema, line, 0, options)
}

fn as_json(args: &ParsedArgs) -> Value {
    serde_json::to_value(args).expect("parsed args serialize")
}

fn greet() -> CommandNode {
    CommandNode::new("greet")
        .with_arg(Argument::new("name", "string"))
        .with_arg(Argument::new("age", "int").optional(json!(0)))
}

fn counter() -> CommandNode {
    CommandNode::new("counter").with_flag(
        Flag::new(Some("count"), Some('c'))
            .with_dest("count_given")
            .with_arg(Argument::new("count", "int")),
    )
}

fn todo() -> CommandNode {
    CommandNode::new("todo")
        .with_subcommand(CommandNode::new("add").with_arg(Argument::new("item", "string")))
        .with_subcommand(
            CommandNode::new("remove")
                .with_alias("rm")
                .with_arg(Argument::new("index", "int")),
        )
}

// ---------------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------------

#[test]
fn test_tokenize_quoted_span_covers_quotes() {
    let line = r#"a "b c" d"#;
    let tokens = tokenize(line, 0);
    let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
    assert_eq!(texts, vec!["a", "b c", "d"]);
    assert!(tokens[1].quoted);
    assert!(!tokens[0].quoted && !tokens[2].quoted);
    assert_eq!(&line[tokens[1].start..tokens[1].end], r#""b c""#);
}

#[test]
fn test_tokenize_escaped_space() {
    let tokens = tokenize(r"a\ b", 0);
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].text, "a b");
}

#[test]
fn test_tokenize_unterminated_quote_is_lenient() {
    let tokens = tokenize(r#"say "hello"#, 0);
    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens[1].text, "hello");
    assert!(tokens[1].quoted);
}

// ---------------------------------------------------------------------------
// Builtin conversions
// ---------------------------------------------------------------------------

#[test]
fn test_number_range_bounds() {
    let schema = CommandNode::new("roll")
        .with_arg(Argument::new("sides", "number").with_range(Some(2.0), Some(100.0)));

    for (line, expected) in [("2", json!(2)), ("100", json!(100)), ("50.5", json!(50.5))] {
        let args = run(&schema, line).unwrap();
        assert_eq!(args.get("sides"), Some(&expected), "input {line}");
    }

    let below = run(&schema, "1").unwrap_err();
    assert!(matches!(
        below.kind(),
        ErrorKind::Type(TypeError::BelowRange { min, .. }) if *min == 2.0
    ));
    let above = run(&schema, "101").unwrap_err();
    assert!(matches!(
        above.kind(),
        ErrorKind::Type(TypeError::AboveRange { max, .. }) if *max == 100.0
    ));
}

#[test]
fn test_byte_overflow_names_width_and_signedness() {
    let signed = CommandNode::new("b").with_arg(Argument::new("v", "byte"));
    let unsigned = CommandNode::new("b").with_arg(Argument::new("v", "byte").unsigned());

    for line in ["128", "-129", "99999999999999999999999999999999999999999"] {
        let err = run(&signed, line).unwrap_err();
        assert_eq!(err.to_string(), "8-bit signed overflow", "input {line}");
    }
    for line in ["256", "-1"] {
        let err = run(&unsigned, line).unwrap_err();
        assert_eq!(err.to_string(), "8-bit unsigned overflow", "input {line}");
    }

    assert_eq!(run(&signed, "-128").unwrap().get_i64("v"), Some(-128));
    assert_eq!(run(&unsigned, "255").unwrap().get_u64("v"), Some(255));
}

#[test]
fn test_sized_integer_widths() {
    for (ty, bits) in [("short", 16), ("int", 32), ("long", 64)] {
        let schema = CommandNode::new("n").with_arg(Argument::new("v", ty).unsigned());
        let max = (1u128 << bits) - 1;
        assert!(run(&schema, &max.to_string()).is_ok(), "{ty} max");
        let err = run(&schema, &(max + 1).to_string()).unwrap_err();
        assert_eq!(err.to_string(), format!("{bits}-bit unsigned overflow"));
    }
}

// ---------------------------------------------------------------------------
// Positional arguments
// ---------------------------------------------------------------------------

#[test]
fn test_optional_positional_default() {
    let schema = greet();
    assert_eq!(
        as_json(&run(&schema, "Sam").unwrap()),
        json!({"greet": true, "name": "Sam", "age": 0})
    );
    assert_eq!(
        as_json(&run(&schema, "Sam 30").unwrap()),
        json!({"greet": true, "name": "Sam", "age": 30})
    );
}

#[test]
fn test_type_error_anchored_at_offending_token() {
    let err = run(&greet(), "Sam thirty").unwrap_err();
    assert!(err.is_syntax());
    assert_eq!(err.token().map(|t| t.text.as_str()), Some("thirty"));
    assert_eq!(err.to_string(), "Type error: 'thirty' is not a valid int");
    assert_eq!(err.column(), Some(5));
    assert_eq!(err.render(10), "Sam >>thirty<<");
}

#[test]
fn test_missing_required_argument() {
    let err = run(&greet(), "").unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::UnexpectedEndOfInput);
    assert_eq!(err.render(10), ">><<");
}

#[test]
fn test_too_many_arguments_spans_to_end() {
    let err = run(&greet(), "Sam 30 extra more").unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::TooManyArguments);
    assert_eq!(err.render(10), "Sam 30 >>extra more<<");
}

#[test]
fn test_optional_without_default_is_absent() {
    let schema = CommandNode::new("x").with_arg(Argument::new("maybe", "string").with_required(false));
    let args = run(&schema, "").unwrap();
    assert!(!args.contains("maybe"));
    assert!(args.is_present("x"));
}

#[test]
fn test_quoted_dash_is_positional() {
    let schema = CommandNode::new("n").with_arg(Argument::new("v", "int"));
    assert_eq!(run(&schema, r#""-5""#).unwrap().get_i64("v"), Some(-5));
    assert!(matches!(
        run(&schema, "-5").unwrap_err().kind(),
        ErrorKind::UnknownOption('5')
    ));

    let text = CommandNode::new("t").with_arg(Argument::new("v", "string"));
    assert_eq!(run(&text, "-").unwrap().get_str("v"), Some("-"));
}

// ---------------------------------------------------------------------------
// Flags
// ---------------------------------------------------------------------------

#[test]
fn test_flag_argument_forms() {
    let schema = counter();
    let expected = json!({"counter": true, "count_given": true, "count": 5});
    for line in ["-c 5", "--count=5", "--count 5"] {
        assert_eq!(as_json(&run(&schema, line).unwrap()), expected, "input {line}");
    }
}

#[test]
fn test_flag_requires_more_argument() {
    let err = run(&counter(), "-c").unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::FlagRequiresArgument);
    assert_eq!(err.to_string(), "Flag requires more argument");
    assert_eq!(err.span(), Some((2, 2)));
}

#[test]
fn test_flag_argument_type_error_propagates() {
    let err = run(&counter(), "--count five").unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::Type(TypeError::InvalidInteger { .. })));
    assert_eq!(err.render(10), "--count >>five<<");
}

#[test]
fn test_inline_value_error_points_at_value() {
    let err = run(&counter(), "--count=five").unwrap_err();
    assert_eq!(err.render(10), "--count=>>five<<");
}

#[test]
fn test_inline_value_span_survives_escapes() {
    let err = run(&counter(), r"--count=fi\ve").unwrap_err();
    assert_eq!(err.span(), Some((8, 13)));
    assert_eq!(err.render(10), r"--count=>>fi\ve<<");

    let err = run(&counter(), r"--co\unt=five").unwrap_err();
    assert_eq!(err.render(10), r"--co\unt=>>five<<");
}

#[test]
fn test_escaped_inline_value_parses() {
    let args = run(&counter(), r"--count=1\2").unwrap();
    assert_eq!(args.get_i64("count"), Some(12));
}

#[test]
fn test_optional_flag_argument_default() {
    let schema = CommandNode::new("img").with_flag(
        Flag::new(Some("size"), Some('s'))
            .with_dest("resize")
            .with_arg(Argument::new("size", "int").optional(json!(10))),
    );
    assert_eq!(
        as_json(&run(&schema, "--size").unwrap()),
        json!({"img": true, "resize": true, "size": 10})
    );
    assert_eq!(run(&schema, "-s 3").unwrap().get_i64("size"), Some(3));

    let err = run(&schema, "--size=").unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::FlagRequiresArgument);
}

#[test]
fn test_packed_short_flags() {
    let schema = CommandNode::new("p")
        .with_flag(Flag::new(None, Some('a')))
        .with_flag(Flag::new(None, Some('b')))
        .with_flag(
            Flag::new(None, Some('c'))
                .with_dest("c_given")
                .with_arg(Argument::new("c", "int")),
        );
    assert_eq!(
        as_json(&run(&schema, "-abc 7").unwrap()),
        json!({"p": true, "a": true, "b": true, "c_given": true, "c": 7})
    );
}

#[test]
fn test_unknown_short_option_span() {
    let schema = CommandNode::new("p").with_flag(Flag::new(None, Some('x')));
    let err = run(&schema, "-xz").unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::UnknownOption('z'));
    assert_eq!(err.render(10), "-x>>z<<");
}

#[test]
fn test_unknown_short_option_span_after_escape() {
    let schema = CommandNode::new("p")
        .with_flag(Flag::new(None, Some('x')))
        .with_flag(Flag::new(None, Some('y')));
    let err = run(&schema, r"-x\yz").unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::UnknownOption('z'));
    assert_eq!(err.span(), Some((4, 5)));
    assert_eq!(err.render(10), r"-x\y>>z<<");
}

#[test]
fn test_unrecognized_long_flag() {
    let err = run(&counter(), "--verbose").unwrap_err();
    assert_eq!(err.to_string(), "Unrecognized flag: verbose");
    assert_eq!(err.render(10), "-->>verbose<<");
}

#[test]
fn test_flag_disallows_argument() {
    let schema = CommandNode::new("say")
        .with_arg(Argument::new("text", "string").with_required(false))
        .with_flag(Flag::new(Some("loud"), None));

    let err = run(&schema, "--loud=yes").unwrap_err();
    assert_eq!(err.to_string(), "Option '--loud' doesn't allow an argument");
    assert_eq!(err.render(10), "--loud=>>yes<<");

    let err = run(&schema, "--loud= next").unwrap_err();
    assert_eq!(err.render(10), "--loud= >>next<<");

    let err = run(&schema, "--loud=").unwrap_err();
    assert_eq!(err.span(), Some((7, 7)));
}

#[test]
fn test_double_dash_disables_flags() {
    let schema = CommandNode::new("echo")
        .with_arg(Argument::new("text", "string"))
        .with_flag(Flag::new(Some("verbose"), Some('v')));

    let args = run(&schema, "-- -v").unwrap();
    assert_eq!(args.get_str("text"), Some("-v"));
    assert!(!args.contains("verbose"));

    let options = ParseOptions {
        breakable_flags: false,
        ..ParseOptions::default()
    };
    let err = run_with(&schema, "-- -v", options).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::UnrecognizedFlag(name) if name.is_empty()));
}

#[test]
fn test_parse_flags_disabled() {
    let schema = CommandNode::new("echo").with_arg(Argument::new("text", "string"));
    let options = ParseOptions {
        parse_flags: false,
        ..ParseOptions::default()
    };
    let args = run_with(&schema, "--not-a-flag", options).unwrap();
    assert_eq!(args.get_str("text"), Some("--not-a-flag"));
}

#[test]
fn test_java_style_long_flags() {
    let schema = CommandNode::new("j").with_flag(Flag::new(Some("verbose"), None));
    let java = ParseOptions {
        java_flags: true,
        ..ParseOptions::default()
    };
    assert!(run_with(&schema, "-verbose", java).unwrap().is_present("verbose"));

    let err = run(&schema, "-verbose").unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::UnknownOption('v'));
    assert_eq!(err.render(10), "->>v<<erbose");
}

#[test]
fn test_equals_in_short_flags() {
    let schema = CommandNode::new("n").with_flag(
        Flag::new(None, Some('n'))
            .with_dest("n_given")
            .with_arg(Argument::new("n", "int")),
    );
    assert_eq!(run(&schema, "-n=4").unwrap().get_i64("n"), Some(4));

    let strict = ParseOptions {
        equals_in_short_flags: false,
        ..ParseOptions::default()
    };
    let err = run_with(&schema, "-n=4", strict).unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::UnknownOption('='));
}

// ---------------------------------------------------------------------------
// Sub-commands
// ---------------------------------------------------------------------------

#[test]
fn test_alias_routes_to_named_subcommand() {
    assert_eq!(
        as_json(&run(&todo(), "rm 3").unwrap()),
        json!({"todo": true, "remove": true, "index": 3})
    );
    assert_eq!(
        as_json(&run(&todo(), "add milk").unwrap()),
        json!({"todo": true, "add": true, "item": "milk"})
    );
}

#[test]
fn test_unknown_subcommand() {
    let err = run(&todo(), "zap").unwrap_err();
    assert_eq!(err.to_string(), "Unknown sub-command: zap");
    assert_eq!(err.render(10), ">>zap<<");
}

fn calc() -> CommandNode {
    CommandNode::new("calc")
        .with_subcommand(CommandNode::unnamed("toggle").with_arg(Argument::new("on", "boolean")))
        .with_subcommand(
            CommandNode::unnamed("pair")
                .with_arg(Argument::new("x", "int"))
                .with_arg(Argument::new("y", "int")),
        )
}

#[test]
fn test_unnamed_alternative_selected_by_arity() {
    assert_eq!(
        as_json(&run(&calc(), "1 2").unwrap()),
        json!({"calc": true, "pair": true, "x": 1, "y": 2})
    );
    assert_eq!(
        as_json(&run(&calc(), "true").unwrap()),
        json!({"calc": true, "toggle": true, "on": true})
    );
}

#[test]
fn test_unnamed_alternatives_surface_first_error() {
    let err = run(&calc(), "1 2 3").unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::Type(TypeError::NotBoolean(text)) if text == "1"));
}

#[test]
fn test_subcommand_value_shadows_parent() {
    let schema = CommandNode::new("job")
        .with_flag(
            Flag::new(Some("mode"), None)
                .with_dest("mode_given")
                .with_arg(Argument::new("mode", "string")),
        )
        .with_subcommand(CommandNode::new("run").with_arg(Argument::new("mode", "string")));

    let args = run(&schema, "--mode fast run slow").unwrap();
    assert_eq!(args.get_str("mode"), Some("slow"));
    assert!(args.is_present("mode_given"));
    assert!(args.is_present("run"));
}

#[test]
fn test_flags_are_scoped_to_their_level() {
    let schema = CommandNode::new("job")
        .with_flag(Flag::new(Some("force"), Some('f')))
        .with_subcommand(CommandNode::new("run").with_arg(Argument::new("what", "string")));
    let err = run(&schema, "run --force").unwrap_err();
    assert_eq!(err.to_string(), "Unrecognized flag: force");
}

// ---------------------------------------------------------------------------
// Registry, offsets and determinism
// ---------------------------------------------------------------------------

#[test]
fn test_start_offset_reports_whole_line_columns() {
    let line = "!greet Sam thirty";
    let err = parse(&greet(), line, 7, ParseOptions::default()).unwrap_err();
    assert_eq!(err.command(), line);
    assert_eq!(err.column(), Some(12));
    assert_eq!(
        err.report(),
        "Type error: 'thirty' is not a valid int\n    at column 12\n    greet Sam >>thirty<<"
    );
}

#[test]
fn test_custom_type_internal_error() {
    let mut registry = TypeRegistry::with_builtins();
    registry.register("color", |_tokens, _arg| {
        Err(ConversionError::Internal("palette not loaded".to_string()))
    });
    let schema = CommandNode::new("paint").with_arg(Argument::new("color", "color"));

    let err = Parser::new(&registry).parse(&schema, "red", 0).unwrap_err();
    assert!(!err.is_syntax());
    assert_eq!(
        err.render(10),
        "Internal error: exception encountered while converting 'color': palette not loaded"
    );
}

#[test]
fn test_unregistered_type() {
    let schema = CommandNode::new("paint").with_arg(Argument::new("color", "color"));
    let err = run(&schema, "red").unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::UnknownType("color".into()));
}

#[test]
fn test_repeated_parse_is_deterministic() {
    let registry = TypeRegistry::with_builtins();
    let parser = Parser::new(&registry);
    let schema = counter();
    let first = parser.parse(&schema, "--count=5", 0).unwrap();
    let second = parser.parse(&schema, "--count=5", 0).unwrap();
    assert_eq!(first, second);

    let calc = calc();
    assert_eq!(
        parser.parse(&calc, "1 2", 0).unwrap(),
        parser.parse(&calc, "1 2", 0).unwrap()
    );
}

// ---------------------------------------------------------------------------
// Declarations
// ---------------------------------------------------------------------------

const TODO_YAML: &str = r#"
name: todo
subcommands:
  - name: add
    args:
      - name: item
        type: string
  - name: remove
    aliases: [rm]
    args:
      - name: index
        type: int
"#;

#[test]
fn test_yaml_declaration_matches_builder() {
    let decl: CommandDecl = serde_yaml::from_str(TODO_YAML).unwrap();
    let declared = build_schema(&decl).unwrap();
    let built = todo();

    for line in ["rm 3", "remove 4", "add eggs"] {
        assert_eq!(run(&declared, line).unwrap(), run(&built, line).unwrap(), "input {line}");
    }
    assert_eq!(
        run(&declared, "zap").unwrap_err(),
        run(&built, "zap").unwrap_err()
    );
    assert!(validate_schema(&declared, TypeRegistry::builtins()).is_empty());
}

#[test]
fn test_json_declaration_with_flags() {
    let decl: CommandDecl = serde_json::from_value(json!({
        "name": "counter",
        "flags": [
            {"long": "count", "short": "c", "dest": "count_given",
             "args": [{"name": "count", "type": "int"}]}
        ]
    }))
    .unwrap();
    let schema = CommandNode::try_from(&decl).unwrap();
    assert_eq!(run(&schema, "-c 5").unwrap(), run(&counter(), "-c 5").unwrap());
}

#[test]
fn test_declared_unsigned_byte_with_range() {
    let decl: CommandDecl = serde_json::from_value(json!({
        "name": "volume",
        "args": [{"name": "level", "type": "byte", "unsigned": true, "range": [0, 200]}]
    }))
    .unwrap();
    let schema = build_schema(&decl).unwrap();

    let args = run(&schema, "200").unwrap();
    assert_eq!(args.get("level"), Some(&json!(200)));
    assert!(run(&schema, "256").is_err());
}
