//! Tests for the line parser and dispatch table
//!
//! These tests verify:
//! - Field splitting and argument order
//! - Blank line handling
//! - Command resolution and argument-count checks
//! - Response encoding

use walkv::error::KvError;
use walkv::protocol::{parse, Command, Response, GRAMMAR};

// =============================================================================
// Parser Tests
// =============================================================================

#[test]
fn test_parse_set_with_newline() {
    let parsed = parse("SET a 1\n");

    assert_eq!(parsed.command, "SET");
    assert_eq!(parsed.args, vec!["a", "1"]);
}

#[test]
fn test_parse_without_terminator() {
    let parsed = parse("GET key");

    assert_eq!(parsed.command, "GET");
    assert_eq!(parsed.args, vec!["key"]);
}

#[test]
fn test_parse_crlf_and_repeated_whitespace() {
    let parsed = parse("  DEL \t  some_key   \r\n");

    assert_eq!(parsed.command, "DEL");
    assert_eq!(parsed.args, vec!["some_key"]);
}

#[test]
fn test_parse_keeps_argument_order() {
    let parsed = parse("SET b a c");

    assert_eq!(parsed.args, vec!["b", "a", "c"]);
}

#[test]
fn test_parse_whitespace_only_line() {
    let parsed = parse(" \t \n");

    assert!(parsed.is_empty());
    assert_eq!(parsed.command, "");
    assert!(parsed.args.is_empty());
}

#[test]
fn test_parse_empty_line() {
    assert!(parse("").is_empty());
}

#[test]
fn test_parse_no_quoting() {
    let parsed = parse("SET \"a b\" c");

    assert_eq!(parsed.args, vec!["\"a", "b\"", "c"]);
}

// =============================================================================
// Dispatch Table Tests
// =============================================================================

#[test]
fn test_dispatch_table_entries() {
    let set = Command::Set.spec();
    assert_eq!(set.min_args, 2);
    assert!(set.durable);

    let get = Command::Get.spec();
    assert_eq!(get.min_args, 1);
    assert!(!get.durable);

    let del = Command::Del.spec();
    assert_eq!(del.min_args, 1);
    assert!(del.durable);

    let help = Command::Help.spec();
    assert_eq!(help.min_args, 0);
    assert!(!help.durable);

    assert!(!Command::Exit.spec().durable);
}

#[test]
fn test_command_names_are_case_sensitive() {
    assert_eq!(Command::from_name("SET"), Some(Command::Set));
    assert_eq!(Command::from_name("help"), Some(Command::Help));
    assert_eq!(Command::from_name("set"), None);
    assert_eq!(Command::from_name("HELP"), None);
}

#[test]
fn test_resolve_unknown_command() {
    let err = Command::resolve("FOO", &["x"]).unwrap_err();

    assert!(matches!(err, KvError::UnknownCommand(ref name) if name == "FOO"));
    assert_eq!(err.to_string(), "unknown command: FOO");
}

#[test]
fn test_resolve_argument_count() {
    let err = Command::resolve("GET", &[]).unwrap_err();

    match err {
        KvError::ArgumentCount {
            command,
            required,
            got,
        } => {
            assert_eq!(command, "GET");
            assert_eq!(required, 1);
            assert_eq!(got, 0);
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_resolve_unknown_checked_before_arguments() {
    let err = Command::resolve("NOPE", &[]).unwrap_err();

    assert!(matches!(err, KvError::UnknownCommand(_)));
}

#[test]
fn test_resolve_extra_arguments_allowed() {
    let (command, _) = Command::resolve("GET", &["a", "b"]).unwrap();

    assert_eq!(command, Command::Get);
}

// =============================================================================
// Response Encoding Tests
// =============================================================================

#[test]
fn test_response_encoding() {
    assert_eq!(&Response::Ok.encode().unwrap()[..], b"ok\n");
    assert_eq!(
        &Response::Value("v".to_string()).encode().unwrap()[..],
        b"v\n"
    );
    assert_eq!(&Response::NotFound.encode().unwrap()[..], b" \n");
    assert_eq!(&Response::Goodbye.encode().unwrap()[..], b"bye\n");
    assert_eq!(
        &Response::Error("boom".to_string()).encode().unwrap()[..],
        b"error: boom\n"
    );
    assert!(Response::Empty.encode().is_none());
}

#[test]
fn test_help_lists_every_command() {
    let help = Response::Help.encode().unwrap();
    let text = std::str::from_utf8(&help).unwrap();

    assert!(text.starts_with(GRAMMAR));
    for command in Command::ALL {
        assert!(text.contains(command.name()), "missing {}", command.name());
    }
}
