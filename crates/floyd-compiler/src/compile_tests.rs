use indoc::indoc;

use crate::{Error, compile};

#[test]
fn compile_returns_an_executable_grammar() {
    let grammar = compile(indoc! {"
        g = a b end
        a = 'x'
        b = 'y'
    "})
    .unwrap();
    assert_eq!(grammar.starting_rule, "g");
    let names: Vec<&str> = grammar.rules.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["g", "a", "b"]);
    assert_eq!(grammar.rule_id("b"), Some(2));
    assert_eq!(grammar.rule_name(0), Some("g"));
}

#[test]
fn parse_errors_and_analysis_errors_are_distinct() {
    match compile("g = (") {
        Err(Error::Parse(d)) => assert!(d.has_errors()),
        other => panic!("expected a parse error, got {other:?}"),
    }
    match compile("g = nope") {
        Err(Error::Analyze(d)) => assert!(d.has_errors()),
        other => panic!("expected an analysis error, got {other:?}"),
    }
}

#[test]
fn error_display_counts() {
    let err = compile("g = nope\nh = alsonope").unwrap_err();
    assert_eq!(err.to_string(), "grammar analysis failed with 2 error(s)");
}

#[test]
fn escapes_decode_in_literals() {
    let grammar = compile(r"g = '\n' '\x41' '\u{2713}'").unwrap();
    assert_eq!(
        grammar.dump(),
        "g = (seq (lit \"\\n\") (lit \"A\") (lit \"\u{2713}\"))\n"
    );
}

#[test]
fn bad_escapes_are_reported() {
    let err = compile(r"g = '\q'").unwrap_err();
    let rendered = err.diagnostics().printer().render();
    assert!(rendered.contains("unknown escape"), "{rendered}");
}

#[test]
fn empty_grammar_is_an_error() {
    assert!(compile("").is_err());
    assert!(compile("// only a comment\n").is_err());
}

#[test]
fn grammars_are_shareable() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<crate::Grammar>();
}
