//! End-to-end scenarios for the public API.

use floyd::Value;
use indoc::indoc;

fn s(text: &str) -> Value {
    Value::Str(text.to_string())
}

fn list(items: Vec<Value>) -> Value {
    Value::List(items)
}

#[test]
fn simple_sequence() {
    let result = floyd::parse("g = 'foo' 'bar' end", "foobar");
    assert_eq!(result.val, Some(s("bar")));
    assert_eq!(result.pos, 6);
    assert_eq!(result.err, None);
}

#[test]
fn filler_insertion() {
    let parser = floyd::compile(indoc! {"
        %whitespace = ' '+
        g = 'foo' 'bar' end
    "})
    .unwrap();

    let result = parser.parse("foo bar");
    assert!(result.is_ok(), "{:?}", result.err);
    assert_eq!(result.pos, 7);

    // Zero filler is permitted.
    assert!(parser.parse("foobar").is_ok());

    // Space-only whitespace rejects a tab, at the tab's offset.
    let result = parser.parse("foo\tbar");
    assert!(result.err.is_some());
    assert_eq!(result.pos, 3);
}

#[test]
fn left_recursion_left_assoc() {
    let parser = floyd::compile(indoc! {"
        expr = expr '+' n -> [$1, $2, $3] | n
        n = '0'..'9' -> atoi($1, 10)
    "})
    .unwrap();
    let result = parser.parse("1+2+3");
    assert_eq!(
        result.val,
        Some(list(vec![
            list(vec![Value::Int(1), s("+"), Value::Int(2)]),
            s("+"),
            Value::Int(3),
        ]))
    );
}

#[test]
fn precedence_and_right_assoc() {
    let parser = floyd::compile(indoc! {"
        %prec +
        %prec ^
        %assoc ^ right
        expr = expr '+' expr -> [$1, $2, $3]
             | expr '^' expr -> [$1, $2, $3]
             | '0'..'9' -> atoi($1, 10)
    "})
    .unwrap();
    let result = parser.parse("1+2^3^4");
    assert_eq!(
        result.val,
        Some(list(vec![
            Value::Int(1),
            s("+"),
            list(vec![
                Value::Int(2),
                s("^"),
                list(vec![Value::Int(3), s("^"), Value::Int(4)]),
            ]),
        ]))
    );
}

#[test]
fn associativity_flip_changes_the_tree() {
    let left = floyd::compile(indoc! {"
        %prec +
        expr = expr '+' expr -> [$1, $2, $3]
             | '0'..'9' -> atoi($1, 10)
    "})
    .unwrap();
    assert_eq!(
        left.parse("1+2+3").val,
        Some(list(vec![
            list(vec![Value::Int(1), s("+"), Value::Int(2)]),
            s("+"),
            Value::Int(3),
        ]))
    );

    let right = floyd::compile(indoc! {"
        %prec +
        %assoc + right
        expr = expr '+' expr -> [$1, $2, $3]
             | '0'..'9' -> atoi($1, 10)
    "})
    .unwrap();
    assert_eq!(
        right.parse("1+2+3").val,
        Some(list(vec![
            Value::Int(1),
            s("+"),
            list(vec![Value::Int(2), s("+"), Value::Int(3)]),
        ]))
    );
}

#[test]
fn worst_case_left_recursion_stays_linear() {
    let grammar = "a = a 'x' | 'x'";
    let budget_per_char: u64 = 64;

    for n in [50usize, 200] {
        let parser = floyd::compile(grammar)
            .unwrap()
            .with_exec_fuel(budget_per_char * n as u64 + 256);
        let input = "x".repeat(n);
        let result = parser.parse(&input);
        assert!(result.is_ok(), "n={n}: {:?}", result.err);
        assert_eq!(result.pos, n);
    }
}

#[test]
fn error_position() {
    let result = floyd::parse("g = 'ab' | 'ac'", "ad");
    assert_eq!(result.val, None);
    assert_eq!(
        result.err.as_deref(),
        Some("<string>:1 Unexpected \"d\" at column 2")
    );
    assert_eq!(result.pos, 1);
}

#[test]
fn error_messages_carry_the_path() {
    let parser = floyd::compile("g = 'a' end").unwrap();
    let result = parser.parse_path("b", "input.floyd");
    assert_eq!(
        result.err.as_deref(),
        Some("input.floyd:1 Unexpected \"b\" at column 1")
    );
}

#[test]
fn grammar_errors_render_as_diagnostics() {
    let result = floyd::parse("g = bogus", "anything");
    let err = result.err.expect("compile error");
    assert!(err.contains("unknown rule `bogus`"), "{err}");
    assert!(err.contains("g = bogus"), "{err}");
}

#[test]
fn backtracking_leaves_no_side_effects() {
    // The winning alternative's result is identical to parsing it
    // alone from the same offset.
    let through_choice = floyd::parse("g = 'aaa' 'q' | 'a'+ end", "aa");
    let direct = floyd::parse("g = 'a'+ end", "aa");
    assert_eq!(through_choice.val, direct.val);
    assert_eq!(through_choice.pos, direct.pos);
}

#[test]
fn star_terminates_on_nullable_children() {
    let result = floyd::parse("g = ('a'?)* 'b' end", "b");
    assert!(result.is_ok(), "{:?}", result.err);
}

#[test]
fn results_serialize_to_json() {
    let grammar = indoc! {r#"
        %whitespace = /[ \t\r\n]+/
        %tokens = number string
        value   = object | array | number | string
                | 'true' -> true | 'false' -> false | 'null' -> null
        object  = '{' members '}' -> dict($2)
        members = member (',' member)* -> cons($1, $2)
                | -> list()
        member  = string ':' value -> [$1, $3]
        array   = '[' elems ']' -> $2
        elems   = value (',' value)* -> cons($1, $2)
                | -> list()
        string  = '"' <(^'"')*> '"' -> $2
        number  = <'-'? '0'..'9'+> -> atoi($1, 10)
    "#};
    let parser = floyd::compile(grammar).unwrap();

    let result = parser.parse(r#"{"a": [1, -2], "b": {"c": true}, "d": null}"#);
    assert!(result.is_ok(), "{:?}", result.err);
    let json = serde_json::to_string(&result.val.unwrap()).unwrap();
    assert_eq!(json, r#"{"a":[1,-2],"b":{"c":true},"d":null}"#);
}

#[test]
fn parsers_are_reusable() {
    let parser = floyd::compile("g = 'a'+ end").unwrap();
    assert_eq!(parser.parse("a").pos, 1);
    assert_eq!(parser.parse("aaa").pos, 3);
    assert!(parser.parse("b").err.is_some());
    assert_eq!(parser.parse("aa").pos, 2);
}

#[test]
fn start_rule_override() {
    let parser = floyd::compile("g = 'a'\nh = 'b'").unwrap().with_start("h");
    assert!(parser.parse("b").is_ok());
}

#[test]
fn extern_hooks() {
    let grammar = indoc! {"
        %externs = base -> 10 digits -> func
        g = <'0'..'9'+> -> digits($1, base)
    "};
    let parser = floyd::compile(grammar)
        .unwrap()
        .with_extern(
            "digits",
            floyd::Extern::func(|args| {
                let (Some(Value::Str(s)), Some(Value::Int(base))) = (args.first(), args.get(1))
                else {
                    return Err("bad arguments".to_string());
                };
                i64::from_str_radix(s, *base as u32)
                    .map(Value::Int)
                    .map_err(|e| e.to_string())
            }),
        )
        .unwrap();
    assert_eq!(parser.parse("42").val, Some(Value::Int(42)));
}

#[test]
fn compiled_parsers_are_shareable() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<floyd::FloydParser>();
    assert_send_sync::<floyd::Grammar>();
}

#[test]
fn host_errors_abort_with_no_partial_value() {
    let result = floyd::parse("g = 'a' -> throw('nope') | 'a'", "a");
    let err = result.err.expect("host error");
    assert!(err.contains("nope"), "{err}");
    assert_eq!(result.val, None);
}
