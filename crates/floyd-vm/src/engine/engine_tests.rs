use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use floyd_core::Value;
use indoc::indoc;

use crate::externs::Extern;

use super::{Interpreter, ParseResult};

fn parse(grammar: &str, input: &str) -> ParseResult {
    let grammar = floyd_compiler::compile(grammar).unwrap_or_else(|err| {
        panic!("grammar failed to compile: {}", err.diagnostics().printer().render())
    });
    Interpreter::new(grammar).unwrap().parse(input)
}

fn parse_value(grammar: &str, input: &str) -> Value {
    let result = parse(grammar, input);
    assert!(result.is_ok(), "parse failed: {:?}", result.err);
    result.val.unwrap()
}

fn s(text: &str) -> Value {
    Value::Str(text.to_string())
}

fn list(items: Vec<Value>) -> Value {
    Value::List(items)
}

#[test]
fn sequence_yields_last_value() {
    let result = parse("g = 'foo' 'bar' end", "foobar");
    assert_eq!(result.val, Some(s("bar")));
    assert_eq!(result.pos, 6);
    assert_eq!(result.err, None);
}

#[test]
fn choice_backtracks() {
    assert_eq!(parse_value("g = 'ab' | 'ac'", "ac"), s("ac"));
}

#[test]
fn failure_reports_farthest_position() {
    let result = parse("g = 'ab' | 'ac'", "ad");
    assert_eq!(result.val, None);
    assert_eq!(
        result.err.as_deref(),
        Some("<string>:1 Unexpected \"d\" at column 2")
    );
    assert_eq!(result.pos, 1);
}

#[test]
fn opt_wraps_in_a_list() {
    assert_eq!(parse_value("g = 'a'? end", "a"), list(vec![s("a")]));
    assert_eq!(parse_value("g = 'a'? end", ""), list(vec![]));
}

#[test]
fn star_and_plus_collect() {
    assert_eq!(
        parse_value("g = 'a'* end", "aaa"),
        list(vec![s("a"), s("a"), s("a")])
    );
    assert_eq!(parse_value("g = 'a'* end", ""), list(vec![]));
    assert!(parse("g = 'a'+ end", "").err.is_some());
    assert_eq!(parse_value("g = 'a'+ end", "a"), list(vec![s("a")]));
}

#[test]
fn star_terminates_on_zero_consumption() {
    // The inner choice can succeed without consuming; the loop must
    // still stop.
    let result = parse("g = ('a' | '')* 'b' end", "aab");
    assert!(result.is_ok(), "{:?}", result.err);
}

#[test]
fn counted_repetition() {
    assert!(parse("g = 'a'{2,3} end", "a").err.is_some());
    assert_eq!(
        parse_value("g = 'a'{2,3} end", "aa"),
        list(vec![s("a"), s("a")])
    );
    assert_eq!(
        parse_value("g = 'a'{2,3} end", "aaa"),
        list(vec![s("a"), s("a"), s("a")])
    );
    assert!(parse("g = 'a'{2,3} end", "aaaa").err.is_some());
    assert_eq!(
        parse_value("g = 'a'{2} end", "aa"),
        list(vec![s("a"), s("a")])
    );
}

#[test]
fn negative_lookahead() {
    assert_eq!(parse_value("g = ~'b' 'a' end", "a"), s("a"));
    assert!(parse("g = ~'a' 'a' end", "a").err.is_some());
}

#[test]
fn not_one_consumes_a_character() {
    assert_eq!(
        parse_value("g = (^'b')* 'b' end", "aab"),
        s("b")
    );
}

#[test]
fn ends_in_scans_forward() {
    let result = parse("g = ^. 'b' end", "aaab");
    assert!(result.is_ok(), "{:?}", result.err);
    assert_eq!(result.pos, 4);
}

#[test]
fn run_captures_consumed_text() {
    assert_eq!(parse_value("g = <'a' 'b'+> end", "abb"), s("abb"));
}

#[test]
fn char_ranges_and_classes() {
    assert_eq!(parse_value("g = 'a'..'z' end", "q"), s("q"));
    assert!(parse("g = 'a'..'z' end", "Q").err.is_some());
    assert_eq!(
        parse_value("g = [abc]+ end", "cab"),
        list(vec![s("c"), s("a"), s("b")])
    );
    assert!(parse("g = [^abc] end", "a").err.is_some());
    assert_eq!(parse_value("g = [^abc] end", "z"), s("z"));
}

#[test]
fn regex_terms_are_anchored() {
    assert_eq!(parse_value("g = /a+b/ end", "aab"), s("aab"));
    assert!(parse("g = /a+b/ end", "xaab").err.is_some());
}

#[test]
fn unicode_categories() {
    assert_eq!(
        parse_value(r"g = \p{Lu}+ end", "AB"),
        list(vec![s("A"), s("B")])
    );
    assert!(parse(r"g = \p{Lu} end", "a").err.is_some());
}

#[test]
fn labels_bind_into_scopes() {
    assert_eq!(parse_value("g = 'a':x 'b' -> x", "ab"), s("a"));
}

#[test]
fn positional_labels() {
    assert_eq!(
        parse_value("g = 'a' 'b' -> [$2, $1]", "ab"),
        list(vec![s("b"), s("a")])
    );
}

#[test]
fn outer_scope_lookup() {
    assert_eq!(parse_value("g = 'a':x ('b' -> x) end", "ab"), s("a"));
}

#[test]
fn predicates_gate_the_parse() {
    assert!(parse("g = 'a' ?( true ) 'b' end", "ab").is_ok());
    assert!(parse("g = 'a' ?( false ) 'b' end", "ab").err.is_some());
}

#[test]
fn equals_matches_an_evaluated_literal() {
    let result = parse("g = 'a':x ={ x } end", "aa");
    assert!(result.is_ok(), "{:?}", result.err);
    assert_eq!(result.pos, 2);
    assert!(parse("g = 'a':x ={ x } end", "ab").err.is_some());
}

#[test]
fn host_expressions() {
    assert_eq!(parse_value("g = 'a' -> 1 + 2", "a"), Value::Int(3));
    assert_eq!(parse_value("g = 'a' -> 2 - 0.5", "a"), Value::Float(1.5));
    assert_eq!(
        parse_value("g = 'a' -> [1, 'x'][1]", "a"),
        s("x")
    );
    assert_eq!(parse_value("g = 'a' -> !null", "a"), Value::Bool(true));
    assert_eq!(
        parse_value("g = 'a' -> strcat('x', 'y')", "a"),
        s("xy")
    );
    assert_eq!(parse_value("g = 'a' -> pos()", "a"), Value::Int(1));
    assert_eq!(parse_value("g = 'a' -> colno()", "a"), Value::Int(2));
}

#[test]
fn filler_is_inserted_outside_tokens() {
    let grammar = indoc! {"
        %whitespace = ' '+
        g = 'foo' 'bar' end
    "};
    assert_eq!(parse(grammar, "foo bar").pos, 7);
    assert!(parse(grammar, "foobar").is_ok());
    let result = parse(grammar, "foo\tbar");
    assert!(result.err.is_some());
    assert_eq!(result.pos, 3);
}

#[test]
fn comment_filler() {
    let grammar = indoc! {"
        %whitespace = ' '+
        %comment = '#' (^'\\n')*
        g = 'a' 'b' end
    "};
    let result = parse(grammar, "a #note\nb");
    // The comment stops at the newline, which whitespace must cover.
    assert!(result.err.is_some());
    let result = parse(grammar, "a #note b");
    assert!(result.err.is_some());
    let result = parse(grammar, "a  b");
    assert!(result.is_ok(), "{:?}", result.err);
}

#[test]
fn tokens_get_no_filler() {
    let grammar = indoc! {"
        %whitespace = ' '+
        %tokens = word
        g = word word end
        word = 'a' 'b'
    "};
    assert!(parse(grammar, "ab ab").is_ok());
    assert!(parse(grammar, "a b a b").err.is_some());
}

#[test]
fn left_recursion_builds_left_leaning_trees() {
    let grammar = indoc! {"
        expr = expr '+' n -> [$1, $2, $3] | n
        n = '0'..'9' -> atoi($1, 10)
    "};
    assert_eq!(
        parse_value(grammar, "1+2+3"),
        list(vec![
            list(vec![Value::Int(1), s("+"), Value::Int(2)]),
            s("+"),
            Value::Int(3),
        ])
    );
}

#[test]
fn right_assoc_left_recursion_leans_right() {
    let grammar = indoc! {"
        %assoc expr right
        expr = expr '+' expr -> [$1, $2, $3] | n
        n = '0'..'9' -> atoi($1, 10)
    "};
    assert_eq!(
        parse_value(grammar, "1+2+3"),
        list(vec![
            Value::Int(1),
            s("+"),
            list(vec![Value::Int(2), s("+"), Value::Int(3)]),
        ])
    );
}

#[test]
fn operator_precedence_and_associativity() {
    let grammar = indoc! {"
        %prec +
        %prec ^
        %assoc ^ right
        expr = expr '+' expr -> [$1, $2, $3]
             | expr '^' expr -> [$1, $2, $3]
             | '0'..'9' -> atoi($1, 10)
    "};
    assert_eq!(
        parse_value(grammar, "1+2^3^4"),
        list(vec![
            Value::Int(1),
            s("+"),
            list(vec![
                Value::Int(2),
                s("^"),
                list(vec![Value::Int(3), s("^"), Value::Int(4)]),
            ]),
        ])
    );
}

#[test]
fn operator_left_association_by_default() {
    let grammar = indoc! {"
        %prec +
        expr = expr '+' expr -> [$1, $2, $3]
             | '0'..'9' -> atoi($1, 10)
    "};
    assert_eq!(
        parse_value(grammar, "1+2+3"),
        list(vec![
            list(vec![Value::Int(1), s("+"), Value::Int(2)]),
            s("+"),
            Value::Int(3),
        ])
    );
}

#[test]
fn memoization_avoids_rerunning_rule_bodies() {
    let grammar = indoc! {"
        %externs = tick -> func
        g = a 'z' | a 'q'
        a = 'x' -> tick()
    "};
    let grammar = floyd_compiler::compile(grammar).expect("compiles");

    let counter = Arc::new(AtomicUsize::new(0));
    let make_tick = |counter: Arc<AtomicUsize>| {
        Extern::func(move |_args| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Value::Null)
        })
    };

    let interp = Interpreter::new(grammar.clone())
        .unwrap()
        .with_extern("tick", make_tick(counter.clone()))
        .unwrap();
    assert!(interp.parse("xq").is_ok());
    assert_eq!(counter.load(Ordering::SeqCst), 1, "memo hit should not re-run");

    let counter2 = Arc::new(AtomicUsize::new(0));
    let interp = Interpreter::new(grammar)
        .unwrap()
        .with_memoize(false)
        .with_extern("tick", make_tick(counter2.clone()))
        .unwrap();
    assert!(interp.parse("xq").is_ok());
    assert_eq!(counter2.load(Ordering::SeqCst), 2);
}

#[test]
fn extern_consts_and_pfuncs() {
    let grammar = indoc! {"
        %externs = limit -> 2 where -> pfunc
        g = 'aa' -> [limit, where()]
    "};
    let grammar = floyd_compiler::compile(grammar).expect("compiles");
    let interp = Interpreter::new(grammar)
        .unwrap()
        .with_extern(
            "where",
            Extern::pfunc(|view, _args| Ok(Value::Int(view.pos() as i64))),
        )
        .unwrap();
    let result = interp.parse("aa");
    assert_eq!(result.val, Some(list(vec![Value::Int(2), Value::Int(2)])));
}

#[test]
fn unknown_extern_binding_is_rejected() {
    let grammar = floyd_compiler::compile("g = 'a'").unwrap();
    let err = Interpreter::new(grammar)
        .unwrap()
        .with_extern("nope", Extern::Const(Value::Null))
        .err();
    assert!(err.is_some());
}

#[test]
fn throw_aborts_the_parse() {
    let result = parse("g = 'a' -> throw('boom')", "a");
    let err = result.err.expect("host error");
    assert!(err.contains("boom"), "{err}");
    assert_eq!(result.val, None);
}

#[test]
fn bad_predicate_value_is_a_host_error() {
    // `$1` types as `any`, so only the runtime can see the misuse.
    let result = parse("g = 'a' ?( $1 ) end", "a");
    let err = result.err.expect("host error");
    assert!(err.contains("not a boolean"), "{err}");
}

#[test]
fn exec_fuel_bounds_the_parse() {
    let grammar = floyd_compiler::compile("g = 'a'* end").unwrap();
    let interp = Interpreter::new(grammar).unwrap().with_exec_fuel(3);
    let result = interp.parse("aaaaaaaaaa");
    assert!(result.err.unwrap().contains("execution limit"));
}

#[test]
fn recursion_fuel_bounds_nesting() {
    let grammar = floyd_compiler::compile("g = '(' g ')' | 'x'").unwrap();
    let interp = Interpreter::new(grammar).unwrap().with_recursion_fuel(16);
    let deep = format!("{}x{}", "(".repeat(64), ")".repeat(64));
    let result = interp.parse(&deep);
    assert!(result.err.unwrap().contains("recursion limit"));
}

#[test]
fn start_rule_override() {
    let grammar = floyd_compiler::compile("g = 'a'\nh = 'b'").unwrap();
    let interp = Interpreter::new(grammar.clone()).unwrap().with_start("h");
    assert!(interp.parse("b").is_ok());
    let interp = Interpreter::new(grammar).unwrap().with_start("nope");
    assert!(interp.parse("b").err.unwrap().contains("unknown start rule"));
}

#[test]
fn errpos_is_monotone_across_alternatives() {
    // The first alternative fails deeper into the input; the error
    // points there even though the second alternative failed earlier.
    let result = parse("g = 'aab' | 'ay'", "aax");
    assert!(result.err.is_some());
    assert_eq!(result.pos, 2);
}

#[test]
fn unicode_input_is_code_point_indexed() {
    let result = parse("g = 'é' '✓' end", "é✓");
    assert!(result.is_ok(), "{:?}", result.err);
    assert_eq!(result.pos, 2);

    let result = parse("g = 'é' 'x' end", "éy");
    assert_eq!(
        result.err.as_deref(),
        Some("<string>:1 Unexpected \"y\" at column 2")
    );
}

#[test]
fn empty_alternative_matches_nothing() {
    let result = parse("g = 'a' ('b' | ) 'c' end", "ac");
    assert!(result.is_ok(), "{:?}", result.err);
}
