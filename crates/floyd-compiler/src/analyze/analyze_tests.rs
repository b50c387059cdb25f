use floyd_core::NodeKind;
use indoc::indoc;

use crate::{Error, compile};

fn dump(source: &str) -> String {
    compile(source)
        .unwrap_or_else(|err| {
            panic!("compile failed: {}", err.diagnostics().printer().source(source).render())
        })
        .dump()
}

fn compile_err(source: &str) -> String {
    match compile(source) {
        Ok(_) => panic!("expected a compile error"),
        Err(Error::Parse(d) | Error::Analyze(d)) => d.printer().source(source).render(),
    }
}

#[test]
fn lowering_produces_the_uniform_tree() {
    assert_eq!(
        dump("g = 'foo' 'bar' end"),
        "g = (seq (lit \"foo\") (lit \"bar\") (end))\n"
    );
}

#[test]
fn singleton_choices_and_seqs_collapse() {
    assert_eq!(dump("g = ('a')"), "g = (paren (lit \"a\"))\n");
    assert_eq!(dump("g = 'a' | 'b'"), "g = (choice (lit \"a\") (lit \"b\"))\n");
}

#[test]
fn postfix_operators_lower() {
    assert_eq!(dump("g = 'a'?"), "g = (opt (lit \"a\"))\n");
    assert_eq!(dump("g = 'a'{2,5}"), "g = (count 2 5 (lit \"a\"))\n");
    assert_eq!(dump("g = 'a'..'z'"), "g = (range 97 122)\n");
    assert_eq!(dump("g = ~'a' 'b'"), "g = (seq (not (lit \"a\")) (lit \"b\"))\n");
}

#[test]
fn duplicate_rules_point_at_both_definitions() {
    let rendered = compile_err("a = 'x'\na = 'y'\n");
    assert!(rendered.contains("duplicate rule `a`"), "{rendered}");
    assert!(rendered.contains("first defined here"), "{rendered}");
}

#[test]
fn unknown_rules_are_rejected() {
    let rendered = compile_err("g = bogus");
    assert!(rendered.contains("unknown rule `bogus`"), "{rendered}");
}

#[test]
fn unknown_identifiers_in_actions_are_rejected() {
    let rendered = compile_err("g = 'a' -> nope");
    assert!(rendered.contains("unknown identifier `nope`"), "{rendered}");
}

#[test]
fn positional_labels_must_exist() {
    let rendered = compile_err("g = 'a' -> $3");
    assert!(rendered.contains("unknown identifier `$3`"), "{rendered}");
}

#[test]
fn extern_defaults_are_validated() {
    let rendered = compile_err("%externs = hook -> cat\ng = 'a'");
    assert!(rendered.contains("literal default"), "{rendered}");

    let grammar = compile("%externs = base -> 16 name -> 'x' go -> pfunc\ng = 'a'").unwrap();
    assert_eq!(grammar.externs.len(), 3);
}

#[test]
fn tokens_must_name_rules() {
    let rendered = compile_err("%tokens = nope\ng = 'a'");
    assert!(rendered.contains("`%tokens` names unknown rule"), "{rendered}");
}

#[test]
fn direct_left_recursion_is_wrapped() {
    let dumped = dump("a = a 'x' | 'x'");
    assert!(dumped.starts_with("a = (leftrec \"a\" "), "{dumped}");
}

#[test]
fn indirect_left_recursion_is_wrapped() {
    let dumped = dump(indoc! {"
        a = b 'x' | 'x'
        b = a 'y'
    "});
    assert!(dumped.contains("a = (leftrec \"a\""), "{dumped}");
    assert!(dumped.contains("b = (leftrec \"b\""), "{dumped}");
}

#[test]
fn right_recursion_is_not_left_recursion() {
    let dumped = dump("a = 'x' a | 'x'");
    assert!(!dumped.contains("leftrec"), "{dumped}");
}

#[test]
fn recursion_through_nullable_prefixes_is_caught() {
    let dumped = dump("a = 'q'? a 'x' | 'x'");
    assert!(dumped.starts_with("a = (leftrec"), "{dumped}");
}

#[test]
fn operator_rules_are_rewritten() {
    let grammar = compile(indoc! {"
        %prec +
        %prec *
        expr = expr '+' expr -> [$1, $2, $3]
             | expr '*' expr -> [$1, $2, $3]
             | '0'..'9'
    "})
    .unwrap();
    assert!(grammar.dump().starts_with("expr = (operator \"expr\""));
    let table = &grammar.operators["expr"];
    assert_eq!(table.classes.len(), 2);
    // Later `%prec` lines bind tighter.
    assert_eq!(table.classes[0].ops, vec!["*"]);
    assert_eq!(table.classes[1].ops, vec!["+"]);
    assert!(table.classes[0].prec > table.classes[1].prec);
    assert!(grammar.needed_operators.contains("expr"));
    assert!(grammar.flags.seeds_needed);
}

#[test]
fn operator_rules_need_an_operand() {
    let rendered = compile_err(indoc! {"
        %prec +
        expr = expr '+' expr
    "});
    assert!(rendered.contains("non-operator alternative"), "{rendered}");
}

#[test]
fn mixed_associativity_in_a_class_is_rejected() {
    let rendered = compile_err(indoc! {"
        %prec + -
        %assoc + right
        expr = expr '+' expr | expr '-' expr | 'x'
    "});
    assert!(rendered.contains("mixes left- and right-associative"), "{rendered}");
}

#[test]
fn filler_is_installed_outside_tokens() {
    let grammar = compile(indoc! {"
        %whitespace = ' '+
        %tokens = num
        g = num '+' num
        num = '0'..'9' helper
        helper = 'x'?
    "})
    .unwrap();
    let dumped = grammar.dump();
    assert!(dumped.contains("(seq (apply \"_filler\") (lit \"+\"))"), "{dumped}");
    assert!(dumped.contains("(seq (apply \"_filler\") (apply \"num\"))"), "{dumped}");
    // Token rules and everything they reach stay untouched.
    assert!(grammar.tokens.contains("num"));
    assert!(grammar.tokens.contains("helper"));
    assert!(!dumped.contains("num = (seq (apply \"_filler\")"), "{dumped}");
    // Synthesized rules exist.
    assert!(grammar.rules.contains_key("_whitespace"));
    assert!(grammar.rules.contains_key("_filler"));
}

#[test]
fn no_pragmas_means_no_filler() {
    let dumped = dump("g = 'a' 'b'");
    assert!(!dumped.contains("_filler"), "{dumped}");
}

#[test]
fn labels_materialize_and_scope() {
    let dumped = dump("g = 'a' 'b' -> [$2, $1]");
    assert!(dumped.starts_with("g = (scope (seq (label \"$1\""), "{dumped}");
    assert!(dumped.contains("(label \"$2\" (lit \"b\"))"), "{dumped}");
}

#[test]
fn unlabeled_sequences_stay_plain() {
    let dumped = dump("g = 'a' 'b'");
    assert!(!dumped.contains("scope"), "{dumped}");
}

#[test]
fn can_fail_attributes() {
    let grammar = compile("g = 'a'?\nh = 'b'").unwrap();
    let g = grammar.rules["g"];
    let h = grammar.rules["h"];
    assert!(!grammar.tree.node(g).attrs.can_fail);
    assert!(grammar.tree.node(h).attrs.can_fail);
}

#[test]
fn memoize_attribute_skips_leftrec_and_operators() {
    let grammar = compile(indoc! {"
        %prec +
        expr = expr '+' expr | n
        lr = lr 'x' | 'x'
        n = '0'..'9'
    "})
    .unwrap();
    assert!(!grammar.tree.node(grammar.rules["expr"]).attrs.memoize);
    assert!(!grammar.tree.node(grammar.rules["lr"]).attrs.memoize);
    assert!(grammar.tree.node(grammar.rules["n"]).attrs.memoize);
}

#[test]
fn type_mismatches_are_compile_errors() {
    assert!(compile_err("g = 'a' -> 1 + 'x'").contains("cannot add"));
    assert!(compile_err("g = 'a' ?( 3 )").contains("predicate must be boolean"));
    assert!(compile_err("g = 'a' -> atoi($1)").contains("takes 2 argument(s)"));
    assert!(compile_err("g = 'a' ={ 1 }").contains("needs a string"));
}

#[test]
fn any_typed_labels_pass_the_checker() {
    assert!(compile("g = 'a' -> atoi($1, 10)").is_ok());
    assert!(compile("g = 'a':x -> strcat(x, 'y')").is_ok());
}

#[test]
fn unicode_table_builtins_fail_analysis() {
    let rendered = compile_err("g = 'a' -> uname($1)");
    assert!(rendered.contains("Unicode tables"), "{rendered}");
}

#[test]
fn feature_flags() {
    let grammar = compile("g = /x+/ [ab] \\p{Lu}").unwrap();
    assert!(grammar.flags.re_needed);
    assert!(grammar.flags.unicodedata_needed);
    assert!(!grammar.flags.leftrec_needed);
    assert!(!grammar.flags.seeds_needed);

    let grammar = compile("a = a 'x' | 'x'").unwrap();
    assert!(grammar.flags.leftrec_needed);
    assert!(grammar.flags.seeds_needed);

    let grammar = compile("g = 'a':x ('b' -> x)").unwrap();
    assert!(grammar.flags.lookup_needed);

    let grammar = compile("g = 'a' any end -> cat(['x'])").unwrap();
    assert!(grammar.needed_builtin_rules.contains("any"));
    assert!(grammar.needed_builtin_rules.contains("end"));
    assert!(grammar.needed_builtin_functions.contains("cat"));
}

#[test]
fn builtin_rules_normalize_to_node_kinds() {
    let grammar = compile("g = any end").unwrap();
    let body = grammar.rules["g"];
    let children = grammar.tree.children(body).to_vec();
    assert_eq!(grammar.tree.kind(children[0]), NodeKind::Any);
    assert_eq!(grammar.tree.kind(children[1]), NodeKind::End);
}

#[test]
fn bad_patterns_are_compile_errors() {
    assert!(compile_err(r"g = /a(/").contains("bad pattern"));
    assert!(compile_err(r"g = \p{Nope}").contains("bad pattern"));
}

#[test]
fn reserved_filler_names_are_rejected() {
    let rendered = compile_err(indoc! {"
        %whitespace = ' '+
        _filler = 'x'
        g = 'a'
    "});
    assert!(rendered.contains("reserved for filler"), "{rendered}");
}
