use indoc::indoc;

use crate::ast::{Element, Item, Root};
use crate::parser::parse;

fn root(source: &str) -> Root {
    Root::cast(parse(source).syntax()).expect("parser always produces Root")
}

fn rule_names(source: &str) -> Vec<String> {
    root(source)
        .items()
        .filter_map(|item| match item {
            Item::Rule(rule) => rule.name().map(|t| t.text().to_string()),
            Item::Pragma(_) => None,
        })
        .collect()
}

fn assert_clean(source: &str) {
    let parse = parse(source);
    assert!(
        parse.is_valid(),
        "unexpected diagnostics: {}",
        parse.diagnostics().printer().render()
    );
}

#[test]
fn rules_and_pragmas() {
    let source = indoc! {"
        %whitespace = ' '+
        %tokens = num
        g = num '+' num
        num = '0'..'9'+
    "};
    assert_clean(source);
    assert_eq!(rule_names(source), vec!["g", "num"]);
    let pragmas = root(source)
        .items()
        .filter(|item| matches!(item, Item::Pragma(_)))
        .count();
    assert_eq!(pragmas, 2);
}

#[test]
fn token_list_stops_at_the_next_rule() {
    let source = indoc! {"
        %tokens = a b
        a = 'x'
        b = 'y'
    "};
    assert_clean(source);
    assert_eq!(rule_names(source), vec!["a", "b"]);
    let Item::Pragma(pragma) = root(source).items().next().unwrap() else {
        panic!("first item is the pragma");
    };
    let names: Vec<String> = pragma
        .token_names()
        .filter_map(|apply| apply.name().map(|t| t.text().to_string()))
        .collect();
    assert_eq!(names, vec!["a", "b"]);
}

#[test]
fn extern_entries() {
    let source = "%externs = base -> 10 hook -> func\ng = 'a'";
    assert_clean(source);
    let Item::Pragma(pragma) = root(source).items().next().unwrap() else {
        panic!("first item is the pragma");
    };
    let names: Vec<String> = pragma
        .extern_entries()
        .filter_map(|entry| entry.name().map(|t| t.text().to_string()))
        .collect();
    assert_eq!(names, vec!["base", "hook"]);
}

#[test]
fn expression_mode_handles_arrays_and_calls() {
    assert_clean("g = 'a' 'b' -> [$1, cat([$2, 'x'])]");
    assert_clean("g = 'a' ?( equal($1, 'a') )");
    assert_clean("g = 'a':x ={ x }");
}

#[test]
fn char_class_versus_array() {
    // `[...]` is a character class in matching position even when it
    // contains quotes, and an array inside actions.
    assert_clean(r#"str = '"' (^'"')* '"'"#);
    assert_clean(r#"g = [^"\\]+ -> [1, 2]"#);
}

#[test]
fn counts_and_actions_disambiguate() {
    assert_clean("g = 'x'{2}");
    assert_clean("g = 'x'{2,5}");
    assert_clean("g = 'x' { strcat($1, 'y') }");
}

#[test]
fn prefix_and_postfix_operators() {
    assert_clean("g = ~'a' 'b'* <'c'+>? ^. 'd'");
    assert_clean("g = (^'x')* 'x'");
}

#[test]
fn unknown_pragma_is_reported() {
    let parse = parse("%nonsense = 'a'\ng = 'b'");
    assert!(!parse.is_valid());
    let rendered = parse.diagnostics().printer().render();
    assert!(rendered.contains("unknown pragma"), "{rendered}");
}

#[test]
fn missing_term_is_reported_but_parsing_continues() {
    let source = "g = |\nh = 'ok'";
    let parse = parse(source);
    assert!(!parse.is_valid() || rule_names(source).contains(&"h".to_string()));
    assert_eq!(rule_names(source), vec!["g", "h"]);
}

#[test]
fn garbage_recovers_to_the_next_rule() {
    let source = "g = 'a' @@@\nh = 'b'";
    let parse = parse(source);
    assert!(!parse.is_valid());
    assert_eq!(rule_names(source), vec!["g", "h"]);
}

#[test]
fn unclosed_group_is_reported() {
    let parse = parse("g = ('a'");
    assert!(!parse.is_valid());
}

#[test]
fn range_literals() {
    assert_clean("g = 'a'..'z' 'A'..'Z'");
}

#[test]
fn element_structure_survives_the_cst() {
    let source = "g = 'a':x 'b'+ -> x";
    assert_clean(source);
    let Item::Rule(rule) = root(source).items().next().unwrap() else {
        panic!("first item is the rule");
    };
    let body = rule.body().unwrap();
    let alts: Vec<_> = body.alts().collect();
    assert_eq!(alts.len(), 1);
    let elements: Vec<_> = alts[0].elements().collect();
    assert_eq!(elements.len(), 3);
    assert!(matches!(elements[0], Element::Labeled(_)));
    assert!(matches!(elements[1], Element::Quantified(_)));
    assert!(matches!(elements[2], Element::Action(_)));
}
