//! Productions for the Floyd grammar language.
//!
//! # Grammar (EBNF-ish)
//!
//! ```text
//! root    = (rule | pragma)*
//! rule    = IDENT "=" choice
//! pragma  = "%whitespace" "=" choice
//!         | "%comment" "=" choice
//!         | "%tokens" "=" IDENT*
//!         | "%externs" "=" (IDENT "->" expr)*
//!         | PREC_LINE | ASSOC_LINE
//! choice  = seq ("|" seq)*
//! seq     = element*
//! element = action | predicate | equals
//!         | "~" term | "^" term | "^." term | term
//! term    = primary ("?" | "*" | "+" | "{" INT ("," INT)? "}" | ":" IDENT)*
//! primary = literal (".." literal)? | CLASS | REGEX | UNICAT | IDENT
//!         | "(" choice ")" | "<" choice ">"
//! ```
//!
//! Actions, predicates and `={...}` switch the lexer into expression
//! mode; see the lexer module docs.

mod exprs;
mod terms;

use crate::lexer::LexMode;
use crate::parser::core::Parser;
use crate::syntax::SyntaxKind;

pub(crate) use terms::choice;

pub(crate) fn root(p: &mut Parser) {
    p.start_node(SyntaxKind::Root);
    loop {
        if p.eof() {
            break;
        }
        match p.peek() {
            SyntaxKind::PercentIdent | SyntaxKind::PrecPragma | SyntaxKind::AssocPragma => {
                pragma_def(p)
            }
            SyntaxKind::Ident if p.peek_nth(1) == SyntaxKind::Eq => rule_def(p),
            _ => {
                p.error_and_bump("expected a rule or pragma");
                p.synchronize_to_item_start();
            }
        }
    }
    p.drain_trivia();
    p.finish_node();
}

fn rule_def(p: &mut Parser) {
    p.start_node(SyntaxKind::RuleDef);
    p.bump(); // name
    p.bump(); // =
    choice(p);
    p.finish_node();
}

fn pragma_def(p: &mut Parser) {
    p.start_node(SyntaxKind::PragmaDef);
    match p.peek() {
        SyntaxKind::PrecPragma | SyntaxKind::AssocPragma => p.bump(),
        SyntaxKind::PercentIdent => {
            let name = p.peek_text().to_string();
            match name.as_str() {
                "%whitespace" | "%comment" => {
                    p.bump();
                    p.expect(SyntaxKind::Eq, "`=`");
                    choice(p);
                }
                "%tokens" => {
                    p.bump();
                    p.expect(SyntaxKind::Eq, "`=`");
                    // The list ends where the next rule begins.
                    while p.at(SyntaxKind::Ident) && p.peek_nth(1) != SyntaxKind::Eq {
                        p.start_node(SyntaxKind::ApplyTerm);
                        p.bump();
                        p.finish_node();
                    }
                }
                "%externs" => {
                    p.bump();
                    p.expect(SyntaxKind::Eq, "`=`");
                    while p.at(SyntaxKind::Ident) && p.peek_nth(1) == SyntaxKind::Arrow {
                        extern_entry(p);
                    }
                }
                _ => {
                    p.error(format!("unknown pragma `{name}`"));
                    p.bump();
                }
            }
        }
        _ => {}
    }
    p.finish_node();
}

fn extern_entry(p: &mut Parser) {
    p.start_node(SyntaxKind::ExternEntry);
    p.bump(); // name
    p.bump(); // ->
    p.set_mode(LexMode::Expr);
    exprs::expr(p);
    p.set_mode(LexMode::Term);
    p.finish_node();
}
