//! Matching-term productions: choices, sequences, prefixes, postfixes.

use crate::lexer::LexMode;
use crate::parser::core::Parser;
use crate::syntax::{SyntaxKind, token_sets};

use super::exprs;

pub(crate) fn choice(p: &mut Parser) {
    p.start_node(SyntaxKind::Choice);
    seq(p);
    while p.eat(SyntaxKind::Pipe) {
        seq(p);
    }
    p.finish_node();
}

fn seq(p: &mut Parser) {
    p.start_node(SyntaxKind::Seq);
    loop {
        if p.at_item_start() || !p.at_set(token_sets::TERM_FIRST) {
            break;
        }
        element(p);
    }
    p.finish_node();
}

fn element(p: &mut Parser) {
    if !p.enter_recursion() {
        // Make progress anyway so the caller's loop terminates.
        if !p.eof() {
            p.start_node(SyntaxKind::Error);
            p.bump();
            p.finish_node();
        }
        return;
    }
    match p.peek() {
        SyntaxKind::Arrow | SyntaxKind::BraceOpen => action(p),
        SyntaxKind::QuestionParen | SyntaxKind::QuestionBrace => predicate(p),
        SyntaxKind::EqualsBrace => equals(p),
        SyntaxKind::Tilde => prefixed(p, SyntaxKind::NotTerm),
        SyntaxKind::Caret => prefixed(p, SyntaxKind::NotOneTerm),
        SyntaxKind::CaretDot => prefixed(p, SyntaxKind::EndsInTerm),
        _ => postfix_term(p),
    }
    p.exit_recursion();
}

fn prefixed(p: &mut Parser, kind: SyntaxKind) {
    p.start_node(kind);
    p.bump();
    postfix_term(p);
    p.finish_node();
}

fn postfix_term(p: &mut Parser) {
    let cp = p.checkpoint();
    primary(p);
    loop {
        match p.peek() {
            SyntaxKind::Question | SyntaxKind::Star | SyntaxKind::Plus => {
                p.start_node_at(cp, SyntaxKind::Quantified);
                p.bump();
                p.finish_node();
            }
            SyntaxKind::BraceOpen if count_shaped(p) => {
                p.start_node_at(cp, SyntaxKind::Counted);
                p.bump(); // {
                p.bump(); // min
                if p.eat(SyntaxKind::Comma) {
                    p.expect(SyntaxKind::Int, "a repetition bound");
                }
                p.expect(SyntaxKind::BraceClose, "`}`");
                p.finish_node();
            }
            SyntaxKind::Colon => {
                p.start_node_at(cp, SyntaxKind::Labeled);
                p.bump();
                p.expect(SyntaxKind::Ident, "a label name");
                p.finish_node();
            }
            _ => break,
        }
    }
}

/// `{2}` / `{2,5}` is a repetition count; any other brace content is
/// an action.
fn count_shaped(p: &mut Parser) -> bool {
    p.peek_nth(1) == SyntaxKind::Int
        && matches!(
            p.peek_nth(2),
            SyntaxKind::BraceClose | SyntaxKind::Comma
        )
}

fn primary(p: &mut Parser) {
    match p.peek() {
        SyntaxKind::SqString | SyntaxKind::DqString => literal_or_range(p),
        SyntaxKind::CharClass => single_token(p, SyntaxKind::ClassTerm),
        SyntaxKind::Regex => single_token(p, SyntaxKind::RegexTerm),
        SyntaxKind::Unicat => single_token(p, SyntaxKind::UnicatTerm),
        SyntaxKind::Ident => single_token(p, SyntaxKind::ApplyTerm),
        SyntaxKind::ParenOpen => {
            p.start_node(SyntaxKind::Group);
            p.bump();
            choice(p);
            p.expect(SyntaxKind::ParenClose, "`)`");
            p.finish_node();
        }
        SyntaxKind::Lt => {
            p.start_node(SyntaxKind::RunCap);
            p.bump();
            choice(p);
            p.expect(SyntaxKind::Gt, "`>`");
            p.finish_node();
        }
        _ => p.error("expected a term"),
    }
}

fn literal_or_range(p: &mut Parser) {
    let cp = p.checkpoint();
    single_token(p, SyntaxKind::Literal);
    if p.at(SyntaxKind::DotDot) {
        p.start_node_at(cp, SyntaxKind::RangeTerm);
        p.bump();
        if matches!(p.peek(), SyntaxKind::SqString | SyntaxKind::DqString) {
            single_token(p, SyntaxKind::Literal);
        } else {
            p.error("expected the range's upper literal");
        }
        p.finish_node();
    }
}

fn single_token(p: &mut Parser, kind: SyntaxKind) {
    p.start_node(kind);
    p.bump();
    p.finish_node();
}

fn action(p: &mut Parser) {
    p.start_node(SyntaxKind::ActionTerm);
    if p.at(SyntaxKind::Arrow) {
        p.bump();
        p.set_mode(LexMode::Expr);
        exprs::expr(p);
        p.set_mode(LexMode::Term);
    } else {
        p.bump(); // {
        p.set_mode(LexMode::Expr);
        exprs::expr(p);
        p.expect(SyntaxKind::BraceClose, "`}`");
        p.set_mode(LexMode::Term);
    }
    p.finish_node();
}

fn predicate(p: &mut Parser) {
    p.start_node(SyntaxKind::PredTerm);
    let closer = if p.at(SyntaxKind::QuestionParen) {
        SyntaxKind::ParenClose
    } else {
        SyntaxKind::BraceClose
    };
    p.bump();
    p.set_mode(LexMode::Expr);
    exprs::expr(p);
    p.expect(closer, if closer == SyntaxKind::ParenClose { "`)`" } else { "`}`" });
    p.set_mode(LexMode::Term);
    p.finish_node();
}

fn equals(p: &mut Parser) {
    p.start_node(SyntaxKind::EqualsTerm);
    p.bump(); // ={
    p.set_mode(LexMode::Expr);
    exprs::expr(p);
    p.expect(SyntaxKind::BraceClose, "`}`");
    p.set_mode(LexMode::Term);
    p.finish_node();
}
