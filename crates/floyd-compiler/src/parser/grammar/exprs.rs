//! Host-expression productions.
//!
//! ```text
//! expr    = unary (("+" | "-") unary)*          // left associative
//! unary   = "!" unary | "-" NUM | postfix
//! postfix = primary ("[" expr "]" | "(" args ")")*
//! primary = NUM | STRING | "true" | "false" | "null"
//!         | IDENT | "$" INT | "[" args "]" | "(" expr ")"
//! ```

use crate::parser::core::Parser;
use crate::syntax::SyntaxKind;

pub(crate) fn expr(p: &mut Parser) {
    if !p.enter_recursion() {
        if !p.eof() {
            p.start_node(SyntaxKind::Error);
            p.bump();
            p.finish_node();
        }
        return;
    }
    sum(p);
    p.exit_recursion();
}

fn sum(p: &mut Parser) {
    let cp = p.checkpoint();
    unary(p);
    loop {
        match p.peek() {
            SyntaxKind::Plus => {
                p.start_node_at(cp, SyntaxKind::PlusExpr);
                p.bump();
                unary(p);
                p.finish_node();
            }
            SyntaxKind::Minus => {
                p.start_node_at(cp, SyntaxKind::MinusExpr);
                p.bump();
                unary(p);
                p.finish_node();
            }
            _ => break,
        }
    }
}

fn unary(p: &mut Parser) {
    match p.peek() {
        SyntaxKind::Bang => {
            p.start_node(SyntaxKind::NotExpr);
            p.bump();
            unary(p);
            p.finish_node();
        }
        SyntaxKind::Minus => {
            // Negative literal; the host language has no general unary
            // minus.
            if matches!(p.peek_nth(1), SyntaxKind::Int | SyntaxKind::Float) {
                p.start_node(SyntaxKind::NumExpr);
                p.bump();
                p.bump();
                p.finish_node();
            } else {
                p.error_and_bump("expected a number after `-`");
            }
        }
        _ => postfix(p),
    }
}

fn postfix(p: &mut Parser) {
    let cp = p.checkpoint();
    primary(p);
    if matches!(p.peek(), SyntaxKind::BracketOpen | SyntaxKind::ParenOpen) {
        p.start_node_at(cp, SyntaxKind::QualExpr);
        loop {
            match p.peek() {
                SyntaxKind::BracketOpen => {
                    p.start_node(SyntaxKind::IndexSuffix);
                    p.bump();
                    expr(p);
                    p.expect(SyntaxKind::BracketClose, "`]`");
                    p.finish_node();
                }
                SyntaxKind::ParenOpen => {
                    p.start_node(SyntaxKind::CallSuffix);
                    p.bump();
                    if !p.at(SyntaxKind::ParenClose) {
                        expr(p);
                        while p.eat(SyntaxKind::Comma) {
                            expr(p);
                        }
                    }
                    p.expect(SyntaxKind::ParenClose, "`)`");
                    p.finish_node();
                }
                _ => break,
            }
        }
        p.finish_node();
    }
}

fn primary(p: &mut Parser) {
    match p.peek() {
        SyntaxKind::Int | SyntaxKind::Float => single_token(p, SyntaxKind::NumExpr),
        SyntaxKind::SqString | SyntaxKind::DqString => single_token(p, SyntaxKind::StrExpr),
        SyntaxKind::Ident => {
            let kind = match p.peek_text() {
                "true" | "false" | "null" => SyntaxKind::ConstExpr,
                _ => SyntaxKind::IdentExpr,
            };
            single_token(p, kind);
        }
        SyntaxKind::DollarIdent => single_token(p, SyntaxKind::IdentExpr),
        SyntaxKind::BracketOpen => {
            p.start_node(SyntaxKind::ArrayExpr);
            p.bump();
            if !p.at(SyntaxKind::BracketClose) {
                expr(p);
                while p.eat(SyntaxKind::Comma) {
                    expr(p);
                }
            }
            p.expect(SyntaxKind::BracketClose, "`]`");
            p.finish_node();
        }
        SyntaxKind::ParenOpen => {
            p.start_node(SyntaxKind::ParenExpr);
            p.bump();
            expr(p);
            p.expect(SyntaxKind::ParenClose, "`)`");
            p.finish_node();
        }
        _ => p.error("expected an expression"),
    }
}

fn single_token(p: &mut Parser, kind: SyntaxKind) {
    p.start_node(kind);
    p.bump();
    p.finish_node();
}
