//! Lowering from the CST to the uniform grammar IR.
//!
//! The typed AST is a view over a lossless tree; this stage produces
//! the arena-based node tree every later stage works on. Escape
//! sequences are decoded here, repetition bounds are parsed, and
//! character classes / regexes / category names are validated with
//! `regex-syntax` so a bad pattern is a compile diagnostic rather than
//! a runtime surprise.

use floyd_core::{NodeId, NodeKind, NodeValue, Tree};
use rowan::TextRange;

use crate::ast::{self, Element, Expr, Item, Suffix};
use crate::diagnostics::Diagnostics;
use crate::syntax::SyntaxToken;

#[derive(Debug)]
pub struct LowerResult {
    pub tree: Tree,
    pub root: NodeId,
    pub diagnostics: Diagnostics,
}

/// Lower a parsed grammar into the IR.
pub fn lower(root: &ast::Root) -> LowerResult {
    let mut lowerer = Lowerer {
        tree: Tree::new(),
        diagnostics: Diagnostics::new(),
    };
    let root_id = lowerer.root(root);
    LowerResult {
        tree: lowerer.tree,
        root: root_id,
        diagnostics: lowerer.diagnostics,
    }
}

struct Lowerer {
    tree: Tree,
    diagnostics: Diagnostics,
}

impl Lowerer {
    fn root(&mut self, root: &ast::Root) -> NodeId {
        let mut children = Vec::new();
        for item in root.items() {
            match item {
                Item::Rule(rule) => {
                    let span = rule.syntax().text_range();
                    let name = rule
                        .name()
                        .map(|t| t.text().to_string())
                        .unwrap_or_default();
                    let body = match rule.body() {
                        Some(choice) => self.choice(&choice, span),
                        None => self.empty(span),
                    };
                    children.push(self.tree.alloc(
                        NodeKind::Rule,
                        NodeValue::Str(name),
                        vec![body],
                        span,
                    ));
                }
                Item::Pragma(pragma) => {
                    if let Some(node) = self.pragma(&pragma) {
                        children.push(node);
                    }
                }
            }
        }
        let span = root.syntax().text_range();
        self.tree
            .alloc(NodeKind::Rules, NodeValue::None, children, span)
    }

    fn pragma(&mut self, pragma: &ast::PragmaDef) -> Option<NodeId> {
        let intro = pragma.intro()?;
        let span = pragma.syntax().text_range();

        if intro.kind() == crate::syntax::SyntaxKind::PrecPragma {
            let ops = self.pragma_words(&intro, "%prec".len());
            if ops.is_empty() {
                self.diagnostics
                    .error("`%prec` needs at least one operator", span)
                    .emit();
            }
            return Some(self.tree.alloc(
                NodeKind::Pragma,
                NodeValue::Str("prec".to_string()),
                ops,
                span,
            ));
        }
        if intro.kind() == crate::syntax::SyntaxKind::AssocPragma {
            let words = self.pragma_words(&intro, "%assoc".len());
            if words.len() != 2 {
                self.diagnostics
                    .error("`%assoc` takes an operator and `left` or `right`", span)
                    .emit();
            } else {
                let dir = self.tree.node(words[1]).value.as_str();
                if dir != "left" && dir != "right" {
                    let dir_span = self.tree.node(words[1]).span;
                    self.diagnostics
                        .error(format!("bad associativity `{dir}`"), dir_span)
                        .emit();
                }
            }
            return Some(self.tree.alloc(
                NodeKind::Pragma,
                NodeValue::Str("assoc".to_string()),
                words,
                span,
            ));
        }

        let text = intro.text();
        let node = match text {
            "%whitespace" | "%comment" => {
                let body = match pragma.body() {
                    Some(choice) => self.choice(&choice, span),
                    None => self.empty(span),
                };
                self.tree.alloc(
                    NodeKind::Pragma,
                    NodeValue::Str(text[1..].to_string()),
                    vec![body],
                    span,
                )
            }
            "%tokens" => {
                let names = pragma
                    .token_names()
                    .map(|apply| {
                        let span = apply.syntax().text_range();
                        let name = apply
                            .name()
                            .map(|t| t.text().to_string())
                            .unwrap_or_default();
                        self.tree
                            .alloc(NodeKind::Apply, NodeValue::Str(name), vec![], span)
                    })
                    .collect();
                self.tree.alloc(
                    NodeKind::Pragma,
                    NodeValue::Str("tokens".to_string()),
                    names,
                    span,
                )
            }
            "%externs" => {
                let entries = pragma
                    .extern_entries()
                    .map(|entry| {
                        let span = entry.syntax().text_range();
                        let name = entry
                            .name()
                            .map(|t| t.text().to_string())
                            .unwrap_or_default();
                        let default = match entry.default_expr() {
                            Some(expr) => self.expr(&expr),
                            None => self.null_expr(span),
                        };
                        self.tree.alloc(
                            NodeKind::Label,
                            NodeValue::Str(name),
                            vec![default],
                            span,
                        )
                    })
                    .collect();
                self.tree.alloc(
                    NodeKind::Pragma,
                    NodeValue::Str("externs".to_string()),
                    entries,
                    span,
                )
            }
            // The parser already reported unknown pragmas.
            _ => return None,
        };
        Some(node)
    }

    /// Splits a `%prec`/`%assoc` line into `lit` nodes with accurate
    /// sub-spans.
    fn pragma_words(&mut self, intro: &SyntaxToken, skip: usize) -> Vec<NodeId> {
        let text = intro.text();
        let base: u32 = intro.text_range().start().into();
        let mut out = Vec::new();
        let mut offset = skip;
        let bytes = text.as_bytes();
        while offset < bytes.len() {
            if bytes[offset].is_ascii_whitespace() {
                offset += 1;
                continue;
            }
            let start = offset;
            while offset < bytes.len() && !bytes[offset].is_ascii_whitespace() {
                offset += 1;
            }
            let word = &text[start..offset];
            let span = TextRange::new(
                (base + start as u32).into(),
                (base + offset as u32).into(),
            );
            out.push(self.tree.alloc(
                NodeKind::Lit,
                NodeValue::Str(word.to_string()),
                vec![],
                span,
            ));
        }
        out
    }

    // ------------------------------------------------------------------
    // Matching terms
    // ------------------------------------------------------------------

    fn choice(&mut self, choice: &ast::Choice, span: TextRange) -> NodeId {
        let alts: Vec<NodeId> = choice.alts().map(|seq| self.seq(&seq)).collect();
        match alts.len() {
            0 => self.empty(span),
            1 => alts[0],
            _ => {
                let span = choice.syntax().text_range();
                self.tree.alloc(NodeKind::Choice, NodeValue::None, alts, span)
            }
        }
    }

    fn seq(&mut self, seq: &ast::Seq) -> NodeId {
        let span = seq.syntax().text_range();
        let elements: Vec<NodeId> = seq.elements().map(|e| self.element(&e)).collect();
        match elements.len() {
            0 => self.empty(span),
            1 => elements[0],
            _ => self
                .tree
                .alloc(NodeKind::Seq, NodeValue::None, elements, span),
        }
    }

    fn element(&mut self, element: &Element) -> NodeId {
        let span = element.syntax().text_range();
        match element {
            Element::Literal(lit) => self.literal(lit),
            Element::Range(range) => self.range(range),
            Element::Class(class) => {
                let raw = class.token().map(|t| t.text().to_string()).unwrap_or_default();
                self.check_pattern(&raw, span);
                self.tree
                    .alloc(NodeKind::Set, NodeValue::Str(raw), vec![], span)
            }
            Element::Regex(regex) => {
                let raw = regex.token().map(|t| t.text().to_string()).unwrap_or_default();
                // Strip the slashes and unescape `\/`.
                let pattern = if raw.len() >= 2 {
                    raw[1..raw.len() - 1].replace("\\/", "/")
                } else {
                    String::new()
                };
                self.check_pattern(&pattern, span);
                self.tree
                    .alloc(NodeKind::Regexp, NodeValue::Str(pattern), vec![], span)
            }
            Element::Unicat(unicat) => {
                let raw = unicat.token().map(|t| t.text().to_string()).unwrap_or_default();
                self.check_pattern(&raw, span);
                // `\p{Lu}` -> `Lu`
                let category = raw
                    .strip_prefix("\\p{")
                    .and_then(|s| s.strip_suffix('}'))
                    .unwrap_or("")
                    .to_string();
                self.tree
                    .alloc(NodeKind::Unicat, NodeValue::Str(category), vec![], span)
            }
            Element::Apply(apply) => {
                let name = apply.name().map(|t| t.text().to_string()).unwrap_or_default();
                self.tree
                    .alloc(NodeKind::Apply, NodeValue::Str(name), vec![], span)
            }
            Element::Group(group) => {
                let body = match group.body() {
                    Some(choice) => self.choice(&choice, span),
                    None => self.empty(span),
                };
                self.tree
                    .alloc(NodeKind::Paren, NodeValue::None, vec![body], span)
            }
            Element::Run(run) => {
                let body = match run.body() {
                    Some(choice) => self.choice(&choice, span),
                    None => self.empty(span),
                };
                self.tree
                    .alloc(NodeKind::Run, NodeValue::None, vec![body], span)
            }
            Element::Labeled(labeled) => {
                let name = labeled.name().map(|t| t.text().to_string()).unwrap_or_default();
                let inner = self.inner_or_empty(labeled.inner(), span);
                self.tree
                    .alloc(NodeKind::Label, NodeValue::Str(name), vec![inner], span)
            }
            Element::Quantified(quantified) => {
                let kind = match quantified.op().map(|t| t.text().to_string()).as_deref() {
                    Some("?") => NodeKind::Opt,
                    Some("*") => NodeKind::Star,
                    _ => NodeKind::Plus,
                };
                let inner = self.inner_or_empty(quantified.inner(), span);
                self.tree.alloc(kind, NodeValue::None, vec![inner], span)
            }
            Element::Counted(counted) => {
                let (lo, hi) = counted.bounds();
                let min = lo.and_then(|t| t.text().parse::<i64>().ok()).unwrap_or(0);
                let max = match (counted.has_comma(), hi) {
                    (false, _) => min,
                    (true, Some(t)) => t.text().parse::<i64>().ok().unwrap_or(min),
                    (true, None) => min,
                };
                if max < min {
                    self.diagnostics
                        .error(format!("bad repetition bounds {{{min},{max}}}"), span)
                        .emit();
                }
                let inner = self.inner_or_empty(counted.inner(), span);
                self.tree.alloc(
                    NodeKind::Count,
                    NodeValue::Pair(min, max),
                    vec![inner],
                    span,
                )
            }
            Element::Not(not) => {
                let inner = self.inner_or_empty(not.inner(), span);
                self.tree
                    .alloc(NodeKind::Not, NodeValue::None, vec![inner], span)
            }
            Element::NotOne(not_one) => {
                let inner = self.inner_or_empty(not_one.inner(), span);
                self.tree
                    .alloc(NodeKind::NotOne, NodeValue::None, vec![inner], span)
            }
            Element::EndsIn(ends_in) => {
                let inner = self.inner_or_empty(ends_in.inner(), span);
                self.tree
                    .alloc(NodeKind::EndsIn, NodeValue::None, vec![inner], span)
            }
            Element::Action(action) => {
                let expr = self.expr_or_null(action.expr(), span);
                self.tree
                    .alloc(NodeKind::Action, NodeValue::None, vec![expr], span)
            }
            Element::Pred(pred) => {
                let expr = self.expr_or_null(pred.expr(), span);
                self.tree
                    .alloc(NodeKind::Pred, NodeValue::None, vec![expr], span)
            }
            Element::Equals(equals) => {
                let expr = self.expr_or_null(equals.expr(), span);
                self.tree
                    .alloc(NodeKind::Equals, NodeValue::None, vec![expr], span)
            }
        }
    }

    fn literal(&mut self, lit: &ast::Literal) -> NodeId {
        let span = lit.syntax().text_range();
        let decoded = self.decode_literal(lit, span);
        self.tree
            .alloc(NodeKind::Lit, NodeValue::Str(decoded), vec![], span)
    }

    fn range(&mut self, range: &ast::RangeTerm) -> NodeId {
        let span = range.syntax().text_range();
        let (lo, hi) = range.bounds();
        let lo_char = lo.and_then(|l| self.single_char(&l));
        let hi_char = hi.and_then(|l| self.single_char(&l));
        let (lo, hi) = match (lo_char, hi_char) {
            (Some(a), Some(b)) => {
                if a > b {
                    self.diagnostics
                        .error("range bounds are out of order", span)
                        .emit();
                }
                (a as i64, b as i64)
            }
            _ => (0, 0),
        };
        self.tree
            .alloc(NodeKind::Range, NodeValue::Pair(lo, hi), vec![], span)
    }

    fn single_char(&mut self, lit: &ast::Literal) -> Option<char> {
        let span = lit.syntax().text_range();
        let decoded = self.decode_literal(lit, span);
        let mut chars = decoded.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Some(c),
            _ => {
                self.diagnostics
                    .error("range bounds must be single characters", span)
                    .emit();
                None
            }
        }
    }

    fn decode_literal(&mut self, lit: &ast::Literal, span: TextRange) -> String {
        let raw = lit.token().map(|t| t.text().to_string()).unwrap_or_default();
        match crate::escape::unquote(&raw) {
            Ok(s) => s,
            Err(msg) => {
                self.diagnostics.error(msg, span).emit();
                String::new()
            }
        }
    }

    fn check_pattern(&mut self, pattern: &str, span: TextRange) {
        if let Err(err) = regex_syntax::Parser::new().parse(pattern) {
            self.diagnostics
                .error(format!("bad pattern: {err}"), span)
                .emit();
        }
    }

    // ------------------------------------------------------------------
    // Host expressions
    // ------------------------------------------------------------------

    fn expr(&mut self, expr: &Expr) -> NodeId {
        let span = expr.syntax().text_range();
        match expr {
            Expr::Num(num) => self.num(num, span),
            Expr::Str(s) => {
                let raw = s.token().map(|t| t.text().to_string()).unwrap_or_default();
                let decoded = match crate::escape::unquote(&raw) {
                    Ok(text) => text,
                    Err(msg) => {
                        self.diagnostics.error(msg, span).emit();
                        String::new()
                    }
                };
                self.tree
                    .alloc(NodeKind::ELit, NodeValue::Str(decoded), vec![], span)
            }
            Expr::Const(c) => {
                let text = c.token().map(|t| t.text().to_string()).unwrap_or_default();
                self.tree
                    .alloc(NodeKind::EConst, NodeValue::Str(text), vec![], span)
            }
            Expr::Ident(ident) => {
                let text = ident.token().map(|t| t.text().to_string()).unwrap_or_default();
                self.tree
                    .alloc(NodeKind::EIdent, NodeValue::Str(text), vec![], span)
            }
            Expr::Array(array) => {
                let items: Vec<NodeId> = array.items().map(|e| self.expr(&e)).collect();
                self.tree
                    .alloc(NodeKind::EArr, NodeValue::None, items, span)
            }
            Expr::Paren(paren) => {
                let inner = self.expr_or_null(paren.inner(), span);
                self.tree
                    .alloc(NodeKind::EParen, NodeValue::None, vec![inner], span)
            }
            Expr::Qual(qual) => {
                let mut children = vec![self.expr_or_null(qual.primary(), span)];
                for suffix in qual.suffixes() {
                    children.push(match suffix {
                        Suffix::Index(index) => {
                            let sspan = index.syntax().text_range();
                            let idx = self.expr_or_null(index.index(), sspan);
                            self.tree.alloc(
                                NodeKind::EGetitem,
                                NodeValue::None,
                                vec![idx],
                                sspan,
                            )
                        }
                        Suffix::Call(call) => {
                            let sspan = call.syntax().text_range();
                            let args: Vec<NodeId> =
                                call.args().map(|a| self.expr(&a)).collect();
                            self.tree
                                .alloc(NodeKind::ECall, NodeValue::None, args, sspan)
                        }
                    });
                }
                self.tree
                    .alloc(NodeKind::EQual, NodeValue::None, children, span)
            }
            Expr::Plus(plus) => {
                let (lhs, rhs) = plus.operands();
                let lhs = self.expr_or_null(lhs, span);
                let rhs = self.expr_or_null(rhs, span);
                self.tree
                    .alloc(NodeKind::EPlus, NodeValue::None, vec![lhs, rhs], span)
            }
            Expr::Minus(minus) => {
                let (lhs, rhs) = minus.operands();
                let lhs = self.expr_or_null(lhs, span);
                let rhs = self.expr_or_null(rhs, span);
                self.tree
                    .alloc(NodeKind::EMinus, NodeValue::None, vec![lhs, rhs], span)
            }
            Expr::Not(not) => {
                let inner = self.expr_or_null(not.inner(), span);
                self.tree
                    .alloc(NodeKind::ENot, NodeValue::None, vec![inner], span)
            }
        }
    }

    fn num(&mut self, num: &ast::NumExpr, span: TextRange) -> NodeId {
        let negative = num.is_negative();
        let text = num.num_token().map(|t| t.text().to_string()).unwrap_or_default();
        let value = if text.contains('.') || text.contains('e') || text.contains('E') {
            let parsed = text.parse::<f64>().unwrap_or_else(|_| {
                self.diagnostics
                    .error(format!("bad float literal `{text}`"), span)
                    .emit();
                0.0
            });
            NodeValue::Float(if negative { -parsed } else { parsed })
        } else {
            let parsed = if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
                i64::from_str_radix(hex, 16)
            } else {
                text.parse::<i64>()
            };
            match parsed {
                Ok(v) => NodeValue::Int(if negative { -v } else { v }),
                Err(_) => {
                    self.diagnostics
                        .error(format!("integer literal `{text}` out of range"), span)
                        .emit();
                    NodeValue::Int(0)
                }
            }
        };
        self.tree.alloc(NodeKind::ENum, value, vec![], span)
    }

    // ------------------------------------------------------------------
    // Fallbacks
    // ------------------------------------------------------------------

    fn empty(&mut self, span: TextRange) -> NodeId {
        self.tree.alloc(NodeKind::Empty, NodeValue::None, vec![], span)
    }

    fn null_expr(&mut self, span: TextRange) -> NodeId {
        self.tree.alloc(
            NodeKind::EConst,
            NodeValue::Str("null".to_string()),
            vec![],
            span,
        )
    }

    fn inner_or_empty(&mut self, inner: Option<Element>, span: TextRange) -> NodeId {
        match inner {
            Some(element) => self.element(&element),
            None => self.empty(span),
        }
    }

    fn expr_or_null(&mut self, expr: Option<Expr>, span: TextRange) -> NodeId {
        match expr {
            Some(expr) => self.expr(&expr),
            None => self.null_expr(span),
        }
    }
}
