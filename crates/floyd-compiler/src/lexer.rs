//! Lexer for the Floyd grammar language.
//!
//! Produces span-based tokens without storing text - text is sliced
//! from source only when needed.
//!
//! ## Two modes
//!
//! The grammar surface is context-sensitive at exactly one point:
//! `[...]` is a character class in matching position but an array
//! literal inside a host expression, and a class may contain quote
//! characters that would derail a single-pass lexer. The lexer
//! therefore runs in one of two modes and the parser switches between
//! them at action/predicate boundaries:
//!
//! - **Term mode**: `[...]`, `/.../` and `\p{X}` are single tokens.
//! - **Expr mode**: brackets are plain delimiters, floats and hex
//!   integers exist, `!`/`-` are operators.
//!
//! Tokens are pulled lazily; switching modes re-lexes from the current
//! committed offset, so stale lookahead is simply dropped.
//!
//! ## Error handling
//!
//! Consecutive unlexable characters coalesce into single `Garbage`
//! tokens, keeping the stream manageable for malformed input.

use logos::Logos;
use rowan::TextRange;

use crate::syntax::SyntaxKind;

/// Zero-copy token: kind + span, text retrieved via [`token_text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: SyntaxKind,
    pub span: TextRange,
}

impl Token {
    #[inline]
    pub fn new(kind: SyntaxKind, span: TextRange) -> Self {
        Self { kind, span }
    }
}

/// Lexing mode; see module docs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexMode {
    Term,
    Expr,
}

/// Retrieves the text slice for a token. O(1) slice into source.
#[inline]
pub fn token_text<'s>(source: &'s str, token: &Token) -> &'s str {
    &source[std::ops::Range::<usize>::from(token.span)]
}

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum TermTok {
    #[regex(r"%assoc[ \t][^\n]*", allow_greedy = true)]
    AssocPragma,
    #[regex(r"%prec[ \t][^\n]*", allow_greedy = true)]
    PrecPragma,
    #[regex(r"%[a-z_]+")]
    PercentIdent,

    #[token("={")]
    EqualsBrace,
    #[token("=")]
    Eq,
    #[token("|")]
    Pipe,
    #[token("?(")]
    QuestionParen,
    #[token("?{")]
    QuestionBrace,
    #[token("?")]
    Question,
    #[token("*")]
    Star,
    #[token("+")]
    Plus,
    #[token("~")]
    Tilde,
    #[token("^.")]
    CaretDot,
    #[token("^")]
    Caret,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("(")]
    ParenOpen,
    #[token(")")]
    ParenClose,
    #[token("{")]
    BraceOpen,
    #[token("}")]
    BraceClose,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token("->")]
    Arrow,
    #[token("..")]
    DotDot,

    #[regex(r"'(?:[^'\\\n]|\\.)*'")]
    SqString,
    #[regex(r#""(?:[^"\\\n]|\\.)*""#)]
    DqString,
    #[regex(r"/(?:[^/\\\n]|\\.)+/")]
    Regex,
    #[regex(r"\[(?:[^\]\\\n]|\\.)*\]")]
    CharClass,
    #[regex(r"\\p\{[A-Za-z]+\}")]
    Unicat,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,
    #[regex(r"[0-9]+")]
    Int,

    #[regex(r"[ \t\r\n]+")]
    Whitespace,
    #[regex(r"//[^\n]*", allow_greedy = true)]
    LineComment,
}

impl From<TermTok> for SyntaxKind {
    fn from(tok: TermTok) -> Self {
        match tok {
            TermTok::AssocPragma => SyntaxKind::AssocPragma,
            TermTok::PrecPragma => SyntaxKind::PrecPragma,
            TermTok::PercentIdent => SyntaxKind::PercentIdent,
            TermTok::EqualsBrace => SyntaxKind::EqualsBrace,
            TermTok::Eq => SyntaxKind::Eq,
            TermTok::Pipe => SyntaxKind::Pipe,
            TermTok::QuestionParen => SyntaxKind::QuestionParen,
            TermTok::QuestionBrace => SyntaxKind::QuestionBrace,
            TermTok::Question => SyntaxKind::Question,
            TermTok::Star => SyntaxKind::Star,
            TermTok::Plus => SyntaxKind::Plus,
            TermTok::Tilde => SyntaxKind::Tilde,
            TermTok::CaretDot => SyntaxKind::CaretDot,
            TermTok::Caret => SyntaxKind::Caret,
            TermTok::Lt => SyntaxKind::Lt,
            TermTok::Gt => SyntaxKind::Gt,
            TermTok::ParenOpen => SyntaxKind::ParenOpen,
            TermTok::ParenClose => SyntaxKind::ParenClose,
            TermTok::BraceOpen => SyntaxKind::BraceOpen,
            TermTok::BraceClose => SyntaxKind::BraceClose,
            TermTok::Comma => SyntaxKind::Comma,
            TermTok::Colon => SyntaxKind::Colon,
            TermTok::Arrow => SyntaxKind::Arrow,
            TermTok::DotDot => SyntaxKind::DotDot,
            TermTok::SqString => SyntaxKind::SqString,
            TermTok::DqString => SyntaxKind::DqString,
            TermTok::Regex => SyntaxKind::Regex,
            TermTok::CharClass => SyntaxKind::CharClass,
            TermTok::Unicat => SyntaxKind::Unicat,
            TermTok::Ident => SyntaxKind::Ident,
            TermTok::Int => SyntaxKind::Int,
            TermTok::Whitespace => SyntaxKind::Whitespace,
            TermTok::LineComment => SyntaxKind::LineComment,
        }
    }
}

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum ExprTok {
    #[token("[")]
    BracketOpen,
    #[token("]")]
    BracketClose,
    #[token("(")]
    ParenOpen,
    #[token(")")]
    ParenClose,
    #[token("}")]
    BraceClose,
    #[token(",")]
    Comma,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("!")]
    Bang,

    #[regex(r"'(?:[^'\\\n]|\\.)*'")]
    SqString,
    #[regex(r#""(?:[^"\\\n]|\\.)*""#)]
    DqString,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,
    #[regex(r"\$[0-9]+")]
    DollarIdent,
    #[regex(r"[0-9]+\.[0-9]+(?:[eE][+-]?[0-9]+)?")]
    Float,
    #[regex(r"0[xX][0-9a-fA-F]+|[0-9]+")]
    Int,

    #[regex(r"[ \t\r\n]+")]
    Whitespace,
    #[regex(r"//[^\n]*", allow_greedy = true)]
    LineComment,
}

impl From<ExprTok> for SyntaxKind {
    fn from(tok: ExprTok) -> Self {
        match tok {
            ExprTok::BracketOpen => SyntaxKind::BracketOpen,
            ExprTok::BracketClose => SyntaxKind::BracketClose,
            ExprTok::ParenOpen => SyntaxKind::ParenOpen,
            ExprTok::ParenClose => SyntaxKind::ParenClose,
            ExprTok::BraceClose => SyntaxKind::BraceClose,
            ExprTok::Comma => SyntaxKind::Comma,
            ExprTok::Plus => SyntaxKind::Plus,
            ExprTok::Minus => SyntaxKind::Minus,
            ExprTok::Bang => SyntaxKind::Bang,
            ExprTok::SqString => SyntaxKind::SqString,
            ExprTok::DqString => SyntaxKind::DqString,
            ExprTok::Ident => SyntaxKind::Ident,
            ExprTok::DollarIdent => SyntaxKind::DollarIdent,
            ExprTok::Float => SyntaxKind::Float,
            ExprTok::Int => SyntaxKind::Int,
            ExprTok::Whitespace => SyntaxKind::Whitespace,
            ExprTok::LineComment => SyntaxKind::LineComment,
        }
    }
}

/// Incremental lexer over the grammar source.
pub struct Lexer<'src> {
    source: &'src str,
    offset: usize,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self { source, offset: 0 }
    }

    /// Rewind (or advance) to an absolute offset; used by the parser
    /// when it switches modes and drops stale lookahead.
    pub fn seek(&mut self, offset: usize) {
        debug_assert!(offset <= self.source.len());
        self.offset = offset;
    }

    /// Next token in the given mode, or `None` at end of input.
    pub fn next_token(&mut self, mode: LexMode) -> Option<Token> {
        let mut garbage_start: Option<usize> = None;

        loop {
            if self.offset >= self.source.len() {
                return garbage_start.map(|start| {
                    Token::new(SyntaxKind::Garbage, range(start, self.source.len()))
                });
            }

            match self.lex_one(mode) {
                Ok((kind, start, end)) => {
                    if let Some(gstart) = garbage_start {
                        // Don't lose the good token: re-lex it next call.
                        self.offset = start;
                        return Some(Token::new(SyntaxKind::Garbage, range(gstart, start)));
                    }
                    self.offset = end;
                    return Some(Token::new(kind, range(start, end)));
                }
                Err((start, end)) => {
                    garbage_start.get_or_insert(start);
                    self.offset = end;
                }
            }
        }
    }

    /// Lex one token at the current offset. `Err` carries the span of
    /// the unmatched input.
    fn lex_one(&self, mode: LexMode) -> Result<(SyntaxKind, usize, usize), (usize, usize)> {
        let rest = &self.source[self.offset..];
        match mode {
            LexMode::Term => {
                let mut lexer = TermTok::lexer(rest);
                let item = lexer.next().expect("non-empty input");
                let span = lexer.span();
                let (start, end) = (self.offset + span.start, self.offset + span.end);
                match item {
                    Ok(tok) => Ok((tok.into(), start, end)),
                    Err(()) => Err((start, end)),
                }
            }
            LexMode::Expr => {
                let mut lexer = ExprTok::lexer(rest);
                let item = lexer.next().expect("non-empty input");
                let span = lexer.span();
                let (start, end) = (self.offset + span.start, self.offset + span.end);
                match item {
                    Ok(tok) => Ok((tok.into(), start, end)),
                    Err(()) => Err((start, end)),
                }
            }
        }
    }
}

fn range(start: usize, end: usize) -> TextRange {
    TextRange::new((start as u32).into(), (end as u32).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use SyntaxKind::*;

    fn lex_all(source: &str, mode: LexMode) -> Vec<(SyntaxKind, String)> {
        let mut lexer = Lexer::new(source);
        let mut out = Vec::new();
        while let Some(tok) = lexer.next_token(mode) {
            out.push((tok.kind, token_text(source, &tok).to_string()));
        }
        out
    }

    fn kinds(source: &str, mode: LexMode) -> Vec<SyntaxKind> {
        lex_all(source, mode)
            .into_iter()
            .map(|(k, _)| k)
            .filter(|k| !k.is_trivia())
            .collect()
    }

    #[test]
    fn basic_rule() {
        assert_eq!(
            kinds("g = 'foo' bar", LexMode::Term),
            vec![Ident, Eq, SqString, Ident]
        );
    }

    #[test]
    fn composite_tokens() {
        assert_eq!(
            kinds("-> ?( ?{ ={ ^. ..", LexMode::Term),
            vec![Arrow, QuestionParen, QuestionBrace, EqualsBrace, CaretDot, DotDot]
        );
    }

    #[test]
    fn char_class_is_one_token_in_term_mode() {
        let toks = lex_all(r#"[^"\\]"#, LexMode::Term);
        assert_eq!(toks.len(), 1);
        assert_eq!(toks[0].0, CharClass);
        assert_eq!(toks[0].1, r#"[^"\\]"#);
    }

    #[test]
    fn brackets_are_plain_in_expr_mode() {
        assert_eq!(
            kinds("[$1, $3]", LexMode::Expr),
            vec![BracketOpen, DollarIdent, Comma, DollarIdent, BracketClose]
        );
    }

    #[test]
    fn regex_and_unicat() {
        assert_eq!(
            kinds(r"/a+b/ \p{Lu}", LexMode::Term),
            vec![Regex, Unicat]
        );
    }

    #[test]
    fn line_comment_beats_empty_regex() {
        assert_eq!(kinds("// just a note\nx", LexMode::Term), vec![Ident]);
    }

    #[test]
    fn pragma_lines() {
        let toks = lex_all("%prec + -\n%assoc ^ right\n%tokens", LexMode::Term);
        let sig: Vec<_> = toks.iter().filter(|(k, _)| !k.is_trivia()).collect();
        assert_eq!(sig[0].0, PrecPragma);
        assert_eq!(sig[0].1, "%prec + -");
        assert_eq!(sig[1].0, AssocPragma);
        assert_eq!(sig[2].0, PercentIdent);
    }

    #[test]
    fn expr_numbers() {
        assert_eq!(
            kinds("12 0xFF 1.5 2.0e3", LexMode::Expr),
            vec![Int, Int, Float, Float]
        );
    }

    #[test]
    fn garbage_coalesces() {
        let toks = lex_all("a \u{1}\u{2}\u{3} b", LexMode::Term);
        let sig: Vec<_> = toks.into_iter().filter(|(k, _)| !k.is_trivia()).collect();
        assert_eq!(sig.len(), 3);
        assert_eq!(sig[1].0, Garbage);
        assert_eq!(sig[1].1, "\u{1}\u{2}\u{3}");
    }

    #[test]
    fn seek_relexes() {
        let source = "-> [a]";
        let mut lexer = Lexer::new(source);
        let arrow = lexer.next_token(LexMode::Term).unwrap();
        assert_eq!(arrow.kind, Arrow);
        // Term mode would see a char class...
        let class = lexer.next_token(LexMode::Term).unwrap();
        let class = if class.kind.is_trivia() {
            lexer.next_token(LexMode::Term).unwrap()
        } else {
            class
        };
        assert_eq!(class.kind, CharClass);
        // ...but seeking back and switching modes sees an array.
        lexer.seek(u32::from(arrow.span.end()) as usize);
        let mut kinds = Vec::new();
        while let Some(tok) = lexer.next_token(LexMode::Expr) {
            if !tok.kind.is_trivia() {
                kinds.push(tok.kind);
            }
        }
        assert_eq!(kinds, vec![BracketOpen, Ident, BracketClose]);
    }
}
