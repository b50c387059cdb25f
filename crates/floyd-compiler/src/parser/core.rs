//! Parser state machine and low-level operations.
//!
//! The token stream is pulled lazily from the two-mode lexer. Trivia
//! tokens (whitespace, comments) are buffered and flushed as leading
//! trivia when starting a new node, which gives predictable trivia
//! attachment without backtracking. Switching lex modes drops any
//! unconsumed lookahead and re-lexes from the committed offset, so the
//! green tree always covers the source text exactly once.

use std::collections::VecDeque;

use rowan::{Checkpoint, GreenNode, GreenNodeBuilder, TextRange, TextSize};

use crate::diagnostics::Diagnostics;
use crate::lexer::{LexMode, Lexer, Token, token_text};
use crate::syntax::{SyntaxKind, SyntaxNode, TokenSet};

/// Stack depth limit; deep nesting in a grammar is almost certainly an
/// unclosed delimiter, and this keeps malicious input from overflowing
/// the host stack.
pub(crate) const MAX_DEPTH: u32 = 512;

/// Parse result containing the green tree and any errors.
///
/// The tree is always complete - errors are recorded separately and
/// also represented as `SyntaxKind::Error` nodes in the tree itself.
#[derive(Debug, Clone)]
pub struct Parse {
    green: GreenNode,
    diagnostics: Diagnostics,
}

impl Parse {
    pub fn syntax(&self) -> SyntaxNode {
        SyntaxNode::new_root(self.green.clone())
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }

    pub fn is_valid(&self) -> bool {
        !self.diagnostics.has_errors()
    }
}

pub struct Parser<'src> {
    source: &'src str,
    lexer: Lexer<'src>,
    mode: LexMode,
    /// Raw tokens pulled but not yet consumed; may include trivia.
    lookahead: VecDeque<Token>,
    /// Source offset after the last consumed token; mode switches
    /// re-lex from here.
    committed: usize,
    /// Trivia accumulated since the last non-trivia token, drained
    /// into the tree at `start_node()` / `checkpoint()` / `bump()`.
    trivia_buffer: Vec<Token>,
    builder: GreenNodeBuilder<'static>,
    diagnostics: Diagnostics,
    depth: u32,
    last_diagnostic_pos: Option<TextSize>,
    /// Progress detector: decremented on lookahead, reset on `bump`.
    fuel: std::cell::Cell<u32>,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            lexer: Lexer::new(source),
            mode: LexMode::Term,
            lookahead: VecDeque::with_capacity(8),
            committed: 0,
            trivia_buffer: Vec::with_capacity(4),
            builder: GreenNodeBuilder::new(),
            diagnostics: Diagnostics::new(),
            depth: 0,
            last_diagnostic_pos: None,
            fuel: std::cell::Cell::new(256),
        }
    }

    pub fn finish(mut self) -> Parse {
        self.drain_trivia();
        Parse {
            green: self.builder.finish(),
            diagnostics: self.diagnostics,
        }
    }

    // ------------------------------------------------------------------
    // Token cursor
    // ------------------------------------------------------------------

    /// Switch lex modes: drop unconsumed lookahead and re-lex from the
    /// committed offset.
    pub(crate) fn set_mode(&mut self, mode: LexMode) {
        if self.mode == mode {
            return;
        }
        self.mode = mode;
        self.lookahead.clear();
        self.lexer.seek(self.committed);
    }

    fn fill(&mut self, n: usize) {
        while self.lookahead.len() < n {
            match self.lexer.next_token(self.mode) {
                Some(tok) => self.lookahead.push_back(tok),
                None => break,
            }
        }
    }

    fn skip_trivia_to_buffer(&mut self) {
        loop {
            self.fill(1);
            match self.lookahead.front() {
                Some(tok) if tok.kind.is_trivia() => {
                    let tok = self.lookahead.pop_front().expect("just checked");
                    self.committed = u32::from(tok.span.end()) as usize;
                    self.trivia_buffer.push(tok);
                }
                _ => break,
            }
        }
    }

    /// Kind of the next non-trivia token; `Error` acts as the EOF
    /// sentinel.
    pub(crate) fn peek(&mut self) -> SyntaxKind {
        self.peek_nth(0)
    }

    /// LL(k) lookahead past trivia.
    pub(crate) fn peek_nth(&mut self, n: usize) -> SyntaxKind {
        self.check_fuel();
        self.skip_trivia_to_buffer();
        let mut seen = 0;
        let mut i = 0;
        loop {
            if i >= self.lookahead.len() {
                self.fill(i + 1);
                if i >= self.lookahead.len() {
                    return SyntaxKind::Error;
                }
            }
            let kind = self.lookahead[i].kind;
            if !kind.is_trivia() {
                if seen == n {
                    return kind;
                }
                seen += 1;
            }
            i += 1;
        }
    }

    /// Text of the next non-trivia token.
    pub(crate) fn peek_text(&mut self) -> &'src str {
        self.skip_trivia_to_buffer();
        self.fill(1);
        match self.lookahead.front() {
            Some(tok) => token_text(self.source, tok),
            None => "",
        }
    }

    pub(crate) fn current_span(&mut self) -> TextRange {
        self.skip_trivia_to_buffer();
        self.fill(1);
        match self.lookahead.front() {
            Some(tok) => tok.span,
            None => TextRange::empty(TextSize::from(self.source.len() as u32)),
        }
    }

    pub(crate) fn eof(&mut self) -> bool {
        self.peek() == SyntaxKind::Error && {
            self.skip_trivia_to_buffer();
            self.fill(1);
            self.lookahead.is_empty()
        }
    }

    pub(crate) fn at(&mut self, kind: SyntaxKind) -> bool {
        self.peek() == kind
    }

    pub(crate) fn at_set(&mut self, set: TokenSet) -> bool {
        set.contains(self.peek())
    }

    // ------------------------------------------------------------------
    // Tree building
    // ------------------------------------------------------------------

    pub(crate) fn drain_trivia(&mut self) {
        for tok in self.trivia_buffer.drain(..) {
            let text = token_text(self.source, &tok);
            self.builder.token(tok.kind.into(), text);
        }
    }

    pub(crate) fn start_node(&mut self, kind: SyntaxKind) {
        self.drain_trivia();
        self.builder.start_node(kind.into());
    }

    /// Wrap previously-parsed content using a checkpoint.
    pub(crate) fn start_node_at(&mut self, checkpoint: Checkpoint, kind: SyntaxKind) {
        self.builder.start_node_at(checkpoint, kind.into());
    }

    pub(crate) fn finish_node(&mut self) {
        self.builder.finish_node();
    }

    pub(crate) fn checkpoint(&mut self) -> Checkpoint {
        self.skip_trivia_to_buffer();
        self.drain_trivia();
        self.builder.checkpoint()
    }

    /// Consume the next non-trivia token into the tree.
    pub(crate) fn bump(&mut self) {
        self.skip_trivia_to_buffer();
        self.drain_trivia();
        self.fill(1);
        let tok = self.lookahead.pop_front().expect("bump called at EOF");
        self.committed = u32::from(tok.span.end()) as usize;
        self.fuel.set(256);
        let text = token_text(self.source, &tok);
        self.builder.token(tok.kind.into(), text);
    }

    pub(crate) fn eat(&mut self, kind: SyntaxKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// On mismatch: emit a diagnostic but don't consume, so the parent
    /// production gets a chance to recover.
    pub(crate) fn expect(&mut self, kind: SyntaxKind, what: &str) -> bool {
        if self.eat(kind) {
            return true;
        }
        self.error(format!("expected {what}"));
        false
    }

    // ------------------------------------------------------------------
    // Errors and recovery
    // ------------------------------------------------------------------

    /// Emit a diagnostic at the current position. Deduplicated per
    /// position so cascading failures report once.
    pub(crate) fn error(&mut self, message: impl Into<String>) {
        let range = self.current_span();
        let pos = range.start();
        if self.last_diagnostic_pos == Some(pos) {
            return;
        }
        self.last_diagnostic_pos = Some(pos);
        self.diagnostics.error(message, range).emit();
    }

    pub(crate) fn error_and_bump(&mut self, message: &str) {
        self.error(message);
        if !self.eof() {
            self.start_node(SyntaxKind::Error);
            self.bump();
            self.finish_node();
        }
    }

    /// Skip tokens (inside an `Error` node) until the next plausible
    /// rule or pragma start. Returns whether anything was skipped.
    pub(crate) fn synchronize_to_item_start(&mut self) -> bool {
        if self.eof() || self.at_item_start() {
            return false;
        }
        self.start_node(SyntaxKind::Error);
        while !self.eof() && !self.at_item_start() {
            self.bump();
        }
        self.finish_node();
        true
    }

    pub(crate) fn at_item_start(&mut self) -> bool {
        match self.peek() {
            SyntaxKind::PercentIdent | SyntaxKind::PrecPragma | SyntaxKind::AssocPragma => true,
            SyntaxKind::Ident => self.peek_nth(1) == SyntaxKind::Eq,
            _ => false,
        }
    }

    pub(crate) fn enter_recursion(&mut self) -> bool {
        if self.depth >= MAX_DEPTH {
            self.error("grammar nests too deeply");
            return false;
        }
        self.depth += 1;
        true
    }

    pub(crate) fn exit_recursion(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn check_fuel(&self) {
        let fuel = self.fuel.get();
        assert!(fuel > 0, "parser is stuck (no progress)");
        self.fuel.set(fuel - 1);
    }
}
