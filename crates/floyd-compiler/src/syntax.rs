//! Syntax kinds for the Floyd grammar language.
//!
//! One enum covers both terminal tokens (produced by the lexer) and
//! composite nodes (built by the parser); rowan's `Language` trait
//! bridges it to the green-tree machinery. Tokens come first so their
//! discriminants fit the 64-bit [`TokenSet`] used for FIRST/RECOVERY
//! checks.

use rowan::Language;

/// All kinds of tokens and nodes in the grammar syntax tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
pub enum SyntaxKind {
    // =========================
    // Tokens (terminal symbols)
    // =========================
    Eq = 0,
    Pipe,
    Question,
    Star,
    Plus,
    Tilde,
    Caret,
    /// `^.` — ends-in.
    CaretDot,
    Lt,
    Gt,
    ParenOpen,
    ParenClose,
    BraceOpen,
    BraceClose,
    BracketOpen,
    BracketClose,
    Comma,
    Colon,
    /// `->` — action introducer.
    Arrow,
    /// `?(` — predicate.
    QuestionParen,
    /// `?{` — predicate.
    QuestionBrace,
    /// `={` — literal-from-expression.
    EqualsBrace,
    /// `..` — range.
    DotDot,
    Bang,
    Minus,
    Ident,
    /// Positional label reference, e.g. `$1`.
    DollarIdent,
    Int,
    Float,
    /// Single-quoted literal, quotes included.
    SqString,
    /// Double-quoted literal, quotes included.
    DqString,
    /// `/.../`, delimiters included.
    Regex,
    /// `[...]` character class, brackets included (term mode only).
    CharClass,
    /// `\p{X}`.
    Unicat,
    /// `%name` pragma introducer.
    PercentIdent,
    /// A whole `%prec ...` line.
    PrecPragma,
    /// A whole `%assoc ...` line.
    AssocPragma,

    // Trivia tokens
    Whitespace,
    LineComment,

    /// Coalesced run of unlexable characters.
    Garbage,

    /// Error token; also the EOF sentinel in the parser.
    Error,

    // ================================
    // Nodes (non-terminal symbols)
    // ================================
    Root,
    /// `name = choice`
    RuleDef,
    /// `%whitespace = ...`, `%tokens = ...`, `%prec ...`, ...
    PragmaDef,
    /// `name -> default` inside `%externs`.
    ExternEntry,
    Choice,
    Seq,
    /// `(...)`
    Group,
    /// `<...>`
    RunCap,
    /// `term:name`
    Labeled,
    /// `term?`, `term*`, `term+`
    Quantified,
    /// `term{n}`, `term{m,n}`
    Counted,
    /// `~term`
    NotTerm,
    /// `^term`
    NotOneTerm,
    /// `^. term`
    EndsInTerm,
    /// `'...'` / `"..."`
    Literal,
    /// `'a'..'z'`
    RangeTerm,
    /// `[...]`
    ClassTerm,
    /// `/.../`
    RegexTerm,
    /// `\p{X}`
    UnicatTerm,
    /// Rule reference.
    ApplyTerm,
    /// `-> expr` or `{ expr }`
    ActionTerm,
    /// `?( expr )` or `?{ expr }`
    PredTerm,
    /// `={ expr }`
    EqualsTerm,

    // Host-expression nodes.
    NumExpr,
    StrExpr,
    /// `true` / `false` / `null`
    ConstExpr,
    IdentExpr,
    ArrayExpr,
    ParenExpr,
    /// Primary followed by `[...]` / `(...)` suffixes.
    QualExpr,
    /// `[index]` suffix.
    IndexSuffix,
    /// `(args)` suffix.
    CallSuffix,
    PlusExpr,
    MinusExpr,
    NotExpr,

    // Must be last - used for bounds checking in `kind_from_raw`
    #[doc(hidden)]
    __LAST,
}

use SyntaxKind::*;

impl SyntaxKind {
    /// Trivia tokens are buffered during parsing and attached as
    /// leading trivia of the next node.
    #[inline]
    pub fn is_trivia(self) -> bool {
        matches!(self, Whitespace | LineComment)
    }
}

impl From<SyntaxKind> for rowan::SyntaxKind {
    #[inline]
    fn from(kind: SyntaxKind) -> Self {
        Self(kind as u16)
    }
}

/// Language tag parameterizing rowan's tree types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FloydLang {}

impl Language for FloydLang {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        assert!(raw.0 < __LAST as u16);
        // SAFETY: bounds checked above and SyntaxKind is repr(u16).
        unsafe { std::mem::transmute::<u16, SyntaxKind>(raw.0) }
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        kind.into()
    }
}

pub type SyntaxNode = rowan::SyntaxNode<FloydLang>;
pub type SyntaxToken = rowan::SyntaxToken<FloydLang>;
pub type SyntaxElement = rowan::NodeOrToken<SyntaxNode, SyntaxToken>;

/// A set of token kinds as a 64-bit bitset.
///
/// Token discriminants must stay below 64; `new` asserts this at
/// compile time so sets can be `const`.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct TokenSet(u64);

impl TokenSet {
    pub const EMPTY: TokenSet = TokenSet(0);

    #[inline]
    pub const fn new(kinds: &[SyntaxKind]) -> Self {
        let mut bits = 0u64;
        let mut i = 0;
        while i < kinds.len() {
            let kind = kinds[i] as u16;
            assert!(kind < 64, "SyntaxKind value exceeds TokenSet capacity");
            bits |= 1 << kind;
            i += 1;
        }
        TokenSet(bits)
    }

    #[inline]
    pub const fn contains(&self, kind: SyntaxKind) -> bool {
        let kind = kind as u16;
        if kind >= 64 {
            return false;
        }
        self.0 & (1 << kind) != 0
    }

    #[inline]
    pub const fn union(self, other: TokenSet) -> TokenSet {
        TokenSet(self.0 | other.0)
    }
}

impl std::fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut list = f.debug_set();
        for i in 0..64u16 {
            if self.0 & (1 << i) != 0 && i < __LAST as u16 {
                let kind: SyntaxKind = unsafe { std::mem::transmute(i) };
                list.entry(&kind);
            }
        }
        list.finish()
    }
}

/// Pre-defined token sets used throughout the parser.
pub mod token_sets {
    use super::*;

    /// Tokens that can start a matching term.
    pub const TERM_FIRST: TokenSet = TokenSet::new(&[
        SqString,
        DqString,
        CharClass,
        Regex,
        Unicat,
        Ident,
        ParenOpen,
        Lt,
        Tilde,
        Caret,
        CaretDot,
        Arrow,
        BraceOpen,
        QuestionParen,
        QuestionBrace,
        EqualsBrace,
    ]);

    /// Postfix quantifier tokens.
    pub const QUANTIFIERS: TokenSet = TokenSet::new(&[Question, Star, Plus]);

    /// Tokens that can start a host expression.
    pub const EXPR_FIRST: TokenSet = TokenSet::new(&[
        Ident,
        DollarIdent,
        Int,
        Float,
        Minus,
        SqString,
        DqString,
        BracketOpen,
        ParenOpen,
        Bang,
    ]);

    /// Recovery points when a rule body goes wrong: the next rule or
    /// pragma start.
    pub const RULE_RECOVERY: TokenSet =
        TokenSet::new(&[PercentIdent, PrecPragma, AssocPragma]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_set_contains() {
        let set = TokenSet::new(&[ParenOpen, Star]);
        assert!(set.contains(ParenOpen));
        assert!(set.contains(Star));
        assert!(!set.contains(Pipe));
    }

    #[test]
    fn token_set_union() {
        let set = token_sets::TERM_FIRST.union(token_sets::QUANTIFIERS);
        assert!(set.contains(SqString));
        assert!(set.contains(Question));
    }

    #[test]
    fn trivia() {
        assert!(Whitespace.is_trivia());
        assert!(LineComment.is_trivia());
        assert!(!Ident.is_trivia());
    }
}
