//! Typed AST wrappers over CST nodes.
//!
//! Each struct wraps a `SyntaxNode` and provides typed accessors.
//! Cast is infallible for the correct `SyntaxKind` - validation
//! happens in lowering and analysis.

use crate::syntax::{SyntaxKind, SyntaxNode, SyntaxToken};

macro_rules! ast_node {
    ($name:ident, $kind:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name(SyntaxNode);

        impl $name {
            pub fn cast(node: SyntaxNode) -> Option<Self> {
                (node.kind() == SyntaxKind::$kind).then(|| Self(node))
            }

            pub fn syntax(&self) -> &SyntaxNode {
                &self.0
            }
        }
    };
}

ast_node!(Root, Root);
ast_node!(RuleDef, RuleDef);
ast_node!(PragmaDef, PragmaDef);
ast_node!(ExternEntry, ExternEntry);
ast_node!(Choice, Choice);
ast_node!(Seq, Seq);
ast_node!(Group, Group);
ast_node!(RunCap, RunCap);
ast_node!(Labeled, Labeled);
ast_node!(Quantified, Quantified);
ast_node!(Counted, Counted);
ast_node!(NotTerm, NotTerm);
ast_node!(NotOneTerm, NotOneTerm);
ast_node!(EndsInTerm, EndsInTerm);
ast_node!(Literal, Literal);
ast_node!(RangeTerm, RangeTerm);
ast_node!(ClassTerm, ClassTerm);
ast_node!(RegexTerm, RegexTerm);
ast_node!(UnicatTerm, UnicatTerm);
ast_node!(ApplyTerm, ApplyTerm);
ast_node!(ActionTerm, ActionTerm);
ast_node!(PredTerm, PredTerm);
ast_node!(EqualsTerm, EqualsTerm);

ast_node!(NumExpr, NumExpr);
ast_node!(StrExpr, StrExpr);
ast_node!(ConstExpr, ConstExpr);
ast_node!(IdentExpr, IdentExpr);
ast_node!(ArrayExpr, ArrayExpr);
ast_node!(ParenExpr, ParenExpr);
ast_node!(QualExpr, QualExpr);
ast_node!(IndexSuffix, IndexSuffix);
ast_node!(CallSuffix, CallSuffix);
ast_node!(PlusExpr, PlusExpr);
ast_node!(MinusExpr, MinusExpr);
ast_node!(NotExpr, NotExpr);

/// A top-level item.
#[derive(Debug, Clone)]
pub enum Item {
    Rule(RuleDef),
    Pragma(PragmaDef),
}

/// Any matching element that can appear in a sequence.
#[derive(Debug, Clone)]
pub enum Element {
    Literal(Literal),
    Range(RangeTerm),
    Class(ClassTerm),
    Regex(RegexTerm),
    Unicat(UnicatTerm),
    Apply(ApplyTerm),
    Group(Group),
    Run(RunCap),
    Labeled(Labeled),
    Quantified(Quantified),
    Counted(Counted),
    Not(NotTerm),
    NotOne(NotOneTerm),
    EndsIn(EndsInTerm),
    Action(ActionTerm),
    Pred(PredTerm),
    Equals(EqualsTerm),
}

impl Element {
    pub fn cast(node: SyntaxNode) -> Option<Self> {
        let elem = match node.kind() {
            SyntaxKind::Literal => Element::Literal(Literal(node)),
            SyntaxKind::RangeTerm => Element::Range(RangeTerm(node)),
            SyntaxKind::ClassTerm => Element::Class(ClassTerm(node)),
            SyntaxKind::RegexTerm => Element::Regex(RegexTerm(node)),
            SyntaxKind::UnicatTerm => Element::Unicat(UnicatTerm(node)),
            SyntaxKind::ApplyTerm => Element::Apply(ApplyTerm(node)),
            SyntaxKind::Group => Element::Group(Group(node)),
            SyntaxKind::RunCap => Element::Run(RunCap(node)),
            SyntaxKind::Labeled => Element::Labeled(Labeled(node)),
            SyntaxKind::Quantified => Element::Quantified(Quantified(node)),
            SyntaxKind::Counted => Element::Counted(Counted(node)),
            SyntaxKind::NotTerm => Element::Not(NotTerm(node)),
            SyntaxKind::NotOneTerm => Element::NotOne(NotOneTerm(node)),
            SyntaxKind::EndsInTerm => Element::EndsIn(EndsInTerm(node)),
            SyntaxKind::ActionTerm => Element::Action(ActionTerm(node)),
            SyntaxKind::PredTerm => Element::Pred(PredTerm(node)),
            SyntaxKind::EqualsTerm => Element::Equals(EqualsTerm(node)),
            _ => return None,
        };
        Some(elem)
    }

    pub fn syntax(&self) -> &SyntaxNode {
        match self {
            Element::Literal(n) => n.syntax(),
            Element::Range(n) => n.syntax(),
            Element::Class(n) => n.syntax(),
            Element::Regex(n) => n.syntax(),
            Element::Unicat(n) => n.syntax(),
            Element::Apply(n) => n.syntax(),
            Element::Group(n) => n.syntax(),
            Element::Run(n) => n.syntax(),
            Element::Labeled(n) => n.syntax(),
            Element::Quantified(n) => n.syntax(),
            Element::Counted(n) => n.syntax(),
            Element::Not(n) => n.syntax(),
            Element::NotOne(n) => n.syntax(),
            Element::EndsIn(n) => n.syntax(),
            Element::Action(n) => n.syntax(),
            Element::Pred(n) => n.syntax(),
            Element::Equals(n) => n.syntax(),
        }
    }
}

/// Any host expression.
#[derive(Debug, Clone)]
pub enum Expr {
    Num(NumExpr),
    Str(StrExpr),
    Const(ConstExpr),
    Ident(IdentExpr),
    Array(ArrayExpr),
    Paren(ParenExpr),
    Qual(QualExpr),
    Plus(PlusExpr),
    Minus(MinusExpr),
    Not(NotExpr),
}

impl Expr {
    pub fn cast(node: SyntaxNode) -> Option<Self> {
        let expr = match node.kind() {
            SyntaxKind::NumExpr => Expr::Num(NumExpr(node)),
            SyntaxKind::StrExpr => Expr::Str(StrExpr(node)),
            SyntaxKind::ConstExpr => Expr::Const(ConstExpr(node)),
            SyntaxKind::IdentExpr => Expr::Ident(IdentExpr(node)),
            SyntaxKind::ArrayExpr => Expr::Array(ArrayExpr(node)),
            SyntaxKind::ParenExpr => Expr::Paren(ParenExpr(node)),
            SyntaxKind::QualExpr => Expr::Qual(QualExpr(node)),
            SyntaxKind::PlusExpr => Expr::Plus(PlusExpr(node)),
            SyntaxKind::MinusExpr => Expr::Minus(MinusExpr(node)),
            SyntaxKind::NotExpr => Expr::Not(NotExpr(node)),
            _ => return None,
        };
        Some(expr)
    }

    pub fn syntax(&self) -> &SyntaxNode {
        match self {
            Expr::Num(n) => n.syntax(),
            Expr::Str(n) => n.syntax(),
            Expr::Const(n) => n.syntax(),
            Expr::Ident(n) => n.syntax(),
            Expr::Array(n) => n.syntax(),
            Expr::Paren(n) => n.syntax(),
            Expr::Qual(n) => n.syntax(),
            Expr::Plus(n) => n.syntax(),
            Expr::Minus(n) => n.syntax(),
            Expr::Not(n) => n.syntax(),
        }
    }
}

/// A `[index]` or `(args)` suffix in a qualifier chain.
#[derive(Debug, Clone)]
pub enum Suffix {
    Index(IndexSuffix),
    Call(CallSuffix),
}

// --- Accessors ---

fn first_token(node: &SyntaxNode, pred: impl Fn(SyntaxKind) -> bool) -> Option<SyntaxToken> {
    node.children_with_tokens()
        .filter_map(|it| it.into_token())
        .find(|t| pred(t.kind()))
}

impl Root {
    pub fn items(&self) -> impl Iterator<Item = Item> + '_ {
        self.0.children().filter_map(|node| match node.kind() {
            SyntaxKind::RuleDef => RuleDef::cast(node).map(Item::Rule),
            SyntaxKind::PragmaDef => PragmaDef::cast(node).map(Item::Pragma),
            _ => None,
        })
    }
}

impl RuleDef {
    pub fn name(&self) -> Option<SyntaxToken> {
        first_token(&self.0, |k| k == SyntaxKind::Ident)
    }

    pub fn body(&self) -> Option<Choice> {
        self.0.children().find_map(Choice::cast)
    }
}

impl PragmaDef {
    /// The introducer: `%name`, or the whole `%prec` / `%assoc` line.
    pub fn intro(&self) -> Option<SyntaxToken> {
        first_token(&self.0, |k| {
            matches!(
                k,
                SyntaxKind::PercentIdent | SyntaxKind::PrecPragma | SyntaxKind::AssocPragma
            )
        })
    }

    /// Body choice of `%whitespace` / `%comment`.
    pub fn body(&self) -> Option<Choice> {
        self.0.children().find_map(Choice::cast)
    }

    /// Listed rule names of `%tokens`.
    pub fn token_names(&self) -> impl Iterator<Item = ApplyTerm> + '_ {
        self.0.children().filter_map(ApplyTerm::cast)
    }

    pub fn extern_entries(&self) -> impl Iterator<Item = ExternEntry> + '_ {
        self.0.children().filter_map(ExternEntry::cast)
    }
}

impl ExternEntry {
    pub fn name(&self) -> Option<SyntaxToken> {
        first_token(&self.0, |k| k == SyntaxKind::Ident)
    }

    pub fn default_expr(&self) -> Option<Expr> {
        self.0.children().find_map(Expr::cast)
    }
}

impl Choice {
    pub fn alts(&self) -> impl Iterator<Item = Seq> + '_ {
        self.0.children().filter_map(Seq::cast)
    }
}

impl Seq {
    pub fn elements(&self) -> impl Iterator<Item = Element> + '_ {
        self.0.children().filter_map(Element::cast)
    }
}

impl Literal {
    pub fn token(&self) -> Option<SyntaxToken> {
        first_token(&self.0, |k| {
            matches!(k, SyntaxKind::SqString | SyntaxKind::DqString)
        })
    }
}

impl RangeTerm {
    pub fn bounds(&self) -> (Option<Literal>, Option<Literal>) {
        let mut literals = self.0.children().filter_map(Literal::cast);
        (literals.next(), literals.next())
    }
}

impl ClassTerm {
    pub fn token(&self) -> Option<SyntaxToken> {
        first_token(&self.0, |k| k == SyntaxKind::CharClass)
    }
}

impl RegexTerm {
    pub fn token(&self) -> Option<SyntaxToken> {
        first_token(&self.0, |k| k == SyntaxKind::Regex)
    }
}

impl UnicatTerm {
    pub fn token(&self) -> Option<SyntaxToken> {
        first_token(&self.0, |k| k == SyntaxKind::Unicat)
    }
}

impl ApplyTerm {
    pub fn name(&self) -> Option<SyntaxToken> {
        first_token(&self.0, |k| k == SyntaxKind::Ident)
    }
}

impl Group {
    pub fn body(&self) -> Option<Choice> {
        self.0.children().find_map(Choice::cast)
    }
}

impl RunCap {
    pub fn body(&self) -> Option<Choice> {
        self.0.children().find_map(Choice::cast)
    }
}

impl Labeled {
    pub fn inner(&self) -> Option<Element> {
        self.0.children().find_map(Element::cast)
    }

    /// The label name: the `Ident` after the colon.
    pub fn name(&self) -> Option<SyntaxToken> {
        first_token(&self.0, |k| k == SyntaxKind::Ident)
    }
}

impl Quantified {
    pub fn inner(&self) -> Option<Element> {
        self.0.children().find_map(Element::cast)
    }

    pub fn op(&self) -> Option<SyntaxToken> {
        first_token(&self.0, |k| {
            matches!(k, SyntaxKind::Question | SyntaxKind::Star | SyntaxKind::Plus)
        })
    }
}

impl Counted {
    pub fn inner(&self) -> Option<Element> {
        self.0.children().find_map(Element::cast)
    }

    pub fn bounds(&self) -> (Option<SyntaxToken>, Option<SyntaxToken>) {
        let mut ints = self
            .0
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .filter(|t| t.kind() == SyntaxKind::Int);
        (ints.next(), ints.next())
    }

    pub fn has_comma(&self) -> bool {
        first_token(&self.0, |k| k == SyntaxKind::Comma).is_some()
    }
}

impl NotTerm {
    pub fn inner(&self) -> Option<Element> {
        self.0.children().find_map(Element::cast)
    }
}

impl NotOneTerm {
    pub fn inner(&self) -> Option<Element> {
        self.0.children().find_map(Element::cast)
    }
}

impl EndsInTerm {
    pub fn inner(&self) -> Option<Element> {
        self.0.children().find_map(Element::cast)
    }
}

impl ActionTerm {
    pub fn expr(&self) -> Option<Expr> {
        self.0.children().find_map(Expr::cast)
    }
}

impl PredTerm {
    pub fn expr(&self) -> Option<Expr> {
        self.0.children().find_map(Expr::cast)
    }
}

impl EqualsTerm {
    pub fn expr(&self) -> Option<Expr> {
        self.0.children().find_map(Expr::cast)
    }
}

impl NumExpr {
    pub fn is_negative(&self) -> bool {
        first_token(&self.0, |k| k == SyntaxKind::Minus).is_some()
    }

    pub fn num_token(&self) -> Option<SyntaxToken> {
        first_token(&self.0, |k| matches!(k, SyntaxKind::Int | SyntaxKind::Float))
    }
}

impl StrExpr {
    pub fn token(&self) -> Option<SyntaxToken> {
        first_token(&self.0, |k| {
            matches!(k, SyntaxKind::SqString | SyntaxKind::DqString)
        })
    }
}

impl ConstExpr {
    pub fn token(&self) -> Option<SyntaxToken> {
        first_token(&self.0, |k| k == SyntaxKind::Ident)
    }
}

impl IdentExpr {
    pub fn token(&self) -> Option<SyntaxToken> {
        first_token(&self.0, |k| {
            matches!(k, SyntaxKind::Ident | SyntaxKind::DollarIdent)
        })
    }
}

impl ArrayExpr {
    pub fn items(&self) -> impl Iterator<Item = Expr> + '_ {
        self.0.children().filter_map(Expr::cast)
    }
}

impl ParenExpr {
    pub fn inner(&self) -> Option<Expr> {
        self.0.children().find_map(Expr::cast)
    }
}

impl QualExpr {
    pub fn primary(&self) -> Option<Expr> {
        self.0.children().find_map(Expr::cast)
    }

    pub fn suffixes(&self) -> impl Iterator<Item = Suffix> + '_ {
        self.0.children().filter_map(|node| match node.kind() {
            SyntaxKind::IndexSuffix => IndexSuffix::cast(node).map(Suffix::Index),
            SyntaxKind::CallSuffix => CallSuffix::cast(node).map(Suffix::Call),
            _ => None,
        })
    }
}

impl IndexSuffix {
    pub fn index(&self) -> Option<Expr> {
        self.0.children().find_map(Expr::cast)
    }
}

impl CallSuffix {
    pub fn args(&self) -> impl Iterator<Item = Expr> + '_ {
        self.0.children().filter_map(Expr::cast)
    }
}

impl PlusExpr {
    pub fn operands(&self) -> (Option<Expr>, Option<Expr>) {
        let mut exprs = self.0.children().filter_map(Expr::cast);
        (exprs.next(), exprs.next())
    }
}

impl MinusExpr {
    pub fn operands(&self) -> (Option<Expr>, Option<Expr>) {
        let mut exprs = self.0.children().filter_map(Expr::cast);
        (exprs.next(), exprs.next())
    }
}

impl NotExpr {
    pub fn inner(&self) -> Option<Expr> {
        self.0.children().find_map(Expr::cast)
    }
}
