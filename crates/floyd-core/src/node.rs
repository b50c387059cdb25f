//! The uniform grammar IR.
//!
//! Every stage of the pipeline — lowering, analysis, interpretation —
//! works on the same node shape: a tag, an optional leaf value, an
//! ordered child list, a source span, and a bag of analysis attributes.
//! Nodes live in an arena ([`Tree`]) and reference each other through
//! integer ids, so analysis passes can rewrite subtrees (wrap a rule
//! body, splice filler in front of a literal) without fighting
//! ownership.

use rowan::TextRange;

use crate::types::Type;

/// Arena index of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The closed set of node tags.
///
/// Grouped the way the grammar treats them: structural combinators,
/// matching primitives, and host-expression forms. The
/// `(kind, child arity)` pairing is fixed per kind and documented on
/// the variants where it is not obvious.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    // Structural.
    /// Grammar root; children are `Rule` and `Pragma` nodes.
    Rules,
    /// Named rule; value is the name, single child is the body.
    Rule,
    /// `%name ...` directive; value is the pragma name.
    Pragma,
    Seq,
    Choice,
    /// Matches nothing, always succeeds.
    Empty,
    Paren,
    /// Rule invocation; value is the rule name.
    Apply,
    /// `-> expr` / `{ expr }`; single host-expression child.
    Action,
    /// `?( expr )` / `?{ expr }`; single host-expression child.
    Pred,
    /// `={ expr }`: match the evaluated string literally.
    Equals,
    /// `term:name`; value is the label name, single child is the term.
    Label,
    /// Binding frame inserted by label analysis.
    Scope,
    /// Precedence-climbing entry; value is the rule name.
    Operator,
    /// Left-recursion fixed-point entry; value is the rule name,
    /// single child is the original body.
    Leftrec,
    /// Marker wrapped around generated helper rules.
    RuleWrapper,

    // Matching.
    Any,
    End,
    /// Literal text; value is the decoded string.
    Lit,
    /// Code-point range; value is the inclusive `Pair(lo, hi)`.
    Range,
    /// Character class `[...]`; value is the raw pattern.
    Set,
    /// Anchored regex `/.../`; value is the raw pattern.
    Regexp,
    /// Unicode general category `\p{X}`; value is the category name.
    Unicat,
    /// `<...>`: match the child, produce the consumed text.
    Run,
    Opt,
    Star,
    Plus,
    /// `{m,n}`; value is `Pair(min, max)`.
    Count,
    Not,
    NotOne,
    EndsIn,

    // Host expressions.
    /// `true` / `false` / `null`; value is the keyword.
    EConst,
    /// Numeric literal; value is `Int` or `Float`.
    ENum,
    /// String literal; value is the decoded string.
    ELit,
    /// Identifier reference; value is the name.
    EIdent,
    EArr,
    EParen,
    /// Postfix `[index]` element of a qualifier chain.
    EGetitem,
    /// Rewritten indexing: children are `[object, index]`.
    EGetitemInfix,
    /// Postfix `(args)` element of a qualifier chain.
    ECall,
    /// Rewritten call: children are `[callee, arg...]`.
    ECallInfix,
    EPlus,
    EMinus,
    ENot,
    /// Primary followed by a postfix chain; rewritten away by analysis.
    EQual,
}

/// Leaf payload, interpreted per [`NodeKind`].
#[derive(Debug, Clone, PartialEq, Default)]
pub enum NodeValue {
    #[default]
    None,
    Str(String),
    Int(i64),
    Float(f64),
    /// Numeric pair: count bounds, or a code-point range.
    Pair(i64, i64),
}

impl NodeValue {
    /// The string payload, for kinds whose value is textual.
    pub fn as_str(&self) -> &str {
        match self {
            NodeValue::Str(s) => s,
            _ => "",
        }
    }

    pub fn as_pair(&self) -> (i64, i64) {
        match self {
            NodeValue::Pair(a, b) => (*a, *b),
            _ => (0, 0),
        }
    }
}

/// How an `EIdent` resolves, decided by the resolution pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentClass {
    /// Label bound in the innermost scope.
    Local,
    /// Label bound in an enclosing scope.
    Outer,
    Extern,
    /// Built-in function.
    Function,
}

/// Associativity of a left-recursive or operator construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Assoc {
    #[default]
    Left,
    Right,
}

/// Mutable analysis attributes, populated pass by pass.
#[derive(Debug, Clone, Default)]
pub struct Attrs {
    /// Can execution of this node ever fail? Computed bottom-up.
    pub can_fail: bool,
    /// Inserted by filler installation; skipped by positional labels.
    pub filler: bool,
    pub ident_class: Option<IdentClass>,
    /// Inferred host-expression type.
    pub ty: Option<Type>,
    pub assoc: Assoc,
    /// Rule is memoizable (not left-recursive, not an operator rule).
    pub memoize: bool,
}

/// One node of the grammar IR.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub value: NodeValue,
    pub children: Vec<NodeId>,
    pub span: TextRange,
    pub attrs: Attrs,
}

/// Arena of IR nodes.
///
/// Ids are never invalidated; rewrites allocate replacement nodes and
/// repoint children. The tree is append-only, which keeps analysis
/// passes free to hold ids across mutations.
#[derive(Debug, Clone, Default)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(
        &mut self,
        kind: NodeKind,
        value: NodeValue,
        children: Vec<NodeId>,
        span: TextRange,
    ) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            value,
            children,
            span,
            attrs: Attrs::default(),
        });
        id
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    #[inline]
    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.nodes[id.index()].kind
    }

    #[inline]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Pre-order walk of the subtree under `id`.
    pub fn walk(&self, id: NodeId, f: &mut impl FnMut(NodeId, &Node)) {
        let node = self.node(id);
        f(id, node);
        for &child in &node.children {
            self.walk(child, f);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span() -> TextRange {
        TextRange::empty(0.into())
    }

    #[test]
    fn alloc_and_walk() {
        let mut tree = Tree::new();
        let a = tree.alloc(NodeKind::Lit, NodeValue::Str("a".into()), vec![], span());
        let b = tree.alloc(NodeKind::Lit, NodeValue::Str("b".into()), vec![], span());
        let seq = tree.alloc(NodeKind::Seq, NodeValue::None, vec![a, b], span());

        assert_eq!(tree.kind(seq), NodeKind::Seq);
        assert_eq!(tree.children(seq), &[a, b]);

        let mut seen = Vec::new();
        tree.walk(seq, &mut |id, _| seen.push(id));
        assert_eq!(seen, vec![seq, a, b]);
    }

    #[test]
    fn rewrites_keep_ids_stable() {
        let mut tree = Tree::new();
        let body = tree.alloc(NodeKind::Empty, NodeValue::None, vec![], span());
        let wrapper = tree.alloc(
            NodeKind::Leftrec,
            NodeValue::Str("expr".into()),
            vec![body],
            span(),
        );
        assert_eq!(tree.node(wrapper).children, vec![body]);
        assert_eq!(tree.kind(body), NodeKind::Empty);
    }

    #[test]
    fn pair_values() {
        assert_eq!(NodeValue::Pair(2, 5).as_pair(), (2, 5));
        assert_eq!(NodeValue::None.as_pair(), (0, 0));
        assert_eq!(NodeValue::Str("x".into()).as_str(), "x");
    }
}
