//! Analyzed-grammar metadata.
//!
//! A [`Grammar`] is the compiler's output artifact: the decorated IR
//! tree plus everything the interpreter needs wired up front — rule
//! table, token set, extern declarations, operator tables, and the
//! capability flags that decide which runtime state gets materialized.
//! It is read-only after analysis and safely sharable across parses.

use indexmap::{IndexMap, IndexSet};

use crate::node::{NodeId, NodeKind, NodeValue, Tree};
use crate::value::Value;

/// Index of a rule in declaration order.
pub type RuleId = usize;

/// Kind of a caller-supplied hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternKind {
    /// A plain value with a declared default.
    Const,
    /// A callable.
    Func,
    /// A callable that receives the parser as an implicit first
    /// argument.
    PFunc,
}

/// A declared extern, from a `%externs` pragma.
#[derive(Debug, Clone)]
pub struct ExternDecl {
    pub kind: ExternKind,
    /// Default value for `const` externs; `Null` otherwise.
    pub default: Value,
}

/// One precedence class of an operator rule.
///
/// Classes are stored highest-precedence first; ties within a class
/// resolve by declaration order of `ops`.
#[derive(Debug, Clone)]
pub struct OperatorClass {
    pub prec: i64,
    pub ops: Vec<String>,
    pub rassoc: bool,
}

/// Precedence-climbing tables for one operator rule.
#[derive(Debug, Clone)]
pub struct OperatorTable {
    pub classes: Vec<OperatorClass>,
    /// Operator literal → the generated subrule matching
    /// `head op head`.
    pub choices: IndexMap<String, NodeId>,
    /// The generated choice over alternatives not led by the head;
    /// scanned as the implicit highest class.
    pub operand: NodeId,
}

/// Capability flags: what runtime state a parse of this grammar needs.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureFlags {
    /// Compiled character classes / regexes are used.
    pub re_needed: bool,
    /// At least one left-recursive rule.
    pub leftrec_needed: bool,
    /// Seed table required (left recursion or operator rules).
    pub seeds_needed: bool,
    /// Some identifier resolves outside its innermost scope.
    pub lookup_needed: bool,
    /// Unicode category matching is used.
    pub unicodedata_needed: bool,
}

/// The analyzed grammar.
#[derive(Debug, Clone)]
pub struct Grammar {
    pub tree: Tree,
    /// Rule name → body node, in declaration order.
    pub rules: IndexMap<String, NodeId>,
    /// The first non-pragma rule.
    pub starting_rule: String,
    /// Rules (and their reachable helpers) exempt from filler.
    pub tokens: IndexSet<String>,
    pub externs: IndexMap<String, ExternDecl>,
    /// Per-rule precedence tables, keyed by operator-rule name.
    pub operators: IndexMap<String, OperatorTable>,
    pub needed_builtin_functions: IndexSet<String>,
    /// Subset of `{"any", "end"}` actually applied.
    pub needed_builtin_rules: IndexSet<String>,
    /// Operator-rule names, for interpreter wiring.
    pub needed_operators: IndexSet<String>,
    pub flags: FeatureFlags,
}

impl Grammar {
    pub fn rule_id(&self, name: &str) -> Option<RuleId> {
        self.rules.get_index_of(name)
    }

    pub fn rule_body(&self, id: RuleId) -> Option<NodeId> {
        self.rules.get_index(id).map(|(_, &body)| body)
    }

    pub fn rule_name(&self, id: RuleId) -> Option<&str> {
        self.rules.get_index(id).map(|(name, _)| name.as_str())
    }

    /// Debug rendering of every rule as an s-expression.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for (name, &body) in &self.rules {
            out.push_str(name);
            out.push_str(" = ");
            render(&self.tree, body, &mut out);
            out.push('\n');
        }
        out
    }

    /// Debug rendering of a single node.
    pub fn dump_node(&self, id: NodeId) -> String {
        let mut out = String::new();
        render(&self.tree, id, &mut out);
        out
    }
}

fn render(tree: &Tree, id: NodeId, out: &mut String) {
    let node = tree.node(id);
    out.push('(');
    out.push_str(kind_tag(node.kind));
    match &node.value {
        NodeValue::None => {}
        NodeValue::Str(s) => {
            out.push(' ');
            out.push_str(&format!("{s:?}"));
        }
        NodeValue::Int(i) => {
            out.push(' ');
            out.push_str(&i.to_string());
        }
        NodeValue::Float(x) => {
            out.push(' ');
            out.push_str(&x.to_string());
        }
        NodeValue::Pair(a, b) => {
            out.push_str(&format!(" {a} {b}"));
        }
    }
    for &child in &node.children {
        out.push(' ');
        render(tree, child, out);
    }
    out.push(')');
}

fn kind_tag(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Rules => "rules",
        NodeKind::Rule => "rule",
        NodeKind::Pragma => "pragma",
        NodeKind::Seq => "seq",
        NodeKind::Choice => "choice",
        NodeKind::Empty => "empty",
        NodeKind::Paren => "paren",
        NodeKind::Apply => "apply",
        NodeKind::Action => "action",
        NodeKind::Pred => "pred",
        NodeKind::Equals => "equals",
        NodeKind::Label => "label",
        NodeKind::Scope => "scope",
        NodeKind::Operator => "operator",
        NodeKind::Leftrec => "leftrec",
        NodeKind::RuleWrapper => "rule_wrapper",
        NodeKind::Any => "any",
        NodeKind::End => "end",
        NodeKind::Lit => "lit",
        NodeKind::Range => "range",
        NodeKind::Set => "set",
        NodeKind::Regexp => "regexp",
        NodeKind::Unicat => "unicat",
        NodeKind::Run => "run",
        NodeKind::Opt => "opt",
        NodeKind::Star => "star",
        NodeKind::Plus => "plus",
        NodeKind::Count => "count",
        NodeKind::Not => "not",
        NodeKind::NotOne => "not_one",
        NodeKind::EndsIn => "ends_in",
        NodeKind::EConst => "e_const",
        NodeKind::ENum => "e_num",
        NodeKind::ELit => "e_lit",
        NodeKind::EIdent => "e_ident",
        NodeKind::EArr => "e_arr",
        NodeKind::EParen => "e_paren",
        NodeKind::EGetitem => "e_getitem",
        NodeKind::EGetitemInfix => "e_getitem_infix",
        NodeKind::ECall => "e_call",
        NodeKind::ECallInfix => "e_call_infix",
        NodeKind::EPlus => "e_plus",
        NodeKind::EMinus => "e_minus",
        NodeKind::ENot => "e_not",
        NodeKind::EQual => "e_qual",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowan::TextRange;

    #[test]
    fn dump_renders_rules() {
        let mut tree = Tree::new();
        let span = TextRange::empty(0.into());
        let lit = tree.alloc(NodeKind::Lit, NodeValue::Str("foo".into()), vec![], span);
        let end = tree.alloc(NodeKind::End, NodeValue::None, vec![], span);
        let seq = tree.alloc(NodeKind::Seq, NodeValue::None, vec![lit, end], span);

        let mut rules = IndexMap::new();
        rules.insert("g".to_string(), seq);
        let grammar = Grammar {
            tree,
            rules,
            starting_rule: "g".to_string(),
            tokens: IndexSet::new(),
            externs: IndexMap::new(),
            operators: IndexMap::new(),
            needed_builtin_functions: IndexSet::new(),
            needed_builtin_rules: IndexSet::new(),
            needed_operators: IndexSet::new(),
            flags: FeatureFlags::default(),
        };

        assert_eq!(grammar.dump(), "g = (seq (lit \"foo\") (end))\n");
        assert_eq!(grammar.rule_id("g"), Some(0));
        assert_eq!(grammar.rule_name(0), Some("g"));
    }
}
