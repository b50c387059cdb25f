//! Semantic analysis passes.
//!
//! A fixed pass chain transforms the lowered IR into an executable
//! [`Grammar`] (pass order is load-bearing):
//!
//! 1. Pragma collection and rule-table construction (`pragmas`)
//! 2. Identifier resolution and qualifier rewriting (`resolve`)
//! 3. Extern validation (`externs`)
//! 4. Left-recursion detection over the left-edge call graph
//!    (`recursion`)
//! 5. Operator-rule rewriting and precedence tables (`operators`)
//! 6. Filler installation (`filler`)
//! 7. Label materialization and scope wrapping (`labels`)
//! 8. Can-fail attribute propagation (`attrs`)
//! 9. Host-expression type checking (`type_check`)
//! 10. Feature flags and dependency sets (`flags`)

mod attrs;
mod externs;
mod filler;
mod flags;
mod labels;
mod operators;
mod pragmas;
mod recursion;
mod resolve;
mod type_check;

#[cfg(test)]
mod analyze_tests;

use floyd_core::{Assoc, ExternDecl, Grammar, NodeId, OperatorTable, Tree, Value};
use indexmap::{IndexMap, IndexSet};
use rowan::TextRange;

use crate::diagnostics::Diagnostics;

/// Analyze a lowered grammar tree.
///
/// Returns the grammar when no error-severity diagnostics were
/// produced; the diagnostics are returned either way.
pub fn analyze(tree: Tree, root: NodeId) -> (Option<Grammar>, Diagnostics) {
    let mut az = Analyzer {
        tree,
        root,
        diagnostics: Diagnostics::new(),
        rules: IndexMap::new(),
        rule_spans: IndexMap::new(),
        starting_rule: String::new(),
        whitespace: None,
        comment: None,
        token_names: Vec::new(),
        tokens: IndexSet::new(),
        extern_entries: Vec::new(),
        externs: IndexMap::new(),
        prec_classes: Vec::new(),
        assoc: IndexMap::new(),
        operators: IndexMap::new(),
        leftrec_rules: IndexSet::new(),
        outer_used: false,
        needed_builtin_functions: IndexSet::new(),
        needed_builtin_rules: IndexSet::new(),
    };

    pragmas::collect(&mut az);
    resolve::run(&mut az);
    externs::run(&mut az);

    // Identifier or structural errors make the rewriting passes
    // unreliable; stop here and report what we have.
    if az.diagnostics.has_errors() {
        return (None, az.diagnostics);
    }

    recursion::run(&mut az);
    operators::run(&mut az);
    filler::run(&mut az);
    labels::run(&mut az);
    attrs::run(&mut az);
    type_check::run(&mut az);
    let flags = flags::run(&mut az);

    if az.diagnostics.has_errors() {
        return (None, az.diagnostics);
    }

    let grammar = Grammar {
        tree: az.tree,
        rules: az.rules,
        starting_rule: az.starting_rule,
        tokens: az.tokens,
        externs: az.externs,
        operators: az.operators,
        needed_builtin_functions: az.needed_builtin_functions,
        needed_builtin_rules: az.needed_builtin_rules,
        needed_operators: flags.1,
        flags: flags.0,
    };
    (Some(grammar), az.diagnostics)
}

/// Shared state threaded through the passes.
pub(crate) struct Analyzer {
    pub(crate) tree: Tree,
    pub(crate) root: NodeId,
    pub(crate) diagnostics: Diagnostics,
    /// Rule name -> body node, in declaration order.
    pub(crate) rules: IndexMap<String, NodeId>,
    pub(crate) rule_spans: IndexMap<String, TextRange>,
    pub(crate) starting_rule: String,
    /// Body of `%whitespace`, if declared.
    pub(crate) whitespace: Option<NodeId>,
    /// Body of `%comment`, if declared.
    pub(crate) comment: Option<NodeId>,
    /// Declared `%tokens` names with their spans.
    pub(crate) token_names: Vec<(String, TextRange)>,
    /// Token closure: declared tokens plus rules reachable from them.
    pub(crate) tokens: IndexSet<String>,
    /// Raw `%externs` entries: name, default node, span.
    pub(crate) extern_entries: Vec<(String, NodeId, TextRange)>,
    pub(crate) externs: IndexMap<String, ExternDecl>,
    /// `%prec` classes in declaration order (last = highest).
    pub(crate) prec_classes: Vec<Vec<String>>,
    /// `%assoc` by operator literal or rule name.
    pub(crate) assoc: IndexMap<String, Assoc>,
    pub(crate) operators: IndexMap<String, OperatorTable>,
    pub(crate) leftrec_rules: IndexSet<String>,
    /// Some identifier resolves outside its innermost scope.
    pub(crate) outer_used: bool,
    pub(crate) needed_builtin_functions: IndexSet<String>,
    pub(crate) needed_builtin_rules: IndexSet<String>,
}

impl Analyzer {
    pub(crate) fn error(&mut self, message: impl Into<String>, span: TextRange) {
        self.diagnostics.error(message, span).emit();
    }

    /// Is `name` a declared extern?
    pub(crate) fn is_extern(&self, name: &str) -> bool {
        self.extern_entries.iter().any(|(n, _, _)| n == name)
    }

    /// Const-extern default value, used by the type checker.
    pub(crate) fn extern_default(&self, name: &str) -> Option<&Value> {
        self.externs.get(name).map(|decl| &decl.default)
    }
}
