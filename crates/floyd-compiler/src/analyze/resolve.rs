//! Pass 2: identifier resolution and qualifier rewriting.
//!
//! Rewrites postfix `e_qual` chains into nested `e_getitem_infix` /
//! `e_call_infix` applications, then classifies every `e_ident` as
//! local, outer, extern, or built-in function. Unknown identifiers are
//! compile errors.

use floyd_core::{IdentClass, NodeId, NodeKind};
use indexmap::IndexSet;

use super::Analyzer;

pub(crate) fn run(az: &mut Analyzer) {
    rewrite_quals(az);

    let roots: Vec<_> = az.rules.values().copied().collect();
    for root in roots {
        let mut frames = Vec::new();
        classify(az, root, &mut frames);
    }
}

// ----------------------------------------------------------------------
// Qualifier rewriting
// ----------------------------------------------------------------------

fn rewrite_quals(az: &mut Analyzer) {
    let mut quals = Vec::new();
    let roots: Vec<_> = az.rules.values().copied().collect();
    for root in roots {
        az.tree.walk(root, &mut |id, node| {
            if node.kind == NodeKind::EQual {
                quals.push(id);
            }
        });
    }
    // Inner chains first so nested quals are already rewritten when an
    // outer chain embeds them.
    for id in quals.into_iter().rev() {
        rewrite_qual(az, id);
    }
}

/// `e_qual(primary, suffix...)` becomes left-nested infix nodes; the
/// qual node itself is morphed into the outermost application so the
/// parent's child id stays valid.
fn rewrite_qual(az: &mut Analyzer, id: NodeId) {
    let children = az.tree.node(id).children.clone();
    debug_assert!(children.len() >= 2, "qual without suffixes");
    if children.len() < 2 {
        return;
    }

    let mut receiver = children[0];
    for &suffix in &children[1..children.len() - 1] {
        receiver = apply_suffix(az, receiver, suffix);
    }

    let last = children[children.len() - 1];
    let (kind, new_children) = suffix_shape(az, receiver, last);
    let node = az.tree.node_mut(id);
    node.kind = kind;
    node.children = new_children;
}

fn apply_suffix(az: &mut Analyzer, receiver: NodeId, suffix: NodeId) -> NodeId {
    let (kind, children) = suffix_shape(az, receiver, suffix);
    let span = az.tree.node(suffix).span;
    az.tree.alloc(kind, floyd_core::NodeValue::None, children, span)
}

fn suffix_shape(az: &Analyzer, receiver: NodeId, suffix: NodeId) -> (NodeKind, Vec<NodeId>) {
    let node = az.tree.node(suffix);
    match node.kind {
        NodeKind::EGetitem => (NodeKind::EGetitemInfix, vec![receiver, node.children[0]]),
        NodeKind::ECall => {
            let mut children = vec![receiver];
            children.extend_from_slice(&node.children);
            (NodeKind::ECallInfix, children)
        }
        _ => (NodeKind::EParen, vec![receiver]),
    }
}

// ----------------------------------------------------------------------
// Classification
// ----------------------------------------------------------------------

struct Frame {
    labels: IndexSet<String>,
    arity: usize,
}

fn classify(az: &mut Analyzer, id: NodeId, frames: &mut Vec<Frame>) {
    let node = az.tree.node(id);
    let kind = node.kind;
    let children = node.children.clone();

    match kind {
        NodeKind::Seq => {
            frames.push(seq_frame(az, &children));
            for child in children {
                classify(az, child, frames);
            }
            frames.pop();
        }
        NodeKind::Action | NodeKind::Pred | NodeKind::Equals => {
            classify_expr(az, children[0], frames);
        }
        _ => {
            for child in children {
                classify(az, child, frames);
            }
        }
    }
}

/// Labels visible inside a sequence: explicit labels on its direct
/// children (possibly nested in wrappers, but not across an inner
/// sequence boundary).
fn seq_frame(az: &Analyzer, children: &[NodeId]) -> Frame {
    let mut labels = IndexSet::new();
    for &child in children {
        collect_labels(az, child, &mut labels);
    }
    Frame {
        labels,
        arity: children.len(),
    }
}

fn collect_labels(az: &Analyzer, id: NodeId, out: &mut IndexSet<String>) {
    let node = az.tree.node(id);
    match node.kind {
        NodeKind::Seq => {} // inner sequence, new binding frame
        NodeKind::Label => {
            out.insert(node.value.as_str().to_string());
            for &child in &node.children {
                collect_labels(az, child, out);
            }
        }
        NodeKind::Action | NodeKind::Pred | NodeKind::Equals => {}
        _ => {
            for &child in &node.children {
                collect_labels(az, child, out);
            }
        }
    }
}

fn classify_expr(az: &mut Analyzer, id: NodeId, frames: &[Frame]) {
    let node = az.tree.node(id);
    let kind = node.kind;
    let children = node.children.clone();

    match kind {
        NodeKind::EIdent => {
            let name = node.value.as_str().to_string();
            let span = node.span;
            let class = resolve_ident(az, &name, frames);
            match class {
                Some(class) => {
                    if class == IdentClass::Outer {
                        az.outer_used = true;
                    }
                    az.tree.node_mut(id).attrs.ident_class = Some(class);
                }
                None => az.error(format!("unknown identifier `{name}`"), span),
            }
        }
        NodeKind::ECallInfix => {
            let callee = children[0];
            let callee_node = az.tree.node(callee);
            if callee_node.kind != NodeKind::EIdent {
                let span = callee_node.span;
                az.error("only named functions can be called", span);
            }
            for child in children {
                classify_expr(az, child, frames);
            }
            // A callable must resolve to a function or an extern.
            let callee_class = az.tree.node(callee).attrs.ident_class;
            if matches!(callee_class, Some(IdentClass::Local | IdentClass::Outer)) {
                let span = az.tree.node(callee).span;
                az.error("labels are not callable", span);
            }
        }
        _ => {
            for child in children {
                classify_expr(az, child, frames);
            }
        }
    }
}

fn resolve_ident(az: &Analyzer, name: &str, frames: &[Frame]) -> Option<IdentClass> {
    if let Some(rest) = name.strip_prefix('$') {
        // Positional labels only see the innermost sequence.
        let k: usize = rest.parse().ok()?;
        let frame = frames.last()?;
        return (k >= 1 && k <= frame.arity).then_some(IdentClass::Local);
    }

    if let Some(innermost) = frames.last()
        && innermost.labels.contains(name)
    {
        return Some(IdentClass::Local);
    }
    if frames
        .iter()
        .rev()
        .skip(1)
        .any(|frame| frame.labels.contains(name))
    {
        return Some(IdentClass::Outer);
    }
    if az.is_extern(name) {
        return Some(IdentClass::Extern);
    }
    if floyd_core::functions::is_builtin(name) {
        return Some(IdentClass::Function);
    }
    None
}
