//! Pass 7: label materialization and scope wrapping.
//!
//! Sequences that bind labels - explicitly with `term:name`, or
//! positionally through `$k` references in their actions and
//! predicates - get the positional labels materialized as `label`
//! nodes and the whole sequence wrapped in a `scope` frame. Filler
//! wrappers installed by the previous pass preserve child positions,
//! so `$k` still counts declaration order.
//!
//! Scope wrapping morphs the sequence node in place (its content moves
//! to a fresh node and the old id becomes the `scope`), keeping the
//! operator tables' node ids valid.

use floyd_core::{NodeId, NodeKind, NodeValue};
use indexmap::IndexSet;

use super::Analyzer;

pub(crate) fn run(az: &mut Analyzer) {
    let work: Vec<NodeId> = az.rules.values().copied().collect();
    for body in work {
        transform(az, body);
    }
}

fn transform(az: &mut Analyzer, id: NodeId) {
    let kind = az.tree.kind(id);
    if matches!(kind, NodeKind::Action | NodeKind::Pred | NodeKind::Equals) {
        return;
    }

    let children = az.tree.node(id).children.clone();
    for child in children {
        transform(az, child);
    }

    if kind != NodeKind::Seq || az.tree.node(id).attrs.filler {
        return;
    }

    let children = az.tree.node(id).children.clone();
    let mut positions = IndexSet::new();
    let mut has_explicit = false;
    for &child in &children {
        scan_bindings(az, child, &mut positions, &mut has_explicit);
    }

    if positions.is_empty() && !has_explicit {
        return;
    }

    // Materialize `$k` as a label on the k-th child.
    for k in positions {
        let idx = k - 1;
        if idx >= children.len() {
            continue; // resolution already rejected it
        }
        let child = az.tree.node(id).children[idx];
        let span = az.tree.node(child).span;
        let label = az.tree.alloc(
            NodeKind::Label,
            NodeValue::Str(format!("${k}")),
            vec![child],
            span,
        );
        az.tree.node_mut(id).children[idx] = label;
    }

    morph_into_scope(az, id);
}

/// Move the sequence's content to a fresh node and turn `id` into
/// `scope(seq)`.
fn morph_into_scope(az: &mut Analyzer, id: NodeId) {
    let node = az.tree.node(id).clone();
    let span = node.span;
    let inner = az
        .tree
        .alloc(node.kind, node.value, node.children, span);
    az.tree.node_mut(inner).attrs = node.attrs;

    let scope = az.tree.node_mut(id);
    scope.kind = NodeKind::Scope;
    scope.value = NodeValue::None;
    scope.children = vec![inner];
    scope.attrs = Default::default();
}

/// Collects binding evidence without crossing into a nested sequence
/// (which has its own frame).
fn scan_bindings(
    az: &Analyzer,
    id: NodeId,
    positions: &mut IndexSet<usize>,
    has_explicit: &mut bool,
) {
    let node = az.tree.node(id);
    match node.kind {
        NodeKind::Seq if !node.attrs.filler => {}
        NodeKind::Scope => {}
        NodeKind::Label => {
            *has_explicit = true;
            for &child in &node.children {
                scan_bindings(az, child, positions, has_explicit);
            }
        }
        NodeKind::Action | NodeKind::Pred | NodeKind::Equals => {
            scan_dollar_refs(az, node.children[0], positions);
        }
        _ => {
            for &child in &node.children {
                scan_bindings(az, child, positions, has_explicit);
            }
        }
    }
}

fn scan_dollar_refs(az: &Analyzer, id: NodeId, positions: &mut IndexSet<usize>) {
    let node = az.tree.node(id);
    if node.kind == NodeKind::EIdent
        && let Some(rest) = node.value.as_str().strip_prefix('$')
        && let Ok(k) = rest.parse::<usize>()
        && k >= 1
    {
        positions.insert(k);
    }
    for &child in &node.children {
        scan_dollar_refs(az, child, positions);
    }
}
