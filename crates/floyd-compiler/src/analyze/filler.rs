//! Pass 6: filler installation.
//!
//! When `%whitespace` / `%comment` are declared, synthesizes the
//! `_whitespace` / `_comment` / `_filler` rules and splices an
//! `apply(_filler)` in front of every literal-matching leaf inside
//! non-token rules. Token rules - the `%tokens` closure - are left
//! untouched, as are the filler rules themselves.
//!
//! Wrapping morphs the leaf node in place (the leaf's content moves to
//! a fresh node and the old id becomes the wrapper sequence), so ids
//! held elsewhere - the operator tables in particular - keep pointing
//! at the right thing.

use floyd_core::{NodeId, NodeKind, NodeValue};
use indexmap::IndexSet;

use super::Analyzer;

pub(crate) const WHITESPACE_RULE: &str = "_whitespace";
pub(crate) const COMMENT_RULE: &str = "_comment";
pub(crate) const FILLER_RULE: &str = "_filler";

pub(crate) fn run(az: &mut Analyzer) {
    if az.whitespace.is_none() && az.comment.is_none() {
        az.tokens = az.token_names.iter().map(|(n, _)| n.clone()).collect();
        close_over_applies(az);
        return;
    }

    synthesize_filler_rules(az);

    az.tokens = az.token_names.iter().map(|(n, _)| n.clone()).collect();
    az.tokens.insert(WHITESPACE_RULE.to_string());
    az.tokens.insert(COMMENT_RULE.to_string());
    az.tokens.insert(FILLER_RULE.to_string());
    close_over_applies(az);

    let work: Vec<NodeId> = az
        .rules
        .iter()
        .filter(|(name, _)| !az.tokens.contains(name.as_str()))
        .map(|(_, &body)| body)
        .collect();
    for body in work {
        insert_filler(az, body);
        if wants_filler(az, body) {
            morph_into_filler_seq(az, body);
        }
    }
}

fn synthesize_filler_rules(az: &mut Analyzer) {
    for reserved in [WHITESPACE_RULE, COMMENT_RULE, FILLER_RULE] {
        if let Some(&span) = az.rule_spans.get(reserved) {
            az.error(
                format!("rule name `{reserved}` is reserved for filler"),
                span,
            );
        }
    }

    let span = az.tree.node(az.root).span;
    let mut filler_alts = Vec::new();
    if let Some(ws) = az.whitespace {
        az.rules.insert(WHITESPACE_RULE.to_string(), ws);
        filler_alts.push(az.tree.alloc(
            NodeKind::Apply,
            NodeValue::Str(WHITESPACE_RULE.to_string()),
            vec![],
            span,
        ));
    }
    if let Some(comment) = az.comment {
        az.rules.insert(COMMENT_RULE.to_string(), comment);
        filler_alts.push(az.tree.alloc(
            NodeKind::Apply,
            NodeValue::Str(COMMENT_RULE.to_string()),
            vec![],
            span,
        ));
    }

    let inner = match filler_alts.len() {
        1 => filler_alts[0],
        _ => az
            .tree
            .alloc(NodeKind::Choice, NodeValue::None, filler_alts, span),
    };
    let star = az
        .tree
        .alloc(NodeKind::Star, NodeValue::None, vec![inner], span);
    az.rules.insert(FILLER_RULE.to_string(), star);
}

/// Extend the token set over every rule reachable from a token: filler
/// inside a token's helpers would reintroduce the whitespace the
/// pragma suppresses.
fn close_over_applies(az: &mut Analyzer) {
    let mut queue: Vec<String> = az.tokens.iter().cloned().collect();
    let mut seen: IndexSet<String> = az.tokens.clone();
    while let Some(name) = queue.pop() {
        let Some(&body) = az.rules.get(&name) else {
            continue;
        };
        let mut applied = Vec::new();
        az.tree.walk(body, &mut |_, node| {
            if node.kind == NodeKind::Apply {
                applied.push(node.value.as_str().to_string());
            }
        });
        for target in applied {
            if seen.insert(target.clone()) {
                queue.push(target);
            }
        }
    }
    az.tokens = seen;
}

/// Does this node get a filler application spliced in front of it?
/// Literal-matching leaves do, and so do applications of token rules -
/// a token is a lexical atom, spaced like a literal.
fn wants_filler(az: &Analyzer, id: NodeId) -> bool {
    let node = az.tree.node(id);
    match node.kind {
        NodeKind::Lit
        | NodeKind::Range
        | NodeKind::Set
        | NodeKind::Regexp
        | NodeKind::Unicat
        | NodeKind::End => true,
        NodeKind::Apply => !node.attrs.filler && az.tokens.contains(node.value.as_str()),
        _ => false,
    }
}

fn insert_filler(az: &mut Analyzer, id: NodeId) {
    let kind = az.tree.kind(id);
    // Host expressions have their own leaf kinds; skip the subtrees.
    if matches!(kind, NodeKind::Action | NodeKind::Pred | NodeKind::Equals) {
        return;
    }
    let children = az.tree.node(id).children.clone();
    for child in children {
        insert_filler(az, child);
        if wants_filler(az, child) {
            morph_into_filler_seq(az, child);
        }
    }
}

/// Move the leaf's content to a fresh node and turn `id` into
/// `seq(apply(_filler), leaf)`.
fn morph_into_filler_seq(az: &mut Analyzer, id: NodeId) {
    let node = az.tree.node(id).clone();
    let span = node.span;
    let leaf = az
        .tree
        .alloc(node.kind, node.value, node.children, span);
    az.tree.node_mut(leaf).attrs = node.attrs;

    let filler = az.tree.alloc(
        NodeKind::Apply,
        NodeValue::Str(FILLER_RULE.to_string()),
        vec![],
        span,
    );
    az.tree.node_mut(filler).attrs.filler = true;

    let wrapper = az.tree.node_mut(id);
    wrapper.kind = NodeKind::Seq;
    wrapper.value = NodeValue::None;
    wrapper.children = vec![filler, leaf];
    wrapper.attrs = Default::default();
    wrapper.attrs.filler = true;
}
