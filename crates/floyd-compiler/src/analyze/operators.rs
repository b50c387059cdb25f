//! Pass 5: operator-rule rewriting.
//!
//! A rule whose body is a choice with alternatives of the shape
//! `head OP head [-> action]`, where `OP` has a `%prec` class, becomes
//! an `operator` node driven by the precedence climber. The remaining
//! alternatives form the generated operand choice, scanned as the
//! implicit highest precedence class. Rules rewritten here leave the
//! left-recursion discipline - the climber manages its own seeds.

use floyd_core::{Assoc, NodeId, NodeKind, NodeValue, OperatorClass, OperatorTable};
use indexmap::IndexMap;

use super::Analyzer;

pub(crate) fn run(az: &mut Analyzer) {
    if az.prec_classes.is_empty() {
        return;
    }
    let names: Vec<String> = az.rules.keys().cloned().collect();
    for name in names {
        rewrite_rule(az, &name);
    }
}

fn rewrite_rule(az: &mut Analyzer, name: &str) {
    let body = az.rules[name];
    // Look through a leftrec wrapper; operator alternatives are
    // left-recursive by construction.
    let (choice, wrapped) = match az.tree.kind(body) {
        NodeKind::Leftrec => (az.tree.node(body).children[0], true),
        _ => (body, false),
    };
    // A single-alternative choice collapses during lowering, so the
    // body may be the bare alternative.
    let alts = match az.tree.kind(choice) {
        NodeKind::Choice => az.tree.children(choice).to_vec(),
        _ => vec![choice],
    };
    let mut choices: IndexMap<String, NodeId> = IndexMap::new();
    let mut operands = Vec::new();
    for alt in alts {
        match operator_alt(az, name, alt) {
            Some(op) => {
                if choices.insert(op.clone(), alt).is_some() {
                    let span = az.tree.node(alt).span;
                    az.error(format!("duplicate alternative for operator `{op}`"), span);
                }
            }
            None => operands.push(alt),
        }
    }
    if choices.is_empty() {
        return;
    }

    let rule_span = az.tree.node(body).span;
    if operands.is_empty() {
        az.error(
            format!("operator rule `{name}` needs a non-operator alternative"),
            rule_span,
        );
        return;
    }

    let operand = match operands.len() {
        1 => operands[0],
        _ => az
            .tree
            .alloc(NodeKind::Choice, NodeValue::None, operands, rule_span),
    };

    let classes = build_classes(az, name, &choices, rule_span);

    let operator = az.tree.alloc(
        NodeKind::Operator,
        NodeValue::Str(name.to_string()),
        vec![choice],
        rule_span,
    );
    az.rules[name] = operator;
    if wrapped {
        az.leftrec_rules.swap_remove(name);
    }
    az.operators.insert(
        name.to_string(),
        OperatorTable {
            classes,
            choices,
            operand,
        },
    );
}

/// Does this alternative have the `head OP head [action]` shape for a
/// `%prec`-declared operator? Returns the operator literal.
fn operator_alt(az: &Analyzer, rule: &str, alt: NodeId) -> Option<String> {
    let node = az.tree.node(alt);
    if node.kind != NodeKind::Seq {
        return None;
    }
    let ch = &node.children;
    if ch.len() != 3 && ch.len() != 4 {
        return None;
    }
    if !is_apply_of(az, ch[0], rule) || !is_apply_of(az, ch[2], rule) {
        return None;
    }
    if ch.len() == 4 && az.tree.kind(ch[3]) != NodeKind::Action {
        return None;
    }
    let op_node = az.tree.node(ch[1]);
    if op_node.kind != NodeKind::Lit {
        return None;
    }
    let op = op_node.value.as_str();
    az.prec_classes
        .iter()
        .flatten()
        .any(|declared| declared == op)
        .then(|| op.to_string())
}

fn is_apply_of(az: &Analyzer, id: NodeId, rule: &str) -> bool {
    let node = az.tree.node(id);
    node.kind == NodeKind::Apply && node.value.as_str() == rule
}

/// Precedence classes for one rule, highest first: each `%prec` line
/// declares a class binding tighter than the lines before it. A class
/// mixing left- and right-associative operators is ill-formed.
fn build_classes(
    az: &mut Analyzer,
    rule: &str,
    choices: &IndexMap<String, NodeId>,
    span: rowan::TextRange,
) -> Vec<OperatorClass> {
    let mut classes = Vec::new();
    let prec_classes = az.prec_classes.clone();
    for (idx, declared) in prec_classes.iter().enumerate().rev() {
        let ops: Vec<String> = declared
            .iter()
            .filter(|op| choices.contains_key(op.as_str()))
            .cloned()
            .collect();
        if ops.is_empty() {
            continue;
        }
        let rassoc_count = ops
            .iter()
            .filter(|op| az.assoc.get(op.as_str()) == Some(&Assoc::Right))
            .count();
        if rassoc_count != 0 && rassoc_count != ops.len() {
            az.error(
                format!(
                    "rule `{rule}` mixes left- and right-associative operators in one precedence class"
                ),
                span,
            );
        }
        classes.push(OperatorClass {
            prec: idx as i64 + 1,
            ops,
            rassoc: rassoc_count != 0,
        });
    }
    classes
}
