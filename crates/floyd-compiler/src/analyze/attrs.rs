//! Pass 8: `can_fail` attribute propagation.
//!
//! Computed bottom-up with a fixpoint over `apply` edges (a rule's
//! failability depends on the rules it applies). Starts from the
//! pessimistic "everything can fail" and shrinks monotonically.

use floyd_core::{NodeId, NodeKind};
use indexmap::IndexMap;

use super::Analyzer;

pub(crate) fn run(az: &mut Analyzer) {
    let mut rule_can_fail: IndexMap<String, bool> =
        az.rules.keys().map(|name| (name.clone(), true)).collect();

    loop {
        let mut changed = false;
        let work: Vec<(String, NodeId)> = az
            .rules
            .iter()
            .map(|(name, &body)| (name.clone(), body))
            .collect();
        for (name, body) in work {
            let can_fail = compute(az, body, &rule_can_fail);
            if rule_can_fail[&name] != can_fail {
                rule_can_fail[&name] = can_fail;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    // Final annotation sweep with the settled rule table.
    let bodies: Vec<NodeId> = az.rules.values().copied().collect();
    for body in bodies {
        compute(az, body, &rule_can_fail);
    }
}

fn compute(az: &mut Analyzer, id: NodeId, rules: &IndexMap<String, bool>) -> bool {
    let kind = az.tree.kind(id);
    let children = az.tree.node(id).children.clone();

    let can_fail = match kind {
        NodeKind::Empty | NodeKind::Action | NodeKind::Opt | NodeKind::Star => {
            // Still recurse so children get annotated.
            for &child in &children {
                compute(az, child, rules);
            }
            false
        }
        NodeKind::Lit => !az.tree.node(id).value.as_str().is_empty(),
        NodeKind::Any
        | NodeKind::End
        | NodeKind::Range
        | NodeKind::Set
        | NodeKind::Regexp
        | NodeKind::Unicat
        | NodeKind::Pred
        | NodeKind::Equals
        | NodeKind::Not
        | NodeKind::NotOne
        | NodeKind::EndsIn => {
            for &child in &children {
                compute(az, child, rules);
            }
            true
        }
        NodeKind::Plus | NodeKind::Run | NodeKind::Paren | NodeKind::Label | NodeKind::Scope => {
            compute(az, children[0], rules)
        }
        NodeKind::Count => {
            let (min, _) = az.tree.node(id).value.as_pair();
            let child = compute(az, children[0], rules);
            min > 0 && child
        }
        NodeKind::Seq => {
            let mut any = false;
            for &child in &children {
                any |= compute(az, child, rules);
            }
            any
        }
        NodeKind::Choice => {
            let mut all = true;
            for &child in &children {
                all &= compute(az, child, rules);
            }
            all
        }
        NodeKind::Apply => {
            let name = az.tree.node(id).value.as_str();
            match name {
                "end" | "any" if !rules.contains_key(name) => true,
                _ => rules.get(name).copied().unwrap_or(true),
            }
        }
        NodeKind::Leftrec | NodeKind::Operator => {
            for &child in &children {
                compute(az, child, rules);
            }
            true
        }
        // Host-expression nodes don't participate.
        _ => false,
    };

    az.tree.node_mut(id).attrs.can_fail = can_fail;
    can_fail
}
