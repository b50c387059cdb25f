//! Pass 1: drain pragmas into grammar metadata and build the rule
//! table.

use floyd_core::{Assoc, NodeKind};

use super::Analyzer;

pub(crate) fn collect(az: &mut Analyzer) {
    let items = az.tree.children(az.root).to_vec();
    for item in items {
        match az.tree.kind(item) {
            NodeKind::Rule => collect_rule(az, item),
            NodeKind::Pragma => collect_pragma(az, item),
            _ => {}
        }
    }

    if az.rules.is_empty() {
        let span = az.tree.node(az.root).span;
        az.error("grammar defines no rules", span);
        return;
    }

    validate_applies(az);
    normalize_builtin_rules(az);
    validate_token_names(az);
}

fn collect_rule(az: &mut Analyzer, item: floyd_core::NodeId) {
    let node = az.tree.node(item);
    let name = node.value.as_str().to_string();
    let span = node.span;
    let body = node.children[0];

    if let Some(&first_span) = az.rule_spans.get(&name) {
        az.diagnostics
            .error(format!("duplicate rule `{name}`"), span)
            .related_to("first defined here", first_span)
            .emit();
        return;
    }
    if az.starting_rule.is_empty() {
        az.starting_rule = name.clone();
    }
    az.rule_spans.insert(name.clone(), span);
    az.rules.insert(name, body);
}

fn collect_pragma(az: &mut Analyzer, item: floyd_core::NodeId) {
    let node = az.tree.node(item);
    let name = node.value.as_str().to_string();
    let span = node.span;
    let children = node.children.clone();

    match name.as_str() {
        "whitespace" => {
            if az.whitespace.replace(children[0]).is_some() {
                az.error("duplicate `%whitespace` pragma", span);
            }
        }
        "comment" => {
            if az.comment.replace(children[0]).is_some() {
                az.error("duplicate `%comment` pragma", span);
            }
        }
        "tokens" => {
            for child in children {
                let node = az.tree.node(child);
                az.token_names
                    .push((node.value.as_str().to_string(), node.span));
            }
        }
        "externs" => {
            for child in children {
                let node = az.tree.node(child);
                let name = node.value.as_str().to_string();
                let default = node.children[0];
                az.extern_entries.push((name, default, node.span));
            }
        }
        "prec" => {
            let ops = children
                .iter()
                .map(|&c| az.tree.node(c).value.as_str().to_string())
                .collect::<Vec<_>>();
            for op in &ops {
                if az.prec_classes.iter().flatten().any(|o| o == op) {
                    az.error(format!("operator `{op}` already has a precedence"), span);
                }
            }
            az.prec_classes.push(ops);
        }
        "assoc" => {
            if children.len() == 2 {
                let op = az.tree.node(children[0]).value.as_str().to_string();
                let dir = az.tree.node(children[1]).value.as_str();
                let assoc = if dir == "right" { Assoc::Right } else { Assoc::Left };
                if az.assoc.insert(op.clone(), assoc).is_some() {
                    az.error(format!("duplicate `%assoc` for `{op}`"), span);
                }
            }
        }
        _ => {}
    }
}

/// Rule bodies plus the filler bodies that become rules later.
fn analysis_roots(az: &Analyzer) -> Vec<floyd_core::NodeId> {
    let mut roots: Vec<_> = az.rules.values().copied().collect();
    roots.extend(az.whitespace);
    roots.extend(az.comment);
    roots
}

/// Every applied rule must exist; `any` and `end` are built in unless
/// shadowed.
fn validate_applies(az: &mut Analyzer) {
    let mut missing = Vec::new();
    let roots = analysis_roots(az);
    for root in roots {
        az.tree.walk(root, &mut |_, node| {
            if node.kind == NodeKind::Apply {
                let name = node.value.as_str();
                if !az.rules.contains_key(name) && name != "any" && name != "end" {
                    missing.push((name.to_string(), node.span));
                }
            }
        });
    }
    for (name, span) in missing {
        az.error(format!("unknown rule `{name}`"), span);
    }
}

/// `any` and `end` are rules only by spelling; unless the grammar
/// shadows them they become their own node kinds, which is what the
/// rest of the pipeline dispatches on.
fn normalize_builtin_rules(az: &mut Analyzer) {
    let mut builtins = Vec::new();
    let roots = analysis_roots(az);
    for root in roots {
        az.tree.walk(root, &mut |id, node| {
            if node.kind == NodeKind::Apply {
                let name = node.value.as_str();
                if (name == "any" || name == "end") && !az.rules.contains_key(name) {
                    builtins.push((id, name == "any"));
                }
            }
        });
    }
    for (id, is_any) in builtins {
        let node = az.tree.node_mut(id);
        node.kind = if is_any { NodeKind::Any } else { NodeKind::End };
        node.value = floyd_core::NodeValue::None;
    }
}

fn validate_token_names(az: &mut Analyzer) {
    let names = az.token_names.clone();
    for (name, span) in names {
        if !az.rules.contains_key(&name) {
            az.error(format!("`%tokens` names unknown rule `{name}`"), span);
        }
    }
}
