//! Pass 10: feature flags and dependency sets.
//!
//! Walks the settled tree and records which runtime capabilities the
//! grammar needs, so the interpreter only materializes the state it
//! will actually use.

use floyd_core::{FeatureFlags, IdentClass, NodeKind};
use indexmap::IndexSet;

use super::Analyzer;

pub(crate) fn run(az: &mut Analyzer) -> (FeatureFlags, IndexSet<String>) {
    let mut flags = FeatureFlags {
        lookup_needed: az.outer_used,
        ..FeatureFlags::default()
    };
    let mut builtin_fns = IndexSet::new();
    let mut builtin_rules = IndexSet::new();

    let bodies: Vec<_> = az.rules.values().copied().collect();
    for body in bodies {
        az.tree.walk(body, &mut |_, node| match node.kind {
            NodeKind::Set | NodeKind::Regexp => flags.re_needed = true,
            NodeKind::Unicat => {
                flags.re_needed = true;
                flags.unicodedata_needed = true;
            }
            NodeKind::Leftrec => flags.leftrec_needed = true,
            NodeKind::Any => {
                builtin_rules.insert("any".to_string());
            }
            NodeKind::End => {
                builtin_rules.insert("end".to_string());
            }
            NodeKind::EIdent => {
                if node.attrs.ident_class == Some(IdentClass::Function) {
                    builtin_fns.insert(node.value.as_str().to_string());
                }
            }
            _ => {}
        });
    }

    let needed_operators: IndexSet<String> = az.operators.keys().cloned().collect();
    flags.seeds_needed = flags.leftrec_needed || !needed_operators.is_empty();

    // Memoizability: everything except leftrec and operator rules.
    let work: Vec<_> = az.rules.values().copied().collect();
    for body in work {
        let memoize = !matches!(
            az.tree.kind(body),
            NodeKind::Leftrec | NodeKind::Operator
        );
        az.tree.node_mut(body).attrs.memoize = memoize;
    }

    az.needed_builtin_functions = builtin_fns;
    az.needed_builtin_rules = builtin_rules;
    (flags, needed_operators)
}
