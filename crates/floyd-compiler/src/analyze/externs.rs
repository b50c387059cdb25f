//! Pass 3: extern validation.
//!
//! A declared extern's default is either a literal value (making it a
//! `const`), or the marker `func` / `pfunc`. Externs may shadow
//! built-in functions by name; duplicates are errors.

use floyd_core::{ExternDecl, ExternKind, NodeKind, NodeValue, Value};

use super::Analyzer;

pub(crate) fn run(az: &mut Analyzer) {
    let entries = az.extern_entries.clone();
    for (name, default, span) in entries {
        if az.externs.contains_key(&name) {
            az.error(format!("duplicate extern `{name}`"), span);
            continue;
        }
        let kind = az.tree.kind(default);
        let value = az.tree.node(default).value.clone();
        let decl = match (kind, &value) {
            (NodeKind::EIdent, NodeValue::Str(s)) if s == "func" => ExternDecl {
                kind: ExternKind::Func,
                default: Value::Null,
            },
            (NodeKind::EIdent, NodeValue::Str(s)) if s == "pfunc" => ExternDecl {
                kind: ExternKind::PFunc,
                default: Value::Null,
            },
            (NodeKind::EConst, NodeValue::Str(s)) => ExternDecl {
                kind: ExternKind::Const,
                default: match s.as_str() {
                    "true" => Value::Bool(true),
                    "false" => Value::Bool(false),
                    _ => Value::Null,
                },
            },
            (NodeKind::ENum, NodeValue::Int(i)) => ExternDecl {
                kind: ExternKind::Const,
                default: Value::Int(*i),
            },
            (NodeKind::ENum, NodeValue::Float(x)) => ExternDecl {
                kind: ExternKind::Const,
                default: Value::Float(*x),
            },
            (NodeKind::ELit, NodeValue::Str(s)) => ExternDecl {
                kind: ExternKind::Const,
                default: Value::Str(s.clone()),
            },
            _ => {
                az.error(
                    format!("extern `{name}` needs a literal default, `func`, or `pfunc`"),
                    span,
                );
                continue;
            }
        };
        az.externs.insert(name, decl);
    }
}
