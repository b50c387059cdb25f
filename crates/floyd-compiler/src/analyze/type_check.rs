//! Pass 9: host-expression type checking.
//!
//! Infers a type for every host-expression node over the lattice
//! `null | bool | int | float | str | list[T] | dict[str, T] | any`
//! and reports mismatches that are certain without `any`. Labels and
//! extern calls infer as `any`; const externs take their default's
//! type.

use floyd_core::functions;
use floyd_core::{IdentClass, NodeId, NodeKind, Type, Value};

use super::Analyzer;

pub(crate) fn run(az: &mut Analyzer) {
    let bodies: Vec<NodeId> = az.rules.values().copied().collect();
    for body in bodies {
        check_matching(az, body);
    }
}

fn check_matching(az: &mut Analyzer, id: NodeId) {
    let kind = az.tree.kind(id);
    let children = az.tree.node(id).children.clone();
    match kind {
        NodeKind::Action => {
            infer(az, children[0]);
        }
        NodeKind::Pred => {
            let ty = infer(az, children[0]);
            if !Type::Bool.accepts(&ty) {
                let span = az.tree.node(children[0]).span;
                az.error(format!("predicate must be boolean, found {ty}"), span);
            }
        }
        NodeKind::Equals => {
            let ty = infer(az, children[0]);
            if !Type::Str.accepts(&ty) {
                let span = az.tree.node(children[0]).span;
                az.error(format!("`={{...}}` needs a string, found {ty}"), span);
            }
        }
        _ => {
            for child in children {
                check_matching(az, child);
            }
        }
    }
}

fn infer(az: &mut Analyzer, id: NodeId) -> Type {
    let kind = az.tree.kind(id);
    let children = az.tree.node(id).children.clone();
    let span = az.tree.node(id).span;

    let ty = match kind {
        NodeKind::EConst => match az.tree.node(id).value.as_str() {
            "true" | "false" => Type::Bool,
            _ => Type::Null,
        },
        NodeKind::ENum => match az.tree.node(id).value {
            floyd_core::NodeValue::Float(_) => Type::Float,
            _ => Type::Int,
        },
        NodeKind::ELit => Type::Str,
        NodeKind::EIdent => ident_type(az, id),
        NodeKind::EArr => {
            let mut elem: Option<Type> = None;
            for child in children {
                let t = infer(az, child);
                elem = Some(match elem {
                    Some(prev) => prev.join(&t),
                    None => t,
                });
            }
            Type::list_of(elem.unwrap_or(Type::Any))
        }
        NodeKind::EParen => infer(az, children[0]),
        NodeKind::ENot => {
            infer(az, children[0]);
            Type::Bool
        }
        NodeKind::EPlus => {
            let lhs = infer(az, children[0]);
            let rhs = infer(az, children[1]);
            plus_type(az, lhs, rhs, span)
        }
        NodeKind::EMinus => {
            let lhs = infer(az, children[0]);
            let rhs = infer(az, children[1]);
            if !lhs.is_numeric() || !rhs.is_numeric() {
                az.error(format!("cannot subtract {rhs} from {lhs}"), span);
                Type::Any
            } else if lhs == Type::Float || rhs == Type::Float {
                Type::Float
            } else if lhs == Type::Any || rhs == Type::Any {
                Type::Any
            } else {
                Type::Int
            }
        }
        NodeKind::EGetitemInfix => {
            let obj = infer(az, children[0]);
            let key = infer(az, children[1]);
            getitem_type(az, obj, key, span)
        }
        NodeKind::ECallInfix => call_type(az, &children, span),
        _ => Type::Any,
    };

    az.tree.node_mut(id).attrs.ty = Some(ty.clone());
    ty
}

fn ident_type(az: &Analyzer, id: NodeId) -> Type {
    let node = az.tree.node(id);
    match node.attrs.ident_class {
        Some(IdentClass::Local | IdentClass::Outer) => Type::Any,
        Some(IdentClass::Extern) => match az.extern_default(node.value.as_str()) {
            Some(Value::Bool(_)) => Type::Bool,
            Some(Value::Int(_)) => Type::Int,
            Some(Value::Float(_)) => Type::Float,
            Some(Value::Str(_)) => Type::Str,
            _ => Type::Any,
        },
        _ => Type::Any,
    }
}

fn plus_type(az: &mut Analyzer, lhs: Type, rhs: Type, span: rowan::TextRange) -> Type {
    if lhs == Type::Any || rhs == Type::Any {
        return Type::Any;
    }
    match (&lhs, &rhs) {
        (Type::Str, Type::Str) => Type::Str,
        _ if lhs.is_numeric() && rhs.is_numeric() => {
            if lhs == Type::Float || rhs == Type::Float {
                Type::Float
            } else {
                Type::Int
            }
        }
        _ => {
            az.error(format!("cannot add {lhs} and {rhs}"), span);
            Type::Any
        }
    }
}

fn getitem_type(az: &mut Analyzer, obj: Type, key: Type, span: rowan::TextRange) -> Type {
    match obj {
        Type::List(elem) => {
            if !Type::Int.accepts(&key) {
                az.error(format!("list index must be int, found {key}"), span);
            }
            *elem
        }
        Type::Dict(elem) => {
            if !Type::Str.accepts(&key) {
                az.error(format!("dict key must be str, found {key}"), span);
            }
            *elem
        }
        Type::Any => Type::Any,
        other => {
            az.error(format!("cannot index into {other}"), span);
            Type::Any
        }
    }
}

fn call_type(az: &mut Analyzer, children: &[NodeId], span: rowan::TextRange) -> Type {
    let callee = children[0];
    let args = &children[1..];
    let arg_types: Vec<Type> = args.iter().map(|&arg| infer(az, arg)).collect();

    let callee_node = az.tree.node(callee);
    if callee_node.kind != NodeKind::EIdent {
        return Type::Any;
    }
    let name = callee_node.value.as_str().to_string();
    let class = callee_node.attrs.ident_class;

    // Externs shadow built-ins; their signatures are unknown.
    if class == Some(IdentClass::Extern) {
        return Type::Any;
    }

    let Some(sig) = functions::signature(&name) else {
        return Type::Any;
    };

    if !sig.available {
        az.error(
            format!("built-in `{name}` needs Unicode tables this implementation does not ship"),
            span,
        );
        return Type::Any;
    }

    if sig.variadic {
        if let Some(param) = sig.params.last() {
            for (i, arg) in arg_types.iter().enumerate() {
                if !param.accepts(arg) {
                    let arg_span = az.tree.node(args[i]).span;
                    az.error(format!("`{name}` expects {param}, found {arg}"), arg_span);
                }
            }
        }
    } else {
        if arg_types.len() != sig.params.len() {
            az.error(
                format!(
                    "`{name}` takes {} argument(s), found {}",
                    sig.params.len(),
                    arg_types.len()
                ),
                span,
            );
        }
        for (i, (param, arg)) in sig.params.iter().zip(&arg_types).enumerate() {
            if !param.accepts(arg) {
                let arg_span = az.tree.node(args[i]).span;
                az.error(format!("`{name}` expects {param}, found {arg}"), arg_span);
            }
        }
    }

    sig.ret.clone()
}
