//! The host-expression evaluator.
//!
//! A small tree walker over the `e_*` nodes. Identifiers resolve in
//! order: innermost scope, outer scopes, externs, built-in functions.
//! `pos()` and `colno()` read the machine directly; everything else
//! delegates to the pure built-ins.

use floyd_core::{NodeId, NodeKind, Value, source};

use crate::builtins;
use crate::error::RuntimeError;
use crate::externs::{Extern, ParserView};

use super::Machine;

impl Machine<'_> {
    pub(crate) fn eval(&mut self, id: NodeId) -> Result<Value, RuntimeError> {
        self.tick()?;
        let grammar = self.grammar;
        let node = grammar.tree.node(id);
        match node.kind {
            NodeKind::EConst => Ok(match node.value.as_str() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ => Value::Null,
            }),
            NodeKind::ENum => Ok(match node.value {
                floyd_core::NodeValue::Float(x) => Value::Float(x),
                floyd_core::NodeValue::Int(i) => Value::Int(i),
                _ => Value::Int(0),
            }),
            NodeKind::ELit => Ok(Value::Str(node.value.as_str().to_string())),
            NodeKind::EIdent => self.ident_value(node.value.as_str()),
            NodeKind::EArr => {
                let mut items = Vec::with_capacity(node.children.len());
                for &child in &node.children {
                    items.push(self.eval(child)?);
                }
                Ok(Value::List(items))
            }
            NodeKind::EParen => self.eval(node.children[0]),
            NodeKind::ENot => {
                let value = self.eval(node.children[0])?;
                Ok(Value::Bool(!value.is_truthy()))
            }
            NodeKind::EPlus => {
                let lhs = self.eval(node.children[0])?;
                let rhs = self.eval(node.children[1])?;
                add(lhs, rhs)
            }
            NodeKind::EMinus => {
                let lhs = self.eval(node.children[0])?;
                let rhs = self.eval(node.children[1])?;
                subtract(lhs, rhs)
            }
            NodeKind::EGetitemInfix => {
                let object = self.eval(node.children[0])?;
                let key = self.eval(node.children[1])?;
                get_item(object, key)
            }
            NodeKind::ECallInfix => self.call(node.children[0], &node.children[1..]),
            other => Err(RuntimeError::host(format!(
                "matching node `{other:?}` in expression position"
            ))),
        }
    }

    /// Resolution order: innermost scope outward, externs, built-ins.
    fn ident_value(&mut self, name: &str) -> Result<Value, RuntimeError> {
        for frame in self.scopes.iter().rev() {
            if let Some(value) = frame.get(name) {
                return Ok(value.clone());
            }
        }
        if let Some(ext) = self.externs.get(name) {
            return match ext {
                Extern::Const(value) => Ok(value.clone()),
                Extern::Func(_) | Extern::PFunc(_) => Err(RuntimeError::host(format!(
                    "extern function `{name}` used as a value"
                ))),
            };
        }
        if floyd_core::functions::is_builtin(name) {
            return Err(RuntimeError::host(format!(
                "built-in function `{name}` used as a value"
            )));
        }
        Err(RuntimeError::host(format!("unknown identifier `{name}`")))
    }

    fn call(&mut self, callee: NodeId, args: &[NodeId]) -> Result<Value, RuntimeError> {
        let callee_node = self.grammar.tree.node(callee);
        if callee_node.kind != NodeKind::EIdent {
            return Err(RuntimeError::host("only named functions can be called"));
        }
        let name = callee_node.value.as_str();

        let mut values = Vec::with_capacity(args.len());
        for &arg in args {
            values.push(self.eval(arg)?);
        }

        // Externs shadow built-ins.
        if let Some(ext) = self.externs.get(name) {
            let ext = ext.clone();
            return match ext {
                Extern::Const(_) => Err(RuntimeError::host(format!(
                    "extern `{name}` is a value, not a function"
                ))),
                Extern::Func(f) => f(&values).map_err(RuntimeError::Host),
                Extern::PFunc(f) => {
                    let view = ParserView {
                        text: &self.text,
                        path: &self.path,
                        pos: self.pos,
                    };
                    f(&view, &values).map_err(RuntimeError::Host)
                }
            };
        }

        // The two parser-state functions read the machine.
        match name {
            "pos" => return Ok(Value::Int(self.pos as i64)),
            "colno" => return Ok(Value::Int(source::colno(&self.text, self.pos) as i64)),
            _ => {}
        }

        // A declared func/pfunc extern that the caller never bound.
        if self.grammar.externs.contains_key(name) {
            return Err(RuntimeError::host(format!("extern `{name}` was not bound")));
        }

        builtins::call(name, &values).map_err(RuntimeError::Host)
    }
}

fn add(lhs: Value, rhs: Value) -> Result<Value, RuntimeError> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => a
            .checked_add(b)
            .map(Value::Int)
            .ok_or_else(|| RuntimeError::host("integer overflow in `+`")),
        (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a + b)),
        (Value::Int(a), Value::Float(b)) => Ok(Value::Float(a as f64 + b)),
        (Value::Float(a), Value::Int(b)) => Ok(Value::Float(a + b as f64)),
        (Value::Str(a), Value::Str(b)) => Ok(Value::Str(a + &b)),
        (a, b) => Err(RuntimeError::host(format!(
            "cannot add {} and {}",
            a.type_name(),
            b.type_name()
        ))),
    }
}

fn subtract(lhs: Value, rhs: Value) -> Result<Value, RuntimeError> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => a
            .checked_sub(b)
            .map(Value::Int)
            .ok_or_else(|| RuntimeError::host("integer overflow in `-`")),
        (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a - b)),
        (Value::Int(a), Value::Float(b)) => Ok(Value::Float(a as f64 - b)),
        (Value::Float(a), Value::Int(b)) => Ok(Value::Float(a - b as f64)),
        (a, b) => Err(RuntimeError::host(format!(
            "cannot subtract {} from {}",
            b.type_name(),
            a.type_name()
        ))),
    }
}

/// Lists index by integer (negative counts from the end); dicts index
/// by string.
fn get_item(object: Value, key: Value) -> Result<Value, RuntimeError> {
    match (object, key) {
        (Value::List(items), Value::Int(i)) => {
            let len = items.len() as i64;
            let idx = if i < 0 { len + i } else { i };
            if idx < 0 || idx >= len {
                return Err(RuntimeError::host(format!(
                    "index {i} out of range for list of {len}"
                )));
            }
            Ok(items[idx as usize].clone())
        }
        (Value::Dict(map), Value::Str(k)) => map
            .get(&k)
            .cloned()
            .ok_or_else(|| RuntimeError::host(format!("missing key {k:?}"))),
        (Value::List(_), key) => Err(RuntimeError::host(format!(
            "list index must be int, found {}",
            key.type_name()
        ))),
        (Value::Dict(_), key) => Err(RuntimeError::host(format!(
            "dict key must be str, found {}",
            key.type_name()
        ))),
        (object, _) => Err(RuntimeError::host(format!(
            "cannot index into {}",
            object.type_name()
        ))),
    }
}
