//! Caller-supplied hooks exposed to the host-expression language.

use std::sync::Arc;

use floyd_core::{Value, source};

/// A plain extern callable.
pub type ExternFn = Arc<dyn Fn(&[Value]) -> Result<Value, String> + Send + Sync>;

/// An extern callable that receives the parser as an implicit first
/// argument.
pub type ParserExternFn =
    Arc<dyn Fn(&ParserView<'_>, &[Value]) -> Result<Value, String> + Send + Sync>;

/// A caller-supplied binding: a value or a callable.
#[derive(Clone)]
pub enum Extern {
    Const(Value),
    Func(ExternFn),
    PFunc(ParserExternFn),
}

impl Extern {
    /// Convenience constructor for a plain function extern.
    pub fn func(f: impl Fn(&[Value]) -> Result<Value, String> + Send + Sync + 'static) -> Self {
        Extern::Func(Arc::new(f))
    }

    /// Convenience constructor for a parser-function extern.
    pub fn pfunc(
        f: impl Fn(&ParserView<'_>, &[Value]) -> Result<Value, String> + Send + Sync + 'static,
    ) -> Self {
        Extern::PFunc(Arc::new(f))
    }
}

impl std::fmt::Debug for Extern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Extern::Const(v) => f.debug_tuple("Const").field(v).finish(),
            Extern::Func(_) => f.write_str("Func(..)"),
            Extern::PFunc(_) => f.write_str("PFunc(..)"),
        }
    }
}

/// Read-only view of the running parse, handed to `pfunc` externs.
pub struct ParserView<'a> {
    pub(crate) text: &'a [char],
    pub(crate) path: &'a str,
    pub(crate) pos: usize,
}

impl ParserView<'_> {
    /// Current offset, in code points.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// 1-based column of the current offset.
    pub fn colno(&self) -> usize {
        source::colno(self.text, self.pos)
    }

    /// 1-based line of the current offset.
    pub fn lineno(&self) -> usize {
        source::line_col(self.text, self.pos).0
    }

    pub fn path(&self) -> &str {
        self.path
    }

    /// The input, as code points.
    pub fn text(&self) -> &[char] {
        self.text
    }
}
