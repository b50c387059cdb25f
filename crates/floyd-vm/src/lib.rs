//! Floyd vm: the packrat interpreter for analyzed grammars.
//!
//! Executes a [`floyd_core::Grammar`] against input text:
//! - `engine` - the cooperative state machine, left-recursion seeds,
//!   and the operator-precedence climber
//! - `builtins` - the pure built-in function library
//! - `externs` - caller-supplied hooks
//! - `matchers` - compiled character-class / regex matchers
//!
//! # Concurrency
//!
//! One parse runs entirely on one thread and owns all of its mutable
//! state; the grammar and the [`Interpreter`] are read-only during a
//! parse, so parallel parses may share them. `with_exec_fuel` bounds
//! the work done by a single parse, `with_recursion_fuel` bounds rule
//! nesting (default 1024).

pub mod builtins;
mod engine;
mod error;
pub mod externs;
mod matchers;

pub use engine::{Interpreter, ParseResult};
pub use error::RuntimeError;
pub use externs::{Extern, ParserView};
