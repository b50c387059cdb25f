//! Core data structures for the Floyd parsing engine.
//!
//! Three layers, shared between the compiler and the vm:
//! - **Grammar IR**: the uniform node tree (`node`) plus the analyzed
//!   grammar metadata (`grammar`) the interpreter executes.
//! - **Values**: the dynamic semantic value produced by a parse
//!   (`value`) and the type lattice the analyzer checks host
//!   expressions against (`types`).
//! - **Catalog**: the built-in function signatures (`functions`) so the
//!   compiler's type checker and the vm's implementations agree on one
//!   source of truth.

pub mod functions;
pub mod grammar;
pub mod node;
pub mod source;
pub mod types;
pub mod value;

pub use grammar::{
    ExternDecl, ExternKind, FeatureFlags, Grammar, OperatorClass, OperatorTable, RuleId,
};
pub use node::{Assoc, Attrs, IdentClass, Node, NodeId, NodeKind, NodeValue, Tree};
pub use types::Type;
pub use value::Value;
