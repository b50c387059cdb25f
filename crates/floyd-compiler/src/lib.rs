//! Floyd compiler: grammar front-end and semantic analyzer.
//!
//! This crate provides the compilation half of the Floyd engine:
//! - `lexer` / `parser` - two-mode lexer, resilient CST parser
//! - `ast` - typed views over the CST
//! - `lower` - CST to the uniform grammar IR
//! - `analyze` - the semantic pass chain producing a [`Grammar`]
//! - `diagnostics` - error collection and rendering
//!
//! The output [`Grammar`] is read-only and sharable; execution lives
//! in the `floyd-vm` crate.

pub mod analyze;
pub mod ast;
pub mod diagnostics;
pub mod escape;
pub mod lexer;
pub mod lower;
pub mod parser;
pub mod syntax;

#[cfg(test)]
mod compile_tests;

pub use diagnostics::{Diagnostics, DiagnosticsPrinter, Severity};
pub use floyd_core::Grammar;

/// Errors from grammar compilation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error("grammar parsing failed with {} error(s)", .0.error_count())]
    Parse(Diagnostics),

    #[error("grammar analysis failed with {} error(s)", .0.error_count())]
    Analyze(Diagnostics),
}

impl Error {
    pub fn diagnostics(&self) -> &Diagnostics {
        match self {
            Error::Parse(diagnostics) | Error::Analyze(diagnostics) => diagnostics,
        }
    }
}

/// Result type for compilation.
pub type Result<T> = std::result::Result<T, Error>;

/// Compile grammar source into an executable [`Grammar`].
pub fn compile(source: &str) -> Result<Grammar> {
    let parse = parser::parse(source);
    let root = ast::Root::cast(parse.syntax()).expect("parser always produces Root");

    let lowered = lower::lower(&root);
    let mut diagnostics = parse.into_diagnostics();
    diagnostics.extend(lowered.diagnostics);
    if diagnostics.has_errors() {
        return Err(Error::Parse(diagnostics));
    }

    let (grammar, analysis_diagnostics) = analyze::analyze(lowered.tree, lowered.root);
    diagnostics.extend(analysis_diagnostics);
    match grammar {
        Some(grammar) if !diagnostics.has_errors() => Ok(grammar),
        _ => Err(Error::Analyze(diagnostics)),
    }
}
