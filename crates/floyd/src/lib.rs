//! Floyd: a PEG parsing engine.
//!
//! Compiles a grammar written in the Floyd grammar language into an
//! in-process parser with packrat memoization, left-recursion support,
//! operator-precedence climbing, automatic whitespace/comment filler,
//! scoped bindings, and an embedded expression language for semantic
//! actions.
//!
//! # Example
//!
//! ```
//! let parser = floyd::compile(r"
//!     %whitespace = ' '+
//!     %tokens = num
//!     sum  = sum '+' num -> [$1, $2, $3] | num
//!     num  = <'0'..'9'+> -> atoi($1, 10)
//! ").expect("valid grammar");
//!
//! let result = parser.parse("1 + 2 + 3");
//! assert!(result.is_ok());
//! assert_eq!(result.val.unwrap().to_string(), r#"[[1, "+", 2], "+", 3]"#);
//! ```
//!
//! Grammar errors come back as rendered diagnostics:
//!
//! ```
//! let err = floyd::compile("g = bogus").unwrap_err();
//! assert!(err.to_string().contains("analysis failed"));
//! ```

pub use floyd_core::{Grammar, Value};
pub use floyd_vm::{Extern, ParseResult, ParserView, RuntimeError};

/// Errors from compiling a grammar or building its parser.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Compile(#[from] floyd_compiler::Error),

    #[error(transparent)]
    Runtime(#[from] floyd_vm::RuntimeError),
}

impl Error {
    /// Render compile diagnostics as annotated snippets against the
    /// grammar source.
    pub fn render(&self, source: &str) -> String {
        match self {
            Error::Compile(err) => err.diagnostics().printer().source(source).render(),
            Error::Runtime(err) => err.to_string(),
        }
    }
}

/// A compiled grammar, ready to parse input text.
///
/// Read-only once built: parses may run concurrently from multiple
/// threads.
#[derive(Debug)]
pub struct FloydParser {
    interp: floyd_vm::Interpreter,
}

impl FloydParser {
    /// Parse `text`, reporting errors against `<string>`.
    pub fn parse(&self, text: &str) -> ParseResult {
        self.interp.parse(text)
    }

    /// Parse `text`, reporting errors against `path`.
    pub fn parse_path(&self, text: &str, path: &str) -> ParseResult {
        self.interp.parse_path(text, path)
    }

    /// Bind a declared extern.
    pub fn with_extern(self, name: &str, ext: Extern) -> Result<Self, Error> {
        Ok(Self {
            interp: self.interp.with_extern(name, ext)?,
        })
    }

    /// Start from a rule other than the grammar's first.
    pub fn with_start(self, rule: &str) -> Self {
        Self {
            interp: self.interp.with_start(rule),
        }
    }

    /// Disable or re-enable memoization (on by default).
    pub fn with_memoize(self, on: bool) -> Self {
        Self {
            interp: self.interp.with_memoize(on),
        }
    }

    /// Bound the total number of interpreter steps per parse.
    pub fn with_exec_fuel(self, fuel: u64) -> Self {
        Self {
            interp: self.interp.with_exec_fuel(fuel),
        }
    }

    /// Bound rule-application nesting per parse.
    pub fn with_recursion_fuel(self, limit: u32) -> Self {
        Self {
            interp: self.interp.with_recursion_fuel(limit),
        }
    }

    /// The analyzed grammar.
    pub fn grammar(&self) -> &Grammar {
        self.interp.grammar()
    }
}

/// Compile grammar source into a reusable parser.
pub fn compile(grammar: &str) -> Result<FloydParser, Error> {
    let grammar = floyd_compiler::compile(grammar)?;
    let interp = floyd_vm::Interpreter::new(grammar)?;
    Ok(FloydParser { interp })
}

/// One-shot convenience: compile and parse. Grammar errors surface in
/// `ParseResult::err`, rendered against the grammar source.
pub fn parse(grammar: &str, text: &str) -> ParseResult {
    match compile(grammar) {
        Ok(parser) => parser.parse(text),
        Err(err) => ParseResult {
            val: None,
            err: Some(err.render(grammar)),
            pos: 0,
        },
    }
}
