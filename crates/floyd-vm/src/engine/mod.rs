//! The packrat execution engine.
//!
//! [`Interpreter`] is the reusable, read-only half: the grammar, the
//! compiled matchers, the extern registry, and the run options. Each
//! call to [`Interpreter::parse`] builds a fresh [`Machine`] - the
//! per-parse mutable runtime record (cursor, value, failure flag,
//! memo cache, seed table, blocked set, scope stack, climb state) -
//! and tears it down when the parse finishes.

mod climb;
mod eval;
mod interp;

#[cfg(test)]
mod engine_tests;

use std::collections::{HashMap, HashSet};

use floyd_core::{Grammar, RuleId, Value};
use indexmap::IndexMap;

use crate::error::{RuntimeError, format_failure, format_host_error};
use crate::externs::Extern;
use crate::matchers::Matchers;

/// Default ceiling for rule-application nesting.
const DEFAULT_RECURSION_FUEL: u32 = 1024;

/// Outcome of a parse: exactly one of `val` / `err` is populated.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseResult {
    /// Value of the starting rule on success.
    pub val: Option<Value>,
    /// Formatted failure or host-error message.
    pub err: Option<String>,
    /// Final offset on success; farthest failure offset otherwise.
    pub pos: usize,
}

impl ParseResult {
    pub fn is_ok(&self) -> bool {
        self.err.is_none()
    }
}

/// A reusable parser for one analyzed grammar.
///
/// Owns the grammar and its compiled matchers; each `parse` call gets
/// a fresh [`Machine`], so an interpreter can be shared across
/// threads.
#[derive(Debug)]
pub struct Interpreter {
    grammar: Grammar,
    matchers: Matchers,
    externs: IndexMap<String, Extern>,
    memoize: bool,
    exec_fuel: Option<u64>,
    recursion_fuel: u32,
    start: Option<String>,
}

impl Interpreter {
    /// Build an interpreter, compiling the grammar's matchers.
    pub fn new(grammar: Grammar) -> Result<Self, RuntimeError> {
        let matchers = Matchers::build(&grammar).map_err(RuntimeError::Host)?;
        let mut externs = IndexMap::new();
        for (name, decl) in &grammar.externs {
            if decl.kind == floyd_core::ExternKind::Const {
                externs.insert(name.clone(), Extern::Const(decl.default.clone()));
            }
        }
        Ok(Self {
            grammar,
            matchers,
            externs,
            memoize: true,
            exec_fuel: None,
            recursion_fuel: DEFAULT_RECURSION_FUEL,
            start: None,
        })
    }

    /// Disable or re-enable memoization (on by default).
    pub fn with_memoize(mut self, on: bool) -> Self {
        self.memoize = on;
        self
    }

    /// Bound the total number of interpreter steps.
    pub fn with_exec_fuel(mut self, fuel: u64) -> Self {
        self.exec_fuel = Some(fuel);
        self
    }

    /// Bound rule-application nesting (default 1024).
    pub fn with_recursion_fuel(mut self, limit: u32) -> Self {
        self.recursion_fuel = limit;
        self
    }

    /// Parse from a rule other than the grammar's first.
    pub fn with_start(mut self, rule: &str) -> Self {
        self.start = Some(rule.to_string());
        self
    }

    /// Bind an extern. The name must be declared by the grammar's
    /// `%externs` pragma.
    pub fn with_extern(mut self, name: &str, ext: Extern) -> Result<Self, RuntimeError> {
        if !self.grammar.externs.contains_key(name) {
            return Err(RuntimeError::host(format!(
                "grammar declares no extern named `{name}`"
            )));
        }
        self.externs.insert(name.to_string(), ext);
        Ok(self)
    }

    /// The analyzed grammar this interpreter runs.
    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn parse(&self, text: &str) -> ParseResult {
        self.parse_path(text, "<string>")
    }

    pub fn parse_path(&self, text: &str, path: &str) -> ParseResult {
        let start = self.start.as_deref().unwrap_or(&self.grammar.starting_rule);
        let Some(rule) = self.grammar.rule_id(start) else {
            return ParseResult {
                val: None,
                err: Some(format!("unknown start rule `{start}`")),
                pos: 0,
            };
        };

        let mut machine = Machine::new(self, text, path);
        match machine.apply_rule(rule) {
            Ok(()) => {
                if machine.failed {
                    ParseResult {
                        val: None,
                        err: Some(format_failure(&machine.text, path, machine.errpos)),
                        pos: machine.errpos,
                    }
                } else {
                    ParseResult {
                        val: Some(machine.val),
                        err: None,
                        pos: machine.pos,
                    }
                }
            }
            Err(err) => ParseResult {
                val: None,
                err: Some(format_host_error(&machine.text, path, machine.pos, &err)),
                pos: machine.errpos.max(machine.pos),
            },
        }
    }
}

/// Memoized outcome: `(val, failed, new_pos)`.
pub(crate) type Memo = (Value, bool, usize);

/// Per-rule precedence-climbing working state.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct OpState {
    pub(crate) current_depth: u32,
    pub(crate) current_prec: i64,
}

/// The per-parse runtime record.
pub(crate) struct Machine<'i> {
    pub(crate) grammar: &'i Grammar,
    pub(crate) matchers: &'i Matchers,
    pub(crate) externs: &'i IndexMap<String, Extern>,
    /// Input as code points.
    pub(crate) text: Vec<char>,
    /// Input as UTF-8, for the regex matchers.
    pub(crate) text_str: String,
    /// Code-point offset to byte offset (length `end + 1`).
    pub(crate) byte_pos: Vec<usize>,
    pub(crate) path: String,
    pub(crate) pos: usize,
    pub(crate) end: usize,
    pub(crate) val: Value,
    pub(crate) failed: bool,
    pub(crate) errpos: usize,
    pub(crate) cache: HashMap<(RuleId, usize), Memo>,
    pub(crate) seeds: HashMap<(RuleId, usize), Memo>,
    pub(crate) blocked: HashSet<RuleId>,
    pub(crate) scopes: Vec<IndexMap<String, Value>>,
    pub(crate) op_state: HashMap<RuleId, OpState>,
    pub(crate) memoize: bool,
    pub(crate) exec_fuel: Option<u64>,
    pub(crate) depth: u32,
    pub(crate) recursion_fuel: u32,
}

impl<'i> Machine<'i> {
    fn new(interp: &'i Interpreter, text: &str, path: &str) -> Self {
        let chars: Vec<char> = text.chars().collect();
        let mut byte_pos = Vec::with_capacity(chars.len() + 1);
        for (byte, _) in text.char_indices() {
            byte_pos.push(byte);
        }
        byte_pos.push(text.len());
        let end = chars.len();
        Self {
            grammar: &interp.grammar,
            matchers: &interp.matchers,
            externs: &interp.externs,
            text: chars,
            text_str: text.to_string(),
            byte_pos,
            path: path.to_string(),
            pos: 0,
            end,
            val: Value::Null,
            failed: false,
            errpos: 0,
            cache: HashMap::new(),
            seeds: HashMap::new(),
            blocked: HashSet::new(),
            scopes: Vec::new(),
            op_state: HashMap::new(),
            memoize: interp.memoize,
            exec_fuel: interp.exec_fuel,
            depth: 0,
            recursion_fuel: interp.recursion_fuel,
        }
    }

    // ------------------------------------------------------------------
    // The operator contract: on success set `val` and advance `pos`;
    // on failure raise `failed` and push `errpos` forward. Callers
    // save and restore position when they intend to backtrack.
    // ------------------------------------------------------------------

    #[inline]
    pub(crate) fn fail(&mut self) {
        self.failed = true;
        self.val = Value::Null;
        if self.pos > self.errpos {
            self.errpos = self.pos;
        }
    }

    #[inline]
    pub(crate) fn succeed(&mut self, val: Value) {
        self.val = val;
        self.failed = false;
    }

    /// Work counter; see the concurrency notes in the crate docs.
    #[inline]
    pub(crate) fn tick(&mut self) -> Result<(), RuntimeError> {
        if let Some(fuel) = &mut self.exec_fuel {
            if *fuel == 0 {
                return Err(RuntimeError::ExecFuelExhausted);
            }
            *fuel -= 1;
        }
        Ok(())
    }

    pub(crate) fn slice(&self, start: usize, end: usize) -> String {
        self.text[start..end].iter().collect()
    }
}
