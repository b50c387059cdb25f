//! Operator dispatch: one `match` over the node kind.
//!
//! Every operator follows the same contract (see `Machine`): failure
//! is a flag, host errors abort through `Result`. Backtracking
//! operators save position (and value) themselves before running
//! their children.

use floyd_core::{NodeId, NodeKind, Value};

use crate::error::RuntimeError;

use super::Machine;

impl Machine<'_> {
    pub(crate) fn interpret(&mut self, id: NodeId) -> Result<(), RuntimeError> {
        self.tick()?;
        let grammar = self.grammar;
        let node = grammar.tree.node(id);
        match node.kind {
            NodeKind::Empty => {
                self.succeed(Value::Null);
                Ok(())
            }
            NodeKind::Any => {
                self.r_any();
                Ok(())
            }
            NodeKind::End => {
                self.r_end();
                Ok(())
            }
            NodeKind::Lit => {
                let s = node.value.as_str();
                self.lit_match(s);
                Ok(())
            }
            NodeKind::Range => {
                let (lo, hi) = node.value.as_pair();
                self.range_match(lo, hi);
                Ok(())
            }
            NodeKind::Set | NodeKind::Regexp | NodeKind::Unicat => {
                self.regex_match(id);
                Ok(())
            }
            NodeKind::Seq => self.op_seq(&node.children),
            NodeKind::Choice => self.op_choice(&node.children),
            NodeKind::Paren => self.interpret(node.children[0]),
            NodeKind::Opt => self.op_opt(node.children[0]),
            NodeKind::Star => self.op_star(node.children[0]),
            NodeKind::Plus => self.op_plus(node.children[0]),
            NodeKind::Count => {
                let (min, max) = node.value.as_pair();
                self.op_count(node.children[0], min, max)
            }
            NodeKind::Not => self.op_not(node.children[0]),
            NodeKind::NotOne => {
                self.op_not(node.children[0])?;
                if !self.failed {
                    self.r_any();
                }
                Ok(())
            }
            NodeKind::EndsIn => self.op_ends_in(node.children[0]),
            NodeKind::Run => self.op_run(node.children[0]),
            NodeKind::Equals => self.op_equals(node.children[0]),
            NodeKind::Label => {
                let name = node.value.as_str();
                self.interpret(node.children[0])?;
                if !self.failed {
                    self.bind(name);
                }
                Ok(())
            }
            NodeKind::Scope => {
                self.scopes.push(Default::default());
                let result = self.interpret(node.children[0]);
                self.scopes.pop();
                result
            }
            NodeKind::Action => {
                let value = self.eval(node.children[0])?;
                self.succeed(value);
                Ok(())
            }
            NodeKind::Pred => {
                let value = self.eval(node.children[0])?;
                match value {
                    Value::Bool(true) => {
                        self.succeed(Value::Null);
                        Ok(())
                    }
                    Value::Bool(false) => {
                        self.fail();
                        Ok(())
                    }
                    other => Err(RuntimeError::host(format!(
                        "predicate produced {}, not a boolean",
                        other.type_name()
                    ))),
                }
            }
            NodeKind::Apply => {
                let name = node.value.as_str();
                // Inserted filler is invisible to values: whatever the
                // surrounding sequence had produced stays current.
                if node.attrs.filler {
                    let saved = self.val.clone();
                    let result = match grammar.rule_id(name) {
                        Some(rule) => self.apply_rule(rule),
                        None => Ok(()),
                    };
                    if !self.failed {
                        self.val = saved;
                    }
                    return result;
                }
                match grammar.rule_id(name) {
                    Some(rule) => self.apply_rule(rule),
                    None => {
                        // Validated during analysis: only the built-in
                        // rules reach here.
                        match name {
                            "any" => self.r_any(),
                            "end" => self.r_end(),
                            _ => {
                                return Err(RuntimeError::host(format!("unknown rule `{name}`")));
                            }
                        }
                        Ok(())
                    }
                }
            }
            NodeKind::Leftrec => self.op_leftrec(id),
            NodeKind::Operator => self.op_operator(id),
            other => Err(RuntimeError::host(format!(
                "host-expression node `{other:?}` in matching position"
            ))),
        }
    }

    // ------------------------------------------------------------------
    // Primitives
    // ------------------------------------------------------------------

    pub(crate) fn r_any(&mut self) {
        match self.text.get(self.pos) {
            Some(&ch) => {
                self.pos += 1;
                self.succeed(Value::Str(ch.to_string()));
            }
            None => self.fail(),
        }
    }

    /// Succeeds at end of input without touching `val`, so a trailing
    /// `end` doesn't clobber the rule's result.
    pub(crate) fn r_end(&mut self) {
        if self.pos == self.end {
            self.failed = false;
        } else {
            self.fail();
        }
    }

    /// Matches `s` code point by code point, leaving `pos` at the
    /// first mismatch so `errpos` points into the literal.
    pub(crate) fn lit_match(&mut self, s: &str) {
        for ch in s.chars() {
            if self.text.get(self.pos) == Some(&ch) {
                self.pos += 1;
            } else {
                self.fail();
                return;
            }
        }
        self.succeed(Value::Str(s.to_string()));
    }

    fn range_match(&mut self, lo: i64, hi: i64) {
        match self.text.get(self.pos) {
            Some(&ch) if (ch as i64) >= lo && (ch as i64) <= hi => {
                self.pos += 1;
                self.succeed(Value::Str(ch.to_string()));
            }
            _ => self.fail(),
        }
    }

    fn regex_match(&mut self, id: NodeId) {
        let byte_start = self.byte_pos[self.pos];
        match self.matchers.match_at(id, &self.text_str, byte_start) {
            Some(len) => {
                let matched = self.text_str[byte_start..byte_start + len].to_string();
                self.pos += matched.chars().count();
                self.succeed(Value::Str(matched));
            }
            None => self.fail(),
        }
    }

    // ------------------------------------------------------------------
    // Combinators
    // ------------------------------------------------------------------

    fn op_seq(&mut self, children: &[NodeId]) -> Result<(), RuntimeError> {
        for &child in children {
            self.interpret(child)?;
            if self.failed {
                return Ok(());
            }
        }
        Ok(())
    }

    fn op_choice(&mut self, children: &[NodeId]) -> Result<(), RuntimeError> {
        let pos = self.pos;
        let val = self.val.clone();
        for &child in children {
            self.interpret(child)?;
            if !self.failed {
                return Ok(());
            }
            self.pos = pos;
            self.val = val.clone();
        }
        self.fail();
        Ok(())
    }

    fn op_opt(&mut self, child: NodeId) -> Result<(), RuntimeError> {
        let pos = self.pos;
        self.interpret(child)?;
        if self.failed {
            self.pos = pos;
            self.succeed(Value::List(Vec::new()));
        } else {
            let val = std::mem::take(&mut self.val);
            self.succeed(Value::List(vec![val]));
        }
        Ok(())
    }

    fn op_star(&mut self, child: NodeId) -> Result<(), RuntimeError> {
        let mut values = Vec::new();
        self.star_into(child, &mut values)?;
        self.succeed(Value::List(values));
        Ok(())
    }

    /// The shared `*` loop: stops on failure or on a zero-consumption
    /// iteration (which would otherwise never terminate).
    fn star_into(&mut self, child: NodeId, values: &mut Vec<Value>) -> Result<(), RuntimeError> {
        loop {
            let pos = self.pos;
            self.interpret(child)?;
            if self.failed {
                self.failed = false;
                self.pos = pos;
                return Ok(());
            }
            if self.pos == pos {
                return Ok(());
            }
            values.push(std::mem::take(&mut self.val));
        }
    }

    fn op_plus(&mut self, child: NodeId) -> Result<(), RuntimeError> {
        self.interpret(child)?;
        if self.failed {
            return Ok(());
        }
        let mut values = vec![std::mem::take(&mut self.val)];
        self.star_into(child, &mut values)?;
        self.succeed(Value::List(values));
        Ok(())
    }

    fn op_count(&mut self, child: NodeId, min: i64, max: i64) -> Result<(), RuntimeError> {
        let mut values = Vec::new();
        let mut i: i64 = 0;
        while i < max {
            let pos = self.pos;
            self.interpret(child)?;
            if self.failed {
                if i >= min {
                    self.failed = false;
                    self.pos = pos;
                    break;
                }
                return Ok(());
            }
            values.push(std::mem::take(&mut self.val));
            i += 1;
        }
        self.succeed(Value::List(values));
        Ok(())
    }

    fn op_not(&mut self, child: NodeId) -> Result<(), RuntimeError> {
        let pos = self.pos;
        let val = self.val.clone();
        let errpos = self.errpos;
        self.interpret(child)?;
        if self.failed {
            self.failed = false;
            self.pos = pos;
            self.val = Value::Null;
            self.errpos = errpos;
        } else {
            self.pos = pos;
            self.val = val;
            self.fail();
        }
        Ok(())
    }

    fn op_ends_in(&mut self, child: NodeId) -> Result<(), RuntimeError> {
        loop {
            let pos = self.pos;
            self.interpret(child)?;
            if !self.failed {
                return Ok(());
            }
            self.failed = false;
            self.pos = pos;
            self.r_any();
            if self.failed {
                return Ok(());
            }
        }
    }

    fn op_run(&mut self, child: NodeId) -> Result<(), RuntimeError> {
        let start = self.pos;
        self.interpret(child)?;
        if !self.failed {
            let text = self.slice(start, self.pos);
            self.succeed(Value::Str(text));
        }
        Ok(())
    }

    fn op_equals(&mut self, expr: NodeId) -> Result<(), RuntimeError> {
        let value = self.eval(expr)?;
        match value {
            Value::Str(s) => {
                self.lit_match(&s);
                Ok(())
            }
            other => Err(RuntimeError::host(format!(
                "`={{...}}` produced {}, not a string",
                other.type_name()
            ))),
        }
    }

    fn bind(&mut self, name: &str) {
        let value = self.val.clone();
        if let Some(frame) = self.scopes.last_mut() {
            frame.insert(name.to_string(), value);
        }
    }

    // ------------------------------------------------------------------
    // Rule application and memoization
    // ------------------------------------------------------------------

    pub(crate) fn apply_rule(&mut self, rule: floyd_core::RuleId) -> Result<(), RuntimeError> {
        if self.depth >= self.recursion_fuel {
            return Err(RuntimeError::RecursionLimitExceeded);
        }
        self.depth += 1;
        let result = self.apply_rule_inner(rule);
        self.depth -= 1;
        result
    }

    fn apply_rule_inner(&mut self, rule: floyd_core::RuleId) -> Result<(), RuntimeError> {
        let body = self
            .grammar
            .rule_body(rule)
            .expect("rule ids come from the grammar");

        // Left-recursive and operator rules manage their own seeds and
        // never consult the memo cache. While any fixed point is
        // mid-growth the cache is also bypassed entirely: a result
        // computed against a partial seed must not be replayed, and a
        // pre-computed result must not short-circuit seed growth.
        if !self.memoize
            || !self.grammar.tree.node(body).attrs.memoize
            || !self.seeds.is_empty()
        {
            return self.interpret(body);
        }

        let key = (rule, self.pos);
        if let Some((val, failed, new_pos)) = self.cache.get(&key) {
            self.val = val.clone();
            self.failed = *failed;
            self.pos = *new_pos;
            return Ok(());
        }
        self.interpret(body)?;
        self.cache
            .insert(key, (self.val.clone(), self.failed, self.pos));
        Ok(())
    }
}
