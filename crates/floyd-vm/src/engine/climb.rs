//! Left-recursion seeding and operator-precedence climbing.
//!
//! Both algorithms share the per-parse seed table: the current best
//! parse of a rule at a given offset, grown to a fixed point. The
//! climber drives the growth by precedence classes instead of a single
//! loop, with the generated operand choice scanned as the implicit
//! highest class.

use floyd_core::{Assoc, NodeId, Value};

use crate::error::RuntimeError;

use super::{Machine, Memo, OpState};

impl Machine<'_> {
    /// The fixed-point seed algorithm for a left-recursive rule.
    ///
    /// Termination: the seed's `new_pos` is strictly monotone across
    /// iterations, and the input is finite.
    pub(crate) fn op_leftrec(&mut self, id: NodeId) -> Result<(), RuntimeError> {
        let node = self.grammar.tree.node(id);
        let name = node.value.as_str();
        let rule = self
            .grammar
            .rule_id(name)
            .expect("leftrec wrapper names its rule");
        let body = node.children[0];
        let pos0 = self.pos;
        let key = (rule, pos0);

        if let Some((val, failed, new_pos)) = self.seeds.get(&key) {
            self.val = val.clone();
            self.failed = *failed;
            self.pos = *new_pos;
            return Ok(());
        }

        // Left-associative discipline: a blocked rule refuses
        // re-entry anywhere inside the fixed-point loop.
        if self.blocked.contains(&rule) {
            self.fail();
            return Ok(());
        }

        let mut current: Memo = (Value::Null, true, pos0);
        self.seeds.insert(key, current.clone());
        let left_assoc = node.attrs.assoc == Assoc::Left;
        if left_assoc {
            self.blocked.insert(rule);
        }

        loop {
            self.pos = pos0;
            self.interpret(body)?;
            if !self.failed && self.pos > current.2 {
                current = (self.val.clone(), false, self.pos);
                self.seeds.insert(key, current.clone());
            } else {
                break;
            }
        }

        self.seeds.remove(&key);
        if left_assoc {
            self.blocked.remove(&rule);
        }
        let (val, failed, new_pos) = current;
        self.val = val;
        self.failed = failed;
        self.pos = new_pos;
        Ok(())
    }

    /// The precedence climber for an operator rule.
    pub(crate) fn op_operator(&mut self, id: NodeId) -> Result<(), RuntimeError> {
        let node = self.grammar.tree.node(id);
        let name = node.value.as_str();
        let rule = self
            .grammar
            .rule_id(name)
            .expect("operator node names its rule");
        let table = self
            .grammar
            .operators
            .get(name)
            .expect("operator node has a table");
        let pos0 = self.pos;
        let key = (rule, pos0);

        if let Some((val, failed, new_pos)) = self.seeds.get(&key) {
            self.val = val.clone();
            self.failed = *failed;
            self.pos = *new_pos;
            return Ok(());
        }

        let state = self.op_state.entry(rule).or_insert_with(OpState::default);
        state.current_depth += 1;
        let min_prec = state.current_prec;

        let mut current: Memo = (Value::Null, true, pos0);
        self.seeds.insert(key, current.clone());

        // Class 0 is the synthetic operand class, one precedence step
        // above the highest declared class so every climb tries it.
        let operand_prec = table
            .classes
            .first()
            .map(|class| class.prec + 1)
            .unwrap_or(1);

        let mut i = 0;
        while i <= table.classes.len() {
            let mut repeat = false;
            let (prec, rassoc, choices): (i64, bool, Vec<NodeId>) = if i == 0 {
                (operand_prec, false, vec![table.operand])
            } else {
                let class = &table.classes[i - 1];
                let nodes = class
                    .ops
                    .iter()
                    .map(|op| table.choices[op.as_str()])
                    .collect();
                (class.prec, class.rassoc, nodes)
            };
            if prec < min_prec {
                break;
            }

            // A non-right-associative class refuses same-precedence
            // operators in its right operand, which is what makes the
            // result left-leaning.
            let next_prec = if rassoc { prec } else { prec + 1 };
            self.op_state.get_mut(&rule).expect("entered above").current_prec = next_prec;

            for choice in choices {
                self.pos = pos0;
                self.interpret(choice)?;
                if !self.failed && self.pos > current.2 {
                    current = (self.val.clone(), false, self.pos);
                    self.seeds.insert(key, current.clone());
                    repeat = true;
                    break;
                }
                self.pos = pos0;
                self.failed = false;
            }

            if repeat {
                // The seed grew; rescan from the highest class.
                i = 0;
            } else {
                i += 1;
            }
        }

        self.seeds.remove(&key);
        let state = self.op_state.get_mut(&rule).expect("entered above");
        state.current_depth -= 1;
        if state.current_depth == 0 {
            state.current_prec = 0;
        }

        let (val, failed, new_pos) = current;
        self.val = val;
        self.pos = new_pos;
        if failed {
            self.failed = false;
            self.fail();
        } else {
            self.failed = false;
        }
        Ok(())
    }
}
