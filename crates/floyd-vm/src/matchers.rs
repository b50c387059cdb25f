//! Compiled character-class / regex matchers.
//!
//! Patterns were validated with `regex-syntax` during analysis; here
//! they are compiled once per parser with `regex-automata` and matched
//! anchored at the cursor.

use std::collections::HashMap;

use floyd_core::{Grammar, NodeId, NodeKind};
use regex_automata::meta::Regex;
use regex_automata::{Anchored, Input};

#[derive(Debug, Default)]
pub(crate) struct Matchers {
    map: HashMap<NodeId, Regex>,
}

impl Matchers {
    /// Compile every `set` / `regexp` / `unicat` node in the grammar.
    pub(crate) fn build(grammar: &Grammar) -> Result<Matchers, String> {
        let mut map = HashMap::new();
        if !grammar.flags.re_needed {
            return Ok(Matchers { map });
        }
        let mut failure = None;
        for &body in grammar.rules.values() {
            grammar.tree.walk(body, &mut |id, node| {
                let pattern = match node.kind {
                    NodeKind::Set | NodeKind::Regexp => node.value.as_str().to_string(),
                    NodeKind::Unicat => format!(r"\p{{{}}}", node.value.as_str()),
                    _ => return,
                };
                match Regex::new(&pattern) {
                    Ok(regex) => {
                        map.insert(id, regex);
                    }
                    Err(err) => failure = Some(format!("cannot compile `{pattern}`: {err}")),
                }
            });
        }
        match failure {
            Some(message) => Err(message),
            None => Ok(Matchers { map }),
        }
    }

    /// Length in bytes of an anchored match at `byte_start`, if any.
    pub(crate) fn match_at(&self, id: NodeId, haystack: &str, byte_start: usize) -> Option<usize> {
        let regex = self.map.get(&id)?;
        let input = Input::new(haystack)
            .range(byte_start..)
            .anchored(Anchored::Yes);
        regex.find(input).map(|m| m.end() - m.start())
    }
}
