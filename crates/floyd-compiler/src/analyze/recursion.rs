//! Pass 4: left-recursion detection.
//!
//! Builds the left-edge call graph - the rules reachable at a rule's
//! left edge before any input is necessarily consumed - and marks each
//! strongly connected component as left-recursive. Marked rules are
//! wrapped in `leftrec` nodes carrying their associativity (from
//! `%assoc`, keyed by rule name; default left).
//!
//! A nullable fixpoint runs first so that recursion through
//! possibly-empty prefixes is not missed.

use floyd_core::{NodeId, NodeKind, NodeValue};
use indexmap::{IndexMap, IndexSet};

use super::Analyzer;

pub(crate) fn run(az: &mut Analyzer) {
    let nullable = compute_nullable(az);

    let mut graph: IndexMap<String, IndexSet<String>> = IndexMap::new();
    for (name, &body) in &az.rules {
        let mut edges = IndexSet::new();
        left_edges(az, body, &nullable, &mut edges);
        edges.retain(|target| az.rules.contains_key(target));
        graph.insert(name.clone(), edges);
    }

    let recursive = find_recursive(&graph);
    for name in recursive {
        let body = az.rules[&name];
        let span = az.tree.node(body).span;
        let assoc = az.assoc.get(&name).copied().unwrap_or_default();
        let wrapper = az.tree.alloc(
            NodeKind::Leftrec,
            NodeValue::Str(name.clone()),
            vec![body],
            span,
        );
        az.tree.node_mut(wrapper).attrs.assoc = assoc;
        az.rules[&name] = wrapper;
        az.leftrec_rules.insert(name);
    }
}

// ----------------------------------------------------------------------
// Nullability
// ----------------------------------------------------------------------

/// May this rule succeed without consuming input? Monotone fixpoint,
/// starting from "no".
fn compute_nullable(az: &Analyzer) -> IndexMap<String, bool> {
    let mut nullable: IndexMap<String, bool> =
        az.rules.keys().map(|name| (name.clone(), false)).collect();
    loop {
        let mut changed = false;
        for (name, &body) in &az.rules {
            if nullable[name] {
                continue;
            }
            if node_nullable(az, body, &nullable) {
                nullable[name] = true;
                changed = true;
            }
        }
        if !changed {
            return nullable;
        }
    }
}

fn node_nullable(az: &Analyzer, id: NodeId, nullable: &IndexMap<String, bool>) -> bool {
    let node = az.tree.node(id);
    match node.kind {
        NodeKind::Empty
        | NodeKind::Action
        | NodeKind::Pred
        | NodeKind::Not
        | NodeKind::Opt
        | NodeKind::Star
        | NodeKind::End => true,
        // `equals` usually matches a non-empty operator string; treating
        // it as consuming keeps correct grammars out of the leftrec
        // discipline, and the recursion fuel catches the degenerate
        // empty-string case at runtime.
        NodeKind::Equals => false,
        NodeKind::Any
        | NodeKind::Range
        | NodeKind::Set
        | NodeKind::Regexp
        | NodeKind::Unicat
        | NodeKind::NotOne
        | NodeKind::EndsIn => false,
        NodeKind::Lit => node.value.as_str().is_empty(),
        NodeKind::Count => {
            let (min, _) = node.value.as_pair();
            min == 0 || node_nullable(az, node.children[0], nullable)
        }
        NodeKind::Plus
        | NodeKind::Run
        | NodeKind::Paren
        | NodeKind::Label
        | NodeKind::Scope
        | NodeKind::Leftrec => node_nullable(az, node.children[0], nullable),
        NodeKind::Seq => node
            .children
            .iter()
            .all(|&c| node_nullable(az, c, nullable)),
        NodeKind::Choice => node
            .children
            .iter()
            .any(|&c| node_nullable(az, c, nullable)),
        NodeKind::Apply => {
            let name = node.value.as_str();
            match name {
                "end" if !az.rules.contains_key(name) => true,
                "any" if !az.rules.contains_key(name) => false,
                _ => nullable.get(name).copied().unwrap_or(false),
            }
        }
        // Host-expression nodes and already-rewritten wrappers never
        // appear in matching position here.
        _ => false,
    }
}

// ----------------------------------------------------------------------
// Left edges
// ----------------------------------------------------------------------

fn left_edges(
    az: &Analyzer,
    id: NodeId,
    nullable: &IndexMap<String, bool>,
    out: &mut IndexSet<String>,
) {
    let node = az.tree.node(id);
    match node.kind {
        NodeKind::Apply => {
            out.insert(node.value.as_str().to_string());
        }
        NodeKind::Seq => {
            for &child in &node.children {
                left_edges(az, child, nullable, out);
                if !node_nullable(az, child, nullable) {
                    break;
                }
            }
        }
        NodeKind::Choice => {
            for &child in &node.children {
                left_edges(az, child, nullable, out);
            }
        }
        NodeKind::Opt
        | NodeKind::Star
        | NodeKind::Plus
        | NodeKind::Count
        | NodeKind::Run
        | NodeKind::Paren
        | NodeKind::Label
        | NodeKind::Scope
        | NodeKind::Not
        | NodeKind::NotOne
        | NodeKind::EndsIn
        | NodeKind::Leftrec => {
            left_edges(az, node.children[0], nullable, out);
        }
        _ => {}
    }
}

// ----------------------------------------------------------------------
// Strongly connected components
// ----------------------------------------------------------------------

/// Names involved in a left-recursive cycle: members of SCCs of size
/// two or more, plus self-loops.
fn find_recursive(graph: &IndexMap<String, IndexSet<String>>) -> Vec<String> {
    let sccs = Tarjan::new(graph).run();
    let mut out = Vec::new();
    for scc in sccs {
        if scc.len() > 1 {
            out.extend(scc);
        } else if let Some(name) = scc.first()
            && graph[name].contains(name)
        {
            out.push(name.clone());
        }
    }
    out
}

struct Tarjan<'a> {
    graph: &'a IndexMap<String, IndexSet<String>>,
    index: IndexMap<&'a str, u32>,
    lowlink: IndexMap<&'a str, u32>,
    on_stack: IndexSet<&'a str>,
    stack: Vec<&'a str>,
    next_index: u32,
    sccs: Vec<Vec<String>>,
}

impl<'a> Tarjan<'a> {
    fn new(graph: &'a IndexMap<String, IndexSet<String>>) -> Self {
        Self {
            graph,
            index: IndexMap::new(),
            lowlink: IndexMap::new(),
            on_stack: IndexSet::new(),
            stack: Vec::new(),
            next_index: 0,
            sccs: Vec::new(),
        }
    }

    fn run(mut self) -> Vec<Vec<String>> {
        for name in self.graph.keys() {
            if !self.index.contains_key(name.as_str()) {
                self.connect(name);
            }
        }
        self.sccs
    }

    fn connect(&mut self, v: &'a str) {
        self.index.insert(v, self.next_index);
        self.lowlink.insert(v, self.next_index);
        self.next_index += 1;
        self.stack.push(v);
        self.on_stack.insert(v);

        if let Some(edges) = self.graph.get(v) {
            for w in edges {
                if !self.index.contains_key(w.as_str()) {
                    self.connect(w);
                    let low = self.lowlink[w.as_str()].min(self.lowlink[v]);
                    self.lowlink.insert(v, low);
                } else if self.on_stack.contains(w.as_str()) {
                    let low = self.index[w.as_str()].min(self.lowlink[v]);
                    self.lowlink.insert(v, low);
                }
            }
        }

        if self.lowlink[v] == self.index[v] {
            let mut scc = Vec::new();
            while let Some(w) = self.stack.pop() {
                self.on_stack.swap_remove(w);
                scc.push(w.to_string());
                if w == v {
                    break;
                }
            }
            self.sccs.push(scc);
        }
    }
}
