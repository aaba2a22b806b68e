//! Direct type usage of a single tree, and the usage graph built from it

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use petgraph::graph::{DiGraph, NodeIndex};

use crate::frontend::{Frontend, TreeId};
use crate::symbol::TypeSymbol;

/// Distinct types referenced anywhere in `tree`
///
/// Nodes that resolve to nothing, or to a symbol outside any type, are
/// skipped; that is the normal case for literals and keywords.
pub fn direct_uses<F: Frontend>(
    frontend: &F,
    compilation: &F::Compilation,
    tree: TreeId,
) -> Result<BTreeSet<TypeSymbol>, F::Error> {
    let mut uses = BTreeSet::new();
    for node in frontend.nodes(compilation, tree)? {
        if let Some(symbol) = frontend.resolve_symbol_at(compilation, tree, node)? {
            if let Some(ty) = symbol.containing_type() {
                uses.insert(ty.clone());
            }
        }
    }
    Ok(uses)
}

/// A vertex of the usage graph
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UsageNode {
    Entry,
    /// Corpus unit by index
    Unit(usize),
    Type(TypeSymbol),
}

impl fmt::Display for UsageNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UsageNode::Entry => write!(f, "<entry>"),
            UsageNode::Unit(index) => write!(f, "unit#{}", index),
            UsageNode::Type(ty) => write!(f, "{}", ty),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageEdge {
    /// unit -> type it references
    Uses,
    /// type -> unit declaring it
    Declares,
}

/// Units and types connected by "uses" and "declares" edges
///
/// Cycles are expected (two types referencing each other).
#[derive(Debug, Clone, Default)]
pub struct UsageGraph {
    graph: DiGraph<UsageNode, UsageEdge>,
    index: HashMap<UsageNode, NodeIndex>,
}

impl UsageGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn node(&mut self, node: UsageNode) -> NodeIndex {
        if let Some(idx) = self.index.get(&node) {
            return *idx;
        }
        let idx = self.graph.add_node(node.clone());
        self.index.insert(node, idx);
        idx
    }

    pub fn add_use(&mut self, from: UsageNode, ty: &TypeSymbol) {
        let from = self.node(from);
        let to = self.node(UsageNode::Type(ty.clone()));
        self.graph.update_edge(from, to, UsageEdge::Uses);
    }

    pub fn add_declaration(&mut self, ty: &TypeSymbol, unit: usize) {
        let from = self.node(UsageNode::Type(ty.clone()));
        let to = self.node(UsageNode::Unit(unit));
        self.graph.update_edge(from, to, UsageEdge::Declares);
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Shortest chain of units and types leading from the entry to `unit`
    pub fn explain(&self, unit: usize) -> Option<Vec<UsageNode>> {
        let start = *self.index.get(&UsageNode::Entry)?;
        let goal = *self.index.get(&UsageNode::Unit(unit))?;
        petgraph::algo::astar(&self.graph, start, |n| n == goal, |_| 1u32, |_| 0u32)
            .map(|(_, path)| path.into_iter().map(|idx| self.graph[idx].clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explain_follows_shortest_chain() {
        let helper = TypeSymbol::new("Lib", "Helper");
        let inner = TypeSymbol::new("Lib", "Inner");
        let mut graph = UsageGraph::new();
        graph.add_use(UsageNode::Entry, &helper);
        graph.add_declaration(&helper, 0);
        graph.add_use(UsageNode::Unit(0), &inner);
        graph.add_declaration(&inner, 2);
        // Cycle back to the first unit must not confuse the search
        graph.add_use(UsageNode::Unit(2), &helper);

        let path = graph.explain(2).unwrap();
        assert_eq!(
            path,
            vec![
                UsageNode::Entry,
                UsageNode::Type(helper),
                UsageNode::Unit(0),
                UsageNode::Type(inner),
                UsageNode::Unit(2),
            ]
        );
        assert_eq!(graph.explain(7), None);
    }

    #[test]
    fn test_duplicate_edges_collapse() {
        let helper = TypeSymbol::new("Lib", "Helper");
        let mut graph = UsageGraph::new();
        graph.add_use(UsageNode::Entry, &helper);
        graph.add_use(UsageNode::Entry, &helper);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
    }
}
