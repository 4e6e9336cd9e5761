//! Inheritance graph - the explicit is-base-of table.
//!
//! Uses `petgraph::DiGraph` with:
//! - Nodes: managed class names
//! - Edges: `Extends`, from a derived class to its single base

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use rustc_hash::FxHashMap;

/// Edge from a derived class to its base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extends;

/// Single-inheritance class graph.
#[derive(Debug, Default)]
pub struct InheritanceGraph {
    graph: DiGraph<String, Extends>,
    nodes: FxHashMap<String, NodeIndex>,
}

impl InheritanceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a class node, returning the existing one if already present.
    pub fn add_class(&mut self, name: &str) -> NodeIndex {
        if let Some(&node) = self.nodes.get(name) {
            return node;
        }
        let node = self.graph.add_node(name.to_string());
        self.nodes.insert(name.to_string(), node);
        node
    }

    /// Record `derived extends base`. Both must be present.
    ///
    /// Returns `false` if either is unknown or `derived` already has a base.
    pub fn set_base(&mut self, derived: &str, base: &str) -> bool {
        let (Some(&d), Some(&b)) = (self.nodes.get(derived), self.nodes.get(base)) else {
            return false;
        };
        if self.graph.edges_directed(d, Direction::Outgoing).next().is_some() {
            return false;
        }
        self.graph.add_edge(d, b, Extends);
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// The direct base of a class.
    pub fn base_of(&self, name: &str) -> Option<&str> {
        let node = *self.nodes.get(name)?;
        self.graph
            .edges_directed(node, Direction::Outgoing)
            .next()
            .map(|edge| self.graph[edge.target()].as_str())
    }

    /// All ancestors, nearest first.
    pub fn ancestors(&self, name: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut current = self.base_of(name);
        while let Some(base) = current {
            // Registration forbids cycles; the bound keeps a corrupted graph finite.
            if out.len() > self.nodes.len() {
                break;
            }
            out.push(base.to_string());
            current = self.base_of(base);
        }
        out
    }

    /// Direct subclasses.
    pub fn derived_of(&self, name: &str) -> Vec<&str> {
        let Some(&node) = self.nodes.get(name) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(node, Direction::Incoming)
            .map(|edge| self.graph[edge.source()].as_str())
            .collect()
    }

    /// Whether `base` is a strict ancestor of `derived`.
    pub fn is_base_of(&self, base: &str, derived: &str) -> bool {
        let mut current = self.base_of(derived);
        let mut steps = 0;
        while let Some(name) = current {
            if name == base {
                return true;
            }
            steps += 1;
            if steps > self.nodes.len() {
                return false;
            }
            current = self.base_of(name);
        }
        false
    }

    /// `class` is `target` or derives from it.
    pub fn is_a(&self, class: &str, target: &str) -> bool {
        class == target || self.is_base_of(target, class)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> InheritanceGraph {
        let mut g = InheritanceGraph::new();
        for name in ["RefItem", "SpaceItem", "Item", "Solid", "Path"] {
            g.add_class(name);
        }
        assert!(g.set_base("SpaceItem", "RefItem"));
        assert!(g.set_base("Item", "SpaceItem"));
        assert!(g.set_base("Solid", "Item"));
        g
    }

    #[test]
    fn ancestors_nearest_first() {
        let g = chain();
        assert_eq!(g.ancestors("Solid"), ["Item", "SpaceItem", "RefItem"]);
        assert!(g.ancestors("RefItem").is_empty());
    }

    #[test]
    fn is_base_of() {
        let g = chain();
        assert!(g.is_base_of("RefItem", "Solid"));
        assert!(!g.is_base_of("Solid", "RefItem"));
        assert!(!g.is_base_of("Solid", "Solid"));
        assert!(g.is_a("Solid", "Solid"));
        assert!(!g.is_a("Path", "Item"));
    }

    #[test]
    fn single_base_only() {
        let mut g = chain();
        assert!(!g.set_base("Solid", "Path"));
        assert!(!g.set_base("Unknown", "Path"));
        assert_eq!(g.derived_of("Item"), ["Solid"]);
    }
}
