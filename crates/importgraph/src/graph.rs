//! Flattening resolved trees into a deduplicated graph.
//!
//! The resolver's output is a forest in which the same package appears once
//! per importer. [`Graph::build`] walks it and keeps one node per name and one
//! edge per ordered pair. Nodes are stored in a petgraph `DiGraph`, so node
//! indices are small, stable and follow first-visit order.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use tracing::debug;

use crate::context::ResolutionContext;
use crate::types::{PackageId, PackageSummary};

/// A graph node: its name and the summary of the package it stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Unique node name
    pub id: String,
    /// Package summary
    pub value: PackageSummary,
}

/// Deduplicated, directed import graph.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    inner: DiGraph<Node, ()>,
    index: HashMap<String, NodeIndex>,
}

impl Graph {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Flatten the trees under `roots` into a graph.
    ///
    /// Each name is expanded once, no matter how many importers share it.
    #[must_use]
    pub fn build(ctx: &ResolutionContext, roots: &[PackageId]) -> Self {
        let mut graph = Self::new();
        for &root in roots {
            graph.visit(ctx, root);
        }
        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "Built import graph"
        );
        graph
    }

    /// Add `id` and, on first visit, its subtree.
    fn visit(&mut self, ctx: &ResolutionContext, id: PackageId) -> NodeIndex {
        let pkg = ctx.package(id);
        if let Some(&existing) = self.index.get(pkg.name()) {
            return existing;
        }
        // A cycle re-entry has no children of its own.
        let pkg = match ctx.cached(pkg.name()) {
            Some(full) if pkg.is_located_only() => ctx.package(full),
            _ => pkg,
        };

        let from = self.add_node(pkg.name(), PackageSummary::from(pkg));
        for &child in pkg.children() {
            let to = self.visit(ctx, child);
            if self.inner.find_edge(from, to).is_none() {
                self.inner.add_edge(from, to, ());
            }
        }
        from
    }

    /// Add a node unless one with the same id exists. Returns its index.
    pub fn add_node(&mut self, id: &str, value: PackageSummary) -> NodeIndex {
        if let Some(&existing) = self.index.get(id) {
            return existing;
        }
        let index = self.inner.add_node(Node {
            id: id.to_string(),
            value,
        });
        self.index.insert(id.to_string(), index);
        index
    }

    /// Add an edge between two existing nodes.
    ///
    /// Returns `false` if either node is missing or the edge already exists.
    pub fn add_edge(&mut self, from: &str, to: &str) -> bool {
        let (Some(&a), Some(&b)) = (self.index.get(from), self.index.get(to)) else {
            return false;
        };
        if self.inner.find_edge(a, b).is_some() {
            return false;
        }
        self.inner.add_edge(a, b, ());
        true
    }

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// Whether a node with this id exists.
    #[must_use]
    pub fn contains_node(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Whether the edge `from -> to` exists.
    #[must_use]
    pub fn contains_edge(&self, from: &str, to: &str) -> bool {
        match (self.index.get(from), self.index.get(to)) {
            (Some(&a), Some(&b)) => self.inner.find_edge(a, b).is_some(),
            _ => false,
        }
    }

    /// Node with this id.
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index.get(id).map(|&i| &self.inner[i])
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.inner.node_indices().map(|i| &self.inner[i])
    }

    /// Edges in insertion order, as `(from index, to index)`.
    pub fn edge_indices(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.inner
            .edge_references()
            .map(|e| (e.source().index(), e.target().index()))
    }

    /// Edges in insertion order, as `(from id, to id)`.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.edge_references().map(|e| {
            (
                self.inner[e.source()].id.as_str(),
                self.inner[e.target()].id.as_str(),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::DependencyResolver;
    use crate::source::MemoryResolver;
    use crate::types::PackageKind;
    use std::path::Path;

    fn summary(name: &str) -> PackageSummary {
        PackageSummary {
            name: name.to_string(),
            canonical_path: None,
            dir: None,
            kind: PackageKind::External,
        }
    }

    #[test]
    fn nodes_and_edges_are_deduplicated() {
        let mut graph = Graph::new();
        let a = graph.add_node("a", summary("a"));
        assert_eq!(graph.add_node("a", summary("a")), a);
        graph.add_node("b", summary("b"));

        assert!(graph.add_edge("a", "b"));
        assert!(!graph.add_edge("a", "b"));
        assert!(!graph.add_edge("a", "missing"));

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert!(graph.contains_edge("a", "b"));
        assert!(!graph.contains_edge("b", "a"));
    }

    #[test]
    fn shared_subtrees_are_expanded_once() {
        let resolver = MemoryResolver::new()
            .with_package("example.com/r", &["example.com/x", "example.com/y"])
            .with_package("example.com/x", &["example.com/shared"])
            .with_package("example.com/y", &["example.com/shared"])
            .with_package("example.com/shared", &["example.com/leaf"])
            .with_package("example.com/leaf", &[]);
        let mut ctx = ResolutionContext::new();
        let root = DependencyResolver::new(&resolver)
            .resolve_root(&mut ctx, "example.com/r", Path::new("/"))
            .unwrap();

        let graph = Graph::build(&ctx, &[root]);

        assert_eq!(graph.node_count(), 5);
        assert_eq!(graph.edge_count(), 5);
        assert!(graph.contains_edge("example.com/x", "example.com/shared"));
        assert!(graph.contains_edge("example.com/y", "example.com/shared"));
        assert!(graph.contains_edge("example.com/shared", "example.com/leaf"));
        let first = graph.nodes().next().unwrap();
        assert_eq!(first.id, "example.com/r");
    }

    fn build(resolver: &MemoryResolver, root: &str) -> (ResolutionContext, Graph) {
        let mut ctx = ResolutionContext::new();
        let root = DependencyResolver::new(resolver)
            .resolve_root(&mut ctx, root, Path::new("/"))
            .unwrap();
        let graph = Graph::build(&ctx, &[root]);
        (ctx, graph)
    }

    #[test]
    fn cycle_reentry_reached_first_still_expands_full_package() {
        // The splice puts zb's full appearance after n, whose c carries the
        // locate-only zb from the cycle.
        let resolver = MemoryResolver::new()
            .with_package("example.com/r", &["example.com/m/internal/i", "example.com/n"])
            .with_package("example.com/m/internal/i", &["example.com/zb"])
            .with_package("example.com/zb", &["example.com/c"])
            .with_package("example.com/c", &["example.com/zb"])
            .with_package("example.com/n", &["example.com/c"]);

        let (ctx, graph) = build(&resolver, "example.com/r");

        let zb = ctx.cached("example.com/zb").unwrap();
        assert!(!ctx.package(zb).is_located_only());
        assert_eq!(graph.edge_count(), 5);
        for (from, to) in [
            ("example.com/r", "example.com/n"),
            ("example.com/r", "example.com/zb"),
            ("example.com/n", "example.com/c"),
            ("example.com/c", "example.com/zb"),
            ("example.com/zb", "example.com/c"),
        ] {
            assert!(graph.contains_edge(from, to), "missing edge {from} -> {to}");
        }
    }

    #[test]
    fn cycle_between_siblings_keeps_both_edges() {
        let resolver = MemoryResolver::new()
            .with_package("example.com/r", &["example.com/b", "example.com/a"])
            .with_package("example.com/a", &["example.com/c"])
            .with_package("example.com/b", &["example.com/c"])
            .with_package("example.com/c", &["example.com/b"]);

        let (_, graph) = build(&resolver, "example.com/r");

        assert!(graph.contains_edge("example.com/b", "example.com/c"));
        assert!(graph.contains_edge("example.com/c", "example.com/b"));
        assert!(graph.contains_edge("example.com/a", "example.com/c"));
        assert_eq!(graph.edge_count(), 5);
    }

    #[test]
    fn forest_roots_share_nodes() {
        let resolver = MemoryResolver::new()
            .with_package("example.com/a", &["example.com/common"])
            .with_package("example.com/b", &["example.com/common"])
            .with_package("example.com/common", &[]);
        let mut ctx = ResolutionContext::new();
        let deps = DependencyResolver::new(&resolver);
        let a = deps.resolve_root(&mut ctx, "example.com/a", Path::new("/")).unwrap();
        let b = deps.resolve_root(&mut ctx, "example.com/b", Path::new("/")).unwrap();

        let graph = Graph::build(&ctx, &[a, b, a]);

        assert_eq!(graph.node_count(), 3);
        assert_eq!(
            graph.edges().collect::<Vec<_>>(),
            vec![
                ("example.com/a", "example.com/common"),
                ("example.com/b", "example.com/common"),
            ]
        );
    }
}
