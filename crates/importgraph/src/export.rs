//! Graph serializations.
//!
//! | Format | Shape |
//! |--------|-------|
//! | [`Format::Json`] | `{nodes: [{id, value}], edges: [{from, to}], options}` |
//! | [`Format::Dot`] | Graphviz `digraph`, nodes numbered in graph order |
//! | [`Format::List`] | JSON array of node names, sorted |

use std::fmt::Write as _;

use serde::Serialize;

use crate::error::Result;
use crate::graph::Graph;
use crate::types::PackageSummary;

/// Output format for a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// Generic node/edge/options document
    #[default]
    Json,
    /// Graphviz directed graph
    Dot,
    /// Sorted list of node names
    List,
}

/// Graph-level flags of the JSON document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GraphOptions {
    /// Edges have a direction
    pub directed: bool,
    /// More than one edge per node pair
    pub multigraph: bool,
    /// Nodes nest inside other nodes
    pub compound: bool,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            directed: true,
            multigraph: false,
            compound: false,
        }
    }
}

#[derive(Debug, Serialize)]
struct JsonNode<'a> {
    id: &'a str,
    value: &'a PackageSummary,
}

#[derive(Debug, Serialize)]
struct JsonEdge<'a> {
    from: &'a str,
    to: &'a str,
}

/// Borrowed view of a graph in its JSON shape.
#[derive(Debug, Serialize)]
pub struct GraphDocument<'a> {
    nodes: Vec<JsonNode<'a>>,
    edges: Vec<JsonEdge<'a>>,
    options: GraphOptions,
}

impl<'a> GraphDocument<'a> {
    /// Borrow `graph` as a serializable document.
    #[must_use]
    pub fn new(graph: &'a Graph) -> Self {
        Self {
            nodes: graph
                .nodes()
                .map(|n| JsonNode {
                    id: &n.id,
                    value: &n.value,
                })
                .collect(),
            edges: graph
                .edges()
                .map(|(from, to)| JsonEdge { from, to })
                .collect(),
            options: GraphOptions::default(),
        }
    }
}

/// Serialize `graph` as a pretty-printed JSON document.
///
/// # Errors
///
/// Returns [`Error::Json`](crate::Error::Json) if serialization fails.
pub fn to_json(graph: &Graph) -> Result<String> {
    Ok(serde_json::to_string_pretty(&GraphDocument::new(graph))?)
}

/// Render `graph` as a Graphviz `digraph`.
///
/// Node `i` is the `i`-th node in graph order; edges refer to those numbers.
#[must_use]
pub fn to_dot(graph: &Graph) -> String {
    let mut dot = String::from("digraph {\n");
    for (i, node) in graph.nodes().enumerate() {
        let _ = writeln!(dot, "\t{i} [label=\"{}\"]", escape_label(&node.id));
    }
    dot.push('\n');
    for (from, to) in graph.edge_indices() {
        let _ = writeln!(dot, "\t{from} -> {to};");
    }
    dot.push_str("}\n");
    dot
}

/// All node names, sorted.
#[must_use]
pub fn sorted_names(graph: &Graph) -> Vec<String> {
    let mut names: Vec<String> = graph.nodes().map(|n| n.id.clone()).collect();
    names.sort();
    names
}

/// Render `graph` in the requested format.
///
/// # Errors
///
/// Returns [`Error::Json`](crate::Error::Json) if serialization fails.
pub fn render(graph: &Graph, format: Format) -> Result<String> {
    match format {
        Format::Json => to_json(graph),
        Format::Dot => Ok(to_dot(graph)),
        Format::List => Ok(serde_json::to_string_pretty(&sorted_names(graph))?),
    }
}

fn escape_label(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}
