//! Strategies enumerating the objects a rule may match against.
//!
//! Selectors are evaluated afresh against the current graph every time a rule
//! is applied; candidates are owned copies and are never reused after the
//! graph changes.

use std::fmt::Debug;

use itertools::Either;
use rulegraph_core::{EndpointRef, GraphView};
use smol_str::SmolStr;

/// Enumerates candidates of one shape from a graph.
pub trait CandidateSelector<G: GraphView>: Send + Sync {
    /// The objects produced by this selector.
    type Candidate: Debug;

    /// Iterates over the candidates of `graph`, in a stable order.
    fn select<'g>(&'g self, graph: &'g G) -> impl Iterator<Item = Self::Candidate> + 'g;
}

/// Selects nodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeSelector {
    recursive: bool,
}

impl Default for NodeSelector {
    /// Descends into compound nodes.
    fn default() -> Self {
        Self { recursive: true }
    }
}

impl NodeSelector {
    /// Selects every node, parents before the nodes nested inside them.
    #[must_use]
    pub fn recursive() -> Self {
        Self { recursive: true }
    }

    /// Selects the top-level nodes only.
    #[must_use]
    pub fn top_level() -> Self {
        Self { recursive: false }
    }
}

impl<G: GraphView> CandidateSelector<G> for NodeSelector {
    type Candidate = G::Node;

    fn select<'g>(&'g self, graph: &'g G) -> impl Iterator<Item = Self::Candidate> + 'g {
        if self.recursive {
            Either::Left(graph.nodes_deep())
        } else {
            Either::Right(graph.nodes())
        }
        .cloned()
    }
}

/// A port, together with the node owning it.
#[derive(Clone, Debug)]
pub struct PortCandidate<G: GraphView> {
    /// The owning node.
    pub node: G::Node,
    /// The port.
    pub port: G::Port,
}

/// Selects every port of every node, in node order then declaration order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PortSelector {
    nodes: NodeSelector,
}

impl PortSelector {
    /// Selects the ports of the nodes chosen by `nodes`.
    #[must_use]
    pub fn new(nodes: NodeSelector) -> Self {
        Self { nodes }
    }
}

impl<G: GraphView> CandidateSelector<G> for PortSelector {
    type Candidate = PortCandidate<G>;

    fn select<'g>(&'g self, graph: &'g G) -> impl Iterator<Item = Self::Candidate> + 'g {
        CandidateSelector::<G>::select(&self.nodes, graph).flat_map(|node| {
            G::ports(&node)
                .iter()
                .map(|port| PortCandidate {
                    node: node.clone(),
                    port: port.clone(),
                })
                .collect::<Vec<_>>()
        })
    }
}

/// An edge resolved against the nodes and ports it connects.
#[derive(Clone, Debug)]
pub struct EdgeCandidate<G: GraphView> {
    /// The node the edge leaves.
    pub source: G::Node,
    /// The node the edge enters.
    pub target: G::Node,
    /// The port the edge leaves, for edges between ports.
    pub source_port: Option<G::Port>,
    /// The port the edge enters, for edges between ports.
    pub target_port: Option<G::Port>,
    /// The layer of the edge.
    pub layer: SmolStr,
    /// The edge itself, with all its attributes.
    pub edge: G::Edge,
}

/// Selects every edge, at every nesting level, whose endpoints resolve.
///
/// Edges naming a node or port that cannot be found are skipped.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EdgeSelector {
    layer: Option<SmolStr>,
}

impl EdgeSelector {
    /// Selects edges of every layer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects only the edges of one layer.
    pub fn in_layer(layer: impl Into<SmolStr>) -> Self {
        Self {
            layer: Some(layer.into()),
        }
    }

    fn resolve<G: GraphView>(graph: &G, edge: &G::Edge) -> Option<EdgeCandidate<G>> {
        let (source, source_port) = resolve_end(graph, G::edge_source(edge))?;
        let (target, target_port) = resolve_end(graph, G::edge_target(edge))?;
        if G::is_port_edge(edge) && (source_port.is_none() || target_port.is_none()) {
            return None;
        }
        Some(EdgeCandidate {
            source: source.clone(),
            target: target.clone(),
            source_port: source_port.cloned(),
            target_port: target_port.cloned(),
            layer: G::edge_layer(edge).into(),
            edge: edge.clone(),
        })
    }
}

/// Looks up the node, and the port if one is named. `None` if either is
/// missing.
fn resolve_end<'g, G: GraphView>(
    graph: &'g G,
    end: EndpointRef<'_, G::NodeId>,
) -> Option<(&'g G::Node, Option<&'g G::Port>)> {
    let node = graph.node(end.node)?;
    match end.port {
        None => Some((node, None)),
        Some(name) => G::port(name, node).map(|port| (node, Some(port))),
    }
}

impl<G: GraphView> CandidateSelector<G> for EdgeSelector {
    type Candidate = EdgeCandidate<G>;

    fn select<'g>(&'g self, graph: &'g G) -> impl Iterator<Item = Self::Candidate> + 'g {
        graph
            .edges_deep()
            .filter(|e| {
                self.layer
                    .as_ref()
                    .is_none_or(|layer| layer.as_str() == G::edge_layer(e))
            })
            .filter_map(|e| Self::resolve(graph, e))
    }
}

/// Selects every top-level component.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ComponentSelector;

impl<G: GraphView> CandidateSelector<G> for ComponentSelector {
    type Candidate = G::Component;

    fn select<'g>(&'g self, graph: &'g G) -> impl Iterator<Item = Self::Candidate> + 'g {
        graph.components().cloned()
    }
}
