//! Read-only and persistent-mutation access to rule graphs.
//!
//! Rewrite engines are written against these traits rather than against
//! [`Graph`] directly, so any representation providing the same queries can be
//! rewritten.

use std::fmt::{Debug, Display};
use std::hash::Hash;

use super::{Graph, PortNotFoundError};
use crate::Direction;

/// A borrowed view of one end of an edge.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct EndpointRef<'a, N> {
    /// The node at this end of the edge.
    pub node: &'a N,
    /// The port at this end, for edges between ports.
    pub port: Option<&'a str>,
}

/// A trait for inspecting rule graphs.
pub trait GraphView: Clone + Debug {
    /// Handle identifying a node.
    type NodeId: Clone + Eq + Hash + Debug + Display;
    /// A node, owning an ordered collection of ports.
    type Node: Clone + Debug;
    /// A port belonging to a node.
    type Port: Clone + Debug;
    /// An edge between nodes or ports.
    type Edge: Clone + Debug;
    /// A graph-level component.
    type Component: Clone + Debug;
    /// Error produced by failing queries or mutations.
    type Error: std::error::Error + From<PortNotFoundError>;

    /// Iterates over the top-level nodes of the graph.
    fn nodes(&self) -> impl Iterator<Item = &Self::Node> + '_;

    /// Iterates over every node in the graph, descending into compound nodes.
    ///
    /// Parents are yielded before their children and no node is yielded twice.
    fn nodes_deep(&self) -> impl Iterator<Item = &Self::Node> + '_;

    /// Returns the node with the given handle, if it exists.
    fn node(&self, id: &Self::NodeId) -> Option<&Self::Node>;

    /// Returns the handle of a node.
    fn node_id(node: &Self::Node) -> &Self::NodeId;

    /// The ports of a node, in declaration order.
    fn ports(node: &Self::Node) -> &[Self::Port];

    /// Returns the port with the given name, if the node has one.
    fn port<'a>(name: &str, node: &'a Self::Node) -> Option<&'a Self::Port> {
        Self::ports(node).iter().find(|p| Self::port_name(p) == name)
    }

    /// The name of a port.
    fn port_name(port: &Self::Port) -> &str;

    /// The direction of a port.
    fn port_direction(port: &Self::Port) -> Direction;

    /// Iterates over the edges between top-level nodes.
    fn edges(&self) -> impl Iterator<Item = &Self::Edge> + '_;

    /// Iterates over all edges of the graph, including those inside compound
    /// nodes.
    fn edges_deep(&self) -> impl Iterator<Item = &Self::Edge> + '_;

    /// Returns `true` if the edge connects two ports rather than two nodes.
    fn is_port_edge(edge: &Self::Edge) -> bool;

    /// The source end of an edge.
    fn edge_source(edge: &Self::Edge) -> EndpointRef<'_, Self::NodeId>;

    /// The target end of an edge.
    fn edge_target(edge: &Self::Edge) -> EndpointRef<'_, Self::NodeId>;

    /// The layer an edge belongs to.
    fn edge_layer(edge: &Self::Edge) -> &str;

    /// Iterates over the components of the graph.
    fn components(&self) -> impl Iterator<Item = &Self::Component> + '_;

    /// Serializes the graph into a canonical form.
    ///
    /// Graphs with the same structure must produce equal canonical forms up to
    /// the identity fields `id`, `path` and `node`.
    fn to_canonical_form(&self) -> serde_json::Value;

    /// Checks whether two graphs are structurally equal, ignoring node
    /// identities.
    ///
    /// The default implementation compares canonical forms.
    fn is_isomorphic(&self, other: &Self) -> bool {
        self.to_canonical_form() == other.to_canonical_form()
    }

    /// Checks the structural invariants of the graph.
    fn validate(&self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Persistent mutation of rule graphs.
///
/// Mutations never modify `self`; they return the updated graph.
pub trait GraphMut: GraphView {
    /// Returns a graph where `old` has been replaced by `new`.
    ///
    /// The replacement keeps the handle and hierarchy position of `old`.
    fn replace_node(&self, old: &Self::Node, new: Self::Node) -> Result<Self, Self::Error>;

    /// Returns a copy of `node` with its ports replaced by `ports`.
    fn node_with_ports(node: &Self::Node, ports: Vec<Self::Port>) -> Self::Node;
}

impl GraphView for Graph {
    type NodeId = crate::NodeId;
    type Node = super::Node;
    type Port = crate::Port;
    type Edge = super::Edge;
    type Component = super::Component;
    type Error = super::GraphError;

    fn nodes(&self) -> impl Iterator<Item = &Self::Node> + '_ {
        self.hierarchy.roots().iter().map(|id| &self.nodes[id])
    }

    fn nodes_deep(&self) -> impl Iterator<Item = &Self::Node> + '_ {
        self.hierarchy.preorder().map(|id| &self.nodes[&id])
    }

    #[inline]
    fn node(&self, id: &Self::NodeId) -> Option<&Self::Node> {
        self.nodes.get(id)
    }

    #[inline]
    fn node_id(node: &Self::Node) -> &Self::NodeId {
        &node.id
    }

    #[inline]
    fn ports(node: &Self::Node) -> &[Self::Port] {
        &node.ports
    }

    #[inline]
    fn port_name(port: &Self::Port) -> &str {
        &port.name
    }

    #[inline]
    fn port_direction(port: &Self::Port) -> Direction {
        port.direction
    }

    fn edges(&self) -> impl Iterator<Item = &Self::Edge> + '_ {
        self.edges.iter().filter(|e| {
            self.hierarchy.is_root(e.from.node) && self.hierarchy.is_root(e.to.node)
        })
    }

    fn edges_deep(&self) -> impl Iterator<Item = &Self::Edge> + '_ {
        self.edges.iter()
    }

    #[inline]
    fn is_port_edge(edge: &Self::Edge) -> bool {
        edge.is_port_edge()
    }

    fn edge_source(edge: &Self::Edge) -> EndpointRef<'_, Self::NodeId> {
        EndpointRef {
            node: &edge.from.node,
            port: edge.from.port.as_deref(),
        }
    }

    fn edge_target(edge: &Self::Edge) -> EndpointRef<'_, Self::NodeId> {
        EndpointRef {
            node: &edge.to.node,
            port: edge.to.port.as_deref(),
        }
    }

    #[inline]
    fn edge_layer(edge: &Self::Edge) -> &str {
        edge.layer.as_str()
    }

    fn components(&self) -> impl Iterator<Item = &Self::Component> + '_ {
        self.components.values()
    }

    fn to_canonical_form(&self) -> serde_json::Value {
        super::canonical::canonical_form(self)
    }

    fn is_isomorphic(&self, other: &Self) -> bool {
        super::canonical::isomorphic(self, other)
    }

    fn validate(&self) -> Result<(), Self::Error> {
        Graph::validate(self).map_err(Into::into)
    }
}

impl GraphMut for Graph {
    fn replace_node(&self, old: &Self::Node, new: Self::Node) -> Result<Self, Self::Error> {
        let mut graph = self.clone();
        graph.set_node(old.id, new)?;
        Ok(graph)
    }

    fn node_with_ports(node: &Self::Node, ports: Vec<Self::Port>) -> Self::Node {
        super::Node {
            ports,
            ..node.clone()
        }
    }
}
