//! The rule graph data structure, and its nodes, edges and components.

mod canonical;
mod hierarchy;
pub mod serialize;
pub mod validate;
pub mod views;

use std::io;

use derive_more::{Display, From};
use indexmap::IndexMap;
use itertools::Itertools;
use smol_str::SmolStr;
use thiserror::Error;

use self::hierarchy::Hierarchy;
pub use self::serialize::GraphSerializationError;
pub use self::validate::ValidationError;
pub use self::views::{EndpointRef, GraphMut, GraphView};
use crate::{Direction, Endpoint, Layer, NodeId, Port, PortType};

/// Arbitrary metadata entry for a node or edge.
pub type NodeMetadata = serde_json::Value;

/// The container of all the metadata entries for a node or edge.
pub type NodeMetadataMap = serde_json::Map<String, NodeMetadata>;

/// A node in a [`Graph`].
///
/// Nodes own their ports. A node is compound when other nodes are nested
/// inside it, see [`Graph::add_child`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Node {
    pub(crate) id: NodeId,
    /// Name of the node, unique among its siblings.
    pub name: SmolStr,
    /// Ports of the node, in declaration order.
    #[serde(default)]
    pub ports: Vec<Port>,
    /// Free-form attributes.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: NodeMetadataMap,
}

impl Node {
    /// Creates a node without ports.
    ///
    /// The node receives its handle when added to a graph.
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            id: NodeId::new(0),
            name: name.into(),
            ports: Vec::new(),
            metadata: NodeMetadataMap::new(),
        }
    }

    /// Returns the node with the given handle.
    ///
    /// Useful when building replacement nodes by hand; [`Graph::add_node`]
    /// overwrites the handle.
    #[must_use]
    pub fn with_id(mut self, id: NodeId) -> Self {
        self.id = id;
        self
    }

    /// Adds a port.
    #[must_use]
    pub fn with_port(mut self, port: Port) -> Self {
        self.ports.push(port);
        self
    }

    /// Adds an input port.
    #[must_use]
    pub fn with_input(self, name: impl Into<SmolStr>, ty: impl Into<PortType>) -> Self {
        self.with_port(Port::input(name, ty))
    }

    /// Adds an output port.
    #[must_use]
    pub fn with_output(self, name: impl Into<SmolStr>, ty: impl Into<PortType>) -> Self {
        self.with_port(Port::output(name, ty))
    }

    /// Adds a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<NodeMetadata>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// The handle of the node.
    #[inline]
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Returns the port with the given name.
    #[must_use]
    pub fn port(&self, name: &str) -> Option<&Port> {
        self.ports.iter().find(|p| p.name == name)
    }

    /// Iterates over the ports in one direction.
    pub fn ports_in(&self, direction: Direction) -> impl Iterator<Item = &Port> + '_ {
        self.ports.iter().filter(move |p| p.direction == direction)
    }

    /// Returns `true` if any port has the placeholder type.
    #[must_use]
    pub fn has_generic_ports(&self) -> bool {
        self.ports.iter().any(Port::is_generic)
    }
}

/// A directed edge between two nodes, or between two ports.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Edge {
    /// Source end.
    pub from: Endpoint,
    /// Target end.
    pub to: Endpoint,
    /// The relation this edge belongs to.
    #[serde(default)]
    pub layer: Layer,
    /// Any further attributes, passed through untouched.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub attributes: NodeMetadataMap,
}

impl Edge {
    /// Creates a dataflow edge.
    pub fn new(from: impl Into<Endpoint>, to: impl Into<Endpoint>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            layer: Layer::default(),
            attributes: NodeMetadataMap::new(),
        }
    }

    /// Moves the edge to another layer.
    #[must_use]
    pub fn with_layer(mut self, layer: impl Into<Layer>) -> Self {
        self.layer = layer.into();
        self
    }

    /// Adds an attribute.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<NodeMetadata>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Returns `true` if both ends of the edge name a port.
    #[inline]
    #[must_use]
    pub fn is_port_edge(&self) -> bool {
        self.from.port.is_some() && self.to.port.is_some()
    }
}

/// Identifier of a [`Component`].
#[derive(
    Clone,
    Debug,
    Display,
    From,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(transparent)]
pub struct ComponentId(SmolStr);

impl ComponentId {
    /// Creates a component identifier.
    pub fn new(id: impl Into<SmolStr>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ComponentId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A reusable definition stored alongside the nodes of a graph, with its own
/// port signature and version.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Component {
    /// Identifier, unique within a graph.
    #[serde(rename = "componentId")]
    pub id: ComponentId,
    /// Port signature of the component.
    #[serde(default)]
    pub ports: Vec<Port>,
    /// Version of the definition.
    pub version: semver::Version,
    /// Free-form attributes.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: NodeMetadataMap,
}

impl Component {
    /// Creates a component without ports.
    pub fn new(id: impl Into<ComponentId>, version: semver::Version) -> Self {
        Self {
            id: id.into(),
            ports: Vec::new(),
            version,
            metadata: NodeMetadataMap::new(),
        }
    }

    /// Adds a port to the signature.
    #[must_use]
    pub fn with_port(mut self, port: Port) -> Self {
        self.ports.push(port);
        self
    }
}

/// The rule graph data structure.
///
/// Cloning a graph yields an independent value; the [`GraphMut`] operations
/// return new graphs and leave the original untouched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Graph {
    /// Nodes, in insertion order.
    nodes: IndexMap<NodeId, Node>,
    /// The node nesting.
    hierarchy: Hierarchy,
    edges: Vec<Edge>,
    components: IndexMap<ComponentId, Component>,
    /// The handle given to the next inserted node.
    next_id: u32,
}

/// Errors that can occur while querying or mutating a [`Graph`].
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum GraphError {
    /// The node is not part of the graph.
    #[error("Node {0} does not exist in the graph.")]
    NodeNotFound(NodeId),
    /// An edge endpoint does not resolve to a node or port of the graph.
    #[error("Edge endpoint {endpoint:?} does not resolve in the graph.")]
    UnknownEndpoint {
        /// The unresolved endpoint.
        endpoint: Endpoint,
    },
    /// A component with the same identifier already exists.
    #[error("Component {0} is already defined.")]
    DuplicateComponent(ComponentId),
    /// A port replacement referred to a port the node does not have.
    #[error(transparent)]
    PortNotFound(#[from] PortNotFoundError),
    /// The graph breaks a structural invariant.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// A port was looked up on a node that does not (or no longer) have it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Node {node} has no {direction} port named {port:?}.")]
pub struct PortNotFoundError {
    /// Display form of the node handle.
    pub node: String,
    /// Name of the missing port.
    pub port: SmolStr,
    /// Direction of the missing port.
    pub direction: Direction,
}

/// Public API for graphs.
impl Graph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a top-level node, returning its handle.
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = self.insert(node);
        self.hierarchy.push_root(id);
        id
    }

    /// Adds a node nested inside `parent`, making the parent compound.
    pub fn add_child(&mut self, parent: NodeId, node: Node) -> Result<NodeId, GraphError> {
        if !self.contains_node(parent) {
            return Err(GraphError::NodeNotFound(parent));
        }
        let id = self.insert(node);
        self.hierarchy.push_child(parent, id);
        Ok(id)
    }

    /// Adds an edge. Both endpoints must resolve in the graph.
    pub fn add_edge(&mut self, edge: Edge) -> Result<(), GraphError> {
        for endpoint in [&edge.from, &edge.to] {
            if !self.resolves(endpoint) {
                return Err(GraphError::UnknownEndpoint {
                    endpoint: endpoint.clone(),
                });
            }
        }
        self.edges.push(edge);
        Ok(())
    }

    /// Removes an edge, returning whether it was present.
    pub fn remove_edge(&mut self, edge: &Edge) -> bool {
        match self.edges.iter().position(|e| e == edge) {
            Some(pos) => {
                self.edges.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Adds a component definition.
    pub fn add_component(&mut self, component: Component) -> Result<(), GraphError> {
        if self.components.contains_key(&component.id) {
            return Err(GraphError::DuplicateComponent(component.id));
        }
        self.components.insert(component.id.clone(), component);
        Ok(())
    }

    /// Returns the component with the given identifier.
    #[must_use]
    pub fn component(&self, id: &ComponentId) -> Option<&Component> {
        self.components.get(id)
    }

    /// Returns `true` if the node is part of the graph.
    #[inline]
    #[must_use]
    pub fn contains_node(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }

    /// Number of nodes, at every nesting level.
    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges, at every nesting level.
    #[inline]
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// The parent of a nested node.
    #[must_use]
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.hierarchy.parent(node)
    }

    /// The nodes directly nested inside `node`.
    #[must_use]
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.hierarchy.children(node)
    }

    /// Returns `true` if other nodes are nested inside `node`.
    #[must_use]
    pub fn is_compound(&self, node: NodeId) -> bool {
        !self.children(node).is_empty()
    }

    /// Returns the top-level node with the given name.
    #[must_use]
    pub fn node_by_name(&self, name: &str) -> Option<&Node> {
        self.hierarchy
            .roots()
            .iter()
            .map(|id| &self.nodes[id])
            .find(|n| n.name == name)
    }

    /// Returns the node at a `/`-separated path of names, e.g. `outer/inner`.
    #[must_use]
    pub fn node_by_path(&self, path: &str) -> Option<&Node> {
        let mut siblings = self.hierarchy.roots();
        let mut found = None;
        for name in path.split('/') {
            let id = siblings.iter().find(|id| self.nodes[*id].name == name)?;
            siblings = self.hierarchy.children(*id);
            found = Some(&self.nodes[id]);
        }
        found
    }

    /// The `/`-separated path of names leading to a node.
    #[must_use]
    pub fn path(&self, node: NodeId) -> Option<String> {
        let mut names = vec![self.nodes.get(&node)?.name.as_str()];
        let mut current = node;
        while let Some(parent) = self.hierarchy.parent(current) {
            names.push(self.nodes.get(&parent)?.name.as_str());
            current = parent;
        }
        Some(names.into_iter().rev().join("/"))
    }

    /// Read a graph from its JSON encoding.
    pub fn load_json(reader: impl io::Read) -> Result<Self, serde_json::Error> {
        serde_json::from_reader(reader)
    }

    /// Read a graph from a JSON string.
    pub fn from_json_str(json: impl AsRef<str>) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json.as_ref())
    }

    /// Write the graph as pretty-printed JSON.
    pub fn store_json(&self, writer: impl io::Write) -> Result<(), serde_json::Error> {
        serde_json::to_writer_pretty(writer, self)
    }

    fn insert(&mut self, mut node: Node) -> NodeId {
        let id = NodeId::new(self.next_id);
        self.next_id += 1;
        node.id = id;
        self.nodes.insert(id, node);
        id
    }

    /// Replaces the node stored at `id`, keeping the handle.
    pub(crate) fn set_node(&mut self, id: NodeId, mut node: Node) -> Result<(), GraphError> {
        let slot = self.nodes.get_mut(&id).ok_or(GraphError::NodeNotFound(id))?;
        node.id = id;
        *slot = node;
        Ok(())
    }

    fn resolves(&self, endpoint: &Endpoint) -> bool {
        match (self.nodes.get(&endpoint.node), &endpoint.port) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(node), Some(port)) => node.port(port).is_some(),
        }
    }
}
