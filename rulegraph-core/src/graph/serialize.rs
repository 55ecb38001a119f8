//! Serialization definition for [`Graph`]

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use smol_str::SmolStr;
use thiserror::Error;

use super::{Component, ComponentId, Edge, Graph, Hierarchy, Node, NodeMetadataMap};
use crate::{NodeId, Port};

/// A wrapper over the available graph serialization formats.
///
/// The implementation of `Serialize` for `Graph` encodes the graph in the most
/// recent version of the format.
///
/// Make sure to order the variants from newest to oldest, as the deserializer
/// will try to deserialize them in order.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "version", rename_all = "lowercase")]
enum Versioned<SerGraph> {
    /// Version 1 of the graph serialization format.
    V1(SerGraph),

    #[serde(other)]
    Unsupported,
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Debug)]
struct NodeSer {
    id: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parent: Option<NodeId>,
    name: SmolStr,
    #[serde(default)]
    ports: Vec<Port>,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    metadata: NodeMetadataMap,
}

/// Version 1 of the graph serialization format.
#[derive(Serialize, Deserialize, PartialEq, Debug)]
struct SerGraphV1 {
    /// Nodes, each listed after its parent.
    nodes: Vec<NodeSer>,
    #[serde(default)]
    edges: Vec<Edge>,
    #[serde(default)]
    components: Vec<Component>,
}

/// Errors that can occur while deserializing a graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum GraphSerializationError {
    /// Two nodes share a handle.
    #[error("Node handle {0} is used more than once.")]
    DuplicateNode(NodeId),
    /// A node names a parent that is not listed before it.
    #[error("Node {node} names {parent} as parent, but the parent is not listed before it.")]
    UnknownParent {
        /// The child node.
        node: NodeId,
        /// The missing parent.
        parent: NodeId,
    },
    /// Two components share an identifier.
    #[error("Component {0} is defined more than once.")]
    DuplicateComponent(ComponentId),
    /// A node handle is the largest possible one, so no node can follow it.
    #[error("Node handle {0} leaves no room for new nodes.")]
    HandleOverflow(NodeId),
}

impl Serialize for Graph {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        Versioned::V1(SerGraphV1::from(self)).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Graph {
    fn deserialize<D>(deserializer: D) -> Result<Graph, D::Error>
    where
        D: Deserializer<'de>,
    {
        let ser: Versioned<SerGraphV1> = Versioned::deserialize(deserializer)?;
        match ser {
            Versioned::V1(ser) => ser.try_into().map_err(serde::de::Error::custom),
            Versioned::Unsupported => Err(serde::de::Error::custom(
                "Unsupported graph serialization format.",
            )),
        }
    }
}

impl From<&Graph> for SerGraphV1 {
    fn from(graph: &Graph) -> Self {
        // Pre-order guarantees parents are listed before their children.
        let nodes = graph
            .hierarchy
            .preorder()
            .map(|id| {
                let node = &graph.nodes[&id];
                NodeSer {
                    id,
                    parent: graph.hierarchy.parent(id),
                    name: node.name.clone(),
                    ports: node.ports.clone(),
                    metadata: node.metadata.clone(),
                }
            })
            .collect();
        Self {
            nodes,
            edges: graph.edges.clone(),
            components: graph.components.values().cloned().collect(),
        }
    }
}

impl TryFrom<SerGraphV1> for Graph {
    type Error = GraphSerializationError;

    fn try_from(ser: SerGraphV1) -> Result<Self, Self::Error> {
        let mut nodes = IndexMap::with_capacity(ser.nodes.len());
        let mut hierarchy = Hierarchy::default();
        let mut next_id = 0;
        for n in ser.nodes {
            if nodes.contains_key(&n.id) {
                return Err(GraphSerializationError::DuplicateNode(n.id));
            }
            match n.parent {
                Some(parent) if !nodes.contains_key(&parent) => {
                    return Err(GraphSerializationError::UnknownParent {
                        node: n.id,
                        parent,
                    });
                }
                Some(parent) => hierarchy.push_child(parent, n.id),
                None => hierarchy.push_root(n.id),
            }
            let after = u32::try_from(n.id.index())
                .ok()
                .and_then(|i| i.checked_add(1))
                .ok_or(GraphSerializationError::HandleOverflow(n.id))?;
            next_id = next_id.max(after);
            nodes.insert(
                n.id,
                Node {
                    id: n.id,
                    name: n.name,
                    ports: n.ports,
                    metadata: n.metadata,
                },
            );
        }
        let mut components = IndexMap::with_capacity(ser.components.len());
        for c in ser.components {
            if components.contains_key(&c.id) {
                return Err(GraphSerializationError::DuplicateComponent(c.id));
            }
            components.insert(c.id.clone(), c);
        }
        // Edge endpoints are not checked here, see [`Graph::validate`].
        Ok(Graph {
            nodes,
            hierarchy,
            edges: ser.edges,
            components,
            next_id,
        })
    }
}
