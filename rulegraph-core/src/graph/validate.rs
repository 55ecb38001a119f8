//! Structural validation of graphs.

use std::collections::HashSet;

use smol_str::SmolStr;
use thiserror::Error;

use super::{Edge, Graph};
use crate::{Direction, Endpoint, Layer, NodeId};

/// Errors that can occur while validating a [`Graph`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ValidationError {
    /// Two ports of a node share a name.
    #[error("Node {node} declares port {port:?} more than once.")]
    DuplicatePort {
        /// The offending node.
        node: NodeId,
        /// The repeated port name.
        port: SmolStr,
    },
    /// Two siblings share a name.
    #[error("Nodes {first} and {second} share the name {name:?} under the same parent.")]
    DuplicateName {
        /// The first node with the name.
        first: NodeId,
        /// A later sibling with the same name.
        second: NodeId,
        /// The shared name.
        name: SmolStr,
    },
    /// An edge endpoint names a node that is not in the graph.
    #[error("Edge {edge:?} refers to a node that does not exist.")]
    UnknownEdgeNode {
        /// The offending edge.
        edge: Box<Edge>,
    },
    /// An edge endpoint names a port that the node does not have.
    #[error("Edge {edge:?} refers to port {port:?} which node {node} does not have.")]
    UnknownEdgePort {
        /// The offending edge.
        edge: Box<Edge>,
        /// The node at the unresolved end.
        node: NodeId,
        /// The missing port.
        port: SmolStr,
    },
    /// A dataflow edge is connected against the port directions.
    #[error("Dataflow edge {edge:?} must run from an output port to an input port.")]
    WrongDirection {
        /// The offending edge.
        edge: Box<Edge>,
    },
    /// A dataflow edge connects a port to a bare node.
    #[error("Dataflow edge {edge:?} mixes a port end with a node end.")]
    MixedEndpoints {
        /// The offending edge.
        edge: Box<Edge>,
    },
}

impl Graph {
    /// Check the validity of the graph.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for node in self.nodes.values() {
            let mut seen = HashSet::new();
            if let Some(dup) = node.ports.iter().find(|p| !seen.insert(&p.name)) {
                return Err(ValidationError::DuplicatePort {
                    node: node.id,
                    port: dup.name.clone(),
                });
            }
        }
        self.validate_names(self.hierarchy.roots())?;
        for id in self.nodes.keys() {
            self.validate_names(self.hierarchy.children(*id))?;
        }
        self.edges.iter().try_for_each(|e| self.validate_edge(e))
    }

    fn validate_names(&self, siblings: &[NodeId]) -> Result<(), ValidationError> {
        let mut seen = std::collections::HashMap::new();
        for id in siblings {
            let name = &self.nodes[id].name;
            if let Some(first) = seen.insert(name, *id) {
                return Err(ValidationError::DuplicateName {
                    first,
                    second: *id,
                    name: name.clone(),
                });
            }
        }
        Ok(())
    }

    fn validate_edge(&self, edge: &Edge) -> Result<(), ValidationError> {
        let resolve = |end: &Endpoint| -> Result<Option<Direction>, ValidationError> {
            let node = self
                .nodes
                .get(&end.node)
                .ok_or_else(|| ValidationError::UnknownEdgeNode {
                    edge: Box::new(edge.clone()),
                })?;
            let Some(port) = &end.port else {
                return Ok(None);
            };
            node.port(port)
                .map(|p| Some(p.direction))
                .ok_or_else(|| ValidationError::UnknownEdgePort {
                    edge: Box::new(edge.clone()),
                    node: end.node,
                    port: port.clone(),
                })
        };
        let (src, tgt) = (resolve(&edge.from)?, resolve(&edge.to)?);
        if edge.layer != Layer::DATAFLOW {
            return Ok(());
        }
        match (src, tgt) {
            (None, None) => Ok(()),
            (Some(Direction::Output), Some(Direction::Input)) => Ok(()),
            (Some(_), Some(_)) => Err(ValidationError::WrongDirection {
                edge: Box::new(edge.clone()),
            }),
            _ => Err(ValidationError::MixedEndpoints {
                edge: Box::new(edge.clone()),
            }),
        }
    }
}
