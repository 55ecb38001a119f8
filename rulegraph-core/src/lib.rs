//! Attributed port graphs with nested nodes, the data structure rewritten by
//! `rulegraph-rewrite`.
//!
//! A [`Graph`] holds [`Node`]s carrying typed [`Port`]s, directed [`Edge`]s
//! between ports or whole nodes (partitioned into [`Layer`]s), and named
//! [`Component`] definitions. Nodes may be nested inside other nodes.
//!
//! Rewrite engines access graphs through the [`GraphView`] and [`GraphMut`]
//! traits; mutations through [`GraphMut`] are persistent and return a new
//! graph.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod core;
pub mod graph;

pub use crate::core::{Direction, Endpoint, Layer, NodeId, Port, PortType};
pub use crate::graph::{
    Component, ComponentId, Edge, EndpointRef, Graph, GraphError, GraphMut, GraphView, Node,
    NodeMetadata, NodeMetadataMap, PortNotFoundError, ValidationError,
};

#[cfg(test)]
pub mod proptest;
