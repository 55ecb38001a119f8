//! Attributed port graphs, and an engine rewriting them with local rules until
//! a fixpoint.
//!
//! A [`Graph`] holds nodes with typed ports, edges partitioned into layers, and
//! component definitions. Nodes may nest other nodes. Ports start out with
//! concrete types or the placeholder type `generic`.
//!
//! Rules live in [`rewrite`]: each pairs a matcher and a generator with a
//! selector choosing what the matcher inspects. A
//! [`Rewriter`](rewrite::Rewriter) applies an ordered list of rules, one
//! firing at a time, until none fires or an iteration bound is reached.
//!
//! # Example
//!
//! A rule renaming nodes called `tmp`, run to a fixpoint:
//!
//! ```
//! use rulegraph::rewrite::{MatchResult, Rewriter, apply_node};
//! use rulegraph::{Graph, GraphMut, Node};
//!
//! let mut graph = Graph::new();
//! let outer = graph.add_node(Node::new("outer"));
//! graph.add_child(outer, Node::new("tmp")).unwrap();
//!
//! let rename = apply_node::<Graph, ()>(
//!     |node, _| Some(MatchResult::from(node.name == "tmp")),
//!     |matched, graph| {
//!         let node = matched.candidate();
//!         let renamed = Node::new("scratch").with_id(node.id());
//!         graph.replace_node(node, renamed).map(Some)
//!     },
//! )
//! .with_name("rename-tmp");
//!
//! let result = Rewriter::new().with_rule(rename).run_with_stats(&graph).unwrap();
//! assert!(result.converged);
//! assert_eq!(result.firings, 1);
//! assert!(result.graph.node_by_path("outer/scratch").is_some());
//!
//! // The input graph is left untouched.
//! assert!(graph.node_by_path("outer/tmp").is_some());
//! ```

pub use rulegraph_core::{core, graph};
pub use rulegraph_rewrite as rewrite;

pub use rulegraph_core::{
    Component, ComponentId, Direction, Edge, Endpoint, Graph, GraphError, GraphMut, GraphView,
    Layer, Node, NodeId, Port, PortType, ValidationError,
};
