//! Rule-based rewriting of rule graphs to a fixpoint.
//!
//! A [`Rule`] pairs a matcher and a generator with a [`CandidateSelector`]
//! choosing what the matcher looks at: nodes, ports, edges or components.
//! Applying a rule rewrites the first matching candidate and nothing else. A
//! [`Rewriter`] applies an ordered list of rules until none of them fires, or
//! until an iteration bound is reached.
//!
//! The engine works on any graph implementing
//! [`GraphView`](rulegraph_core::GraphView); generators build new graphs
//! through [`GraphMut`](rulegraph_core::GraphMut) and never modify the graph
//! they are given.
//!
//! ```
//! use rulegraph_core::{Edge, Graph, Node, PortType};
//! use rulegraph_rewrite::{ComposablePass, TypePropagation};
//!
//! let mut graph = Graph::new();
//! let a = graph.add_node(Node::new("a").with_output("out", "number"));
//! let b = graph.add_node(Node::new("b").with_input("in", "generic"));
//! graph.add_edge(Edge::new((a, "out"), (b, "in"))).unwrap();
//!
//! let typed = TypePropagation::new().run(&graph).unwrap();
//! let b = typed.node_by_name("b").unwrap();
//! assert_eq!(b.port("in").unwrap().port_type, PortType::new("number"));
//! ```

pub mod composable;
pub use composable::{ComposablePass, ValidatePassError, ValidatingPass};
pub mod equality;
pub use equality::{GraphEquality, graph_equals};
pub mod observer;
pub use observer::{FiringLog, RewriteObserver, RuleFired, TracingObserver};
pub mod replace_port;
pub use replace_port::replace_port;
pub mod rewrite;
pub use rewrite::{Rewriter, Rewritten, rewrite};
pub mod rule;
pub use rule::{
    Applied, BoxedRule, InvalidRuleError, Match, MatchResult, RewriteError, RewriteRule, Rule,
    apply_component, apply_edge, apply_node, apply_port, apply_rule,
};
pub mod selector;
pub use selector::{
    CandidateSelector, ComponentSelector, EdgeCandidate, EdgeSelector, NodeSelector,
    PortCandidate, PortSelector,
};
pub mod type_propagation;
pub use type_propagation::{TypePropagation, propagate_types_rule};

#[cfg(test)]
pub(crate) mod test {
    use rstest::fixture;
    use rulegraph_core::{Edge, Graph, Node};

    /// Node `a` with outputs `p1: number` and `p2: generic`, node `b` with
    /// inputs of the same names and types, cross-connected.
    #[fixture]
    pub(crate) fn simple_graph() -> Graph {
        let mut g = Graph::new();
        let a = g.add_node(
            Node::new("a")
                .with_output("p1", "number")
                .with_output("p2", "generic"),
        );
        let b = g.add_node(
            Node::new("b")
                .with_input("p1", "number")
                .with_input("p2", "generic"),
        );
        g.add_edge(Edge::new((a, "p1"), (b, "p2"))).unwrap();
        g.add_edge(Edge::new((a, "p2"), (b, "p1"))).unwrap();
        g
    }

    /// `outer` holds `inner_a` (holding `leaf`) and `inner_b`; `sink` sits
    /// next to `outer`.
    #[fixture]
    pub(crate) fn nested_graph() -> Graph {
        let mut g = Graph::new();
        let outer = g.add_node(Node::new("outer").with_output("out", "number"));
        let inner_a = g
            .add_child(outer, Node::new("inner_a").with_output("x", "generic"))
            .unwrap();
        g.add_child(inner_a, Node::new("leaf")).unwrap();
        let inner_b = g
            .add_child(outer, Node::new("inner_b").with_input("y", "number"))
            .unwrap();
        let sink = g.add_node(Node::new("sink").with_input("in", "number"));
        g.add_edge(Edge::new((inner_a, "x"), (inner_b, "y")))
            .unwrap();
        g.add_edge(Edge::new((outer, "out"), (sink, "in"))).unwrap();
        g
    }
}
