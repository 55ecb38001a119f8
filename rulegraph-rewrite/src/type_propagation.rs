//! Propagation of concrete port types along dataflow edges.
//!
//! Ports typed [`PortType::Generic`] take the type of the concrete port at
//! the other end of a dataflow edge, in either direction, until no dataflow
//! edge connects a generic port to a concrete one.

use rulegraph_core::{Graph, GraphError, GraphView, Layer, Node, Port, PortType};

use crate::composable::ComposablePass;
use crate::equality::GraphEquality;
use crate::observer::RewriteObserver;
use crate::replace_port::replace_port;
use crate::rewrite::{Rewritten, Rewriter};
use crate::rule::{GeneratorResult, Match, MatchResult, RewriteError, Rule};
use crate::selector::{EdgeCandidate, EdgeSelector};

/// Name of the rule built by [`propagate_types_rule`].
pub const PROPAGATE_TYPES: &str = "propagate-types";

/// A port to retype, found by [`propagate_types_rule`].
#[derive(Clone, Debug, PartialEq)]
pub struct Retype {
    /// The node owning the generic port.
    pub node: Node,
    /// The generic port.
    pub port: Port,
    /// The type it receives.
    pub port_type: PortType,
}

fn generic_end(edge: &EdgeCandidate<Graph>, _graph: &Graph) -> Option<MatchResult<Retype>> {
    let (Some(source), Some(target)) = (&edge.source_port, &edge.target_port) else {
        return Some(MatchResult::NoMatch);
    };
    let retype = match (source.is_generic(), target.is_generic()) {
        (true, false) => Retype {
            node: edge.source.clone(),
            port: source.clone(),
            port_type: target.port_type.clone(),
        },
        (false, true) => Retype {
            node: edge.target.clone(),
            port: target.clone(),
            port_type: source.port_type.clone(),
        },
        _ => return Some(MatchResult::NoMatch),
    };
    Some(MatchResult::Value(retype))
}

fn retype(matched: &Match<EdgeCandidate<Graph>, Retype>, graph: &Graph) -> GeneratorResult<Graph> {
    let Some(Retype {
        node,
        port,
        port_type,
    }) = matched.value()
    else {
        return Ok(None);
    };
    replace_port(node, port, port.with_type(port_type.clone()), graph).map(Some)
}

/// The rule retyping the generic end of a dataflow edge whose other end is
/// concrete.
pub fn propagate_types_rule() -> Rule<Graph, EdgeSelector, Retype> {
    Rule::new(
        EdgeSelector::in_layer(Layer::DATAFLOW.as_str()),
        generic_end,
        retype,
    )
    .with_name(PROPAGATE_TYPES)
}

/// A pass propagating concrete types until a fixpoint.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypePropagation {
    max_iterations: Option<usize>,
    equality: GraphEquality,
}

impl TypePropagation {
    /// Creates the pass, without an iteration bound.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bounds the number of retyped ports.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    /// Sets the equality policy used to detect changes.
    #[must_use]
    pub fn with_equality(mut self, equality: GraphEquality) -> Self {
        self.equality = equality;
        self
    }

    /// The rewriter implementing this pass.
    pub fn rewriter(&self) -> Rewriter<Graph> {
        let rewriter = Rewriter::new()
            .with_rule(propagate_types_rule())
            .with_equality(self.equality);
        match self.max_iterations {
            Some(max) => rewriter.with_max_iterations(max),
            None => rewriter,
        }
    }

    /// Runs the pass, reporting to `observer`.
    pub fn run_with_observer(
        &self,
        graph: &Graph,
        observer: &mut dyn RewriteObserver<Graph>,
    ) -> Result<Rewritten<Graph>, RewriteError<GraphError>> {
        self.rewriter().run_with_observer(graph, observer)
    }
}

impl ComposablePass<Graph> for TypePropagation {
    type Error = RewriteError<GraphError>;

    fn run(&self, graph: &Graph) -> Result<Graph, Self::Error> {
        self.rewriter().run(graph)
    }
}

/// Counts the ports of `graph`, at every nesting level, still typed generic.
pub fn generic_port_count(graph: &Graph) -> usize {
    graph
        .nodes_deep()
        .map(|n| n.ports.iter().filter(|p| p.is_generic()).count())
        .sum()
}
