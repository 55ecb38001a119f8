//! Graph passes and utilities for composing them

use std::{error::Error, marker::PhantomData};

use itertools::Either;
use rulegraph_core::GraphView;

use crate::equality::canonical_form;

/// A transformation from one graph to another.
///
/// Passes never modify their input; they return the transformed graph.
pub trait ComposablePass<G>: Sized {
    /// Error raised by the pass.
    type Error: Error;

    /// Runs the pass on `graph`.
    fn run(&self, graph: &G) -> Result<G, Self::Error>;

    /// Converts the errors of this pass.
    fn map_err<E2: Error>(
        self,
        f: impl Fn(Self::Error) -> E2,
    ) -> impl ComposablePass<G, Error = E2> {
        ErrMapper::new(self, f)
    }

    /// Runs `other` on the output of this pass.
    fn sequence(
        self,
        other: impl ComposablePass<G, Error = Self::Error>,
    ) -> impl ComposablePass<G, Error = Self::Error> {
        (self, other)
    }

    /// Runs `other` on the output of this pass, keeping both error types.
    fn sequence_either<P: ComposablePass<G>>(
        self,
        other: P,
    ) -> impl ComposablePass<G, Error = Either<Self::Error, P::Error>> {
        self.map_err(Either::Left)
            .sequence(other.map_err(Either::Right))
    }
}

struct ErrMapper<P, E, F>(P, F, PhantomData<E>);

impl<P, E, F> ErrMapper<P, E, F> {
    fn new(pass: P, err_fn: F) -> Self {
        Self(pass, err_fn, PhantomData)
    }
}

impl<G, P: ComposablePass<G>, Err: Error, F: Fn(P::Error) -> Err> ComposablePass<G>
    for ErrMapper<P, Err, F>
{
    type Error = Err;

    fn run(&self, graph: &G) -> Result<G, Self::Error> {
        self.0.run(graph).map_err(&self.1)
    }
}

impl<G, Err: Error, P1: ComposablePass<G, Error = Err>, P2: ComposablePass<G, Error = Err>>
    ComposablePass<G> for (P1, P2)
{
    type Error = Err;

    fn run(&self, graph: &G) -> Result<G, Self::Error> {
        let graph = self.0.run(graph)?;
        self.1.run(&graph)
    }
}

/// Error from a [`ValidatingPass`]
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum ValidatePassError<V, E> {
    /// The input graph was invalid.
    #[error("Failed to validate input graph: {err}\n{pretty_graph}")]
    Input {
        /// The validation failure.
        #[source]
        err: V,
        /// The canonical form of the invalid graph.
        pretty_graph: String,
    },
    /// The pass produced an invalid graph.
    #[error("Failed to validate output graph: {err}\n{pretty_graph}")]
    Output {
        /// The validation failure.
        #[source]
        err: V,
        /// The canonical form of the invalid graph.
        pretty_graph: String,
    },
    /// The pass itself failed.
    #[error(transparent)]
    Underlying(E),
}

/// Runs an underlying pass, validating the graph before and after.
#[derive(Clone, Debug, Default)]
pub struct ValidatingPass<P>(P);

impl<P> ValidatingPass<P> {
    /// Wraps `underlying`.
    pub fn new(underlying: P) -> Self {
        Self(underlying)
    }

    /// The wrapped pass.
    pub fn underlying(&self) -> &P {
        &self.0
    }

    fn validation_impl<G: GraphView, E>(
        graph: &G,
        mk_err: impl FnOnce(G::Error, String) -> ValidatePassError<G::Error, E>,
    ) -> Result<(), ValidatePassError<G::Error, E>> {
        graph.validate().map_err(|err| {
            let pretty_graph =
                serde_json::to_string_pretty(&canonical_form(graph)).unwrap_or_default();
            mk_err(err, pretty_graph)
        })
    }
}

impl<G: GraphView, P: ComposablePass<G>> ComposablePass<G> for ValidatingPass<P>
where
    G::Error: 'static,
    P::Error: 'static,
{
    type Error = ValidatePassError<G::Error, P::Error>;

    fn run(&self, graph: &G) -> Result<G, Self::Error> {
        Self::validation_impl(graph, |err, pretty_graph| ValidatePassError::Input {
            err,
            pretty_graph,
        })?;
        let out = self.0.run(graph).map_err(ValidatePassError::Underlying)?;
        Self::validation_impl(&out, |err, pretty_graph| ValidatePassError::Output {
            err,
            pretty_graph,
        })?;
        Ok(out)
    }
}

#[cfg(test)]
mod test {
    use std::convert::Infallible;

    use rstest::rstest;
    use rulegraph_core::{Graph, GraphError, Node, ValidationError};

    use super::*;
    use crate::test::simple_graph;

    /// Adds a top-level node with a fixed name.
    struct AddNode(&'static str);

    impl ComposablePass<Graph> for AddNode {
        type Error = Infallible;

        fn run(&self, graph: &Graph) -> Result<Graph, Self::Error> {
            let mut graph = graph.clone();
            graph.add_node(Node::new(self.0));
            Ok(graph)
        }
    }

    /// Always fails.
    struct Fail;

    impl ComposablePass<Graph> for Fail {
        type Error = GraphError;

        fn run(&self, _graph: &Graph) -> Result<Graph, Self::Error> {
            Err(GraphError::NodeNotFound(rulegraph_core::NodeId::new(7)))
        }
    }

    #[rstest]
    fn sequences_run_in_order(simple_graph: Graph) {
        let out = AddNode("x").sequence(AddNode("y")).run(&simple_graph).unwrap();
        let names: Vec<_> = out.nodes_deep().map(|n| n.name.as_str()).collect();
        assert_eq!(names, ["a", "b", "x", "y"]);
    }

    #[rstest]
    fn either_keeps_both_errors(simple_graph: Graph) {
        let err = AddNode("x")
            .sequence_either(Fail)
            .run(&simple_graph)
            .unwrap_err();
        assert!(matches!(err, Either::Right(GraphError::NodeNotFound(_))));
    }

    #[rstest]
    fn validation_catches_bad_output(simple_graph: Graph) {
        let pass = ValidatingPass::new(AddNode("a"));
        let err = pass.run(&simple_graph).unwrap_err();
        match err {
            ValidatePassError::Output { err, pretty_graph } => {
                assert!(matches!(
                    err,
                    GraphError::Validation(ValidationError::DuplicateName { .. })
                ));
                assert!(pretty_graph.contains("\"name\": \"a\""));
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[rstest]
    fn validation_error_reports_its_source(simple_graph: Graph) {
        let err = ValidatingPass::new(AddNode("b"))
            .run(&simple_graph)
            .unwrap_err();
        let source = Error::source(&err).expect("validation failure is the source");
        assert!(source.to_string().contains('b'));
    }

    #[rstest]
    fn validation_passes_good_graphs(simple_graph: Graph) {
        let pass = ValidatingPass::new(AddNode("c"));
        assert_eq!(pass.run(&simple_graph).unwrap().node_count(), 3);
    }
}
