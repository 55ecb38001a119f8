//! Repeated application of an ordered list of rules until a fixpoint.

use std::fmt;

use rulegraph_core::GraphView;

use crate::composable::ComposablePass;
use crate::equality::GraphEquality;
use crate::observer::RewriteObserver;
use crate::rule::{Applied, BoxedRule, RewriteError, RewriteRule};

/// Applies rules until none of them fires.
///
/// Each outer iteration tries the rules in order and stops at the first one
/// that fires; the next iteration starts again from the first rule. The
/// rewriter holds no state between runs, so a single rewriter may rewrite
/// several graphs at once from different threads.
pub struct Rewriter<G: GraphView> {
    rules: Vec<BoxedRule<G>>,
    max_iterations: Option<usize>,
    equality: GraphEquality,
}

impl<G: GraphView> Default for Rewriter<G> {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            max_iterations: None,
            equality: GraphEquality::default(),
        }
    }
}

impl<G: GraphView> fmt::Debug for Rewriter<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rewriter")
            .field(
                "rules",
                &self.rules.iter().map(|r| r.name()).collect::<Vec<_>>(),
            )
            .field("max_iterations", &self.max_iterations)
            .field("equality", &self.equality)
            .finish()
    }
}

/// The result of a rewrite, with statistics.
#[derive(Clone, Debug, PartialEq)]
pub struct Rewritten<G> {
    /// The rewritten graph.
    pub graph: G,
    /// Number of outer iterations started.
    pub iterations: usize,
    /// Number of rule firings.
    pub firings: usize,
    /// Whether a fixpoint was reached. `false` when the iteration budget ran
    /// out first.
    pub converged: bool,
}

impl<G: GraphView> Rewriter<G> {
    /// Creates a rewriter without rules, iteration bound, using the default
    /// equality.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a rule. Rules earlier in the list take priority.
    #[must_use]
    pub fn with_rule(mut self, rule: impl RewriteRule<G> + 'static) -> Self {
        self.push_rule(rule);
        self
    }

    /// Appends a rule.
    pub fn push_rule(&mut self, rule: impl RewriteRule<G> + 'static) {
        self.rules.push(Box::new(rule));
    }

    /// Bounds the number of outer iterations.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    /// Sets how the rules decide whether they changed the graph.
    #[must_use]
    pub fn with_equality(mut self, equality: GraphEquality) -> Self {
        self.equality = equality;
        self
    }

    /// The rules, in priority order.
    pub fn rules(&self) -> impl Iterator<Item = &dyn RewriteRule<G>> + '_ {
        self.rules.iter().map(|r| &**r)
    }

    /// The iteration bound, if any.
    pub fn max_iterations(&self) -> Option<usize> {
        self.max_iterations
    }

    /// The equality policy.
    pub fn equality(&self) -> GraphEquality {
        self.equality
    }

    /// Rewrites `graph`, returning the final graph.
    ///
    /// Running out of iterations is not an error; use
    /// [`Rewriter::run_with_stats`] to find out whether a fixpoint was
    /// reached.
    pub fn run(&self, graph: &G) -> Result<G, RewriteError<G::Error>> {
        self.run_with_stats(graph).map(|r| r.graph)
    }

    /// Rewrites `graph`, reporting how the rewrite went.
    pub fn run_with_stats(&self, graph: &G) -> Result<Rewritten<G>, RewriteError<G::Error>> {
        self.run_with_observer(graph, &mut ())
    }

    /// Rewrites `graph`, reporting every event to `observer`.
    ///
    /// On error the input graph is untouched and no partial result is
    /// returned.
    pub fn run_with_observer(
        &self,
        graph: &G,
        observer: &mut dyn RewriteObserver<G>,
    ) -> Result<Rewritten<G>, RewriteError<G::Error>> {
        let mut current = graph.clone();
        let mut iterations = 0;
        let mut firings = 0;
        loop {
            if let Some(max) = self.max_iterations {
                if iterations >= max {
                    observer.budget_exhausted(&current, max);
                    return Ok(Rewritten {
                        graph: current,
                        iterations,
                        firings,
                        converged: false,
                    });
                }
            }
            iterations += 1;
            observer.iteration_started(iterations);
            match self.sweep(&current, observer)? {
                Applied::Fired(next) => {
                    current = next;
                    firings += 1;
                }
                Applied::NotFired => {
                    observer.fixpoint_reached(&current, iterations);
                    return Ok(Rewritten {
                        graph: current,
                        iterations,
                        firings,
                        converged: true,
                    });
                }
            }
        }
    }

    /// Tries the rules in order, returning the result of the first that
    /// fires.
    fn sweep(
        &self,
        graph: &G,
        observer: &mut dyn RewriteObserver<G>,
    ) -> Result<Applied<G>, RewriteError<G::Error>> {
        for rule in &self.rules {
            if let fired @ Applied::Fired(_) = rule.apply_with(graph, self.equality, observer)? {
                return Ok(fired);
            }
        }
        Ok(Applied::NotFired)
    }
}

impl<G: GraphView> ComposablePass<G> for Rewriter<G> {
    type Error = RewriteError<G::Error>;

    fn run(&self, graph: &G) -> Result<G, Self::Error> {
        Rewriter::run(self, graph)
    }
}

/// Builds a [`Rewriter`] from a list of rules and an optional iteration
/// bound.
pub fn rewrite<G: GraphView>(
    rules: impl IntoIterator<Item = BoxedRule<G>>,
    max_iterations: Option<usize>,
) -> Rewriter<G> {
    Rewriter {
        rules: rules.into_iter().collect(),
        max_iterations,
        equality: GraphEquality::default(),
    }
}

#[cfg(test)]
mod test {
    use rstest::rstest;
    use rulegraph_core::{Graph, GraphMut, Node};

    use super::*;
    use crate::observer::FiringLog;
    use crate::rule::{MatchResult, apply_node};
    use crate::test::simple_graph;

    /// Renames nodes called `from` to `to`.
    fn rename(from: &'static str, to: &'static str) -> BoxedRule<Graph> {
        apply_node::<Graph, ()>(
            move |n, _| Some((n.name == from).into()),
            move |m, graph| {
                let node = m.candidate();
                graph
                    .replace_node(node, Node::new(to).with_id(node.id()))
                    .map(Some)
            },
        )
        .with_name(format!("{from}->{to}"))
        .boxed()
    }

    #[rstest]
    fn empty_rewriter_converges_at_once(simple_graph: Graph) {
        let out = Rewriter::new().run_with_stats(&simple_graph).unwrap();
        assert_eq!(out.graph, simple_graph);
        assert_eq!(out.iterations, 1);
        assert_eq!(out.firings, 0);
        assert!(out.converged);
    }

    #[rstest]
    fn rules_chain_to_a_fixpoint(simple_graph: Graph) {
        let rewriter = rewrite([rename("a", "x"), rename("x", "y")], None);
        let mut log = FiringLog::new();
        let out = rewriter
            .run_with_observer(&simple_graph, &mut log)
            .unwrap();
        assert!(out.graph.node_by_name("y").is_some());
        assert_eq!(out.firings, 2);
        assert_eq!(out.iterations, 3);
        assert_eq!(
            log.rule_names().collect::<Vec<_>>(),
            [Some("a->x"), Some("x->y")]
        );
    }

    #[rstest]
    fn earlier_rules_take_priority(simple_graph: Graph) {
        // The sweep restarts from the first rule after every firing.
        let rewriter = Rewriter::new()
            .with_rule(rename("c", "e"))
            .with_rule(rename("b", "c"))
            .with_rule(rename("a", "d"));
        let mut log = FiringLog::new();
        rewriter
            .run_with_observer(&simple_graph, &mut log)
            .unwrap();
        assert_eq!(
            log.rule_names().collect::<Vec<_>>(),
            [Some("b->c"), Some("c->e"), Some("a->d")]
        );
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(5)]
    fn budget_bounds_ping_pong(simple_graph: Graph, #[case] max: usize) {
        let rewriter = rewrite([rename("a", "z"), rename("z", "a")], Some(max));
        let out = rewriter.run_with_stats(&simple_graph).unwrap();
        assert!(!out.converged);
        assert_eq!(out.iterations, max);
        assert_eq!(out.firings, max);
    }

    #[rstest]
    fn errors_abort_the_rewrite(simple_graph: Graph) {
        let broken = apply_node::<Graph, ()>(|_, _| None, |_, _| Ok(None)).boxed();
        let rewriter = rewrite([rename("a", "x"), broken], None);
        assert!(matches!(
            rewriter.run(&simple_graph),
            Err(RewriteError::MatcherContract { .. })
        ));
    }

    #[rstest]
    fn no_op_rules_keep_the_graph(simple_graph: Graph) {
        let rewriter = Rewriter::new()
            .with_rule(apply_node::<Graph, ()>(
                |_, _| Some(MatchResult::NoMatch),
                |_, _| Ok(None),
            ))
            .with_equality(GraphEquality::Canonical);
        assert_eq!(rewriter.equality(), GraphEquality::Canonical);
        assert_eq!(rewriter.rules().count(), 1);
        assert_eq!(rewriter.run(&simple_graph).unwrap(), simple_graph);
    }
}
