//! Rewrite rules: a matcher, a generator, and the selector feeding them.
//!
//! A [`Rule`] enumerates candidates with its [`CandidateSelector`], asks the
//! matcher about each in turn, and hands the first match to the generator.
//! Applying a rule changes the graph at most once.

use std::fmt::{self, Debug};
use std::sync::Arc;

use rulegraph_core::GraphView;
use smol_str::SmolStr;
use thiserror::Error;

use crate::equality::GraphEquality;
use crate::observer::{RewriteObserver, RuleFired};
use crate::selector::{
    CandidateSelector, ComponentSelector, EdgeCandidate, EdgeSelector, NodeSelector,
    PortCandidate, PortSelector,
};

/// The verdict of a matcher on one candidate.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum MatchResult<M> {
    /// The candidate does not match.
    NoMatch,
    /// The candidate matches, and is itself the match value.
    Candidate,
    /// The candidate matches, with a computed value for the generator.
    Value(M),
}

impl<M> From<bool> for MatchResult<M> {
    fn from(matched: bool) -> Self {
        if matched {
            Self::Candidate
        } else {
            Self::NoMatch
        }
    }
}

/// A successful match, as passed to a generator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Match<C, M> {
    /// The matcher accepted the candidate as is.
    Candidate(C),
    /// The matcher computed a value.
    Value {
        /// The matched candidate.
        candidate: C,
        /// The value returned by the matcher.
        value: M,
    },
}

impl<C, M> Match<C, M> {
    /// The matched candidate.
    pub fn candidate(&self) -> &C {
        match self {
            Match::Candidate(candidate) | Match::Value { candidate, .. } => candidate,
        }
    }

    /// The value computed by the matcher, if any.
    pub fn value(&self) -> Option<&M> {
        match self {
            Match::Candidate(_) => None,
            Match::Value { value, .. } => Some(value),
        }
    }
}

/// What a generator returns: a new graph, nothing (a broken generator), or a
/// failure of the graph itself.
pub type GeneratorResult<G> = Result<Option<G>, <G as GraphView>::Error>;

/// A matcher function. `None` means the matcher gave no verdict.
pub type Matcher<G, C, M> = Arc<dyn Fn(&C, &G) -> Option<MatchResult<M>> + Send + Sync>;

/// A generator function.
pub type Generator<G, C, M> = Arc<dyn Fn(&Match<C, M>, &G) -> GeneratorResult<G> + Send + Sync>;

/// The outcome of applying a rule once.
#[derive(Clone, Debug, PartialEq)]
#[must_use]
pub enum Applied<G> {
    /// The rule matched and produced a different graph.
    Fired(G),
    /// No candidate matched.
    NotFired,
}

impl<G> Applied<G> {
    /// Returns `true` if the rule fired.
    pub fn is_fired(&self) -> bool {
        matches!(self, Applied::Fired(_))
    }

    /// The rewritten graph, if the rule fired.
    pub fn fired(self) -> Option<G> {
        match self {
            Applied::Fired(graph) => Some(graph),
            Applied::NotFired => None,
        }
    }
}

/// Identity of a rule in error messages.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct RuleName(Option<SmolStr>);

impl RuleName {
    /// The name given to the rule, if any.
    pub fn as_str(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl From<Option<&str>> for RuleName {
    fn from(name: Option<&str>) -> Self {
        Self(name.map(SmolStr::new))
    }
}

impl fmt::Display for RuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(name) => write!(f, "rule '{name}'"),
            None => f.write_str("unnamed rule"),
        }
    }
}

/// A rule was built without one of its functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum InvalidRuleError {
    /// No matcher was given.
    #[error("A rule needs a matcher.")]
    MissingMatcher,
    /// No generator was given.
    #[error("A rule needs a generator.")]
    MissingGenerator,
}

/// Errors raised while applying rules. Any of them aborts the rewrite.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum RewriteError<E> {
    /// A matcher returned no verdict for a candidate.
    #[error("The matcher of {rule} gave no verdict for candidate {candidate}.")]
    MatcherContract {
        /// The offending rule.
        rule: RuleName,
        /// Debug rendering of the candidate.
        candidate: String,
    },
    /// A generator returned no graph for a match.
    #[error("The generator of {rule} returned no graph for match {matched}.")]
    GeneratorContract {
        /// The offending rule.
        rule: RuleName,
        /// Debug rendering of the match.
        matched: String,
    },
    /// A rule matched, but its result equals the graph it was applied to.
    #[error("{rule} matched {matched} without changing the graph.")]
    NonProgressing {
        /// The offending rule.
        rule: RuleName,
        /// Debug rendering of the match.
        matched: String,
    },
    /// The graph collaborator failed inside a generator.
    #[error(transparent)]
    Graph(E),
}

impl<E> RewriteError<E> {
    /// The rule at fault, for errors raised by the engine itself.
    pub fn rule(&self) -> Option<&RuleName> {
        match self {
            RewriteError::MatcherContract { rule, .. }
            | RewriteError::GeneratorContract { rule, .. }
            | RewriteError::NonProgressing { rule, .. } => Some(rule),
            RewriteError::Graph(_) => None,
        }
    }
}

/// A rule that can be applied to graphs of type `G`.
///
/// Object safe, so heterogeneous rules can be listed in a
/// [`Rewriter`](crate::Rewriter).
pub trait RewriteRule<G: GraphView>: Send + Sync {
    /// The name of the rule, used in diagnostics.
    fn name(&self) -> Option<&str>;

    /// Applies the rule to the first matching candidate of `graph`.
    ///
    /// `equality` decides whether the generated graph differs from `graph`;
    /// `observer` hears about the firing.
    fn apply_with(
        &self,
        graph: &G,
        equality: GraphEquality,
        observer: &mut dyn RewriteObserver<G>,
    ) -> Result<Applied<G>, RewriteError<G::Error>>;

    /// Applies the rule with the default equality and no observer.
    fn apply(&self, graph: &G) -> Result<Applied<G>, RewriteError<G::Error>> {
        self.apply_with(graph, GraphEquality::default(), &mut ())
    }
}

/// A type-erased rule.
pub type BoxedRule<G> = Box<dyn RewriteRule<G>>;

impl<G: GraphView, R: RewriteRule<G> + ?Sized> RewriteRule<G> for Box<R> {
    fn name(&self) -> Option<&str> {
        (**self).name()
    }

    fn apply_with(
        &self,
        graph: &G,
        equality: GraphEquality,
        observer: &mut dyn RewriteObserver<G>,
    ) -> Result<Applied<G>, RewriteError<G::Error>> {
        (**self).apply_with(graph, equality, observer)
    }
}

/// A rule built from a selector, a matcher and a generator.
///
/// `M` is the type of the values computed by the matcher.
pub struct Rule<G: GraphView, S: CandidateSelector<G>, M = ()> {
    name: Option<SmolStr>,
    selector: S,
    matcher: Matcher<G, S::Candidate, M>,
    generator: Generator<G, S::Candidate, M>,
}

impl<G: GraphView, S: CandidateSelector<G> + Clone, M> Clone for Rule<G, S, M> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            selector: self.selector.clone(),
            matcher: Arc::clone(&self.matcher),
            generator: Arc::clone(&self.generator),
        }
    }
}

impl<G: GraphView, S: CandidateSelector<G> + Debug, M> Debug for Rule<G, S, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("selector", &self.selector)
            .finish_non_exhaustive()
    }
}

impl<G: GraphView, S: CandidateSelector<G>, M> Rule<G, S, M> {
    /// Creates a rule from its three parts.
    pub fn new(
        selector: S,
        matcher: impl Fn(&S::Candidate, &G) -> Option<MatchResult<M>> + Send + Sync + 'static,
        generator: impl Fn(&Match<S::Candidate, M>, &G) -> GeneratorResult<G> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: None,
            selector,
            matcher: Arc::new(matcher),
            generator: Arc::new(generator),
        }
    }

    /// Starts building a rule whose functions are supplied later.
    pub fn builder(selector: S) -> RuleBuilder<G, S, M> {
        RuleBuilder {
            name: None,
            selector,
            matcher: None,
            generator: None,
        }
    }

    /// Names the rule.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<SmolStr>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// The selector feeding the matcher.
    pub fn selector(&self) -> &S {
        &self.selector
    }

    /// Erases the type of the rule.
    pub fn boxed(self) -> BoxedRule<G>
    where
        Self: 'static,
        M: Debug,
    {
        Box::new(self)
    }

    fn rule_name(&self) -> RuleName {
        RuleName(self.name.clone())
    }
}

impl<G, S, M> RewriteRule<G> for Rule<G, S, M>
where
    G: GraphView,
    S: CandidateSelector<G>,
    M: Debug,
{
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn apply_with(
        &self,
        graph: &G,
        equality: GraphEquality,
        observer: &mut dyn RewriteObserver<G>,
    ) -> Result<Applied<G>, RewriteError<G::Error>> {
        for candidate in self.selector.select(graph) {
            let Some(verdict) = (self.matcher)(&candidate, graph) else {
                return Err(RewriteError::MatcherContract {
                    rule: self.rule_name(),
                    candidate: format!("{candidate:?}"),
                });
            };
            let matched = match verdict {
                MatchResult::NoMatch => continue,
                MatchResult::Candidate => Match::Candidate(candidate),
                MatchResult::Value(value) => Match::Value { candidate, value },
            };
            let Some(rewritten) = (self.generator)(&matched, graph).map_err(RewriteError::Graph)?
            else {
                return Err(RewriteError::GeneratorContract {
                    rule: self.rule_name(),
                    matched: format!("{matched:?}"),
                });
            };
            if equality.equals(graph, &rewritten) {
                return Err(RewriteError::NonProgressing {
                    rule: self.rule_name(),
                    matched: format!("{matched:?}"),
                });
            }
            observer.rule_fired(&RuleFired {
                rule: self.name(),
                matched: &matched,
                before: graph,
                after: &rewritten,
            });
            return Ok(Applied::Fired(rewritten));
        }
        Ok(Applied::NotFired)
    }
}

/// Builder for [`Rule`]s whose functions may be missing.
pub struct RuleBuilder<G: GraphView, S: CandidateSelector<G>, M = ()> {
    name: Option<SmolStr>,
    selector: S,
    matcher: Option<Matcher<G, S::Candidate, M>>,
    generator: Option<Generator<G, S::Candidate, M>>,
}

impl<G: GraphView, S: CandidateSelector<G>, M> RuleBuilder<G, S, M> {
    /// Names the rule.
    #[must_use]
    pub fn name(mut self, name: impl Into<SmolStr>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the matcher.
    #[must_use]
    pub fn matcher(
        mut self,
        matcher: impl Fn(&S::Candidate, &G) -> Option<MatchResult<M>> + Send + Sync + 'static,
    ) -> Self {
        self.matcher = Some(Arc::new(matcher));
        self
    }

    /// Sets the generator.
    #[must_use]
    pub fn generator(
        mut self,
        generator: impl Fn(&Match<S::Candidate, M>, &G) -> GeneratorResult<G> + Send + Sync + 'static,
    ) -> Self {
        self.generator = Some(Arc::new(generator));
        self
    }

    /// Finishes the rule.
    pub fn build(self) -> Result<Rule<G, S, M>, InvalidRuleError> {
        let matcher = self.matcher.ok_or(InvalidRuleError::MissingMatcher)?;
        let generator = self.generator.ok_or(InvalidRuleError::MissingGenerator)?;
        Ok(Rule {
            name: self.name,
            selector: self.selector,
            matcher,
            generator,
        })
    }
}

/// A rule over every node, nested nodes included.
pub fn apply_node<G: GraphView, M>(
    matcher: impl Fn(&G::Node, &G) -> Option<MatchResult<M>> + Send + Sync + 'static,
    generator: impl Fn(&Match<G::Node, M>, &G) -> GeneratorResult<G> + Send + Sync + 'static,
) -> Rule<G, NodeSelector, M> {
    Rule::new(NodeSelector::recursive(), matcher, generator)
}

/// A rule over every port of every node.
pub fn apply_port<G: GraphView, M>(
    matcher: impl Fn(&PortCandidate<G>, &G) -> Option<MatchResult<M>> + Send + Sync + 'static,
    generator: impl Fn(&Match<PortCandidate<G>, M>, &G) -> GeneratorResult<G>
    + Send
    + Sync
    + 'static,
) -> Rule<G, PortSelector, M> {
    Rule::new(PortSelector::default(), matcher, generator)
}

/// A rule over every resolvable edge.
pub fn apply_edge<G: GraphView, M>(
    matcher: impl Fn(&EdgeCandidate<G>, &G) -> Option<MatchResult<M>> + Send + Sync + 'static,
    generator: impl Fn(&Match<EdgeCandidate<G>, M>, &G) -> GeneratorResult<G>
    + Send
    + Sync
    + 'static,
) -> Rule<G, EdgeSelector, M> {
    Rule::new(EdgeSelector::new(), matcher, generator)
}

/// A rule over every component.
pub fn apply_component<G: GraphView, M>(
    matcher: impl Fn(&G::Component, &G) -> Option<MatchResult<M>> + Send + Sync + 'static,
    generator: impl Fn(&Match<G::Component, M>, &G) -> GeneratorResult<G> + Send + Sync + 'static,
) -> Rule<G, ComponentSelector, M> {
    Rule::new(ComponentSelector, matcher, generator)
}

/// Applies `rule` once to `graph`, with the default equality policy.
pub fn apply_rule<G: GraphView>(
    rule: &(impl RewriteRule<G> + ?Sized),
    graph: &G,
) -> Result<Applied<G>, RewriteError<G::Error>> {
    rule.apply(graph)
}

#[cfg(test)]
mod test {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use rstest::rstest;
    use rulegraph_core::{Graph, GraphMut, Node, Port};

    use super::*;
    use crate::observer::FiringLog;
    use crate::test::{nested_graph, simple_graph};

    /// Renames a node by appending a suffix.
    fn renamed(node: &Node, graph: &Graph) -> GeneratorResult<Graph> {
        let mut new = node.clone();
        new.name = format!("{}'", node.name).into();
        graph.replace_node(node, new).map(Some)
    }

    #[rstest]
    fn no_match_leaves_graph_alone(simple_graph: Graph) {
        let rule = apply_node::<Graph, ()>(|_, _| Some(MatchResult::NoMatch), |_, _| Ok(None));
        assert_eq!(apply_rule(&rule, &simple_graph).unwrap(), Applied::NotFired);
    }

    #[rstest]
    fn first_match_wins(simple_graph: Graph) {
        let seen = Arc::new(AtomicUsize::new(0));
        let generated = Arc::new(AtomicUsize::new(0));
        let (s, g) = (Arc::clone(&seen), Arc::clone(&generated));
        let rule = apply_node::<Graph, ()>(
            move |_, _| {
                s.fetch_add(1, Ordering::SeqCst);
                Some(MatchResult::Candidate)
            },
            move |m, graph| {
                g.fetch_add(1, Ordering::SeqCst);
                renamed(m.candidate(), graph)
            },
        );
        let out = rule.apply(&simple_graph).unwrap().fired().unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert_eq!(generated.load(Ordering::SeqCst), 1);
        assert!(out.node_by_name("a'").is_some());
        assert!(out.node_by_name("b").is_some());
    }

    #[rstest]
    fn matcher_sees_candidates_until_first_match(simple_graph: Graph) {
        let seen = Arc::new(AtomicUsize::new(0));
        let s = Arc::clone(&seen);
        let rule = apply_port::<Graph, ()>(
            move |c, _| {
                s.fetch_add(1, Ordering::SeqCst);
                Some((c.node.name == "b").into())
            },
            |m, graph| renamed(&m.candidate().node, graph),
        );
        let out = rule.apply(&simple_graph).unwrap().fired().unwrap();
        // a.p1, a.p2, then b.p1 matches.
        assert_eq!(seen.load(Ordering::SeqCst), 3);
        assert!(out.node_by_name("b'").is_some());
    }

    #[rstest]
    fn match_values_reach_the_generator(simple_graph: Graph) {
        let rule = apply_node::<Graph, usize>(
            |n, _| Some(MatchResult::Value(n.ports.len())),
            |m, graph| {
                assert_eq!(m.value(), Some(&2));
                renamed(m.candidate(), graph)
            },
        );
        assert!(rule.apply(&simple_graph).unwrap().is_fired());
    }

    #[rstest]
    fn falsy_match_values_still_match(simple_graph: Graph) {
        let rule = apply_node::<Graph, usize>(
            |_, _| Some(MatchResult::Value(0)),
            |m, graph| renamed(m.candidate(), graph),
        );
        assert!(rule.apply(&simple_graph).unwrap().is_fired());
    }

    #[rstest]
    fn nested_nodes_are_candidates(nested_graph: Graph) {
        let rule = apply_node::<Graph, ()>(
            |n, _| Some((n.name == "leaf").into()),
            |m, graph| renamed(m.candidate(), graph),
        );
        let out = rule.apply(&nested_graph).unwrap().fired().unwrap();
        assert!(out.node_by_path("outer/inner_a/leaf'").is_some());
    }

    #[rstest]
    fn missing_verdict_is_a_contract_error(simple_graph: Graph) {
        let rule = apply_node::<Graph, ()>(|_, _| None, |_, _| Ok(None)).with_name("silent");
        let err = rule.apply(&simple_graph).unwrap_err();
        assert!(matches!(
            &err,
            RewriteError::MatcherContract { rule, candidate }
                if rule.as_str() == Some("silent") && candidate.contains("\"a\"")
        ));
    }

    #[rstest]
    fn missing_graph_is_a_contract_error(simple_graph: Graph) {
        let rule = apply_node::<Graph, ()>(|_, _| Some(MatchResult::Candidate), |_, _| Ok(None));
        let err = rule.apply(&simple_graph).unwrap_err();
        assert!(matches!(err, RewriteError::GeneratorContract { .. }));
        assert!(err.to_string().starts_with("The generator of unnamed rule"));
    }

    #[rstest]
    #[case::isomorphic(GraphEquality::Isomorphic)]
    #[case::canonical(GraphEquality::Canonical)]
    fn unchanged_graph_is_non_progressing(simple_graph: Graph, #[case] equality: GraphEquality) {
        let rule = apply_node::<Graph, ()>(
            |_, _| Some(MatchResult::Candidate),
            |_, graph| Ok(Some(graph.clone())),
        )
        .with_name("idle");
        let err = rule
            .apply_with(&simple_graph, equality, &mut ())
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("rule 'idle'"), "{msg}");
        assert!(msg.contains("\"a\""), "{msg}");
    }

    #[rstest]
    fn graph_errors_propagate(simple_graph: Graph) {
        let rule = apply_node::<Graph, ()>(
            |_, _| Some(MatchResult::Candidate),
            |_, graph| {
                let ghost = Node::new("ghost").with_id(rulegraph_core::NodeId::new(99));
                graph.replace_node(&ghost, Node::new("x")).map(Some)
            },
        );
        assert!(matches!(
            rule.apply(&simple_graph),
            Err(RewriteError::Graph(_))
        ));
    }

    #[rstest]
    fn firings_are_observed(simple_graph: Graph) {
        let rule = apply_node::<Graph, ()>(
            |_, _| Some(MatchResult::Candidate),
            |m, graph| renamed(m.candidate(), graph),
        )
        .with_name("rename");
        let mut log = FiringLog::default();
        assert!(
            rule.apply_with(&simple_graph, GraphEquality::default(), &mut log)
                .unwrap()
                .is_fired()
        );
        assert_eq!(log.len(), 1);
        assert_eq!(log.firings[0].rule.as_deref(), Some("rename"));
    }

    #[test]
    fn builder_requires_both_functions() {
        let missing_matcher = Rule::<Graph, NodeSelector>::builder(NodeSelector::default())
            .generator(|_, _| Ok(None))
            .build();
        assert_eq!(missing_matcher.unwrap_err(), InvalidRuleError::MissingMatcher);

        let missing_generator = Rule::<Graph, NodeSelector>::builder(NodeSelector::default())
            .matcher(|_, _| Some(MatchResult::NoMatch))
            .build();
        assert_eq!(
            missing_generator.unwrap_err(),
            InvalidRuleError::MissingGenerator
        );

        let rule = Rule::<Graph, NodeSelector>::builder(NodeSelector::top_level())
            .name("complete")
            .matcher(|_, _| Some(MatchResult::NoMatch))
            .generator(|_, _| Ok(None))
            .build()
            .unwrap();
        assert_eq!(RewriteRule::name(&rule), Some("complete"));
    }

    #[test]
    fn components_can_be_rewritten() {
        let mut g = Graph::new();
        g.add_component(rulegraph_core::Component::new(
            "math/add",
            "1.0.0".parse().unwrap(),
        ))
        .unwrap();
        let rule = apply_component::<Graph, ()>(
            |c, _| Some(c.ports.is_empty().into()),
            |m, _| {
                let mut out = Graph::new();
                let component = m.candidate().clone().with_port(Port::input("x", "number"));
                out.add_component(component)?;
                Ok(Some(out))
            },
        );
        let out = rule.apply(&g).unwrap().fired().unwrap();
        assert_eq!(
            out.component(&"math/add".into()).unwrap().ports.len(),
            1
        );
        assert_eq!(rule.apply(&out).unwrap(), Applied::NotFired);
    }

    #[rstest]
    fn edge_rules_see_resolved_edges(simple_graph: Graph) {
        let rule = apply_edge::<Graph, ()>(
            |e, _| Some(e.target_port.as_ref().is_some_and(Port::is_generic).into()),
            |m, graph| renamed(&m.candidate().target, graph),
        );
        let out = rule.apply(&simple_graph).unwrap().fired().unwrap();
        assert!(out.node_by_name("b'").is_some());
    }
}
