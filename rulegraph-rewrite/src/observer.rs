//! Diagnostics hooks for rewriting.
//!
//! The engine reports progress to a [`RewriteObserver`] passed in by the
//! caller. [`TracingObserver`] forwards the events to `tracing`, and
//! [`FiringLog`] keeps a record of every firing.

use std::fmt::Debug;

use rulegraph_core::GraphView;
use serde_json::Value;
use tracing::Level;

use crate::equality::canonical_form;

/// A rule application that changed the graph.
#[derive(Clone, Copy)]
pub struct RuleFired<'a, G> {
    /// Name of the rule, if it has one.
    pub rule: Option<&'a str>,
    /// The match handed to the generator.
    pub matched: &'a dyn Debug,
    /// The graph the rule was applied to.
    pub before: &'a G,
    /// The graph the rule produced.
    pub after: &'a G,
}

impl<G: GraphView> RuleFired<'_, G> {
    /// Canonical form of the graph before the firing.
    pub fn before_canonical(&self) -> Value {
        canonical_form(self.before)
    }

    /// Canonical form of the graph after the firing.
    pub fn after_canonical(&self) -> Value {
        canonical_form(self.after)
    }
}

impl<G> Debug for RuleFired<'_, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleFired")
            .field("rule", &self.rule)
            .field("matched", self.matched)
            .finish_non_exhaustive()
    }
}

/// Receives events from a rewrite. Every method defaults to doing nothing.
pub trait RewriteObserver<G: GraphView> {
    /// A new outer iteration starts. Iterations are numbered from 1.
    fn iteration_started(&mut self, _iteration: usize) {}

    /// A rule fired.
    fn rule_fired(&mut self, _firing: &RuleFired<'_, G>) {}

    /// No rule fired during the last iteration.
    fn fixpoint_reached(&mut self, _graph: &G, _iterations: usize) {}

    /// The iteration budget ran out before a fixpoint was reached.
    fn budget_exhausted(&mut self, _graph: &G, _max_iterations: usize) {}
}

impl<G: GraphView> RewriteObserver<G> for () {}

impl<G: GraphView, O: RewriteObserver<G> + ?Sized> RewriteObserver<G> for &mut O {
    fn iteration_started(&mut self, iteration: usize) {
        (**self).iteration_started(iteration);
    }

    fn rule_fired(&mut self, firing: &RuleFired<'_, G>) {
        (**self).rule_fired(firing);
    }

    fn fixpoint_reached(&mut self, graph: &G, iterations: usize) {
        (**self).fixpoint_reached(graph, iterations);
    }

    fn budget_exhausted(&mut self, graph: &G, max_iterations: usize) {
        (**self).budget_exhausted(graph, max_iterations);
    }
}

/// Notifies both observers, the first one first.
impl<G: GraphView, A: RewriteObserver<G>, B: RewriteObserver<G>> RewriteObserver<G> for (A, B) {
    fn iteration_started(&mut self, iteration: usize) {
        self.0.iteration_started(iteration);
        self.1.iteration_started(iteration);
    }

    fn rule_fired(&mut self, firing: &RuleFired<'_, G>) {
        self.0.rule_fired(firing);
        self.1.rule_fired(firing);
    }

    fn fixpoint_reached(&mut self, graph: &G, iterations: usize) {
        self.0.fixpoint_reached(graph, iterations);
        self.1.fixpoint_reached(graph, iterations);
    }

    fn budget_exhausted(&mut self, graph: &G, max_iterations: usize) {
        self.0.budget_exhausted(graph, max_iterations);
        self.1.budget_exhausted(graph, max_iterations);
    }
}

/// Emits `tracing` events for every rewrite event.
///
/// Firings are logged at `DEBUG`. The canonical forms of the graphs before
/// and after each firing are only computed when `TRACE` is enabled.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

impl<G: GraphView> RewriteObserver<G> for TracingObserver {
    fn iteration_started(&mut self, iteration: usize) {
        tracing::trace!(iteration, "Starting rewrite iteration");
    }

    fn rule_fired(&mut self, firing: &RuleFired<'_, G>) {
        let rule = firing.rule.unwrap_or("<unnamed>");
        tracing::debug!(rule, matched = ?firing.matched, "Rule fired");
        if tracing::enabled!(Level::TRACE) {
            tracing::trace!(
                rule,
                before = %firing.before_canonical(),
                after = %firing.after_canonical(),
                "Graph rewritten"
            );
        }
    }

    fn fixpoint_reached(&mut self, _graph: &G, iterations: usize) {
        tracing::debug!(iterations, "Reached a fixpoint");
    }

    fn budget_exhausted(&mut self, _graph: &G, max_iterations: usize) {
        tracing::warn!(
            max_iterations,
            "Iteration budget exhausted before reaching a fixpoint"
        );
    }
}

/// One recorded firing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Firing {
    /// Name of the rule.
    pub rule: Option<String>,
    /// Debug rendering of the match.
    pub matched: String,
}

/// Records every firing, in order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FiringLog {
    /// The firings seen so far.
    pub firings: Vec<Firing>,
}

impl FiringLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded firings.
    pub fn len(&self) -> usize {
        self.firings.len()
    }

    /// Returns `true` if nothing fired.
    pub fn is_empty(&self) -> bool {
        self.firings.is_empty()
    }

    /// The rule names of the recorded firings, `None` for unnamed rules.
    pub fn rule_names(&self) -> impl Iterator<Item = Option<&str>> + '_ {
        self.firings.iter().map(|f| f.rule.as_deref())
    }
}

impl<G: GraphView> RewriteObserver<G> for FiringLog {
    fn rule_fired(&mut self, firing: &RuleFired<'_, G>) {
        self.firings.push(Firing {
            rule: firing.rule.map(str::to_string),
            matched: format!("{:?}", firing.matched),
        });
    }
}
