//! Deciding whether a rule application changed a graph.

use rulegraph_core::GraphView;
use serde_json::Value;

/// Fields of a canonical form that only carry identity, and are blanked
/// before comparing.
pub const IDENTITY_FIELDS: [&str; 3] = ["id", "path", "node"];

/// How two graph snapshots are compared.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum GraphEquality {
    /// Compare canonical forms with the [`IDENTITY_FIELDS`] blanked out.
    Canonical,
    /// Ask the graph for structural isomorphism.
    #[default]
    Isomorphic,
}

impl GraphEquality {
    /// Returns `true` if `a` and `b` are the same under this policy.
    pub fn equals<G: GraphView>(self, a: &G, b: &G) -> bool {
        match self {
            GraphEquality::Canonical => canonical_form(a) == canonical_form(b),
            GraphEquality::Isomorphic => a.is_isomorphic(b),
        }
    }
}

/// The canonical form of `graph` with identity fields replaced by `null`.
pub fn canonical_form<G: GraphView>(graph: &G) -> Value {
    let mut form = graph.to_canonical_form();
    strip_identity(&mut form);
    form
}

/// Replaces the [`IDENTITY_FIELDS`] of the node and port entries of a
/// canonical form by `null`.
///
/// Only the `nodes` tree is touched, so metadata and edge attributes keep any
/// key that happens to share a name with an identity field.
pub fn strip_identity(form: &mut Value) {
    if let Some(nodes) = form.get_mut("nodes").and_then(Value::as_array_mut) {
        nodes.iter_mut().for_each(strip_node_identity);
    }
}

fn strip_node_identity(node: &mut Value) {
    let Some(map) = node.as_object_mut() else {
        return;
    };
    for key in IDENTITY_FIELDS {
        if let Some(field) = map.get_mut(key) {
            *field = Value::Null;
        }
    }
    if let Some(ports) = map.get_mut("ports").and_then(Value::as_array_mut) {
        for port in ports.iter_mut().filter_map(Value::as_object_mut) {
            for key in IDENTITY_FIELDS {
                if let Some(field) = port.get_mut(key) {
                    *field = Value::Null;
                }
            }
        }
    }
    if let Some(children) = map.get_mut("children").and_then(Value::as_array_mut) {
        children.iter_mut().for_each(strip_node_identity);
    }
}

/// Compares two graphs with the default policy.
pub fn graph_equals<G: GraphView>(a: &G, b: &G) -> bool {
    GraphEquality::default().equals(a, b)
}
