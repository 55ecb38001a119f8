//! Identity-independent views of a graph, used to decide whether two graphs
//! have the same structure.

use std::collections::{BTreeMap, HashMap};

use itertools::Itertools;
use petgraph::graph::{DiGraph, NodeIndex};
use serde_json::{Value, json};

use super::{Edge, Graph, Node};
use crate::{Endpoint, NodeId};

/// Label used for the nesting relation in the labelled graphs.
const CONTAINS: &str = "contains";

/// Serializes `graph` with nodes nested under their parents and every list in
/// a deterministic order.
///
/// Nodes still carry their handles (`id`), paths (`path`) and ports carry a
/// back-reference to their node (`node`). Edges refer to nodes by path and by
/// position in the canonical pre-order, so siblings sharing a name stay
/// distinct.
pub(super) fn canonical_form(graph: &Graph) -> Value {
    let nodes = sorted_nodes(graph, graph.hierarchy.roots());
    let positions = positions(graph);
    let edges = graph
        .edges
        .iter()
        .map(|e| canonical_edge(graph, &positions, e))
        .sorted_by_cached_key(Value::to_string)
        .collect_vec();
    let components = graph
        .components
        .values()
        .sorted_by(|a, b| a.id.cmp(&b.id))
        .map(|c| serde_json::to_value(c).unwrap_or(Value::Null))
        .collect_vec();
    json!({
        "nodes": nodes,
        "edges": edges,
        "components": components,
    })
}

fn sorted_ids(graph: &Graph, ids: &[NodeId]) -> Vec<NodeId> {
    ids.iter()
        .copied()
        .sorted_by_cached_key(|id| {
            let n = &graph.nodes[id];
            (n.name.clone(), node_label(n))
        })
        .collect()
}

fn sorted_nodes(graph: &Graph, ids: &[NodeId]) -> Vec<Value> {
    sorted_ids(graph, ids)
        .into_iter()
        .map(|id| canonical_node(graph, &graph.nodes[&id]))
        .collect()
}

/// Position of every node in the pre-order walk of the canonical form.
fn positions(graph: &Graph) -> HashMap<NodeId, usize> {
    let mut order = HashMap::with_capacity(graph.nodes.len());
    let mut stack = sorted_ids(graph, graph.hierarchy.roots());
    stack.reverse();
    while let Some(id) = stack.pop() {
        let pos = order.len();
        order.insert(id, pos);
        stack.extend(sorted_ids(graph, graph.hierarchy.children(id)).into_iter().rev());
    }
    order
}

fn canonical_node(graph: &Graph, node: &Node) -> Value {
    let ports = node
        .ports
        .iter()
        .map(|p| {
            json!({
                "node": node.id,
                "port": p.name,
                "kind": p.direction,
                "type": p.port_type,
            })
        })
        .collect_vec();
    json!({
        "id": node.id,
        "path": graph.path(node.id),
        "name": node.name,
        "ports": ports,
        "metadata": node.metadata,
        "children": sorted_nodes(graph, graph.hierarchy.children(node.id)),
    })
}

fn canonical_edge(graph: &Graph, positions: &HashMap<NodeId, usize>, edge: &Edge) -> Value {
    json!({
        "from": endpoint_path(graph, positions, &edge.from),
        "to": endpoint_path(graph, positions, &edge.to),
        "layer": edge.layer,
        "attributes": edge.attributes,
    })
}

/// `<path>#<position>@<port>` for port ends, `<path>#<position>` for node
/// ends. Unknown nodes are rendered by handle.
fn endpoint_path(graph: &Graph, positions: &HashMap<NodeId, usize>, end: &Endpoint) -> String {
    let path = match (graph.path(end.node), positions.get(&end.node)) {
        (Some(path), Some(pos)) => format!("{path}#{pos}"),
        _ => end.node.to_string(),
    };
    match &end.port {
        Some(port) => format!("{path}@{port}"),
        None => path,
    }
}

fn node_label(node: &Node) -> String {
    json!({
        "name": node.name,
        "ports": node.ports,
        "metadata": node.metadata,
    })
    .to_string()
}

fn edge_label(edge: &Edge) -> String {
    json!({
        "from": edge.from.port,
        "to": edge.to.port,
        "layer": edge.layer,
        "attributes": edge.attributes,
    })
    .to_string()
}

/// Builds a labelled petgraph graph holding both the nesting and the edges of
/// `graph`. Parallel relations between two nodes are merged into one edge
/// carrying the sorted list of their labels.
fn labelled(graph: &Graph) -> DiGraph<String, Vec<String>> {
    let mut pg = DiGraph::with_capacity(graph.nodes.len(), graph.edges.len());
    let mut index: HashMap<NodeId, NodeIndex> = graph
        .nodes
        .values()
        .map(|n| (n.id, pg.add_node(node_label(n))))
        .collect();

    let mut links: BTreeMap<(NodeIndex, NodeIndex), Vec<String>> = BTreeMap::new();
    for (id, parent) in &index {
        for child in graph.hierarchy.children(*id) {
            links
                .entry((*parent, index[child]))
                .or_default()
                .push(CONTAINS.to_string());
        }
    }
    for edge in &graph.edges {
        let [from, to] = [edge.from.node, edge.to.node].map(|n| {
            *index
                .entry(n)
                .or_insert_with(|| pg.add_node("missing".to_string()))
        });
        links.entry((from, to)).or_default().push(edge_label(edge));
    }
    for ((from, to), mut labels) in links {
        labels.sort_unstable();
        pg.add_edge(from, to, labels);
    }
    pg
}

/// Structural equality up to node handles.
pub(super) fn isomorphic(a: &Graph, b: &Graph) -> bool {
    if a.nodes.len() != b.nodes.len()
        || a.edges.len() != b.edges.len()
        || a.components.len() != b.components.len()
    {
        return false;
    }
    let same_components = a
        .components
        .values()
        .all(|c| b.components.get(&c.id) == Some(c));
    same_components
        && petgraph::algo::is_isomorphic_matching(
            &labelled(a),
            &labelled(b),
            |x, y| x == y,
            |x, y| x == y,
        )
}
