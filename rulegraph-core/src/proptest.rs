//! Strategies for generating arbitrary graphs.

use ::proptest::collection::vec;
use ::proptest::prelude::*;

use crate::{Direction, Edge, Graph, Node, Port, PortType};

/// A type name, occasionally the placeholder.
pub fn any_port_type() -> impl Strategy<Value = PortType> {
    prop_oneof![
        Just(PortType::Generic),
        "[a-z]{1,6}".prop_map(|s| PortType::new(s.as_str())),
    ]
}

/// Up to four ports with distinct names.
pub fn any_ports() -> impl Strategy<Value = Vec<Port>> {
    vec((any::<bool>(), any_port_type()), 0..4).prop_map(|ports| {
        ports
            .into_iter()
            .enumerate()
            .map(|(i, (input, ty))| {
                let dir = if input {
                    Direction::Input
                } else {
                    Direction::Output
                };
                Port::new(format!("p{i}"), dir, ty)
            })
            .collect()
    })
}

/// A flat graph of uniquely named nodes, with node-to-node edges in the
/// recursion layer and port edges where the chosen ends have ports.
pub fn any_graph() -> impl Strategy<Value = Graph> {
    vec(any_ports(), 1..6)
        .prop_flat_map(|nodes| {
            let n = nodes.len();
            (Just(nodes), vec((0..n, 0..n, any::<bool>()), 0..8))
        })
        .prop_map(|(nodes, links)| build(&nodes, &links))
}

fn build(nodes: &[Vec<Port>], links: &[(usize, usize, bool)]) -> Graph {
    let mut g = Graph::new();
    let ids: Vec<_> = nodes
        .iter()
        .enumerate()
        .map(|(i, ports)| {
            let node = ports
                .iter()
                .cloned()
                .fold(Node::new(format!("n{i}")), Node::with_port);
            g.add_node(node)
        })
        .collect();
    for &(from, to, ports) in links {
        let out = nodes[from].iter().find(|p| p.direction == Direction::Output);
        let inp = nodes[to].iter().find(|p| p.direction == Direction::Input);
        let edge = match (ports, out, inp) {
            (true, Some(out), Some(inp)) => {
                Edge::new((ids[from], out.name.clone()), (ids[to], inp.name.clone()))
            }
            _ => Edge::new(ids[from], ids[to]).with_layer("recursion"),
        };
        g.add_edge(edge).expect("endpoints exist");
    }
    g
}

/// Rebuilds `graph` inserting the top-level nodes in reverse order, so that
/// every handle changes while the structure stays the same.
pub fn relabel(graph: &Graph) -> Graph {
    use crate::GraphView;
    let mut g = Graph::new();
    let mut map = std::collections::HashMap::new();
    let nodes: Vec<_> = graph.nodes().collect();
    for node in nodes.iter().rev() {
        map.insert(node.id(), g.add_node((*node).clone()));
    }
    for edge in graph.edges() {
        let mut edge = edge.clone();
        edge.from.node = map[&edge.from.node];
        edge.to.node = map[&edge.to.node];
        g.add_edge(edge).expect("endpoints exist");
    }
    g
}

mod test {
    use super::*;
    use crate::GraphView;

    proptest! {
        #[test]
        fn generated_graphs_are_valid(g in any_graph()) {
            prop_assert!(g.validate().is_ok());
        }

        #[test]
        fn relabelling_preserves_structure(g in any_graph()) {
            let h = relabel(&g);
            prop_assert!(g.is_isomorphic(&h));
            prop_assert!(h.is_isomorphic(&g));
            prop_assert_eq!(g.node_count(), h.node_count());
        }

        #[test]
        fn isomorphism_is_reflexive(g in any_graph()) {
            prop_assert!(g.is_isomorphic(&g.clone()));
            prop_assert_eq!(g.to_canonical_form(), g.clone().to_canonical_form());
        }
    }
}
