//! Substituting one port of a node for another.

use rulegraph_core::{GraphMut, PortNotFoundError};

/// Returns a graph where `old_port` of `node` has been replaced by
/// `new_port`.
///
/// The port is looked up by name and direction among the ports `node` has in
/// `graph` right now, so a stale `node` or `old_port` from before an earlier
/// mutation is detected. The port type is free to change. Fails with a
/// [`PortNotFoundError`] if the node no longer has the port; `graph` is never
/// modified.
pub fn replace_port<G: GraphMut>(
    node: &G::Node,
    old_port: &G::Port,
    new_port: G::Port,
    graph: &G,
) -> Result<G, G::Error> {
    let id = G::node_id(node);
    let name = G::port_name(old_port);
    let direction = G::port_direction(old_port);
    let not_found = || PortNotFoundError {
        node: id.to_string(),
        port: name.into(),
        direction,
    };

    let current = graph.node(id).ok_or_else(not_found)?;
    let ports = G::ports(current);
    let index = ports
        .iter()
        .position(|p| G::port_name(p) == name && G::port_direction(p) == direction)
        .ok_or_else(not_found)?;

    let mut ports = ports.to_vec();
    ports[index] = new_port;
    graph.replace_node(current, G::node_with_ports(current, ports))
}
