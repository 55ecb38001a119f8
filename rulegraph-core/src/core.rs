//! Definitions for the core types used in a rule graph.
//!
//! These types are re-exported in the root of the crate.

use derive_more::{Display, From};
use smol_str::SmolStr;

/// A handle to a node in a [`Graph`](crate::Graph).
///
/// Handles are opaque: two graphs with the same shape may assign different
/// handles to corresponding nodes.
#[derive(
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Debug,
    Display,
    From,
    serde::Serialize,
    serde::Deserialize,
)]
#[display("#{index}")]
#[serde(transparent)]
pub struct NodeId {
    index: u32,
}

impl NodeId {
    /// Creates a node handle from a raw index.
    #[inline]
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self { index }
    }

    /// Returns the raw index of the handle.
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.index as usize
    }
}

/// The direction of a port.
#[derive(
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Debug,
    Display,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// A port consuming values.
    #[display("input")]
    Input,
    /// A port producing values.
    #[display("output")]
    Output,
}

impl Direction {
    /// Returns the opposite direction.
    #[inline]
    #[must_use]
    pub fn reverse(self) -> Self {
        match self {
            Direction::Input => Direction::Output,
            Direction::Output => Direction::Input,
        }
    }
}

/// The type tag carried by a port.
///
/// Serialized as a plain string; the string `"generic"` denotes the
/// placeholder type.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, serde::Serialize, serde::Deserialize)]
#[serde(from = "SmolStr", into = "SmolStr")]
pub enum PortType {
    /// The placeholder type, awaiting a concrete type.
    Generic,
    /// A concrete, named type.
    Concrete(SmolStr),
}

impl PortType {
    /// The name of the placeholder type.
    pub const GENERIC_NAME: &'static str = "generic";

    /// Creates a concrete type, or the placeholder if `name` is `"generic"`.
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self::from(name.into())
    }

    /// Returns `true` for the placeholder type.
    #[inline]
    #[must_use]
    pub fn is_generic(&self) -> bool {
        matches!(self, PortType::Generic)
    }

    /// The name of the type.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            PortType::Generic => Self::GENERIC_NAME,
            PortType::Concrete(name) => name.as_str(),
        }
    }
}

impl From<SmolStr> for PortType {
    fn from(name: SmolStr) -> Self {
        if name == Self::GENERIC_NAME {
            PortType::Generic
        } else {
            PortType::Concrete(name)
        }
    }
}

impl From<&str> for PortType {
    fn from(name: &str) -> Self {
        SmolStr::new(name).into()
    }
}

impl From<PortType> for SmolStr {
    fn from(ty: PortType) -> Self {
        match ty {
            PortType::Generic => SmolStr::new_static(PortType::GENERIC_NAME),
            PortType::Concrete(name) => name,
        }
    }
}

impl std::fmt::Display for PortType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A typed port on a node.
///
/// Port names are unique within their owning node.
#[derive(Clone, PartialEq, Eq, Hash, Debug, serde::Serialize, serde::Deserialize)]
pub struct Port {
    /// The name of the port.
    #[serde(rename = "port")]
    pub name: SmolStr,
    /// Whether the port consumes or produces values.
    #[serde(rename = "kind")]
    pub direction: Direction,
    /// The type carried by the port.
    #[serde(rename = "type")]
    pub port_type: PortType,
}

impl Port {
    /// Creates a new port.
    pub fn new(name: impl Into<SmolStr>, direction: Direction, port_type: impl Into<PortType>) -> Self {
        Self {
            name: name.into(),
            direction,
            port_type: port_type.into(),
        }
    }

    /// Creates an input port.
    pub fn input(name: impl Into<SmolStr>, port_type: impl Into<PortType>) -> Self {
        Self::new(name, Direction::Input, port_type)
    }

    /// Creates an output port.
    pub fn output(name: impl Into<SmolStr>, port_type: impl Into<PortType>) -> Self {
        Self::new(name, Direction::Output, port_type)
    }

    /// Returns a copy of the port with a different type.
    #[must_use]
    pub fn with_type(&self, port_type: impl Into<PortType>) -> Self {
        Self {
            port_type: port_type.into(),
            ..self.clone()
        }
    }

    /// Returns `true` if the port has the placeholder type.
    #[inline]
    #[must_use]
    pub fn is_generic(&self) -> bool {
        self.port_type.is_generic()
    }
}

/// One end of an [`Edge`](crate::Edge): either a bare node or a port on a node.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, serde::Serialize, serde::Deserialize)]
pub struct Endpoint {
    /// The node at this end of the edge.
    pub node: NodeId,
    /// The port at this end of the edge, if the edge connects ports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<SmolStr>,
}

impl Endpoint {
    /// An endpoint referring to a whole node.
    #[must_use]
    pub fn node(node: NodeId) -> Self {
        Self { node, port: None }
    }

    /// An endpoint referring to a named port on a node.
    pub fn port(node: NodeId, port: impl Into<SmolStr>) -> Self {
        Self {
            node,
            port: Some(port.into()),
        }
    }
}

impl From<NodeId> for Endpoint {
    fn from(node: NodeId) -> Self {
        Self::node(node)
    }
}

impl<S: Into<SmolStr>> From<(NodeId, S)> for Endpoint {
    fn from((node, port): (NodeId, S)) -> Self {
        Self::port(node, port)
    }
}

/// A tag partitioning edges into independent relations over the same nodes.
#[derive(
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Debug,
    Display,
    From,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(transparent)]
pub struct Layer(SmolStr);

impl Layer {
    /// The layer carrying values between ports.
    pub const DATAFLOW: Layer = Layer(SmolStr::new_static("dataflow"));
    /// The layer describing recursion structure between nodes.
    pub const RECURSION: Layer = Layer(SmolStr::new_static("recursion"));

    /// Creates a layer tag.
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self(name.into())
    }

    /// The name of the layer.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Default for Layer {
    fn default() -> Self {
        Self::DATAFLOW
    }
}

impl From<&str> for Layer {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}
