//! Input arguments and shared options for the rulegraph CLI.

use std::io::{BufReader, Read};

use clio::Input;
use rulegraph::Graph;
use rulegraph::rewrite::GraphEquality;

use crate::CliError;

/// Arguments for reading a serialized graph.
#[derive(Debug, clap::Args)]
pub struct GraphInputArgs {
    /// Input file. Defaults to `-` for stdin.
    #[arg(value_parser, default_value = "-", help_heading = "Input")]
    pub input: Input,
}

impl GraphInputArgs {
    /// Read a graph from the input.
    pub fn get_graph(&mut self) -> Result<Graph, CliError> {
        read_graph(&mut self.input)
    }

    /// Read a graph from `reader` if given, from the input otherwise.
    pub fn get_graph_with_reader<R: Read>(
        &mut self,
        reader: Option<R>,
    ) -> Result<Graph, CliError> {
        match reader {
            Some(reader) => read_graph(reader),
            None => self.get_graph(),
        }
    }
}

/// Read a JSON-serialized graph.
pub fn read_graph(reader: impl Read) -> Result<Graph, CliError> {
    Ok(Graph::load_json(BufReader::new(reader))?)
}

/// How two graphs are compared.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum, derive_more::Display,
)]
pub enum Policy {
    /// Compare canonical forms, ignoring node handles.
    #[display("canonical")]
    Canonical,
    /// Compare up to isomorphism.
    #[default]
    #[display("isomorphic")]
    Isomorphic,
}

impl From<Policy> for GraphEquality {
    fn from(policy: Policy) -> Self {
        match policy {
            Policy::Canonical => GraphEquality::Canonical,
            Policy::Isomorphic => GraphEquality::Isomorphic,
        }
    }
}
