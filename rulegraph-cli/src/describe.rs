//! Describe the contents of serialized graphs.
use std::collections::BTreeMap;
use std::io::{Read, Write};

use anyhow::Result;
use clap::Parser;
use clio::Output;
use rulegraph::rewrite::type_propagation::generic_port_count;
use rulegraph::{Graph, GraphView};

use crate::graph_io::GraphInputArgs;

/// Describe the contents of a serialized graph.
#[derive(Parser, Debug)]
#[clap(version = "1.0", long_about = None)]
#[clap(about = "Describe the contents of a graph.")]
#[group(id = "rulegraph")]
#[non_exhaustive]
pub struct DescribeArgs {
    /// Graph input.
    #[command(flatten)]
    pub input_args: GraphInputArgs,

    #[arg(long, default_value = "false", help_heading = "JSON")]
    /// Output in json format
    pub json: bool,

    /// Output file. Use '-' for stdout.
    #[clap(short, long, value_parser, default_value = "-")]
    pub output: Output,
}

/// Summary of a graph, as printed by `describe`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct GraphDescription {
    /// Nodes at every nesting level.
    pub nodes: usize,
    /// Nodes without a parent.
    pub top_level_nodes: usize,
    /// Edges, per layer.
    pub edges: BTreeMap<String, usize>,
    /// Component identifiers, in definition order.
    pub components: Vec<String>,
    /// Ports still typed generic.
    pub generic_ports: usize,
    /// Why the graph fails validation, if it does.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GraphDescription {
    /// Describes `graph`.
    pub fn new(graph: &Graph) -> Self {
        let edges = graph.edges_deep().fold(BTreeMap::new(), |mut acc, e| {
            *acc.entry(Graph::edge_layer(e).to_string()).or_default() += 1;
            acc
        });
        Self {
            nodes: graph.node_count(),
            top_level_nodes: graph.nodes().count(),
            edges,
            components: graph.components().map(|c| c.id.to_string()).collect(),
            generic_ports: generic_port_count(graph),
            error: graph.validate().err().map(|e| e.to_string()),
        }
    }
}

impl DescribeArgs {
    /// Load and describe the graph with optional input/output overrides.
    ///
    /// # Arguments
    ///
    /// * `input_override` - Optional reader to use instead of the CLI input argument.
    /// * `output_override` - Optional writer to use instead of the CLI output argument.
    pub fn run_describe_with_io<R: Read, W: Write>(
        &mut self,
        input_override: Option<R>,
        mut output_override: Option<W>,
    ) -> Result<()> {
        let graph = self.input_args.get_graph_with_reader(input_override)?;
        let desc = GraphDescription::new(&graph);

        let writer: &mut dyn Write = if let Some(ref mut w) = output_override {
            w
        } else {
            &mut self.output
        };

        if self.json {
            serde_json::to_writer_pretty(&mut *writer, &desc)?;
            writeln!(writer)?;
        } else {
            print_description(&desc, writer)?;
        }
        Ok(())
    }

    /// Load and describe the graph.
    pub fn run_describe(&mut self) -> Result<()> {
        self.run_describe_with_io(None::<&[u8]>, None::<Vec<u8>>)
    }
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

/// Print a human-readable description of a graph.
fn print_description<W: Write + ?Sized>(desc: &GraphDescription, writer: &mut W) -> Result<()> {
    let n_edges = desc.edges.values().sum();
    writeln!(
        writer,
        "Graph contains {} ({} top level), {} and {}",
        plural(desc.nodes, "node"),
        desc.top_level_nodes,
        plural(n_edges, "edge"),
        plural(desc.components.len(), "component"),
    )?;
    for (layer, count) in &desc.edges {
        writeln!(writer, "  {layer}: {}", plural(*count, "edge"))?;
    }
    if !desc.components.is_empty() {
        writeln!(writer, "Components: {}", desc.components.join(", "))?;
    }
    writeln!(writer, "Generic ports: {}", desc.generic_ports)?;
    match &desc.error {
        None => writeln!(writer, "Valid: yes")?,
        Some(e) => writeln!(writer, "Valid: no ({e})")?,
    }
    Ok(())
}
