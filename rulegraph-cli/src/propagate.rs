//! The `propagate` subcommand.

use std::io::{Read, Write};

use anyhow::Result;
use clap::Parser;
use clio::Output;
use rulegraph::Graph;
use rulegraph::rewrite::{TracingObserver, TypePropagation};
use tracing::{info, warn};

use crate::CliError;
use crate::graph_io::{GraphInputArgs, Policy};

/// Propagate concrete port types along dataflow edges.
#[derive(Parser, Debug)]
#[clap(version = "1.0", long_about = None)]
#[clap(about = "Propagate concrete port types through a graph.")]
#[group(id = "rulegraph")]
#[non_exhaustive]
pub struct PropagateArgs {
    /// Graph input.
    #[command(flatten)]
    pub input_args: GraphInputArgs,

    /// Stop after this many iterations, even without a fixpoint.
    #[arg(long, help_heading = "Rewrite")]
    pub max_iterations: Option<usize>,

    /// How rule applications are checked for progress.
    #[arg(long, value_enum, default_value_t, help_heading = "Rewrite")]
    pub policy: Policy,

    /// Validate the graph before and after propagation.
    #[arg(long, help_heading = "Rewrite")]
    pub validate: bool,

    /// Output file. Use '-' for stdout.
    #[clap(short, long, value_parser, default_value = "-")]
    pub output: Output,
}

impl PropagateArgs {
    /// The pass configured by the arguments.
    pub fn pass(&self) -> TypePropagation {
        let pass = TypePropagation::new().with_equality(self.policy.into());
        match self.max_iterations {
            Some(max) => pass.with_max_iterations(max),
            None => pass,
        }
    }

    /// Propagate types with optional input/output overrides.
    ///
    /// # Arguments
    ///
    /// * `input_override` - Optional reader to use instead of the CLI input argument.
    /// * `output_override` - Optional writer to use instead of the CLI output argument.
    pub fn run_propagate_with_io<R: Read, W: Write>(
        &mut self,
        input_override: Option<R>,
        mut output_override: Option<W>,
    ) -> Result<()> {
        let graph = self.input_args.get_graph_with_reader(input_override)?;
        if self.validate {
            check(&graph)?;
        }

        let out = self
            .pass()
            .run_with_observer(&graph, &mut TracingObserver)
            .map_err(CliError::Rewrite)?;
        info!(
            firings = out.firings,
            iterations = out.iterations,
            "Propagated types"
        );
        if !out.converged {
            warn!(
                "No fixpoint after {} iterations, writing the partial result.",
                out.iterations
            );
        }
        if self.validate {
            check(&out.graph)?;
        }

        let writer: &mut dyn Write = if let Some(ref mut w) = output_override {
            w
        } else {
            &mut self.output
        };
        serde_json::to_writer_pretty(&mut *writer, &out.graph)?;
        writeln!(writer)?;
        Ok(())
    }

    /// Propagate types through the input graph.
    pub fn run_propagate(&mut self) -> Result<()> {
        self.run_propagate_with_io(None::<&[u8]>, None::<Vec<u8>>)
    }
}

fn check(graph: &Graph) -> Result<(), CliError> {
    graph.validate().map_err(|e| CliError::Validate(e.into()))
}
