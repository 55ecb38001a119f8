//! Standard command line tools, used by the rulegraph binary.

use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use thiserror::Error;

use rulegraph::GraphError;
use rulegraph::rewrite::RewriteError;

pub mod describe;
pub mod equals;
pub mod graph_io;
pub mod propagate;
pub mod validate;

/// CLI arguments.
#[derive(Parser, Debug)]
#[clap(version = "1.0", long_about = None)]
#[clap(about = "Rule graph tools.")]
#[non_exhaustive]
pub struct CliArgs {
    /// The subcommand to run.
    #[command(subcommand)]
    pub command: CliCommand,
    /// Verbosity.
    #[command(flatten)]
    pub verbose: Verbosity<InfoLevel>,
}

/// The subcommands of the rulegraph binary.
#[derive(clap::Subcommand, Debug)]
#[non_exhaustive]
pub enum CliCommand {
    /// Validate a serialized graph.
    Validate(validate::ValArgs),
    /// Summarise the contents of a serialized graph.
    Describe(describe::DescribeArgs),
    /// Propagate concrete port types through a graph.
    Propagate(propagate::PropagateArgs),
    /// Compare two serialized graphs.
    Equals(equals::EqualsArgs),
}

/// Error type for the CLI.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CliError {
    /// Error reading input.
    #[error("Error reading from path: {0}")]
    InputFile(#[from] std::io::Error),
    /// Error parsing input.
    #[error("Error parsing input: {0}")]
    Parse(#[from] serde_json::Error),
    /// The graph failed validation.
    #[error("Graph is invalid: {0}")]
    Validate(#[from] GraphError),
    /// A rewrite aborted.
    #[error("Rewrite failed: {0}")]
    Rewrite(#[from] RewriteError<GraphError>),
    /// Two graphs compared unequal.
    #[error("Graphs differ under {0} equality.")]
    NotEqual(graph_io::Policy),
}

impl CliArgs {
    /// Installs a `tracing` subscriber writing to stderr at the requested
    /// verbosity.
    pub fn init_logging(&self) {
        tracing_subscriber::fmt()
            .with_max_level(self.verbose.tracing_level_filter())
            .with_writer(std::io::stderr)
            .with_target(false)
            .without_time()
            .init();
    }

    /// Whether errors should be reported.
    pub fn report_errors(&self) -> bool {
        self.verbose.tracing_level().is_some()
    }

    /// Runs the selected subcommand.
    pub fn run(&mut self) -> anyhow::Result<()> {
        match &mut self.command {
            CliCommand::Validate(args) => args.run(),
            CliCommand::Describe(args) => args.run_describe(),
            CliCommand::Propagate(args) => args.run_propagate(),
            CliCommand::Equals(args) => args.run(),
        }
    }
}
