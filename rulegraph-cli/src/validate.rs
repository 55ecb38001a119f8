//! The `validate` subcommand.

use std::io::Read;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use crate::CliError;
use crate::graph_io::GraphInputArgs;

/// Validate a serialized graph.
#[derive(Parser, Debug)]
#[clap(version = "1.0", long_about = None)]
#[clap(about = "Validate a graph.")]
#[group(id = "rulegraph")]
#[non_exhaustive]
pub struct ValArgs {
    /// Graph input.
    #[command(flatten)]
    pub input_args: GraphInputArgs,
}

/// String to print when validation is successful.
pub const VALID_PRINT: &str = "Graph valid!";

impl ValArgs {
    /// Validate the input graph.
    ///
    /// # Arguments
    ///
    /// * `input_override` - Optional reader to use instead of the CLI input argument.
    pub fn run_with_input<R: Read>(&mut self, input_override: Option<R>) -> Result<()> {
        let graph = self.input_args.get_graph_with_reader(input_override)?;
        graph
            .validate()
            .map_err(|e| CliError::Validate(e.into()))?;

        info!("{VALID_PRINT}");
        Ok(())
    }

    /// Validate the input graph.
    pub fn run(&mut self) -> Result<()> {
        self.run_with_input(None::<&[u8]>)
    }
}
