//! The `equals` subcommand.

use anyhow::Result;
use clap::Parser;
use clio::Input;
use tracing::info;

use crate::CliError;
use crate::graph_io::{Policy, read_graph};

/// Compare two serialized graphs.
#[derive(Parser, Debug)]
#[clap(version = "1.0", long_about = None)]
#[clap(about = "Check whether two graphs are equal.")]
#[group(id = "rulegraph")]
#[non_exhaustive]
pub struct EqualsArgs {
    /// First graph. Use '-' for stdin.
    #[arg(value_parser, help_heading = "Input")]
    pub first: Input,
    /// Second graph. Use '-' for stdin.
    #[arg(value_parser, help_heading = "Input")]
    pub second: Input,

    /// How the graphs are compared.
    #[arg(long, value_enum, default_value_t)]
    pub policy: Policy,
}

/// String to print when the graphs are equal.
pub const EQUAL_PRINT: &str = "Graphs are equal.";

impl EqualsArgs {
    /// Compare the two input graphs, failing if they differ.
    pub fn run(&mut self) -> Result<()> {
        let first = read_graph(&mut self.first)?;
        let second = read_graph(&mut self.second)?;
        let equality = rulegraph::rewrite::GraphEquality::from(self.policy);
        if !equality.equals(&first, &second) {
            return Err(CliError::NotEqual(self.policy).into());
        }
        info!("{EQUAL_PRINT}");
        Ok(())
    }
}
