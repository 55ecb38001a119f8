//! Rule graph command line tools.

use clap::Parser as _;

use rulegraph_cli::CliArgs;

fn main() {
    let mut args = CliArgs::parse();
    args.init_logging();

    if let Err(e) = args.run() {
        if args.report_errors() {
            eprintln!("{e}");
        }
        std::process::exit(1);
    }
}
