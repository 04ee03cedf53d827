//! Tracegen CLI: generate transaction tests from model-checker state graphs
//!
//! ## Usage
//!
//! ```bash
//! tracegen generate -g out/stategraph -o tests/     # Full coverage, one module
//! tracegen generate -g out/stategraph --shards 4    # Four modules
//! tracegen stats -g out/stategraph --dot graph.dot  # Inspect the graph
//! tracegen verify -o tests/                         # Detect hand edits
//! ```

use clap::Parser;
use std::process::ExitCode;
use tracegen_cli::{
    handlers::{execute_generate, execute_stats, execute_verify},
    init_logging, Cli, CliConfig, CliResult, Commands,
};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();

    let config = CliConfig::from_cli(&cli);
    init_logging(&config);

    match cli.command {
        Commands::Generate(args) => execute_generate(&config, &args),
        Commands::Stats(args) => execute_stats(&config, &args),
        Commands::Verify(args) => execute_verify(&config, &args),
    }
}
