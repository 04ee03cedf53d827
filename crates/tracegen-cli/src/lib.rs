//! Tracegen CLI Library
//!
//! Command-line layer around the `tracegen` library: reads model-checker
//! graph dumps, parses flags, writes generated test modules and their manifest.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod config;
mod error;
pub mod handlers;
mod logging;
mod output;

pub use commands::{
    Cli, ColorArg, Commands, DuplicateArg, GenerateArgs, GraphArgs, RootArg, StatsArgs,
    StrategyArg, StyleArg, VerifyArgs,
};
pub use config::{CliConfig, Verbosity};
pub use error::{CliError, CliResult};
pub use logging::init_logging;
pub use output::{format_coverage, ProgressReporter};
