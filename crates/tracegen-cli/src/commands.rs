//! CLI command definitions using clap

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracegen::{CallStyle, DuplicateEdgePolicy};

/// Tracegen: turn model-checker state graphs into storage-engine transaction tests
#[derive(Parser, Debug)]
#[command(name = "tracegen")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate test modules from a state graph
    Generate(GenerateArgs),

    /// Show graph, arborescence and target statistics
    Stats(StatsArgs),

    /// Check generated files against their manifest
    Verify(VerifyArgs),
}

/// Graph location shared by every command that loads one
#[derive(Args, Debug, Clone)]
pub struct GraphArgs {
    /// Graph base path; reads `<BASE>-states.json` and `<BASE>-edges.json`
    #[arg(short, long, value_name = "BASE")]
    pub graph: PathBuf,

    /// Reduced graph base path whose states become the coverage targets
    #[arg(long, value_name = "BASE")]
    pub reduced: Option<PathBuf>,

    /// Parallel edge handling (overrides config)
    #[arg(long)]
    pub duplicate_edges: Option<DuplicateArg>,

    /// Initial state fingerprint
    #[arg(long, value_name = "FP", allow_hyphen_values = true, conflicts_with = "root")]
    pub initial: Option<i64>,

    /// Initial state policy (overrides config)
    #[arg(long)]
    pub root: Option<RootArg>,

    /// YAML or JSON generator config
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Arguments for the generate command
#[derive(Parser, Debug)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub graph: GraphArgs,

    /// Fraction of target states to cover, in (0, 1]
    #[arg(long, value_name = "PCT")]
    pub coverage_pct: Option<f64>,

    /// Emit one helper call per step (same as --style helper)
    #[arg(long, conflicts_with = "style")]
    pub compact: bool,

    /// Call style of emitted statements
    #[arg(long)]
    pub style: Option<StyleArg>,

    /// Drop per-step commentary
    #[arg(long)]
    pub no_comments: bool,

    /// Steps kept per test before truncation
    #[arg(long, value_name = "N")]
    pub max_steps: Option<usize>,

    /// Number of output modules
    #[arg(long, value_name = "N", conflicts_with = "shard")]
    pub shards: Option<usize>,

    /// Write only shard N of M (1-based, e.g. 2/4)
    #[arg(long, value_name = "N/M")]
    pub shard: Option<String>,

    /// Path cover strategy
    #[arg(long)]
    pub strategy: Option<StrategyArg>,

    /// Random-walk seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Random-walk attempts
    #[arg(long, value_name = "N")]
    pub num_paths: Option<usize>,

    /// Random-walk step limit
    #[arg(long, value_name = "N")]
    pub max_path_len: Option<usize>,

    /// Replace the bundled Python preamble
    #[arg(long, value_name = "FILE")]
    pub preamble: Option<PathBuf>,

    /// Fail unless the requested coverage is reached
    #[arg(long)]
    pub strict_coverage: bool,

    /// Also write the traces as JSON
    #[arg(long, value_name = "FILE")]
    pub dump_traces: Option<PathBuf>,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    pub output: PathBuf,
}

/// Arguments for the stats command
#[derive(Parser, Debug)]
pub struct StatsArgs {
    #[command(flatten)]
    pub graph: GraphArgs,

    /// Write the graph with its arborescence as Graphviz DOT
    #[arg(long, value_name = "FILE")]
    pub dot: Option<PathBuf>,

    /// Print statistics as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the verify command
#[derive(Parser, Debug)]
pub struct VerifyArgs {
    /// Directory holding the manifest and generated files
    #[arg(short, long, default_value = ".")]
    pub output: PathBuf,
}

/// Color argument
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

/// Statement call style
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum StyleArg {
    /// Raw API calls with explicit assertions
    Inline,
    /// One helper call per step
    Helper,
}

impl From<StyleArg> for CallStyle {
    fn from(arg: StyleArg) -> Self {
        match arg {
            StyleArg::Inline => Self::Inline,
            StyleArg::Helper => Self::Helper,
        }
    }
}

/// Path cover strategy
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum StrategyArg {
    /// Longest arborescence paths first
    Greedy,
    /// Seeded random walks
    RandomWalk,
}

/// Initial state policy
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RootArg {
    /// The only state without inbound edges
    UniqueSource,
    /// First state of the states document
    FirstListed,
}

/// Parallel edge handling
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DuplicateArg {
    /// Keep the first label
    KeepFirst,
    /// Keep the last label
    KeepLast,
    /// Fail on parallel edges
    Reject,
}

impl From<DuplicateArg> for DuplicateEdgePolicy {
    fn from(arg: DuplicateArg) -> Self {
        match arg {
            DuplicateArg::KeepFirst => Self::KeepFirst,
            DuplicateArg::KeepLast => Self::KeepLast,
            DuplicateArg::Reject => Self::Reject,
        }
    }
}
