//! Command handlers
//!
//! Each handler module contains the execution logic for one CLI command plus
//! its pure helpers; graph loading shared by `generate` and `stats` lives here.

pub mod generate;
pub mod stats;
pub mod verify;

pub use generate::execute_generate;
pub use stats::execute_stats;
pub use verify::execute_verify;

use crate::commands::{GraphArgs, RootArg};
use crate::error::{CliError, CliResult};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracegen::emit::hash_inputs;
use tracegen::{Fingerprint, GeneratorConfig, RootPolicy, StateGraph, TargetSet};

/// `<base>-states.json` and `<base>-edges.json`.
#[must_use]
pub fn graph_paths(base: &Path) -> (PathBuf, PathBuf) {
    let with_suffix = |suffix: &str| {
        let mut name = OsString::from(base.as_os_str());
        name.push(suffix);
        PathBuf::from(name)
    };
    (with_suffix("-states.json"), with_suffix("-edges.json"))
}

fn read_document(path: &Path) -> CliResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| CliError::invalid_argument(format!("cannot read {}: {e}", path.display())))
}

/// Config file (if any) with the graph-level flags applied on top.
pub fn resolve_config(args: &GraphArgs) -> CliResult<GeneratorConfig> {
    let mut config = match args.config {
        Some(ref path) => GeneratorConfig::load(path)?,
        None => GeneratorConfig::default(),
    };
    if let Some(policy) = args.duplicate_edges {
        config.duplicate_edges = policy.into();
    }
    if let Some(fp) = args.initial {
        config.root = RootPolicy::Explicit(Fingerprint(fp));
    }
    match args.root {
        Some(RootArg::UniqueSource) => config.root = RootPolicy::UniqueSource,
        Some(RootArg::FirstListed) => config.root = RootPolicy::FirstListed,
        None => {}
    }
    Ok(config)
}

/// Graph, coverage targets, and a digest of every input document.
#[derive(Debug)]
pub struct LoadedGraph {
    /// Full state graph
    pub graph: StateGraph,
    /// States to cover
    pub targets: TargetSet,
    /// Whether targets came from a reduced graph
    pub reduced: bool,
    /// blake3 over the documents read
    pub input_digest: String,
}

/// Read the graph (and reduced graph) named by `args`.
pub fn load_graph(args: &GraphArgs, config: &GeneratorConfig) -> CliResult<LoadedGraph> {
    let options = config.load_options();

    let (states_path, edges_path) = graph_paths(&args.graph);
    let states = read_document(&states_path)?;
    let edges = read_document(&edges_path)?;
    let graph = StateGraph::from_json(&states, &edges, &options)?;
    let mut documents = vec![states, edges];

    let targets = match args.reduced {
        Some(ref base) => {
            let (states_path, edges_path) = graph_paths(base);
            let states = read_document(&states_path)?;
            let edges = read_document(&edges_path)?;
            let reduced = StateGraph::from_json(&states, &edges, &options)?;
            documents.push(states);
            documents.push(edges);
            TargetSet::all_states(&reduced)
        }
        None => TargetSet::all_states(&graph),
    };

    let input_digest = hash_inputs(documents.iter().map(String::as_bytes));
    Ok(LoadedGraph {
        graph,
        targets,
        reduced: args.reduced.is_some(),
        input_digest,
    })
}
