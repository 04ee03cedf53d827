//! Tracegen: model-based test generation for transactional storage engines
//!
//! A model checker explores every state of a transaction model and dumps the
//! state graph. Tracegen picks a small set of root-anchored paths through that
//! graph that visits (a fraction of) its states, replays each path as a
//! labelled trace, and translates every trace into an executable test against
//! the engine's API.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                      TRACEGEN Pipeline                           │
//! ├──────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌─────────────┐    ┌────────────┐            │
//! │   │ State      │    │ Spanning    │    │ Path       │            │
//! │   │ Graph      │───►│ Arbores-    │───►│ Cover      │            │
//! │   │ (JSON)     │    │ cence       │    │ (greedy)   │            │
//! │   └────────────┘    └─────────────┘    └─────┬──────┘            │
//! │                                              ▼                   │
//! │   ┌────────────┐    ┌─────────────┐    ┌────────────┐            │
//! │   │ Python     │◄───│ Statement   │◄───│ Labelled   │            │
//! │   │ unittest   │    │ IR          │    │ Traces     │            │
//! │   │ modules    │    │             │    │            │            │
//! │   └────────────┘    └─────────────┘    └────────────┘            │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use tracegen::prelude::*;
//!
//! # fn main() -> TracegenResult<()> {
//! let states = std::fs::read_to_string("stategraph-states.json")?;
//! let edges = std::fs::read_to_string("stategraph-edges.json")?;
//! let config = GeneratorConfig::default();
//! let graph = StateGraph::from_json(&states, &edges, &config.load_options())?;
//!
//! let output = Generator::new(config)?.run(&graph, &TargetSet::all_states(&graph))?;
//! for (n, module) in output.numbered_modules() {
//!     std::fs::write(format!("model_tests_{n}.py"), &module.text)?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod arborescence;
pub mod config;
pub mod cover;
pub mod emit;
pub mod error;
pub mod graph;
pub mod ir;
pub mod pipeline;
pub mod shard;
pub mod trace;
pub mod translate;

pub use arborescence::{compute_arborescence, select_root, to_dot, Arborescence, RootPolicy};
pub use config::{GeneratorConfig, StrategyConfig};
pub use cover::{
    cover_paths, CoverStrategy, CoverageReport, CoveringPath, GreedyLongestFirst, PathCover,
    RandomWalk, TargetSet,
};
pub use emit::{
    CallStyle, Dialect, EmitOptions, GenerationManifest, TestCase, TestEmitter, TestModule,
    WiredTigerPython,
};
pub use error::{TracegenError, TracegenResult};
pub use graph::{
    ActionLabel, DuplicateEdgePolicy, Fingerprint, GraphStats, LoadOptions, SnapshotSchema,
    StateGraph, StateSnapshot,
};
pub use pipeline::{GenerationOutput, Generator};
pub use shard::{split_even, ShardConfig};
pub use trace::{build_trace, Trace, TraceStep};
pub use translate::ActionTranslator;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::arborescence::{Arborescence, RootPolicy};
    pub use crate::config::{GeneratorConfig, StrategyConfig};
    pub use crate::cover::{CoverStrategy, CoverageReport, CoveringPath, PathCover, TargetSet};
    pub use crate::emit::{CallStyle, EmitOptions, TestModule};
    pub use crate::error::{TracegenError, TracegenResult};
    pub use crate::graph::{Fingerprint, LoadOptions, StateGraph};
    pub use crate::pipeline::{GenerationOutput, Generator};
}
