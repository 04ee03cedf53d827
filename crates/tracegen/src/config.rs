//! Generator configuration.
//!
//! Every knob of a run in one serde struct, loadable from YAML or JSON:
//!
//! ```yaml
//! coverage_pct: 0.9
//! strategy:
//!   kind: random-walk
//!   seed: 7
//!   num_paths: 200
//!   max_path_len: 40
//! root: first-listed
//! duplicate_edges: reject
//! emit:
//!   style: helper
//!   verbose: false
//! shards: 4
//! ```

use crate::arborescence::RootPolicy;
use crate::cover::{validate_coverage_pct, CoverStrategy, GreedyLongestFirst, RandomWalk};
use crate::emit::EmitOptions;
use crate::error::{TracegenError, TracegenResult};
use crate::graph::{DuplicateEdgePolicy, LoadOptions, SnapshotSchema};
use crate::ir::Txn;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Path cover strategy selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum StrategyConfig {
    /// Longest tree paths first
    #[default]
    Greedy,
    /// Seeded random walks
    RandomWalk {
        /// RNG seed
        #[serde(default = "default_seed")]
        seed: u64,
        /// Upper bound on walks attempted
        #[serde(default = "default_num_paths")]
        num_paths: usize,
        /// Upper bound on steps per walk
        #[serde(default = "default_max_path_len")]
        max_path_len: usize,
    },
}

fn default_seed() -> u64 {
    RandomWalk::default().seed
}

fn default_num_paths() -> usize {
    RandomWalk::default().num_paths
}

fn default_max_path_len() -> usize {
    RandomWalk::default().max_path_len
}

impl StrategyConfig {
    /// Instantiate the strategy.
    #[must_use]
    pub fn build(&self) -> Box<dyn CoverStrategy> {
        match *self {
            Self::Greedy => Box::new(GreedyLongestFirst),
            Self::RandomWalk {
                seed,
                num_paths,
                max_path_len,
            } => Box::new(RandomWalk {
                seed,
                num_paths,
                max_path_len,
            }),
        }
    }
}

/// Settings for one generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Fraction of targets to cover, in `(0, 1]`
    pub coverage_pct: f64,
    /// Path cover strategy
    pub strategy: StrategyConfig,
    /// Initial state selection
    pub root: RootPolicy,
    /// Parallel edge handling
    pub duplicate_edges: DuplicateEdgePolicy,
    /// Snapshot field names
    pub schema: SnapshotSchema,
    /// Emission settings
    pub emit: EmitOptions,
    /// Number of output modules
    pub shards: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            coverage_pct: 1.0,
            strategy: StrategyConfig::default(),
            root: RootPolicy::default(),
            duplicate_edges: DuplicateEdgePolicy::default(),
            schema: SnapshotSchema::default(),
            emit: EmitOptions::default(),
            shards: 1,
        }
    }
}

impl GeneratorConfig {
    /// Parse and validate YAML.
    pub fn from_yaml(yaml: &str) -> TracegenResult<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate JSON.
    pub fn from_json(json: &str) -> TracegenResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file; `.json` is parsed as JSON, anything else as YAML.
    pub fn load(path: &Path) -> TracegenResult<Self> {
        let text = std::fs::read_to_string(path)?;
        if path.extension().is_some_and(|ext| ext == "json") {
            Self::from_json(&text)
        } else {
            Self::from_yaml(&text)
        }
    }

    /// Reject settings no run could use.
    pub fn validate(&self) -> TracegenResult<()> {
        validate_coverage_pct(self.coverage_pct)?;
        if self.shards == 0 {
            return Err(TracegenError::config("shards must be at least 1"));
        }
        if let StrategyConfig::RandomWalk {
            num_paths,
            max_path_len,
            ..
        } = self.strategy
        {
            if num_paths == 0 {
                return Err(TracegenError::config("num_paths must be at least 1"));
            }
            if max_path_len == 0 {
                return Err(TracegenError::config("max_path_len must be at least 1"));
            }
        }
        if self.emit.max_steps == Some(0) {
            return Err(TracegenError::config("max_steps must be at least 1"));
        }
        for session in &self.emit.sessions {
            Txn::new(session.as_str())?;
        }
        if self.schema.node_key.is_empty() {
            return Err(TracegenError::config("schema.node_key must not be empty"));
        }
        Ok(())
    }

    /// Loader settings derived from this config.
    #[must_use]
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions::new()
            .with_schema(self.schema.clone())
            .with_duplicate_edges(self.duplicate_edges)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::emit::CallStyle;
    use crate::graph::Fingerprint;

    #[test]
    fn test_defaults() {
        let config = GeneratorConfig::default();
        assert_eq!(config.coverage_pct, 1.0);
        assert_eq!(config.shards, 1);
        assert_eq!(config.strategy, StrategyConfig::Greedy);
        assert_eq!(config.root, RootPolicy::UniqueSource);
        assert_eq!(config.emit.sessions, vec!["t1", "t2", "t3"]);
        assert!(config.emit.verbose);
        config.validate().unwrap();
    }

    #[test]
    fn test_from_yaml() {
        let yaml = r"
coverage_pct: 0.5
strategy:
  kind: random-walk
  seed: 7
root:
  explicit: -12
duplicate_edges: keep-last
emit:
  style: helper
  verbose: false
shards: 3
";
        let config = GeneratorConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.coverage_pct, 0.5);
        assert_eq!(
            config.strategy,
            StrategyConfig::RandomWalk {
                seed: 7,
                num_paths: 50,
                max_path_len: 100
            }
        );
        assert_eq!(config.root, RootPolicy::Explicit(Fingerprint(-12)));
        assert_eq!(config.duplicate_edges, DuplicateEdgePolicy::KeepLast);
        assert_eq!(config.emit.style, CallStyle::Helper);
        assert!(!config.emit.verbose);
        assert_eq!(config.emit.max_steps, Some(1000));
        assert_eq!(config.shards, 3);
        assert_eq!(config.strategy.build().name(), "random-walk");
    }

    #[test]
    fn test_from_json() {
        let config = GeneratorConfig::from_json(r#"{"root": "first-listed"}"#).unwrap();
        assert_eq!(config.root, RootPolicy::FirstListed);
        assert_eq!(config.strategy.build().name(), "greedy-longest-first");
    }

    #[test]
    fn test_validate_rejects() {
        for yaml in [
            "coverage_pct: 0.0",
            "coverage_pct: 1.2",
            "shards: 0",
            "strategy: {kind: random-walk, num_paths: 0}",
            "emit: {max_steps: 0}",
            "emit: {sessions: [\"t-1\"]}",
        ] {
            assert!(GeneratorConfig::from_yaml(yaml).is_err(), "{yaml}");
        }
    }

    #[test]
    fn test_bad_yaml_is_yaml_error() {
        let err = GeneratorConfig::from_yaml("coverage_pct: [").unwrap_err();
        assert!(matches!(err, TracegenError::Yaml(_)));
    }

    #[test]
    fn test_load_options() {
        let config = GeneratorConfig {
            duplicate_edges: DuplicateEdgePolicy::Reject,
            ..GeneratorConfig::default()
        };
        assert_eq!(config.load_options().duplicate_edges, DuplicateEdgePolicy::Reject);
    }
}
