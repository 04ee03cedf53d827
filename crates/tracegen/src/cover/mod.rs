//! Root-anchored path covers.
//!
//! A cover is a list of root-to-node paths whose union visits enough target
//! states to reach the requested coverage fraction. [`GreedyLongestFirst`] is
//! the default; [`RandomWalk`] samples walks over the full graph instead.

mod greedy;
mod random_walk;

pub use greedy::GreedyLongestFirst;
pub use random_walk::RandomWalk;

use crate::arborescence::Arborescence;
use crate::error::{TracegenError, TracegenResult};
use crate::graph::{Fingerprint, StateGraph};
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};

/// States whose coverage is measured.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetSet {
    nodes: BTreeSet<Fingerprint>,
}

impl TargetSet {
    /// Targets from explicit fingerprints.
    #[must_use]
    pub fn from_fingerprints(fps: impl IntoIterator<Item = Fingerprint>) -> Self {
        Self {
            nodes: fps.into_iter().collect(),
        }
    }

    /// Every state of `graph`.
    ///
    /// Pass the reduced graph here to use its states as targets.
    #[must_use]
    pub fn all_states(graph: &StateGraph) -> Self {
        Self::from_fingerprints(graph.fingerprints())
    }

    /// Number of targets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether there are no targets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether `fp` is a target.
    #[must_use]
    pub fn contains(&self, fp: Fingerprint) -> bool {
        self.nodes.contains(&fp)
    }

    /// Targets in ascending fingerprint order.
    pub fn iter(&self) -> impl Iterator<Item = Fingerprint> + '_ {
        self.nodes.iter().copied()
    }
}

/// Check that a coverage fraction lies in `(0, 1]`.
pub fn validate_coverage_pct(pct: f64) -> TracegenResult<f64> {
    if pct.is_finite() && pct > 0.0 && pct <= 1.0 {
        Ok(pct)
    } else {
        Err(TracegenError::config(format!(
            "coverage_pct must be in (0, 1], got {pct}"
        )))
    }
}

/// Stable digest of a node sequence: first 8 bytes of its BLAKE3 hash.
#[must_use]
pub fn path_digest(nodes: &[Fingerprint]) -> u64 {
    let mut hasher = blake3::Hasher::new();
    for fp in nodes {
        hasher.update(&fp.0.to_le_bytes());
    }
    let hash = hasher.finalize();
    let mut head = [0u8; 8];
    head.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(head)
}

/// One path of a cover, starting at the root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CoveringPath {
    nodes: Vec<Fingerprint>,
}

impl CoveringPath {
    /// Wrap a node sequence.
    #[must_use]
    pub fn new(nodes: Vec<Fingerprint>) -> Self {
        Self { nodes }
    }

    /// Node sequence.
    #[must_use]
    pub fn nodes(&self) -> &[Fingerprint] {
        &self.nodes
    }

    /// Number of nodes (one more than the number of steps).
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the path has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Final node.
    #[must_use]
    pub fn end(&self) -> Option<Fingerprint> {
        self.nodes.last().copied()
    }

    /// See [`path_digest`].
    #[must_use]
    pub fn digest(&self) -> u64 {
        path_digest(&self.nodes)
    }
}

/// How much of the target set a cover reached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageReport {
    /// Strategy that produced the cover
    pub strategy: String,
    /// Size of the target set
    pub total_targets: usize,
    /// Targets visited by at least one path
    pub covered: usize,
    /// Requested fraction
    pub requested_pct: f64,
    /// Targets not visited, ascending
    pub uncovered: Vec<Fingerprint>,
    /// Uncovered targets outside the arborescence, whether absent from the
    /// graph or not reachable from the root
    pub unreachable: usize,
    /// Number of paths
    pub path_count: usize,
    /// Mean path length in nodes
    pub average_path_len: f64,
}

impl CoverageReport {
    /// Achieved fraction; 1.0 for an empty target set.
    #[must_use]
    pub fn achieved_pct(&self) -> f64 {
        if self.total_targets == 0 {
            1.0
        } else {
            self.covered as f64 / self.total_targets as f64
        }
    }

    /// Whether every target was covered.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.covered == self.total_targets
    }

    /// Fail unless the achieved fraction reaches `min_pct`.
    pub fn require(&self, min_pct: f64) -> TracegenResult<()> {
        let achieved = self.achieved_pct();
        if achieved + 1e-9 >= min_pct {
            Ok(())
        } else {
            Err(TracegenError::UnreachableTargets {
                covered: self.covered,
                total: self.total_targets,
                achieved: achieved * 100.0,
                required: min_pct * 100.0,
            })
        }
    }
}

/// Paths plus their coverage report.
#[derive(Debug, Clone, Serialize)]
pub struct PathCover {
    /// Paths in selection order
    pub paths: Vec<CoveringPath>,
    /// Coverage summary
    pub report: CoverageReport,
}

/// A way of choosing covering paths.
pub trait CoverStrategy: Send + Sync + std::fmt::Debug {
    /// Short name used in logs and reports.
    fn name(&self) -> &'static str;

    /// Choose paths from the root until `coverage_pct` of `targets` is visited.
    fn cover(
        &self,
        graph: &StateGraph,
        tree: &Arborescence,
        targets: &TargetSet,
        coverage_pct: f64,
    ) -> TracegenResult<PathCover>;
}

/// Validate `coverage_pct` and run `strategy`.
pub fn cover_paths(
    graph: &StateGraph,
    tree: &Arborescence,
    targets: &TargetSet,
    coverage_pct: f64,
    strategy: &dyn CoverStrategy,
) -> TracegenResult<PathCover> {
    let coverage_pct = validate_coverage_pct(coverage_pct)?;
    let _span = tracing::info_span!("cover", strategy = strategy.name()).entered();

    let cover = strategy.cover(graph, tree, targets, coverage_pct)?;
    let report = &cover.report;
    tracing::info!(
        paths = report.path_count,
        covered = report.covered,
        total = report.total_targets,
        "selected covering paths"
    );
    if report.achieved_pct() + 1e-9 < coverage_pct {
        tracing::warn!(
            achieved = report.achieved_pct(),
            requested = coverage_pct,
            unreachable = report.unreachable,
            "coverage below requested fraction"
        );
    }
    Ok(cover)
}

/// Running count of visited targets shared by the strategies.
#[derive(Debug)]
pub(crate) struct CoverageTracker<'a> {
    targets: &'a TargetSet,
    remaining: HashSet<Fingerprint>,
    threshold: usize,
    requested_pct: f64,
}

impl<'a> CoverageTracker<'a> {
    pub(crate) fn new(targets: &'a TargetSet, coverage_pct: f64) -> Self {
        let exact = coverage_pct * targets.len() as f64;
        // absorb float noise such as 0.3 * 10 = 3.0000000000000004
        let threshold = (exact - 1e-9).ceil().max(0.0) as usize;
        Self {
            targets,
            remaining: targets.iter().collect(),
            threshold,
            requested_pct: coverage_pct,
        }
    }

    pub(crate) fn covered(&self) -> usize {
        self.targets.len() - self.remaining.len()
    }

    pub(crate) fn is_satisfied(&self) -> bool {
        self.covered() >= self.threshold
    }

    pub(crate) fn is_remaining(&self, fp: Fingerprint) -> bool {
        self.remaining.contains(&fp)
    }

    /// Mark the path's targets visited; returns how many were new.
    pub(crate) fn absorb(&mut self, path: &[Fingerprint]) -> usize {
        path.iter().filter(|fp| self.remaining.remove(fp)).count()
    }

    pub(crate) fn finish(
        self,
        strategy: &str,
        tree: &Arborescence,
        paths: Vec<CoveringPath>,
    ) -> PathCover {
        let mut uncovered: Vec<_> = self.remaining.iter().copied().collect();
        uncovered.sort_unstable();
        let unreachable = uncovered.iter().filter(|fp| !tree.contains(**fp)).count();
        let average_path_len = if paths.is_empty() {
            0.0
        } else {
            paths.iter().map(CoveringPath::len).sum::<usize>() as f64 / paths.len() as f64
        };
        let report = CoverageReport {
            strategy: strategy.to_string(),
            total_targets: self.targets.len(),
            covered: self.covered(),
            requested_pct: self.requested_pct,
            uncovered,
            unreachable,
            path_count: paths.len(),
            average_path_len,
        };
        PathCover { paths, report }
    }
}
