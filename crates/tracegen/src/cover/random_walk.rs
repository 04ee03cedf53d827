use super::{CoverStrategy, CoverageTracker, CoveringPath, PathCover, TargetSet};
use crate::arborescence::Arborescence;
use crate::error::{TracegenError, TracegenResult};
use crate::graph::{Fingerprint, StateGraph};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Seeded random walks from the root over the full graph.
///
/// At each step the walk picks among unseen successors plus one random
/// successor, so it drifts toward new states but can still revisit. Walks may
/// follow non-tree edges and cycles. A walk is kept only when it reaches at
/// least one new target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomWalk {
    /// RNG seed
    pub seed: u64,
    /// Upper bound on walks attempted
    pub num_paths: usize,
    /// Upper bound on steps per walk
    pub max_path_len: usize,
}

impl Default for RandomWalk {
    fn default() -> Self {
        Self {
            seed: 14,
            num_paths: 50,
            max_path_len: 100,
        }
    }
}

impl RandomWalk {
    /// Walk strategy with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Set the walk budget.
    #[must_use]
    pub const fn with_num_paths(mut self, num_paths: usize) -> Self {
        self.num_paths = num_paths;
        self
    }

    /// Set the per-walk step limit.
    #[must_use]
    pub const fn with_max_path_len(mut self, max_path_len: usize) -> Self {
        self.max_path_len = max_path_len;
        self
    }

    fn walk(
        &self,
        graph: &StateGraph,
        root: Fingerprint,
        rng: &mut StdRng,
        seen: &mut HashSet<Fingerprint>,
    ) -> Vec<Fingerprint> {
        let mut current = root;
        let mut walk = vec![current];
        for _ in 0..self.max_path_len {
            seen.insert(current);
            let successors = graph.successors(current);
            let mut choices: Vec<Fingerprint> = successors
                .iter()
                .copied()
                .filter(|s| !seen.contains(s))
                .collect();
            if let Some(&any) = successors.choose(rng) {
                choices.push(any);
            }
            let Some(&next) = choices.choose(rng) else {
                break;
            };
            walk.push(next);
            current = next;
        }
        walk
    }
}

impl CoverStrategy for RandomWalk {
    fn name(&self) -> &'static str {
        "random-walk"
    }

    fn cover(
        &self,
        graph: &StateGraph,
        tree: &Arborescence,
        targets: &TargetSet,
        coverage_pct: f64,
    ) -> TracegenResult<PathCover> {
        if self.max_path_len == 0 {
            return Err(TracegenError::config("max_path_len must be at least 1"));
        }
        let mut tracker = CoverageTracker::new(targets, coverage_pct);
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut seen = HashSet::new();
        let mut paths = Vec::new();

        for attempt in 0..self.num_paths {
            if tracker.is_satisfied() {
                break;
            }
            let walk = self.walk(graph, tree.root(), &mut rng, &mut seen);
            if tracker.absorb(&walk) > 0 {
                paths.push(CoveringPath::new(walk));
            } else {
                tracing::trace!(attempt, "walk reached no new target");
            }
        }

        Ok(tracker.finish(self.name(), tree, paths))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::arborescence::RootPolicy;
    use crate::graph::tests::{edge, node};
    use crate::graph::LoadOptions;
    use serde_json::json;

    // 1 -> 2 -> 3 -> 1 cycle with a 2 -> 4 exit
    fn cyclic() -> (StateGraph, Arborescence) {
        let g = StateGraph::load(
            vec![node(1), node(2), node(3), node(4)],
            vec![
                edge(1, 2, "StartTransaction", json!({"tid": "t1", "readTs": 1})),
                edge(2, 3, "CommitTransaction", json!({"tid": "t1", "commitTs": 2})),
                edge(3, 1, "RollbackToStable", json!({})),
                edge(2, 4, "AbortTransaction", json!({"tid": "t1"})),
            ],
            &LoadOptions::new(),
        )
        .unwrap();
        let tree = Arborescence::compute(&g, RootPolicy::FirstListed).unwrap();
        (g, tree)
    }

    #[test]
    fn test_walks_start_at_root_and_follow_edges() {
        let (g, tree) = cyclic();
        let targets = TargetSet::all_states(&g);
        let cover = RandomWalk::new(7)
            .with_max_path_len(6)
            .cover(&g, &tree, &targets, 1.0)
            .unwrap();
        assert!(!cover.paths.is_empty());
        for path in &cover.paths {
            assert_eq!(path.nodes()[0], Fingerprint(1));
            assert!(path.len() <= 7);
            for pair in path.nodes().windows(2) {
                assert!(g.label(pair[0], pair[1]).is_some());
            }
        }
    }

    #[test]
    fn test_same_seed_same_cover() {
        let (g, tree) = cyclic();
        let targets = TargetSet::all_states(&g);
        let strategy = RandomWalk::new(99).with_max_path_len(4);
        let a = strategy.cover(&g, &tree, &targets, 1.0).unwrap();
        let b = strategy.cover(&g, &tree, &targets, 1.0).unwrap();
        assert_eq!(a.paths, b.paths);
    }

    #[test]
    fn test_zero_budget_covers_nothing() {
        let (g, tree) = cyclic();
        let targets = TargetSet::all_states(&g);
        let cover = RandomWalk::new(1)
            .with_num_paths(0)
            .cover(&g, &tree, &targets, 1.0)
            .unwrap();
        assert!(cover.paths.is_empty());
        assert_eq!(cover.report.covered, 0);
    }

    #[test]
    fn test_zero_length_rejected() {
        let (g, tree) = cyclic();
        let err = RandomWalk::new(1)
            .with_max_path_len(0)
            .cover(&g, &tree, &TargetSet::all_states(&g), 1.0)
            .unwrap_err();
        assert!(matches!(err, TracegenError::Config { .. }));
    }
}
