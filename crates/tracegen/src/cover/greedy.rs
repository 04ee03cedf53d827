use super::{path_digest, CoverStrategy, CoverageTracker, CoveringPath, PathCover, TargetSet};
use crate::arborescence::Arborescence;
use crate::error::TracegenResult;
use crate::graph::{Fingerprint, StateGraph};

/// Longest tree paths first, skipping any path that adds no new target.
///
/// Candidates are ordered by depth, then by [`path_digest`], both descending,
/// so the selection depends only on the tree and never on hash seeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyLongestFirst;

impl GreedyLongestFirst {
    const NAME: &'static str = "greedy-longest-first";

    /// Cover straight from the tree; the graph itself is not consulted.
    #[must_use]
    pub fn cover_tree(tree: &Arborescence, targets: &TargetSet, coverage_pct: f64) -> PathCover {
        let mut tracker = CoverageTracker::new(targets, coverage_pct);
        let mut paths = Vec::new();
        if tracker.is_satisfied() {
            return tracker.finish(Self::NAME, tree, paths);
        }

        let mut candidates: Vec<(usize, u64, Fingerprint, Vec<Fingerprint>)> = tree
            .nodes()
            .iter()
            .filter_map(|&end| {
                let path = tree.path_to(end)?;
                Some((path.len(), path_digest(&path), end, path))
            })
            .collect();
        candidates.sort_unstable_by(|a, b| (b.0, b.1, b.2).cmp(&(a.0, a.1, a.2)));

        for (_, _, _, path) in candidates {
            if !path.iter().any(|&fp| tracker.is_remaining(fp)) {
                continue;
            }
            tracker.absorb(&path);
            paths.push(CoveringPath::new(path));
            if paths.len() % 1000 == 0 {
                tracing::debug!(
                    paths = paths.len(),
                    covered = tracker.covered(),
                    total = targets.len(),
                    "cover progress"
                );
            }
            if tracker.is_satisfied() {
                break;
            }
        }

        tracker.finish(Self::NAME, tree, paths)
    }
}

impl CoverStrategy for GreedyLongestFirst {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn cover(
        &self,
        _graph: &StateGraph,
        tree: &Arborescence,
        targets: &TargetSet,
        coverage_pct: f64,
    ) -> TracegenResult<PathCover> {
        Ok(Self::cover_tree(tree, targets, coverage_pct))
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
    use std::cmp::Reverse;

    fn fp(id: i64) -> Fingerprint {
        Fingerprint(id)
    }

    // A(1) -> B(2) -> C(3), B(2) -> D(4)
    fn branching() -> (StateGraph, Arborescence) {
        let g = StateGraph::load(
            vec![node(1), node(2), node(3), node(4)],
            vec![
                edge(1, 2, "TransactionWrite", json!({"tid": "t1", "k": "k1", "v": "t1"})),
                edge(2, 3, "TransactionRead", json!({"tid": "t1", "k": "k1", "v": "t1"})),
                edge(2, 4, "AbortTransaction", json!({"tid": "t1"})),
            ],
            &LoadOptions::new(),
        )
        .unwrap();
        let tree = Arborescence::compute(&g, RootPolicy::UniqueSource).unwrap();
        (g, tree)
    }

    /// Equal-length paths ordered by digest, then end fingerprint, both descending.
    fn tie_order(mut paths: Vec<Vec<Fingerprint>>) -> Vec<Vec<Fingerprint>> {
        paths.sort_by_key(|p| Reverse((path_digest(p), p.last().copied())));
        paths
    }

    fn nodes(cover: &PathCover) -> Vec<Vec<Fingerprint>> {
        cover.paths.iter().map(|p| p.nodes().to_vec()).collect()
    }

    #[test]
    fn test_two_leaves_two_paths() {
        let (_, tree) = branching();
        let targets = TargetSet::from_fingerprints([fp(3), fp(4)]);
        let cover = GreedyLongestFirst::cover_tree(&tree, &targets, 1.0);
        let want = tie_order(vec![vec![fp(1), fp(2), fp(3)], vec![fp(1), fp(2), fp(4)]]);
        assert_eq!(nodes(&cover), want);
        assert!(cover.report.is_complete());
    }

    #[test]
    fn test_longest_path_first() {
        // 1 -> 2 -> 3 -> 4, 1 -> 5
        let g = StateGraph::load(
            (1..=5).map(node).collect(),
            vec![
                edge(1, 2, "TransactionWrite", json!({"tid": "t1", "k": "k1", "v": "t1"})),
                edge(2, 3, "TransactionWrite", json!({"tid": "t1", "k": "k2", "v": "t1"})),
                edge(3, 4, "AbortTransaction", json!({"tid": "t1"})),
                edge(1, 5, "AbortTransaction", json!({"tid": "t1"})),
            ],
            &LoadOptions::new(),
        )
        .unwrap();
        let tree = Arborescence::compute(&g, RootPolicy::UniqueSource).unwrap();
        let targets = TargetSet::from_fingerprints((1..=5).map(fp));
        let cover = GreedyLongestFirst::cover_tree(&tree, &targets, 1.0);
        assert_eq!(
            nodes(&cover),
            vec![vec![fp(1), fp(2), fp(3), fp(4)], vec![fp(1), fp(5)]]
        );
    }

    #[test]
    fn test_equal_length_tie_broken_by_digest() {
        // Three leaves at depth 2 under the root.
        let g = StateGraph::load(
            (1..=4).map(node).collect(),
            vec![
                edge(1, 2, "AbortTransaction", json!({"tid": "t1"})),
                edge(1, 3, "AbortTransaction", json!({"tid": "t2"})),
                edge(1, 4, "AbortTransaction", json!({"tid": "t3"})),
            ],
            &LoadOptions::new(),
        )
        .unwrap();
        let tree = Arborescence::compute(&g, RootPolicy::UniqueSource).unwrap();
        let leaves = vec![vec![fp(1), fp(2)], vec![fp(1), fp(3)], vec![fp(1), fp(4)]];

        let targets = TargetSet::from_fingerprints([fp(2), fp(3), fp(4)]);
        let full = GreedyLongestFirst::cover_tree(&tree, &targets, 1.0);
        assert_eq!(nodes(&full), tie_order(leaves.clone()));

        // Partial coverage keeps only the winner of the tie.
        let partial = GreedyLongestFirst::cover_tree(&tree, &targets, 0.3);
        assert_eq!(nodes(&partial), tie_order(leaves)[..1].to_vec());
    }

    #[test]
    fn test_single_target_single_path() {
        let (_, tree) = branching();
        let targets = TargetSet::from_fingerprints([fp(3)]);
        let cover = GreedyLongestFirst::cover_tree(&tree, &targets, 1.0);
        assert_eq!(cover.paths.len(), 1);
        assert_eq!(cover.paths[0].nodes(), &[fp(1), fp(2), fp(3)]);
    }

    #[test]
    fn test_partial_coverage_stops_early() {
        let (_, tree) = branching();
        let targets = TargetSet::from_fingerprints([fp(3), fp(4)]);
        let cover = GreedyLongestFirst::cover_tree(&tree, &targets, 0.5);
        assert_eq!(cover.paths.len(), 1);
        assert_eq!(cover.report.covered, 1);
        assert!(cover.report.require(0.5).is_ok());
    }

    #[test]
    fn test_root_only_target() {
        let (_, tree) = branching();
        let targets = TargetSet::from_fingerprints([fp(1)]);
        let cover = GreedyLongestFirst::cover_tree(&tree, &targets, 1.0);
        assert_eq!(cover.paths.len(), 1);
        assert_eq!(cover.paths[0].nodes()[0], fp(1));
    }

    #[test]
    fn test_empty_targets_no_paths() {
        let (_, tree) = branching();
        let cover = GreedyLongestFirst::cover_tree(&tree, &TargetSet::default(), 1.0);
        assert!(cover.paths.is_empty());
        assert_eq!(cover.report.achieved_pct(), 1.0);
    }

    #[test]
    fn test_unknown_target_reported() {
        let (g, tree) = branching();
        let targets = TargetSet::from_fingerprints([fp(3), fp(99)]);
        let cover = GreedyLongestFirst.cover(&g, &tree, &targets, 1.0).unwrap();
        assert_eq!(cover.report.covered, 1);
        assert_eq!(cover.report.uncovered, vec![fp(99)]);
        assert_eq!(cover.report.unreachable, 1);
        assert!(cover.report.require(1.0).is_err());
    }

    #[test]
    fn test_deterministic() {
        let (_, tree) = branching();
        let targets = TargetSet::from_fingerprints([fp(1), fp(2), fp(3), fp(4)]);
        let a = GreedyLongestFirst::cover_tree(&tree, &targets, 1.0);
        let b = GreedyLongestFirst::cover_tree(&tree, &targets, 1.0);
        assert_eq!(a.paths, b.paths);
    }
}
