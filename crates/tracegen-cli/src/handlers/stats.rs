//! Stats command handler

use super::{load_graph, resolve_config};
use crate::commands::StatsArgs;
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::ProgressReporter;
use serde::Serialize;
use tracegen::{to_dot, Arborescence, Fingerprint, GraphStats, StateGraph, TargetSet};

/// Everything `tracegen stats` reports.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSummary {
    /// Graph counts
    pub graph: GraphStats,
    /// Initial state
    pub root: Fingerprint,
    /// States reachable from the root
    pub reachable: usize,
    /// States not reachable from the root
    pub unreachable: usize,
    /// Longest root path, in edges
    pub max_depth: usize,
    /// States to cover
    pub targets: usize,
    /// Targets present in the arborescence
    pub reachable_targets: usize,
}

impl StatsSummary {
    /// Collect the summary for `graph` under `tree`.
    #[must_use]
    pub fn collect(graph: &StateGraph, tree: &Arborescence, targets: &TargetSet) -> Self {
        let max_depth = tree
            .nodes()
            .iter()
            .filter_map(|&fp| tree.depth(fp))
            .max()
            .unwrap_or(0);
        Self {
            graph: graph.stats(),
            root: tree.root(),
            reachable: tree.len(),
            unreachable: tree.unreachable_count(),
            max_depth,
            targets: targets.len(),
            reachable_targets: targets.iter().filter(|&fp| tree.contains(fp)).count(),
        }
    }

    /// Plain text rendering, one `key: value` per line.
    #[must_use]
    pub fn render(&self) -> String {
        let rows = [
            ("states:", self.graph.nodes.to_string()),
            ("edges:", self.graph.edges.to_string()),
            ("dropped duplicates:", self.graph.dropped_duplicates.to_string()),
            ("sources:", self.graph.sources.to_string()),
            ("self loops:", self.graph.self_loops.to_string()),
            ("root:", self.root.to_string()),
            ("reachable:", self.reachable.to_string()),
            ("unreachable:", self.unreachable.to_string()),
            ("max depth:", self.max_depth.to_string()),
            (
                "targets:",
                format!("{} ({} reachable)", self.targets, self.reachable_targets),
            ),
        ];
        rows.iter()
            .map(|(key, value)| format!("{key:<18} {value}\n"))
            .collect()
    }
}

/// Execute the stats command
pub fn execute_stats(config: &CliConfig, args: &StatsArgs) -> CliResult<()> {
    let reporter = ProgressReporter::new(config.use_color, config.is_quiet());

    let generator_config = resolve_config(&args.graph)?;
    let loaded = load_graph(&args.graph, &generator_config)?;
    let tree = Arborescence::compute(&loaded.graph, generator_config.root)?;
    let summary = StatsSummary::collect(&loaded.graph, &tree, &loaded.targets);

    if args.json {
        let json = serde_json::to_string_pretty(&summary)
            .map_err(|e| CliError::generation(format!("cannot serialize stats: {e}")))?;
        println!("{json}");
    } else {
        reporter.header("State graph");
        print!("{}", summary.render());
    }

    if let Some(ref path) = args.dot {
        std::fs::write(path, to_dot(&loaded.graph, Some(&tree)))?;
        reporter.success(&format!("wrote {}", path.display()));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::handlers::tests::{graph_args, write_graph};
    use tempfile::TempDir;
    use tracegen::{GeneratorConfig, RootPolicy};

    #[test]
    fn test_collect_summary() {
        let dir = TempDir::new().unwrap();
        let args = graph_args(write_graph(dir.path()));
        let loaded = load_graph(&args, &GeneratorConfig::default()).unwrap();
        let tree = Arborescence::compute(&loaded.graph, RootPolicy::UniqueSource).unwrap();

        let summary = StatsSummary::collect(&loaded.graph, &tree, &loaded.targets);
        assert_eq!(summary.root, Fingerprint(1));
        assert_eq!(summary.reachable, 4);
        assert_eq!(summary.max_depth, 2);
        assert_eq!(summary.reachable_targets, 4);
        assert!(summary.render().contains("root:              1\n"));
    }

    #[test]
    fn test_stats_writes_dot() {
        let dir = TempDir::new().unwrap();
        let dot = dir.path().join("graph.dot");
        let args = StatsArgs {
            graph: graph_args(write_graph(dir.path())),
            dot: Some(dot.clone()),
            json: true,
        };
        execute_stats(&CliConfig::default(), &args).unwrap();
        assert!(std::fs::read_to_string(dot).unwrap().starts_with("digraph"));
    }
}
