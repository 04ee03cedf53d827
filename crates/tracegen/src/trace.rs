//! Labelled traces.
//!
//! A trace replays a covering path against the source graph: each consecutive
//! node pair becomes a step carrying the pre-state, action label and
//! post-state. Steps borrow from the graph.

use crate::cover::CoveringPath;
use crate::error::{TracegenError, TracegenResult};
use crate::graph::{ActionLabel, Fingerprint, StateGraph, StateSnapshot};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeSet;

/// One transition of a trace.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TraceStep<'g> {
    /// Pre-state fingerprint
    pub from: Fingerprint,
    /// Post-state fingerprint
    pub to: Fingerprint,
    /// Pre-state snapshot
    pub pre: &'g StateSnapshot,
    /// Action taken
    pub label: &'g ActionLabel,
    /// Post-state snapshot
    pub post: &'g StateSnapshot,
}

/// Executable action sequence for one covering path.
#[derive(Debug, Clone, Serialize)]
pub struct Trace<'g> {
    start: Fingerprint,
    steps: Vec<TraceStep<'g>>,
}

impl<'g> Trace<'g> {
    /// Initial state.
    #[must_use]
    pub const fn start(&self) -> Fingerprint {
        self.start
    }

    /// Steps in execution order.
    #[must_use]
    pub fn steps(&self) -> &[TraceStep<'g>] {
        &self.steps
    }

    /// Number of steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the trace takes no step (single-node path).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Fingerprints visited, start included.
    #[must_use]
    pub fn node_sequence(&self) -> Vec<Fingerprint> {
        std::iter::once(self.start)
            .chain(self.steps.iter().map(|s| s.to))
            .collect()
    }

    /// Transaction ids acted on, sorted.
    #[must_use]
    pub fn transactions(&self) -> BTreeSet<String> {
        self.steps.iter().filter_map(|s| s.label.tid()).collect()
    }

    /// `{"action": [[[i, pre], {"name", "context"}, [i + 1, post]], ...]}`
    #[must_use]
    pub fn to_json(&self) -> Value {
        let action: Vec<Value> = self
            .steps
            .iter()
            .enumerate()
            .map(|(i, step)| {
                json!([
                    [i + 1, step.pre],
                    {"name": step.label.name, "context": step.label.params},
                    [i + 2, step.post],
                ])
            })
            .collect();
        json!({ "action": action })
    }
}

/// Pair each consecutive node pair of `path` with its edge label.
pub fn build_trace<'g>(graph: &'g StateGraph, path: &CoveringPath) -> TracegenResult<Trace<'g>> {
    let start = path
        .nodes()
        .first()
        .copied()
        .ok_or_else(|| TracegenError::malformed("covering path has no nodes"))?;
    if !graph.contains(start) {
        return Err(TracegenError::malformed(format!(
            "covering path starts at unknown state {start}"
        )));
    }

    let steps = path
        .nodes()
        .windows(2)
        .map(|pair| {
            let (from, to) = (pair[0], pair[1]);
            let label = graph
                .label(from, to)
                .ok_or(TracegenError::MissingEdge { from, to })?;
            let (Some(pre), Some(post)) = (graph.snapshot(from), graph.snapshot(to)) else {
                return Err(TracegenError::MissingEdge { from, to });
            };
            Ok(TraceStep {
                from,
                to,
                pre,
                label,
                post,
            })
        })
        .collect::<TracegenResult<Vec<_>>>()?;

    Ok(Trace { start, steps })
}

/// Build a trace for every path, in order.
pub fn build_traces<'g>(
    graph: &'g StateGraph,
    paths: &[CoveringPath],
) -> TracegenResult<Vec<Trace<'g>>> {
    paths.iter().map(|p| build_trace(graph, p)).collect()
}

/// JSON dump of many traces, one object per trace.
#[must_use]
pub fn traces_to_json(traces: &[Trace<'_>]) -> Value {
    Value::Array(traces.iter().map(Trace::to_json).collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::graph::tests::{edge, node};
    use crate::graph::LoadOptions;

    fn chain() -> StateGraph {
        StateGraph::load(
            vec![node(1), node(2), node(3)],
            vec![
                edge(1, 2, "StartTransaction", json!({"tid": "t1", "readTs": 1})),
                edge(2, 3, "TransactionWrite", json!({"tid": "t1", "k": "k1", "v": "t1"})),
            ],
            &LoadOptions::new(),
        )
        .unwrap()
    }

    fn path(ids: &[i64]) -> CoveringPath {
        CoveringPath::new(ids.iter().copied().map(Fingerprint).collect())
    }

    #[test]
    fn test_build_trace_labels_steps() {
        let g = chain();
        let trace = build_trace(&g, &path(&[1, 2, 3])).unwrap();
        assert_eq!(trace.len(), 2);
        assert_eq!(trace.steps()[0].label.name, "StartTransaction");
        assert_eq!(trace.steps()[1].label.name, "TransactionWrite");
        assert_eq!(trace.node_sequence(), path(&[1, 2, 3]).nodes());
        assert_eq!(trace.transactions().into_iter().collect::<Vec<_>>(), vec!["t1"]);
    }

    #[test]
    fn test_single_node_path_is_empty_trace() {
        let g = chain();
        let trace = build_trace(&g, &path(&[1])).unwrap();
        assert!(trace.is_empty());
        assert_eq!(trace.start(), Fingerprint(1));
    }

    #[test]
    fn test_missing_edge() {
        let g = chain();
        let err = build_trace(&g, &path(&[1, 3])).unwrap_err();
        assert!(matches!(
            err,
            TracegenError::MissingEdge { from: Fingerprint(1), to: Fingerprint(3) }
        ));
    }

    #[test]
    fn test_empty_path_rejected() {
        let g = chain();
        assert!(build_trace(&g, &path(&[])).is_err());
    }

    #[test]
    fn test_json_dump_shape() {
        let g = chain();
        let trace = build_trace(&g, &path(&[1, 2])).unwrap();
        let dump = trace.to_json();
        let step = &dump["action"][0];
        assert_eq!(step[0][0], json!(1));
        assert_eq!(step[1]["name"], json!("StartTransaction"));
        assert_eq!(step[1]["context"]["readTs"], json!(1));
        assert_eq!(step[2][0], json!(2));
        assert!(step[2][1].get("txnStatus").is_some());
    }
}
