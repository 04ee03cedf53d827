//! Spanning arborescence over the state graph.
//!
//! Every edge has unit weight, so any breadth-first tree from the root is a
//! minimum spanning arborescence. Visiting successors in edge insertion order
//! makes the tree a pure function of the input documents.

use crate::error::{TracegenError, TracegenResult};
use crate::graph::{Fingerprint, StateGraph};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::fmt::Write as _;

/// How the initial state is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RootPolicy {
    /// The single state with no inbound edge (self loops ignored)
    #[default]
    UniqueSource,
    /// The first state of the states document
    FirstListed,
    /// A caller-supplied initial state
    Explicit(Fingerprint),
}

/// Resolve the root state under `policy`.
pub fn select_root(graph: &StateGraph, policy: RootPolicy) -> TracegenResult<Fingerprint> {
    if graph.node_count() == 0 {
        return Err(TracegenError::no_root("graph has no states"));
    }
    match policy {
        RootPolicy::Explicit(fp) => {
            if graph.contains(fp) {
                Ok(fp)
            } else {
                Err(TracegenError::no_root(format!(
                    "initial state {fp} is not in the graph"
                )))
            }
        }
        RootPolicy::FirstListed => graph
            .first_listed()
            .ok_or_else(|| TracegenError::no_root("graph has no states")),
        RootPolicy::UniqueSource => {
            let sources = graph.sources();
            match sources.as_slice() {
                [root] => Ok(*root),
                [] => Err(TracegenError::no_root(
                    "every state has an inbound edge; name the initial state explicitly",
                )),
                many => {
                    let shown = many
                        .iter()
                        .take(5)
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(", ");
                    Err(TracegenError::no_root(format!(
                        "{} states have no inbound edge ({shown}{}); name the initial state explicitly",
                        many.len(),
                        if many.len() > 5 { ", ..." } else { "" }
                    )))
                }
            }
        }
    }
}

/// Directed spanning tree rooted at the initial state.
///
/// Covers exactly the states reachable from the root; each non-root state has
/// one tree parent and the root has none.
#[derive(Debug, Clone)]
pub struct Arborescence {
    root: Fingerprint,
    parent: HashMap<Fingerprint, Fingerprint>,
    depth: HashMap<Fingerprint, usize>,
    order: Vec<Fingerprint>,
    unreachable: usize,
}

impl Arborescence {
    /// Build the tree from the root chosen by `policy`.
    pub fn compute(graph: &StateGraph, policy: RootPolicy) -> TracegenResult<Self> {
        let root = select_root(graph, policy)?;
        let _span = tracing::info_span!("arborescence", %root).entered();

        let mut parent = HashMap::new();
        let mut depth = HashMap::from([(root, 0usize)]);
        let mut order = vec![root];
        let mut queue = VecDeque::from([root]);

        while let Some(current) = queue.pop_front() {
            let next_depth = depth[&current] + 1;
            for succ in graph.successors(current) {
                if depth.contains_key(&succ) {
                    continue;
                }
                depth.insert(succ, next_depth);
                parent.insert(succ, current);
                order.push(succ);
                queue.push_back(succ);
            }
        }

        let unreachable = graph.node_count() - order.len();
        if unreachable > 0 {
            tracing::warn!(unreachable, "states unreachable from root are left out of the tree");
        }
        tracing::info!(nodes = order.len(), "computed spanning arborescence");

        Ok(Self {
            root,
            parent,
            depth,
            order,
            unreachable,
        })
    }

    /// Root state.
    #[must_use]
    pub const fn root(&self) -> Fingerprint {
        self.root
    }

    /// Number of states in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Always false; the root is in every tree.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Whether the state is reachable from the root.
    #[must_use]
    pub fn contains(&self, fp: Fingerprint) -> bool {
        self.depth.contains_key(&fp)
    }

    /// Tree parent; `None` for the root and for states outside the tree.
    #[must_use]
    pub fn parent(&self, fp: Fingerprint) -> Option<Fingerprint> {
        self.parent.get(&fp).copied()
    }

    /// Edge count from the root.
    #[must_use]
    pub fn depth(&self, fp: Fingerprint) -> Option<usize> {
        self.depth.get(&fp).copied()
    }

    /// States in discovery order, root first.
    #[must_use]
    pub fn nodes(&self) -> &[Fingerprint] {
        &self.order
    }

    /// States of the graph the tree does not reach.
    #[must_use]
    pub const fn unreachable_count(&self) -> usize {
        self.unreachable
    }

    /// Tree edges `(parent, child)` in discovery order.
    pub fn edges(&self) -> impl Iterator<Item = (Fingerprint, Fingerprint)> + '_ {
        self.order
            .iter()
            .filter_map(|child| self.parent.get(child).map(|p| (*p, *child)))
    }

    /// Whether `from -> to` is a tree edge.
    #[must_use]
    pub fn is_tree_edge(&self, from: Fingerprint, to: Fingerprint) -> bool {
        self.parent.get(&to) == Some(&from)
    }

    /// Unique root-to-`fp` path, both ends included.
    #[must_use]
    pub fn path_to(&self, fp: Fingerprint) -> Option<Vec<Fingerprint>> {
        let len = self.depth(fp)? + 1;
        let mut path = Vec::with_capacity(len);
        let mut current = fp;
        path.push(current);
        while let Some(&p) = self.parent.get(&current) {
            path.push(p);
            current = p;
        }
        path.reverse();
        Some(path)
    }
}

/// Free-function form of [`Arborescence::compute`].
pub fn compute_arborescence(graph: &StateGraph, policy: RootPolicy) -> TracegenResult<Arborescence> {
    Arborescence::compute(graph, policy)
}

/// Graphviz DOT rendering, with tree edges drawn bold when a tree is given.
#[must_use]
pub fn to_dot(graph: &StateGraph, tree: Option<&Arborescence>) -> String {
    let mut dot = String::from("digraph StateGraph {\n");
    dot.push_str("  rankdir=LR;\n");
    dot.push_str("  node [shape=circle];\n\n");

    for fp in graph.fingerprints() {
        let shape = if tree.is_some_and(|t| t.root() == fp) {
            "doublecircle"
        } else {
            "circle"
        };
        let _ = writeln!(dot, "  \"{fp}\" [shape={shape}];");
    }
    dot.push('\n');

    for (from, to, label) in graph.edges() {
        let style = if tree.is_some_and(|t| t.is_tree_edge(from, to)) {
            ", style=bold"
        } else {
            ""
        };
        let _ = writeln!(
            dot,
            "  \"{from}\" -> \"{to}\" [label=\"{}\"{style}];",
            label.describe().replace('"', "\\\"")
        );
    }

    dot.push_str("}\n");
    dot
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::graph::tests::{edge, node};
    use crate::graph::LoadOptions;
    use serde_json::json;

    fn diamond() -> StateGraph {
        // 1 -> 2 -> 4, 1 -> 3 -> 4, 4 -> 1, plus orphan 5
        StateGraph::load(
            vec![node(1), node(2), node(3), node(4), node(5)],
            vec![
                edge(1, 2, "TransactionWrite", json!({"tid": "t1", "k": "k1", "v": "t1"})),
                edge(1, 3, "TransactionWrite", json!({"tid": "t2", "k": "k1", "v": "t2"})),
                edge(3, 4, "AbortTransaction", json!({"tid": "t2"})),
                edge(2, 4, "AbortTransaction", json!({"tid": "t1"})),
                edge(4, 1, "RollbackToStable", json!({})),
                edge(5, 5, "RollbackToStable", json!({})),
            ],
            &LoadOptions::new(),
        )
        .unwrap()
    }

    #[test]
    fn test_unique_source_ambiguous_with_orphan() {
        let err = Arborescence::compute(&diamond(), RootPolicy::UniqueSource).unwrap_err();
        assert!(matches!(err, TracegenError::NoRoot { .. }));
    }

    #[test]
    fn test_no_source_in_cycle() {
        let g = StateGraph::load(
            vec![node(1), node(2)],
            vec![
                edge(1, 2, "RollbackToStable", json!({})),
                edge(2, 1, "RollbackToStable", json!({})),
            ],
            &LoadOptions::new(),
        )
        .unwrap();
        let err = select_root(&g, RootPolicy::UniqueSource).unwrap_err();
        assert!(err.to_string().contains("every state has an inbound edge"));
        assert_eq!(select_root(&g, RootPolicy::FirstListed).unwrap(), Fingerprint(1));
    }

    #[test]
    fn test_explicit_root_must_exist() {
        let g = diamond();
        assert!(select_root(&g, RootPolicy::Explicit(Fingerprint(42))).is_err());
        assert_eq!(
            select_root(&g, RootPolicy::Explicit(Fingerprint(3))).unwrap(),
            Fingerprint(3)
        );
    }

    #[test]
    fn test_empty_graph_has_no_root() {
        let g = StateGraph::load(vec![], vec![], &LoadOptions::new()).unwrap();
        assert!(select_root(&g, RootPolicy::FirstListed).is_err());
    }

    #[test]
    fn test_tree_structure() {
        let g = diamond();
        let tree = Arborescence::compute(&g, RootPolicy::FirstListed).unwrap();
        assert_eq!(tree.root(), Fingerprint(1));
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.unreachable_count(), 1);
        assert!(!tree.contains(Fingerprint(5)));
        assert_eq!(tree.parent(Fingerprint(1)), None);
        // first discovered parent wins: 2 is expanded before 3
        assert_eq!(tree.parent(Fingerprint(4)), Some(Fingerprint(2)));
        assert_eq!(tree.depth(Fingerprint(4)), Some(2));
        assert_eq!(tree.edges().count(), 3);
    }

    #[test]
    fn test_path_to() {
        let tree = Arborescence::compute(&diamond(), RootPolicy::FirstListed).unwrap();
        assert_eq!(
            tree.path_to(Fingerprint(4)).unwrap(),
            vec![Fingerprint(1), Fingerprint(2), Fingerprint(4)]
        );
        assert_eq!(tree.path_to(Fingerprint(1)).unwrap(), vec![Fingerprint(1)]);
        assert!(tree.path_to(Fingerprint(5)).is_none());
    }

    #[test]
    fn test_tree_edges_exist_in_graph() {
        let g = diamond();
        let tree = Arborescence::compute(&g, RootPolicy::FirstListed).unwrap();
        for (from, to) in tree.edges() {
            assert!(g.label(from, to).is_some());
        }
    }

    #[test]
    fn test_to_dot_marks_tree() {
        let g = diamond();
        let tree = Arborescence::compute(&g, RootPolicy::FirstListed).unwrap();
        let dot = to_dot(&g, Some(&tree));
        assert!(dot.starts_with("digraph StateGraph {"));
        assert!(dot.contains("\"1\" [shape=doublecircle]"));
        assert!(dot.contains("\"1\" -> \"2\" [label=\"TransactionWrite(tid=t1, k=k1, v=t1)\", style=bold]"));
        assert!(dot.contains("\"3\" -> \"4\" [label=\"AbortTransaction(tid=t2)\"]"));

        let plain = to_dot(&g, None);
        assert!(!plain.contains("bold"));
    }
}
