//! State graph model.
//!
//! In-memory form of the graph a model checker dumps: states identified by
//! fingerprint, each with a snapshot of the model variables, and action-labelled
//! edges from predecessor to successor. The graph is read-only once loaded.
//!
//! Two JSON documents feed the loader:
//!
//! ```json
//! {"states": [{"fp": 17, "val": {"txnStatus": {"n": {"t1": "OK"}}, "stableTs": {"n": -1}}}]}
//! {"edges":  [{"from": 17, "to": 42, "act": "StartTransaction", "params": {"tid": "t1", "readTs": 1}}]}
//! ```

use crate::error::{TracegenError, TracegenResult};
use indexmap::IndexMap;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Unique identifier of one state in the model's state space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(pub i64);

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Fingerprint {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// Model variables of one state, in document order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateSnapshot {
    fields: IndexMap<String, Value>,
}

impl StateSnapshot {
    /// Create a snapshot from its fields.
    #[must_use]
    pub fn new(fields: IndexMap<String, Value>) -> Self {
        Self { fields }
    }

    /// Raw value of a field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Whether the field is present.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Fields in document order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Value of `field` as seen by model node `node_key`.
    ///
    /// Model checkers dump per-node variables as `{"n": ...}`; a field that is
    /// not keyed by the node is returned as-is.
    #[must_use]
    pub fn node_value(&self, field: &str, node_key: &str) -> Option<&Value> {
        match self.fields.get(field)? {
            Value::Object(map) if map.contains_key(node_key) => map.get(node_key),
            other => Some(other),
        }
    }
}

/// Names of the snapshot fields the translator reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotSchema {
    /// Key of the model node inside per-node variables
    pub node_key: String,
    /// Transaction status table (`tid -> status`)
    pub txn_status: String,
    /// All-durable timestamp
    pub all_durable_ts: String,
    /// Stable timestamp
    pub stable_ts: String,
    /// Oldest timestamp
    pub oldest_ts: String,
}

impl Default for SnapshotSchema {
    fn default() -> Self {
        Self {
            node_key: "n".to_string(),
            txn_status: "txnStatus".to_string(),
            all_durable_ts: "allDurableTs".to_string(),
            stable_ts: "stableTs".to_string(),
            oldest_ts: "oldestTs".to_string(),
        }
    }
}

impl SnapshotSchema {
    /// Fields every state must carry.
    #[must_use]
    pub fn required_fields(&self) -> [&str; 4] {
        [
            self.txn_status.as_str(),
            self.all_durable_ts.as_str(),
            self.stable_ts.as_str(),
            self.oldest_ts.as_str(),
        ]
    }

    /// First required field missing from `snapshot`.
    #[must_use]
    pub fn missing_field<'s>(&'s self, snapshot: &StateSnapshot) -> Option<&'s str> {
        self.required_fields()
            .into_iter()
            .find(|field| !snapshot.contains(field))
    }
}

/// Named operation and parameters carried by an edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionLabel {
    /// Action name as written by the model checker
    pub name: String,
    /// Parameters in document order
    #[serde(default)]
    pub params: IndexMap<String, Value>,
}

impl ActionLabel {
    /// Create a label.
    #[must_use]
    pub fn new(name: impl Into<String>, params: IndexMap<String, Value>) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }

    /// Raw parameter value.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    /// Acting transaction id, if the action belongs to a transaction.
    #[must_use]
    pub fn tid(&self) -> Option<String> {
        self.params.get("tid").and_then(value_text)
    }

    /// `Name(k=v, ...)` rendering used in generated commentary.
    #[must_use]
    pub fn describe(&self) -> String {
        let params = self
            .params
            .iter()
            .map(|(k, v)| format!("{k}={}", value_text(v).unwrap_or_else(|| v.to_string())))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{}({params})", self.name)
    }
}

/// Text of a scalar value with TLA string quoting removed.
#[must_use]
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(unquote(s).to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Strip one level of surrounding double quotes (`"\"false\""` -> `false`).
#[must_use]
pub fn unquote(s: &str) -> &str {
    s.strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(s)
}

/// One entry of the states document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawNode {
    /// State fingerprint
    pub fp: Fingerprint,
    /// State snapshot
    pub val: StateSnapshot,
}

/// One entry of the edges document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEdge {
    /// Predecessor fingerprint
    pub from: Fingerprint,
    /// Successor fingerprint
    pub to: Fingerprint,
    /// Action name
    pub act: String,
    /// Action parameters
    #[serde(default)]
    pub params: IndexMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct StatesDocument {
    states: Vec<RawNode>,
}

#[derive(Debug, Deserialize)]
struct EdgesDocument {
    edges: Vec<RawEdge>,
}

/// What to do when two edges share the same ordered node pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicateEdgePolicy {
    /// Keep the first label seen
    #[default]
    KeepFirst,
    /// Overwrite with the last label seen (edge keeps its first position)
    KeepLast,
    /// Fail with [`TracegenError::DuplicateEdge`]
    Reject,
}

/// Loader settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadOptions {
    /// Snapshot fields validated at load time
    pub schema: SnapshotSchema,
    /// Parallel edge handling
    pub duplicate_edges: DuplicateEdgePolicy,
}

impl LoadOptions {
    /// Default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the snapshot schema.
    #[must_use]
    pub fn with_schema(mut self, schema: SnapshotSchema) -> Self {
        self.schema = schema;
        self
    }

    /// Set the duplicate edge policy.
    #[must_use]
    pub const fn with_duplicate_edges(mut self, policy: DuplicateEdgePolicy) -> Self {
        self.duplicate_edges = policy;
        self
    }
}

/// Node weight: fingerprint plus snapshot.
#[derive(Debug, Clone)]
pub struct StateNode {
    /// State fingerprint
    pub fingerprint: Fingerprint,
    /// State snapshot
    pub snapshot: StateSnapshot,
}

/// Summary counts for a loaded graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    /// States
    pub nodes: usize,
    /// Distinct labelled edges
    pub edges: usize,
    /// Parallel edges collapsed by the duplicate policy
    pub dropped_duplicates: usize,
    /// States with no inbound edge other than self loops
    pub sources: usize,
    /// Self-loop edges
    pub self_loops: usize,
}

/// Directed state graph with one action label per ordered node pair.
#[derive(Debug, Clone)]
pub struct StateGraph {
    graph: DiGraph<StateNode, ActionLabel>,
    index: HashMap<Fingerprint, NodeIndex>,
    schema: SnapshotSchema,
    dropped_duplicates: usize,
}

impl StateGraph {
    /// Parse both JSON documents and load the graph.
    pub fn from_json(
        states_json: &str,
        edges_json: &str,
        options: &LoadOptions,
    ) -> TracegenResult<Self> {
        let states: StatesDocument = serde_json::from_str(states_json)?;
        let edges: EdgesDocument = serde_json::from_str(edges_json)?;
        Self::load(states.states, edges.edges, options)
    }

    /// Build the graph from typed records.
    ///
    /// Fails with [`TracegenError::MalformedGraph`] when a state lacks a
    /// required field, a fingerprint repeats, or an edge names an unknown state.
    pub fn load(
        nodes: Vec<RawNode>,
        edges: Vec<RawEdge>,
        options: &LoadOptions,
    ) -> TracegenResult<Self> {
        let mut graph = DiGraph::with_capacity(nodes.len(), edges.len());
        let mut index = HashMap::with_capacity(nodes.len());

        for node in nodes {
            if let Some(field) = options.schema.missing_field(&node.val) {
                return Err(TracegenError::malformed(format!(
                    "state {} is missing required field '{field}'",
                    node.fp
                )));
            }
            if index.contains_key(&node.fp) {
                return Err(TracegenError::malformed(format!(
                    "state {} appears more than once",
                    node.fp
                )));
            }
            let idx = graph.add_node(StateNode {
                fingerprint: node.fp,
                snapshot: node.val,
            });
            index.insert(node.fp, idx);
        }

        let lookup = |fp: Fingerprint, edge: &RawEdge| {
            index.get(&fp).copied().ok_or_else(|| {
                TracegenError::malformed(format!(
                    "edge {} -> {} ('{}') references unknown state {fp}",
                    edge.from, edge.to, edge.act
                ))
            })
        };

        let mut dropped_duplicates = 0;
        for edge in edges {
            let from = lookup(edge.from, &edge)?;
            let to = lookup(edge.to, &edge)?;
            let label = ActionLabel::new(edge.act, edge.params);

            if let Some(existing) = graph.find_edge(from, to) {
                match options.duplicate_edges {
                    DuplicateEdgePolicy::KeepFirst => {}
                    DuplicateEdgePolicy::KeepLast => graph[existing] = label,
                    DuplicateEdgePolicy::Reject => {
                        return Err(TracegenError::DuplicateEdge {
                            from: edge.from,
                            to: edge.to,
                            first: graph[existing].name.clone(),
                            second: label.name,
                        });
                    }
                }
                tracing::debug!(from = %edge.from, to = %edge.to, "collapsed parallel edge");
                dropped_duplicates += 1;
                continue;
            }
            graph.add_edge(from, to, label);
        }

        if dropped_duplicates > 0 {
            tracing::warn!(
                dropped = dropped_duplicates,
                policy = ?options.duplicate_edges,
                "state graph has parallel edges; one label kept per state pair"
            );
        }
        tracing::info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "loaded state graph"
        );

        Ok(Self {
            graph,
            index,
            schema: options.schema.clone(),
            dropped_duplicates,
        })
    }

    /// Number of states.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of distinct labelled edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Schema the graph was validated against.
    #[must_use]
    pub fn schema(&self) -> &SnapshotSchema {
        &self.schema
    }

    /// Whether a state exists.
    #[must_use]
    pub fn contains(&self, fp: Fingerprint) -> bool {
        self.index.contains_key(&fp)
    }

    /// Snapshot of a state.
    #[must_use]
    pub fn snapshot(&self, fp: Fingerprint) -> Option<&StateSnapshot> {
        self.index.get(&fp).map(|&idx| &self.graph[idx].snapshot)
    }

    /// Label of the edge `from -> to`.
    #[must_use]
    pub fn label(&self, from: Fingerprint, to: Fingerprint) -> Option<&ActionLabel> {
        let from = *self.index.get(&from)?;
        let to = *self.index.get(&to)?;
        self.graph.find_edge(from, to).map(|e| &self.graph[e])
    }

    /// Fingerprints in document order.
    pub fn fingerprints(&self) -> impl Iterator<Item = Fingerprint> + '_ {
        self.graph.node_weights().map(|n| n.fingerprint)
    }

    /// First state of the states document.
    #[must_use]
    pub fn first_listed(&self) -> Option<Fingerprint> {
        self.graph.node_weights().next().map(|n| n.fingerprint)
    }

    /// Successors of a state, in edge insertion order.
    #[must_use]
    pub fn successors(&self, fp: Fingerprint) -> Vec<Fingerprint> {
        let Some(&idx) = self.index.get(&fp) else {
            return Vec::new();
        };
        let mut out: Vec<_> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| (e.id(), e.target()))
            .collect();
        out.sort_by_key(|(id, _)| *id);
        out.into_iter()
            .map(|(_, target)| self.graph[target].fingerprint)
            .collect()
    }

    /// Edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (Fingerprint, Fingerprint, &ActionLabel)> + '_ {
        self.graph.edge_references().map(|e| {
            (
                self.graph[e.source()].fingerprint,
                self.graph[e.target()].fingerprint,
                e.weight(),
            )
        })
    }

    /// Inbound edges of a state, ignoring self loops.
    #[must_use]
    pub fn in_degree(&self, fp: Fingerprint) -> usize {
        self.index.get(&fp).map_or(0, |&idx| {
            self.graph
                .edges_directed(idx, Direction::Incoming)
                .filter(|e| e.source() != idx)
                .count()
        })
    }

    /// States without inbound edges (self loops ignored), in document order.
    #[must_use]
    pub fn sources(&self) -> Vec<Fingerprint> {
        self.fingerprints()
            .filter(|&fp| self.in_degree(fp) == 0)
            .collect()
    }

    /// Summary counts.
    #[must_use]
    pub fn stats(&self) -> GraphStats {
        GraphStats {
            nodes: self.node_count(),
            edges: self.edge_count(),
            dropped_duplicates: self.dropped_duplicates,
            sources: self.sources().len(),
            self_loops: self
                .graph
                .edge_references()
                .filter(|e| e.source() == e.target())
                .count(),
        }
    }
}
