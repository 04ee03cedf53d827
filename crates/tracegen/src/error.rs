//! Error types for tracegen.
//!
//! Every fatal variant names the node, edge, or action that caused it so a
//! failed run can be traced back to the state graph without re-running it.
//! Partial target coverage is not an error during generation; it only becomes
//! [`TracegenError::UnreachableTargets`] when a caller asks for strict coverage.

use crate::graph::Fingerprint;
use thiserror::Error;

/// Result type alias for tracegen operations.
pub type TracegenResult<T> = Result<T, TracegenError>;

/// Errors that can occur while loading a graph or generating tests.
#[derive(Debug, Error)]
pub enum TracegenError {
    /// Input graph violates the loader contract
    #[error("Malformed graph: {message}")]
    MalformedGraph {
        /// What was wrong with the input
        message: String,
    },

    /// Initial state is absent or ambiguous
    #[error("No root state: {message}")]
    NoRoot {
        /// Why no root could be chosen
        message: String,
    },

    /// Coverage below the required fraction (strict mode only)
    #[error(
        "Covered {covered}/{total} target states ({achieved:.1}%), required {required:.1}%"
    )]
    UnreachableTargets {
        /// Targets covered
        covered: usize,
        /// Total targets
        total: usize,
        /// Achieved percentage
        achieved: f64,
        /// Required percentage
        required: f64,
    },

    /// A covering path steps over a pair with no edge in the source graph
    #[error("No edge {from} -> {to} in source graph")]
    MissingEdge {
        /// Source fingerprint
        from: Fingerprint,
        /// Target fingerprint
        to: Fingerprint,
    },

    /// Action name has no entry in the translation table
    #[error("Unknown action '{name}' on edge {from} -> {to}")]
    UnknownAction {
        /// Action name as found in the graph
        name: String,
        /// Source fingerprint
        from: Fingerprint,
        /// Target fingerprint
        to: Fingerprint,
    },

    /// Action is missing a parameter its table entry reads
    #[error("Action '{action}' is missing parameter '{param}'")]
    MissingParameter {
        /// Action name
        action: String,
        /// Parameter name
        param: String,
    },

    /// Action parameter has the wrong shape
    #[error("Action '{action}' has invalid parameter '{param}': {reason}")]
    InvalidParameter {
        /// Action name
        action: String,
        /// Parameter name
        param: String,
        /// What was wrong
        reason: String,
    },

    /// Transaction status token not in the status table
    #[error("Unknown transaction status '{status}' for transaction '{tid}' in state {state}")]
    UnknownStatus {
        /// Raw status token
        status: String,
        /// Transaction id
        tid: String,
        /// Post-state fingerprint
        state: Fingerprint,
    },

    /// Parallel edge rejected by the duplicate-edge policy
    #[error("Duplicate edge {from} -> {to} ('{first}' and '{second}')")]
    DuplicateEdge {
        /// Source fingerprint
        from: Fingerprint,
        /// Target fingerprint
        to: Fingerprint,
        /// Action already recorded
        first: String,
        /// Action that collided with it
        second: String,
    },

    /// Name cannot be used as a generated identifier
    #[error("Invalid identifier '{name}': {reason}")]
    InvalidIdentifier {
        /// The invalid identifier
        name: String,
        /// Why it's invalid
        reason: String,
    },

    /// Generated file no longer matches its manifest
    #[error("{file} was modified after generation (expected {expected}, found {actual})")]
    DigestMismatch {
        /// File name
        file: String,
        /// Digest recorded in the manifest
        expected: String,
        /// Digest of the file on disk
        actual: String,
    },

    /// Generator configuration rejected
    #[error("Invalid configuration: {message}")]
    Config {
        /// What was rejected
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl TracegenError {
    /// Create a malformed-graph error
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedGraph {
            message: message.into(),
        }
    }

    /// Create a no-root error
    #[must_use]
    pub fn no_root(message: impl Into<String>) -> Self {
        Self::NoRoot {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether the error is a reporting condition rather than a fatal one.
    #[must_use]
    pub const fn is_coverage_shortfall(&self) -> bool {
        matches!(self, Self::UnreachableTargets { .. })
    }
}
