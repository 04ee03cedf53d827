//! Typed model actions decoded from edge labels.

use crate::error::{TracegenError, TracegenResult};
use crate::graph::{value_text, ActionLabel, Fingerprint};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Marker the model uses for "key has no value".
pub const NO_VALUE: &str = "NoValue";

/// Action names the translator understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    StartTransaction,
    TransactionWrite,
    TransactionRead,
    TransactionRemove,
    PrepareTransaction,
    CommitTransaction,
    CommitPreparedTransaction,
    AbortTransaction,
    SetStableTimestamp,
    SetOldestTimestamp,
    RollbackToStable,
}

impl ActionKind {
    /// Every kind, in table order.
    pub const ALL: [Self; 11] = [
        Self::StartTransaction,
        Self::TransactionWrite,
        Self::TransactionRead,
        Self::TransactionRemove,
        Self::PrepareTransaction,
        Self::CommitTransaction,
        Self::CommitPreparedTransaction,
        Self::AbortTransaction,
        Self::SetStableTimestamp,
        Self::SetOldestTimestamp,
        Self::RollbackToStable,
    ];

    /// Name as written in the graph.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::StartTransaction => "StartTransaction",
            Self::TransactionWrite => "TransactionWrite",
            Self::TransactionRead => "TransactionRead",
            Self::TransactionRemove => "TransactionRemove",
            Self::PrepareTransaction => "PrepareTransaction",
            Self::CommitTransaction => "CommitTransaction",
            Self::CommitPreparedTransaction => "CommitPreparedTransaction",
            Self::AbortTransaction => "AbortTransaction",
            Self::SetStableTimestamp => "SetStableTimestamp",
            Self::SetOldestTimestamp => "SetOldestTimestamp",
            Self::RollbackToStable => "RollbackToStable",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ActionKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|k| k.name() == s).ok_or(())
    }
}

/// What a read observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadValue {
    /// Key had no visible value
    NoValue,
    /// Key held this value
    Value(String),
}

/// A model action with its parameters decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    StartTransaction {
        tid: String,
        read_ts: i64,
        ignore_prepare: String,
    },
    Write {
        tid: String,
        key: String,
        value: String,
    },
    Read {
        tid: String,
        key: String,
        value: ReadValue,
    },
    Remove {
        tid: String,
        key: String,
    },
    Prepare {
        tid: String,
        prepare_ts: i64,
    },
    Commit {
        tid: String,
        commit_ts: i64,
    },
    CommitPrepared {
        tid: String,
        commit_ts: i64,
        durable_ts: i64,
    },
    Abort {
        tid: String,
    },
    SetStableTimestamp {
        ts: i64,
    },
    SetOldestTimestamp {
        ts: i64,
    },
    RollbackToStable,
}

impl Action {
    /// Decode the label of edge `from -> to`.
    pub fn decode(label: &ActionLabel, from: Fingerprint, to: Fingerprint) -> TracegenResult<Self> {
        let kind: ActionKind = label.name.parse().map_err(|()| TracegenError::UnknownAction {
            name: label.name.clone(),
            from,
            to,
        })?;
        let p = Params { label };

        Ok(match kind {
            ActionKind::StartTransaction => Self::StartTransaction {
                tid: p.text("tid")?,
                read_ts: p.int("readTs")?,
                ignore_prepare: p.text_or("ignorePrepare", "false")?,
            },
            ActionKind::TransactionWrite => Self::Write {
                tid: p.text("tid")?,
                key: p.text("k")?,
                value: p.text("v")?,
            },
            ActionKind::TransactionRead => {
                let value = p.text("v")?;
                Self::Read {
                    tid: p.text("tid")?,
                    key: p.text("k")?,
                    value: if value == NO_VALUE {
                        ReadValue::NoValue
                    } else {
                        ReadValue::Value(value)
                    },
                }
            }
            ActionKind::TransactionRemove => Self::Remove {
                tid: p.text("tid")?,
                key: p.text("k")?,
            },
            ActionKind::PrepareTransaction => Self::Prepare {
                tid: p.text("tid")?,
                prepare_ts: p.int("prepareTs")?,
            },
            ActionKind::CommitTransaction => Self::Commit {
                tid: p.text("tid")?,
                commit_ts: p.int("commitTs")?,
            },
            ActionKind::CommitPreparedTransaction => Self::CommitPrepared {
                tid: p.text("tid")?,
                commit_ts: p.int("commitTs")?,
                durable_ts: p.int("durableTs")?,
            },
            ActionKind::AbortTransaction => Self::Abort {
                tid: p.text("tid")?,
            },
            ActionKind::SetStableTimestamp => Self::SetStableTimestamp { ts: p.int("ts")? },
            ActionKind::SetOldestTimestamp => Self::SetOldestTimestamp { ts: p.int("ts")? },
            ActionKind::RollbackToStable => Self::RollbackToStable,
        })
    }

    /// Acting transaction, if any.
    #[must_use]
    pub fn tid(&self) -> Option<&str> {
        match self {
            Self::StartTransaction { tid, .. }
            | Self::Write { tid, .. }
            | Self::Read { tid, .. }
            | Self::Remove { tid, .. }
            | Self::Prepare { tid, .. }
            | Self::Commit { tid, .. }
            | Self::CommitPrepared { tid, .. }
            | Self::Abort { tid } => Some(tid),
            Self::SetStableTimestamp { .. }
            | Self::SetOldestTimestamp { .. }
            | Self::RollbackToStable => None,
        }
    }
}

struct Params<'a> {
    label: &'a ActionLabel,
}

impl Params<'_> {
    fn raw(&self, name: &str) -> TracegenResult<&Value> {
        self.label
            .param(name)
            .ok_or_else(|| TracegenError::MissingParameter {
                action: self.label.name.clone(),
                param: name.to_string(),
            })
    }

    fn invalid(&self, name: &str, reason: &str) -> TracegenError {
        TracegenError::InvalidParameter {
            action: self.label.name.clone(),
            param: name.to_string(),
            reason: reason.to_string(),
        }
    }

    fn text(&self, name: &str) -> TracegenResult<String> {
        value_text(self.raw(name)?).ok_or_else(|| self.invalid(name, "expected a scalar"))
    }

    fn text_or(&self, name: &str, default: &str) -> TracegenResult<String> {
        match self.label.param(name) {
            Some(_) => self.text(name),
            None => Ok(default.to_string()),
        }
    }

    fn int(&self, name: &str) -> TracegenResult<i64> {
        match self.raw(name)? {
            Value::Number(n) => n.as_i64().ok_or_else(|| self.invalid(name, "expected an integer")),
            Value::String(s) => crate::graph::unquote(s)
                .parse()
                .map_err(|_| self.invalid(name, "expected an integer")),
            _ => Err(self.invalid(name, "expected an integer")),
        }
    }
}
