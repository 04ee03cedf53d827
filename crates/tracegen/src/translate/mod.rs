//! Model action to engine statement translation.
//!
//! Each action name has one entry in a fixed table ([`ActionKind`]). The entry
//! decides which [`ApiCall`] to make; the post-state decides which
//! [`Assertion`]s follow it. Any global timestamp set in the post-state adds a
//! trailing [`Statement::CheckTimestamps`].

mod action;

pub use action::{Action, ActionKind, ReadValue, NO_VALUE};

use crate::error::{TracegenError, TracegenResult};
use crate::graph::{ActionLabel, Fingerprint, SnapshotSchema, StateSnapshot};
use crate::ir::{ApiCall, Assertion, ErrorCode, Invocation, Statement, TimestampCheck, Txn, TxnStatus};
use crate::trace::TraceStep;
use serde_json::Value;

/// Translates labelled steps into statements.
#[derive(Debug, Clone, Default)]
pub struct ActionTranslator {
    schema: SnapshotSchema,
}

impl ActionTranslator {
    /// Translator reading snapshots through `schema`.
    #[must_use]
    pub const fn new(schema: SnapshotSchema) -> Self {
        Self { schema }
    }

    /// Schema in use.
    #[must_use]
    pub const fn schema(&self) -> &SnapshotSchema {
        &self.schema
    }

    /// Translate one trace step.
    pub fn translate_step(&self, step: &TraceStep<'_>) -> TracegenResult<Vec<Statement>> {
        self.translate_action(step.pre, step.label, step.post, (step.from, step.to))
    }

    /// Translate the action of edge `from -> to`.
    ///
    /// The pre-state is accepted for symmetry with the trace model; no table
    /// entry reads it.
    pub fn translate_action(
        &self,
        _pre: &StateSnapshot,
        label: &ActionLabel,
        post: &StateSnapshot,
        (from, to): (Fingerprint, Fingerprint),
    ) -> TracegenResult<Vec<Statement>> {
        let action = Action::decode(label, from, to)?;
        let status = match action.tid() {
            Some(tid) => self.status_of(post, tid, to)?,
            None => TxnStatus::Success,
        };

        let mut statements = vec![Statement::Invoke(invocation(action, status)?)];
        let timestamps = self.timestamps(post, to)?;
        if timestamps.is_set() {
            statements.push(Statement::CheckTimestamps(timestamps));
        }
        Ok(statements)
    }

    /// Status of transaction `tid` recorded in `post`.
    pub fn status_of(
        &self,
        post: &StateSnapshot,
        tid: &str,
        state: Fingerprint,
    ) -> TracegenResult<TxnStatus> {
        let table = post
            .node_value(&self.schema.txn_status, &self.schema.node_key)
            .ok_or_else(|| {
                TracegenError::malformed(format!(
                    "state {state} has no '{}' field",
                    self.schema.txn_status
                ))
            })?;
        let raw = table.get(tid).ok_or_else(|| {
            TracegenError::malformed(format!(
                "state {state} has no '{}' entry for transaction '{tid}'",
                self.schema.txn_status
            ))
        })?;
        TxnStatus::parse(raw).ok_or_else(|| TracegenError::UnknownStatus {
            status: crate::graph::value_text(raw).unwrap_or_else(|| raw.to_string()),
            tid: tid.to_string(),
            state,
        })
    }

    /// Global timestamps recorded in `post`; negative means unset.
    pub fn timestamps(&self, post: &StateSnapshot, state: Fingerprint) -> TracegenResult<TimestampCheck> {
        let all_durable = self.timestamp(post, &self.schema.all_durable_ts, state)?;
        let stable = self.timestamp(post, &self.schema.stable_ts, state)?;
        let oldest = self.timestamp(post, &self.schema.oldest_ts, state)?;
        Ok(TimestampCheck {
            all_durable,
            stable: (stable >= 0).then_some(stable),
            oldest: (oldest >= 0).then_some(oldest),
        })
    }

    fn timestamp(&self, post: &StateSnapshot, field: &str, state: Fingerprint) -> TracegenResult<i64> {
        post.node_value(field, &self.schema.node_key)
            .and_then(Value::as_i64)
            .ok_or_else(|| {
                TracegenError::malformed(format!("state {state} has no integer '{field}'"))
            })
    }
}

/// Table entry for one action under the expected status.
fn invocation(action: Action, status: TxnStatus) -> TracegenResult<Invocation> {
    let mut assertions = match status.error_code() {
        Some(ErrorCode::NotFound) => vec![Assertion::ReturnsNotFound],
        Some(code) => vec![Assertion::Error(code)],
        None => vec![Assertion::NoError],
    };
    let success = status == TxnStatus::Success;

    let call = match action {
        Action::StartTransaction {
            tid,
            read_ts,
            ignore_prepare,
        } => ApiCall::BeginTransaction {
            txn: Txn::new(tid)?,
            read_ts,
            ignore_prepare,
        },
        Action::Write { tid, key, value } => ApiCall::Insert {
            txn: Txn::new(tid)?,
            key,
            value,
        },
        Action::Read { tid, key, value } => {
            let expected = match value {
                ReadValue::NoValue => None,
                ReadValue::Value(v) => Some(v),
            };
            if success {
                assertions.push(match &expected {
                    None => Assertion::ReturnsNotFound,
                    Some(v) => Assertion::ValueEquals(v.clone()),
                });
            }
            ApiCall::Search {
                txn: Txn::new(tid)?,
                key,
                expected,
            }
        }
        Action::Remove { tid, key } => {
            if success {
                assertions.push(Assertion::ReturnsZero);
            }
            ApiCall::Remove {
                txn: Txn::new(tid)?,
                key,
            }
        }
        Action::Prepare { tid, prepare_ts } => ApiCall::PrepareTransaction {
            txn: Txn::new(tid)?,
            prepare_ts,
        },
        Action::Commit { tid, commit_ts } => ApiCall::CommitTransaction {
            txn: Txn::new(tid)?,
            commit_ts,
        },
        Action::CommitPrepared {
            tid,
            commit_ts,
            durable_ts,
        } => ApiCall::CommitPreparedTransaction {
            txn: Txn::new(tid)?,
            commit_ts,
            durable_ts,
        },
        Action::Abort { tid } => ApiCall::RollbackTransaction {
            txn: Txn::new(tid)?,
        },
        Action::SetStableTimestamp { ts } => ApiCall::SetStableTimestamp { ts },
        Action::SetOldestTimestamp { ts } => ApiCall::SetOldestTimestamp { ts },
        Action::RollbackToStable => ApiCall::RollbackToStable,
    };

    Ok(Invocation {
        call,
        status,
        assertions,
    })
}
