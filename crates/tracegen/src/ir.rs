//! Statement IR for generated tests.
//!
//! The translator produces these values; an emit dialect renders them. Nothing
//! here knows about text layout, so one translation can be printed inline or
//! through preamble helpers.

use crate::error::{TracegenError, TracegenResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A validated Python identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PyIdentifier(String);

impl PyIdentifier {
    /// Python keywords and the builtin constants that cannot be rebound.
    pub const RESERVED_WORDS: &'static [&'static str] = &[
        "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
        "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
        "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise",
        "return", "try", "while", "with", "yield",
    ];

    /// Create an identifier, validating it.
    pub fn new(name: impl Into<String>) -> TracegenResult<Self> {
        let name = name.into();

        if name.is_empty() {
            return Err(TracegenError::InvalidIdentifier {
                name,
                reason: "identifier cannot be empty".to_string(),
            });
        }
        if name.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(TracegenError::InvalidIdentifier {
                name,
                reason: "identifier cannot start with a digit".to_string(),
            });
        }
        if let Some(c) = name.chars().find(|c| !c.is_ascii_alphanumeric() && *c != '_') {
            return Err(TracegenError::InvalidIdentifier {
                name,
                reason: format!("invalid character '{c}'"),
            });
        }
        if Self::RESERVED_WORDS.contains(&name.as_str()) {
            return Err(TracegenError::InvalidIdentifier {
                name,
                reason: "reserved word".to_string(),
            });
        }

        Ok(Self(name))
    }

    /// Get the identifier string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PyIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A model transaction and the session variable that runs it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Txn {
    /// Transaction id as named in the model (`t1`)
    pub id: String,
    /// Session variable (`sess_t1`)
    pub session: PyIdentifier,
}

impl Txn {
    /// Bind a transaction id to its session variable.
    pub fn new(id: impl Into<String>) -> TracegenResult<Self> {
        let id = id.into();
        let session = PyIdentifier::new(format!("sess_{id}"))?;
        Ok(Self { id, session })
    }
}

/// Error codes the generated assertions compare against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    /// Write conflict; the transaction must roll back
    Rollback,
    /// Key not found
    NotFound,
    /// Read hit a prepared update
    PrepareConflict,
}

impl ErrorCode {
    /// Constant name in the `wiredtiger` module.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Rollback => "WT_ROLLBACK",
            Self::NotFound => "WT_NOTFOUND",
            Self::PrepareConflict => "WT_PREPARE_CONFLICT",
        }
    }
}

/// Outcome the model assigns to a transaction after an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxnStatus {
    /// No error
    Success,
    /// Write conflict
    ConflictAbort,
    /// Key not found
    NotFound,
    /// Prepare conflict
    PrepareConflict,
}

impl TxnStatus {
    /// Map a raw status token from a snapshot.
    ///
    /// `OK`, `"0"`, `""`, `Nil`, `0` and `null` all mean success.
    #[must_use]
    pub fn parse(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(Self::Success),
            Value::Number(n) if n.as_i64() == Some(0) => Some(Self::Success),
            Value::String(s) => match crate::graph::unquote(s) {
                "OK" | "0" | "" | "Nil" => Some(Self::Success),
                "WT_ROLLBACK" => Some(Self::ConflictAbort),
                "WT_NOTFOUND" => Some(Self::NotFound),
                "WT_PREPARE_CONFLICT" => Some(Self::PrepareConflict),
                _ => None,
            },
            _ => None,
        }
    }

    /// Canonical token (`OK` or the error constant name).
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self.error_code() {
            Some(code) => code.name(),
            None => "OK",
        }
    }

    /// Error the call is expected to raise or return.
    #[must_use]
    pub const fn error_code(self) -> Option<ErrorCode> {
        match self {
            Self::Success => None,
            Self::ConflictAbort => Some(ErrorCode::Rollback),
            Self::NotFound => Some(ErrorCode::NotFound),
            Self::PrepareConflict => Some(ErrorCode::PrepareConflict),
        }
    }
}

impl fmt::Display for TxnStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Engine API call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApiCall {
    /// `begin_transaction` plus opening the transaction's cursor
    BeginTransaction {
        /// Transaction
        txn: Txn,
        /// Read timestamp
        read_ts: i64,
        /// `ignore_prepare` setting, unquoted
        ignore_prepare: String,
    },
    /// Cursor insert
    Insert {
        /// Transaction
        txn: Txn,
        /// Key
        key: String,
        /// Value
        value: String,
    },
    /// Cursor search
    Search {
        /// Transaction
        txn: Txn,
        /// Key
        key: String,
        /// Value the model read; `None` when the key had no value
        expected: Option<String>,
    },
    /// Cursor remove
    Remove {
        /// Transaction
        txn: Txn,
        /// Key
        key: String,
    },
    /// `prepare_transaction`
    PrepareTransaction {
        /// Transaction
        txn: Txn,
        /// Prepare timestamp
        prepare_ts: i64,
    },
    /// `commit_transaction`
    CommitTransaction {
        /// Transaction
        txn: Txn,
        /// Commit timestamp
        commit_ts: i64,
    },
    /// `commit_transaction` of a prepared transaction
    CommitPreparedTransaction {
        /// Transaction
        txn: Txn,
        /// Commit timestamp
        commit_ts: i64,
        /// Durable timestamp
        durable_ts: i64,
    },
    /// `rollback_transaction`
    RollbackTransaction {
        /// Transaction
        txn: Txn,
    },
    /// Connection-level `stable_timestamp`
    SetStableTimestamp {
        /// Timestamp
        ts: i64,
    },
    /// Connection-level `oldest_timestamp`
    SetOldestTimestamp {
        /// Timestamp
        ts: i64,
    },
    /// `rollback_to_stable`
    RollbackToStable,
}

impl ApiCall {
    /// Transaction the call runs in, if any.
    #[must_use]
    pub const fn txn(&self) -> Option<&Txn> {
        match self {
            Self::BeginTransaction { txn, .. }
            | Self::Insert { txn, .. }
            | Self::Search { txn, .. }
            | Self::Remove { txn, .. }
            | Self::PrepareTransaction { txn, .. }
            | Self::CommitTransaction { txn, .. }
            | Self::CommitPreparedTransaction { txn, .. }
            | Self::RollbackTransaction { txn } => Some(txn),
            Self::SetStableTimestamp { .. }
            | Self::SetOldestTimestamp { .. }
            | Self::RollbackToStable => None,
        }
    }
}

/// Check on the outcome of an [`ApiCall`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Assertion {
    /// Call raised nothing
    NoError,
    /// Call raised the given error
    Error(ErrorCode),
    /// Cursor call returned not-found
    ReturnsNotFound,
    /// Cursor call returned zero
    ReturnsZero,
    /// Cursor value after search
    ValueEquals(String),
}

/// A call with the status the model expects and the checks that follow it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    /// The call
    pub call: ApiCall,
    /// Expected status
    pub status: TxnStatus,
    /// Checks, in order
    pub assertions: Vec<Assertion>,
}

/// Global timestamps read from a post-state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimestampCheck {
    /// All-durable timestamp
    pub all_durable: i64,
    /// Stable timestamp; `None` when unset
    pub stable: Option<i64>,
    /// Oldest timestamp; `None` when unset
    pub oldest: Option<i64>,
}

impl TimestampCheck {
    /// Whether any timestamp has been set; unset state has nothing to check.
    #[must_use]
    pub const fn is_set(&self) -> bool {
        self.stable.is_some() || self.oldest.is_some() || self.all_durable != 0
    }
}

/// One generated statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Statement {
    /// Engine call with its checks
    Invoke(Invocation),
    /// Global timestamp check
    CheckTimestamps(TimestampCheck),
    /// Comment line
    Comment(String),
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identifier_valid() {
        assert_eq!(PyIdentifier::new("sess_t1").unwrap().as_str(), "sess_t1");
        assert_eq!(PyIdentifier::new("_x9").unwrap().to_string(), "_x9");
    }

    #[test]
    fn test_identifier_invalid() {
        assert!(PyIdentifier::new("").is_err());
        assert!(PyIdentifier::new("1abc").is_err());
        assert!(PyIdentifier::new("sess-t1").is_err());
        assert!(PyIdentifier::new("lambda").is_err());
        assert!(PyIdentifier::new("None").is_err());
    }

    #[test]
    fn test_txn_session_name() {
        let txn = Txn::new("t2").unwrap();
        assert_eq!(txn.session.as_str(), "sess_t2");
        let err = Txn::new("t 2").unwrap_err();
        assert!(matches!(err, TracegenError::InvalidIdentifier { .. }));
    }

    #[test]
    fn test_status_success_tokens() {
        for token in [json!("OK"), json!("0"), json!(""), json!("Nil"), json!(0), json!(null)] {
            assert_eq!(TxnStatus::parse(&token), Some(TxnStatus::Success), "{token}");
        }
    }

    #[test]
    fn test_status_error_tokens() {
        assert_eq!(TxnStatus::parse(&json!("WT_ROLLBACK")), Some(TxnStatus::ConflictAbort));
        assert_eq!(TxnStatus::parse(&json!("\"WT_NOTFOUND\"")), Some(TxnStatus::NotFound));
        assert_eq!(
            TxnStatus::parse(&json!("WT_PREPARE_CONFLICT")),
            Some(TxnStatus::PrepareConflict)
        );
        assert_eq!(TxnStatus::parse(&json!("EBUSY")), None);
        assert_eq!(TxnStatus::parse(&json!(5)), None);
    }

    #[test]
    fn test_status_token_round_trip() {
        for status in [
            TxnStatus::Success,
            TxnStatus::ConflictAbort,
            TxnStatus::NotFound,
            TxnStatus::PrepareConflict,
        ] {
            assert_eq!(TxnStatus::parse(&json!(status.token())), Some(status));
        }
    }

    #[test]
    fn test_timestamp_check_is_set() {
        let unset = TimestampCheck { all_durable: 0, stable: None, oldest: None };
        assert!(!unset.is_set());
        assert!(TimestampCheck { all_durable: 0, stable: Some(0), oldest: None }.is_set());
        assert!(TimestampCheck { all_durable: 3, stable: None, oldest: None }.is_set());
    }

    #[test]
    fn test_api_call_txn() {
        let txn = Txn::new("t1").unwrap();
        assert_eq!(ApiCall::RollbackTransaction { txn: txn.clone() }.txn(), Some(&txn));
        assert_eq!(ApiCall::RollbackToStable.txn(), None);
    }
}
