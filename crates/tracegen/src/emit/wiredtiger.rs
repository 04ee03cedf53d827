use super::{CallStyle, CodeWriter, Dialect};
use crate::ir::{ApiCall, Assertion, Invocation, Statement, TimestampCheck, Txn};

const PREAMBLE: &str = include_str!("../../templates/wiredtiger_preamble.py");

/// Python `unittest` methods driving the WiredTiger Python API.
#[derive(Debug, Clone, Copy, Default)]
pub struct WiredTigerPython;

impl Dialect for WiredTigerPython {
    fn default_preamble(&self) -> &'static str {
        PREAMBLE
    }

    fn header(&self, out: &mut CodeWriter, coverage_pct: f64, trace_count: usize) {
        out.line("#");
        out.line(format!("# coverage_pct = {coverage_pct:?}"));
        out.line(format!("# {trace_count} traces"));
        out.line("#");
        out.blank();
    }

    fn test_signature(&self, name: &str) -> String {
        format!("def {name}(self):")
    }

    fn open_test(&self, out: &mut CodeWriter, sessions: &[Txn]) {
        out.line("self.test_setup()");
        for txn in sessions {
            out.line(format!("{} = self.conn.open_session()", txn.session));
        }
    }

    fn comment(&self, out: &mut CodeWriter, text: &str) {
        out.line(format!("# {text}"));
    }

    fn statement(&self, out: &mut CodeWriter, statement: &Statement, style: CallStyle) {
        match statement {
            Statement::Invoke(inv) => match style {
                CallStyle::Helper => {
                    if let Some(line) = helper_call(inv) {
                        out.line(line);
                    } else {
                        inline(out, inv);
                    }
                }
                CallStyle::Inline => inline(out, inv),
            },
            Statement::CheckTimestamps(check) => out.line(check_timestamps(check)),
            Statement::Comment(text) => self.comment(out, text),
        }
    }

    fn close_test(&self, out: &mut CodeWriter) {
        out.line("self.debug_info()");
        out.line("[self.cursors[c].close() for c in self.cursors]");
    }
}

/// Python string literal.
fn py_str(s: &str) -> String {
    let mut lit = String::with_capacity(s.len() + 2);
    lit.push('"');
    for c in s.chars() {
        match c {
            '"' => lit.push_str("\\\""),
            '\\' => lit.push_str("\\\\"),
            '\n' => lit.push_str("\\n"),
            '\r' => lit.push_str("\\r"),
            '\t' => lit.push_str("\\t"),
            _ => lit.push(c),
        }
    }
    lit.push('"');
    lit
}

fn py_opt(ts: Option<i64>) -> String {
    ts.map_or_else(|| "None".to_string(), |v| v.to_string())
}

fn ts(value: i64) -> String {
    format!("self.timestamp_str({value})")
}

fn cursor(txn: &Txn) -> String {
    format!("self.cursors[{}]", py_str(&txn.id))
}

fn check_timestamps(check: &TimestampCheck) -> String {
    format!(
        "self.check_timestamps(all_durable={}, stable_ts={}, oldest_ts={})",
        check.all_durable,
        py_opt(check.stable),
        py_opt(check.oldest)
    )
}

/// Engine calls for one invocation, one Python statement per line.
fn call_lines(call: &ApiCall) -> Vec<String> {
    match call {
        ApiCall::BeginTransaction {
            txn,
            read_ts,
            ignore_prepare,
        } => vec![
            format!(
                "{}.begin_transaction('ignore_prepare={ignore_prepare},read_timestamp=' + {})",
                txn.session,
                ts(*read_ts)
            ),
            format!("{} = {}.open_cursor(self.uri, None)", cursor(txn), txn.session),
        ],
        ApiCall::Insert { txn, key, value } => vec![
            format!("{}.set_key({})", cursor(txn), py_str(key)),
            format!("{}.set_value({})", cursor(txn), py_str(value)),
            format!("{}.insert()", cursor(txn)),
        ],
        ApiCall::Search { txn, key, .. } => vec![
            format!("{}.set_key({})", cursor(txn), py_str(key)),
            format!("sret = {}.search()", cursor(txn)),
        ],
        ApiCall::Remove { txn, key } => vec![
            format!("{}.set_key({})", cursor(txn), py_str(key)),
            format!("sret = {}.remove()", cursor(txn)),
        ],
        ApiCall::PrepareTransaction { txn, prepare_ts } => vec![format!(
            "{}.prepare_transaction('prepare_timestamp=' + {})",
            txn.session,
            ts(*prepare_ts)
        )],
        ApiCall::CommitTransaction { txn, commit_ts } => vec![format!(
            "{}.commit_transaction('commit_timestamp=' + {})",
            txn.session,
            ts(*commit_ts)
        )],
        ApiCall::CommitPreparedTransaction {
            txn,
            commit_ts,
            durable_ts,
        } => vec![format!(
            "{}.commit_transaction('commit_timestamp=' + {} + ',durable_timestamp=' + {})",
            txn.session,
            ts(*commit_ts),
            ts(*durable_ts)
        )],
        ApiCall::RollbackTransaction { txn } => {
            vec![format!("{}.rollback_transaction()", txn.session)]
        }
        ApiCall::SetStableTimestamp { ts: value } => vec![format!(
            "self.conn.set_timestamp('stable_timestamp=' + {})",
            ts(*value)
        )],
        ApiCall::SetOldestTimestamp { ts: value } => vec![format!(
            "self.conn.set_timestamp('oldest_timestamp=' + {})",
            ts(*value)
        )],
        ApiCall::RollbackToStable => vec!["self.conn.rollback_to_stable()".to_string()],
    }
}

fn assertion_lines(assertion: &Assertion, call: &ApiCall) -> Vec<String> {
    match assertion {
        Assertion::NoError => vec!["self.assertEqual(res, None)".to_string()],
        Assertion::Error(code) => vec![
            "self.assertNotEqual(res, None)".to_string(),
            format!(
                "self.assertIn(wiredtiger.wiredtiger_strerror(wiredtiger.{}), str(res))",
                code.name()
            ),
        ],
        Assertion::ReturnsNotFound => {
            vec!["self.assertEqual(sret, wiredtiger.WT_NOTFOUND)".to_string()]
        }
        Assertion::ReturnsZero => vec!["self.assertEqual(sret, 0)".to_string()],
        Assertion::ValueEquals(value) => match call.txn() {
            Some(txn) => vec![format!(
                "self.assertEqual({}.get_value(), {})",
                cursor(txn),
                py_str(value)
            )],
            None => Vec::new(),
        },
    }
}

fn inline(out: &mut CodeWriter, inv: &Invocation) {
    out.line("res, sret = None, None");
    out.line("try:");
    out.indented(|out| {
        for line in call_lines(&inv.call) {
            out.line(line);
        }
    });
    out.line("except wiredtiger.WiredTigerError as e:");
    out.indented(|out| out.line("res = e"));
    for assertion in &inv.assertions {
        for line in assertion_lines(assertion, &inv.call) {
            out.line(line);
        }
    }
}

/// Single helper call, for the operations the preamble provides a helper for.
fn helper_call(inv: &Invocation) -> Option<String> {
    let expected = py_str(inv.status.token());
    let line = match &inv.call {
        ApiCall::BeginTransaction {
            txn,
            read_ts,
            ignore_prepare,
        } => format!(
            "self.begin_transaction({}, {}, {read_ts}, {}, {expected})",
            py_str(&txn.id),
            txn.session,
            py_str(ignore_prepare)
        ),
        ApiCall::Insert { txn, key, value } => format!(
            "self.transaction_write({}, {}, {}, {expected})",
            py_str(&txn.id),
            py_str(key),
            py_str(value)
        ),
        ApiCall::Search { txn, key, expected: read } => format!(
            "self.transaction_read({}, {}, {}, {expected})",
            py_str(&txn.id),
            py_str(key),
            py_str(read.as_deref().unwrap_or(crate::translate::NO_VALUE))
        ),
        ApiCall::Remove { txn, key } => format!(
            "self.transaction_remove({}, {}, {expected})",
            py_str(&txn.id),
            py_str(key)
        ),
        ApiCall::PrepareTransaction { txn, prepare_ts } => format!(
            "self.prepare_transaction({}, {}, {prepare_ts}, {expected})",
            txn.session,
            py_str(&txn.id)
        ),
        ApiCall::CommitTransaction { txn, commit_ts } => format!(
            "self.commit_transaction({}, {}, {commit_ts}, {expected})",
            txn.session,
            py_str(&txn.id)
        ),
        ApiCall::CommitPreparedTransaction {
            txn,
            commit_ts,
            durable_ts,
        } => format!(
            "self.commit_prepared_transaction({}, {}, {commit_ts}, {durable_ts}, {expected})",
            txn.session,
            py_str(&txn.id)
        ),
        ApiCall::RollbackTransaction { txn } => format!(
            "self.abort_transaction({}, {}, {expected})",
            txn.session,
            py_str(&txn.id)
        ),
        ApiCall::SetStableTimestamp { .. }
        | ApiCall::SetOldestTimestamp { .. }
        | ApiCall::RollbackToStable => return None,
    };
    Some(line)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::ir::{ErrorCode, TxnStatus};
    use pretty_assertions::assert_eq;

    fn txn() -> Txn {
        Txn::new("t1").unwrap()
    }

    fn render(statement: &Statement, style: CallStyle) -> String {
        let mut out = CodeWriter::default();
        WiredTigerPython.statement(&mut out, statement, style);
        out.finish()
    }

    fn invoke(call: ApiCall, status: TxnStatus, assertions: Vec<Assertion>) -> Statement {
        Statement::Invoke(Invocation {
            call,
            status,
            assertions,
        })
    }

    #[test]
    fn test_inline_begin() {
        let stmt = invoke(
            ApiCall::BeginTransaction {
                txn: txn(),
                read_ts: 2,
                ignore_prepare: "false".into(),
            },
            TxnStatus::Success,
            vec![Assertion::NoError],
        );
        assert_eq!(
            render(&stmt, CallStyle::Inline),
            "res, sret = None, None\n\
             try:\n    \
             sess_t1.begin_transaction('ignore_prepare=false,read_timestamp=' + self.timestamp_str(2))\n    \
             self.cursors[\"t1\"] = sess_t1.open_cursor(self.uri, None)\n\
             except wiredtiger.WiredTigerError as e:\n    \
             res = e\n\
             self.assertEqual(res, None)\n"
        );
    }

    #[test]
    fn test_inline_read_value() {
        let stmt = invoke(
            ApiCall::Search {
                txn: txn(),
                key: "k1".into(),
                expected: Some("v\"1".into()),
            },
            TxnStatus::Success,
            vec![Assertion::NoError, Assertion::ValueEquals("v\"1".into())],
        );
        let text = render(&stmt, CallStyle::Inline);
        assert!(text.contains("    sret = self.cursors[\"t1\"].search()\n"));
        assert!(text.ends_with("self.assertEqual(self.cursors[\"t1\"].get_value(), \"v\\\"1\")\n"));
    }

    #[test]
    fn test_inline_conflict() {
        let stmt = invoke(
            ApiCall::Insert {
                txn: txn(),
                key: "k1".into(),
                value: "t1".into(),
            },
            TxnStatus::ConflictAbort,
            vec![Assertion::Error(ErrorCode::Rollback)],
        );
        let text = render(&stmt, CallStyle::Inline);
        assert!(text.contains("self.assertNotEqual(res, None)\n"));
        assert!(text.contains(
            "self.assertIn(wiredtiger.wiredtiger_strerror(wiredtiger.WT_ROLLBACK), str(res))\n"
        ));
    }

    #[test]
    fn test_commit_prepared_inline() {
        let stmt = invoke(
            ApiCall::CommitPreparedTransaction {
                txn: txn(),
                commit_ts: 3,
                durable_ts: 4,
            },
            TxnStatus::Success,
            vec![Assertion::NoError],
        );
        assert!(render(&stmt, CallStyle::Inline).contains(
            "sess_t1.commit_transaction('commit_timestamp=' + self.timestamp_str(3) + ',durable_timestamp=' + self.timestamp_str(4))"
        ));
    }

    #[test]
    fn test_helper_forms() {
        let read = invoke(
            ApiCall::Search {
                txn: txn(),
                key: "k1".into(),
                expected: None,
            },
            TxnStatus::Success,
            vec![Assertion::NoError, Assertion::ReturnsNotFound],
        );
        assert_eq!(
            render(&read, CallStyle::Helper),
            "self.transaction_read(\"t1\", \"k1\", \"NoValue\", \"OK\")\n"
        );

        let abort = invoke(
            ApiCall::RollbackTransaction { txn: txn() },
            TxnStatus::Success,
            vec![Assertion::NoError],
        );
        assert_eq!(
            render(&abort, CallStyle::Helper),
            "self.abort_transaction(sess_t1, \"t1\", \"OK\")\n"
        );
    }

    #[test]
    fn test_helper_falls_back_to_inline() {
        let stmt = invoke(ApiCall::RollbackToStable, TxnStatus::Success, vec![Assertion::NoError]);
        let text = render(&stmt, CallStyle::Helper);
        assert!(text.starts_with("res, sret = None, None\ntry:\n    self.conn.rollback_to_stable()\n"));
    }

    #[test]
    fn test_check_timestamps() {
        let stmt = Statement::CheckTimestamps(TimestampCheck {
            all_durable: 0,
            stable: Some(2),
            oldest: None,
        });
        assert_eq!(
            render(&stmt, CallStyle::Inline),
            "self.check_timestamps(all_durable=0, stable_ts=2, oldest_ts=None)\n"
        );
    }

    #[test]
    fn test_py_str_escapes() {
        assert_eq!(py_str("a\"b\\c\n"), "\"a\\\"b\\\\c\\n\"");
    }
}
