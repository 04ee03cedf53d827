//! Test module emission.
//!
//! A [`TestCase`] is a trace already translated to statements, with the
//! commentary the verbose mode prints. [`TestEmitter`] lays cases out in one
//! module through a [`Dialect`], which owns all target-language syntax.

mod manifest;
mod wiredtiger;
mod writer;

pub use manifest::{hash_contents, hash_inputs, GenerationManifest, ManifestEntry};
pub use wiredtiger::WiredTigerPython;
pub use writer::CodeWriter;

use crate::error::TracegenResult;
use crate::ir::{Statement, Txn};
use crate::trace::Trace;
use crate::translate::ActionTranslator;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// How engine calls are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CallStyle {
    /// Raw API calls wrapped in try/except, followed by explicit assertions
    #[default]
    Inline,
    /// One call per step to a preamble helper
    Helper,
}

/// Emission settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitOptions {
    /// Print action labels and post-states as comments
    pub verbose: bool,
    /// Call style
    pub style: CallStyle,
    /// Truncate traces longer than this many steps
    pub max_steps: Option<usize>,
    /// Sessions opened in every test, in addition to the ones a trace uses
    pub sessions: Vec<String>,
    /// Preamble text replacing the dialect default
    pub preamble: Option<String>,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            verbose: true,
            style: CallStyle::Inline,
            max_steps: Some(1000),
            sessions: vec!["t1".to_string(), "t2".to_string(), "t3".to_string()],
            preamble: None,
        }
    }
}

impl EmitOptions {
    /// Set verbose commentary.
    #[must_use]
    pub const fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Set the call style.
    #[must_use]
    pub const fn with_style(mut self, style: CallStyle) -> Self {
        self.style = style;
        self
    }

    /// Set the step limit; `None` keeps whole traces.
    #[must_use]
    pub const fn with_max_steps(mut self, max_steps: Option<usize>) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Set the always-open sessions.
    #[must_use]
    pub fn with_sessions(mut self, sessions: Vec<String>) -> Self {
        self.sessions = sessions;
        self
    }

    /// Replace the preamble.
    #[must_use]
    pub fn with_preamble(mut self, preamble: impl Into<String>) -> Self {
        self.preamble = Some(preamble.into());
        self
    }
}

/// One translated step plus its commentary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseStep {
    /// `Name(k=v, ...) res:STATUS`
    pub label: String,
    /// Post-state fields as `(name, compact JSON)`
    pub post_state: Vec<(String, String)>,
    /// Statements to run
    pub statements: Vec<Statement>,
}

/// A trace translated and numbered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestCase {
    index: usize,
    steps: Vec<CaseStep>,
    transactions: BTreeSet<String>,
    truncated: bool,
}

impl TestCase {
    /// Translate `trace`, keeping at most `max_steps` steps.
    pub fn from_trace(
        index: usize,
        trace: &Trace<'_>,
        translator: &ActionTranslator,
        max_steps: Option<usize>,
    ) -> TracegenResult<Self> {
        let limit = max_steps.unwrap_or(usize::MAX);
        let steps = trace
            .steps()
            .iter()
            .take(limit)
            .map(|step| {
                let statements = translator.translate_step(step)?;
                let res = match step.label.tid() {
                    Some(tid) => translator.status_of(step.post, &tid, step.to)?.token(),
                    None => "None",
                };
                Ok(CaseStep {
                    label: format!("{} res:{res}", step.label.describe()),
                    post_state: step
                        .post
                        .fields()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect(),
                    statements,
                })
            })
            .collect::<TracegenResult<Vec<_>>>()?;

        let truncated = trace.len() > steps.len();
        if truncated {
            tracing::debug!(index, steps = trace.len(), limit, "truncated long trace");
        }

        Ok(Self {
            index,
            steps,
            transactions: trace.transactions(),
            truncated,
        })
    }

    /// Global test number.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Test method name.
    #[must_use]
    pub fn name(&self) -> String {
        format!("test_trace_{}", self.index)
    }

    /// Translated steps.
    #[must_use]
    pub fn steps(&self) -> &[CaseStep] {
        &self.steps
    }

    /// Transaction ids the trace acts on.
    #[must_use]
    pub const fn transactions(&self) -> &BTreeSet<String> {
        &self.transactions
    }

    /// Whether steps were dropped by the step limit.
    #[must_use]
    pub const fn is_truncated(&self) -> bool {
        self.truncated
    }
}

/// Rendered module text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestModule {
    /// Source text
    pub text: String,
    /// Number of test methods
    pub trace_count: usize,
    /// blake3 hex digest of `text`
    pub digest: String,
}

/// Target-language syntax for one engine binding.
pub trait Dialect: Send + Sync + fmt::Debug {
    /// Preamble used when the caller supplies none.
    fn default_preamble(&self) -> &'static str;

    /// Module header naming coverage and test count.
    fn header(&self, out: &mut CodeWriter, coverage_pct: f64, trace_count: usize);

    /// Test method signature line.
    fn test_signature(&self, name: &str) -> String;

    /// Setup lines at the top of a test body.
    fn open_test(&self, out: &mut CodeWriter, sessions: &[Txn]);

    /// A comment line.
    fn comment(&self, out: &mut CodeWriter, text: &str);

    /// One statement.
    fn statement(&self, out: &mut CodeWriter, statement: &Statement, style: CallStyle);

    /// Teardown lines at the end of a test body.
    fn close_test(&self, out: &mut CodeWriter);
}

/// Lays out test cases through a dialect.
#[derive(Debug, Clone)]
pub struct TestEmitter<D: Dialect> {
    dialect: D,
    options: EmitOptions,
}

impl TestEmitter<WiredTigerPython> {
    /// Emitter for WiredTiger Python tests.
    #[must_use]
    pub fn wiredtiger(options: EmitOptions) -> Self {
        Self::new(WiredTigerPython, options)
    }
}

impl<D: Dialect> TestEmitter<D> {
    /// Emitter over `dialect`.
    #[must_use]
    pub const fn new(dialect: D, options: EmitOptions) -> Self {
        Self { dialect, options }
    }

    /// Options in use.
    #[must_use]
    pub const fn options(&self) -> &EmitOptions {
        &self.options
    }

    /// Render `cases` as one module.
    pub fn emit(&self, cases: &[TestCase], coverage_pct: f64) -> TracegenResult<TestModule> {
        let mut out = CodeWriter::default();
        self.dialect.header(&mut out, coverage_pct, cases.len());
        out.raw(
            self.options
                .preamble
                .as_deref()
                .unwrap_or_else(|| self.dialect.default_preamble()),
        );

        for case in cases {
            let sessions = self.sessions(case)?;
            out.blank();
            out.indented(|out| {
                out.line(self.dialect.test_signature(&case.name()));
                out.indented(|out| self.case_body(out, case, &sessions));
            });
        }

        let text = out.finish();
        let digest = hash_contents(&text);
        Ok(TestModule {
            text,
            trace_count: cases.len(),
            digest,
        })
    }

    fn case_body(&self, out: &mut CodeWriter, case: &TestCase, sessions: &[Txn]) {
        self.dialect.open_test(out, sessions);
        for (i, step) in case.steps().iter().enumerate() {
            out.blank();
            if self.options.verbose {
                self.dialect
                    .comment(out, &format!("[Action {}]: {}", i + 1, step.label));
                for (field, value) in &step.post_state {
                    self.dialect.comment(out, &format!("  {field} = {value}"));
                }
            }
            for statement in &step.statements {
                self.dialect.statement(out, statement, self.options.style);
            }
        }
        if case.is_truncated() {
            self.dialect.comment(out, "trace truncated");
        }
        out.blank();
        self.dialect.close_test(out);
    }

    /// Configured sessions plus the case's own transactions, sorted by id.
    fn sessions(&self, case: &TestCase) -> TracegenResult<Vec<Txn>> {
        let ids: BTreeSet<&str> = self
            .options
            .sessions
            .iter()
            .map(String::as_str)
            .chain(case.transactions().iter().map(String::as_str))
            .collect();
        ids.into_iter().map(Txn::new).collect()
    }
}
