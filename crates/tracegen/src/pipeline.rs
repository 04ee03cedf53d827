//! End-to-end generation.
//!
//! ```text
//! StateGraph ──► Arborescence ──► PathCover ──► Traces ──► TestCases ──► TestModules
//!                (root policy)    (strategy)               (translator)   (one per shard)
//! ```

use crate::arborescence::Arborescence;
use crate::config::GeneratorConfig;
use crate::cover::{cover_paths, PathCover, TargetSet};
use crate::emit::{TestCase, TestEmitter, TestModule, WiredTigerPython};
use crate::error::TracegenResult;
use crate::graph::{Fingerprint, StateGraph};
use crate::shard::{split_even, ShardConfig};
use crate::trace::{build_traces, Trace};
use crate::translate::ActionTranslator;
use std::num::NonZeroUsize;

/// Result of a full run.
#[derive(Debug, Clone)]
pub struct GenerationOutput {
    /// Initial state
    pub root: Fingerprint,
    /// States reachable from the root
    pub tree_size: usize,
    /// Chosen paths and coverage report
    pub cover: PathCover,
    /// Rendered modules in shard order
    pub modules: Vec<TestModule>,
    /// Set when only one shard was rendered; `modules` then holds just that one
    pub shard: Option<ShardConfig>,
}

impl GenerationOutput {
    /// 1-based shard number of each module.
    pub fn numbered_modules(&self) -> impl Iterator<Item = (usize, &TestModule)> + '_ {
        let first = self.shard.map_or(1, |s| s.current);
        self.modules.iter().enumerate().map(move |(i, m)| (first + i, m))
    }
}

/// Traces of one shard and the global index of its first test.
struct ShardJob<'a, 'g> {
    index: usize,
    first_test: usize,
    traces: &'a [Trace<'g>],
}

/// Runs the pipeline under one configuration.
#[derive(Debug, Clone)]
pub struct Generator {
    config: GeneratorConfig,
}

impl Generator {
    /// Validate `config` and wrap it.
    pub fn new(config: GeneratorConfig) -> TracegenResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Arborescence and path cover for `targets`.
    pub fn plan(
        &self,
        graph: &StateGraph,
        targets: &TargetSet,
    ) -> TracegenResult<(Arborescence, PathCover)> {
        let tree = Arborescence::compute(graph, self.config.root)?;
        let strategy = self.config.strategy.build();
        let cover = cover_paths(
            graph,
            &tree,
            targets,
            self.config.coverage_pct,
            strategy.as_ref(),
        )?;
        Ok((tree, cover))
    }

    /// Traces for every covering path, in cover order.
    pub fn traces<'g>(
        &self,
        graph: &'g StateGraph,
        cover: &PathCover,
    ) -> TracegenResult<Vec<Trace<'g>>> {
        let _span = tracing::info_span!("traces", paths = cover.paths.len()).entered();
        build_traces(graph, &cover.paths)
    }

    /// Run every stage and render one module per shard.
    pub fn run(&self, graph: &StateGraph, targets: &TargetSet) -> TracegenResult<GenerationOutput> {
        self.run_with_progress(graph, targets, |_| {})
    }

    /// [`Generator::run`], calling `on_shard(index)` as each shard finishes.
    ///
    /// Shards are translated and rendered on scoped threads, at most one per
    /// available core at a time. Each thread owns its slice of traces, so
    /// output is identical to a sequential run.
    pub fn run_with_progress<F>(
        &self,
        graph: &StateGraph,
        targets: &TargetSet,
        on_shard: F,
    ) -> TracegenResult<GenerationOutput>
    where
        F: Fn(usize) + Sync,
    {
        self.generate(graph, targets, None, on_shard)
    }

    /// Run every stage but render only `shard`; `shard.total` replaces the
    /// configured shard count.
    pub fn run_shard(
        &self,
        graph: &StateGraph,
        targets: &TargetSet,
        shard: ShardConfig,
    ) -> TracegenResult<GenerationOutput> {
        self.generate(graph, targets, Some(shard), |_| {})
    }

    fn generate<F>(
        &self,
        graph: &StateGraph,
        targets: &TargetSet,
        only: Option<ShardConfig>,
        on_shard: F,
    ) -> TracegenResult<GenerationOutput>
    where
        F: Fn(usize) + Sync,
    {
        let (tree, cover) = self.plan(graph, targets)?;
        let traces = self.traces(graph, &cover)?;

        let jobs = match only {
            Some(shard) => {
                let range = shard.range(traces.len());
                vec![ShardJob {
                    index: shard.current - 1,
                    first_test: range.start,
                    traces: &traces[range],
                }]
            }
            None => {
                let mut offset = 0;
                split_even(&traces, self.config.shards)?
                    .into_iter()
                    .enumerate()
                    .map(|(index, chunk)| {
                        let first_test = offset;
                        offset += chunk.len();
                        ShardJob {
                            index,
                            first_test,
                            traces: chunk,
                        }
                    })
                    .collect()
            }
        };

        let modules = self.render(&jobs, graph, worker_count(), &on_shard)?;
        tracing::info!(
            modules = modules.len(),
            traces = traces.len(),
            "generated test modules"
        );

        Ok(GenerationOutput {
            root: tree.root(),
            tree_size: tree.len(),
            cover,
            modules,
            shard: only,
        })
    }

    /// Render `jobs` in order, `workers` threads at a time.
    fn render<F>(
        &self,
        jobs: &[ShardJob<'_, '_>],
        graph: &StateGraph,
        workers: usize,
        on_shard: &F,
    ) -> TracegenResult<Vec<TestModule>>
    where
        F: Fn(usize) + Sync,
    {
        let translator = ActionTranslator::new(graph.schema().clone());
        let emitter = TestEmitter::wiredtiger(self.config.emit.clone());
        let coverage_pct = self.config.coverage_pct;

        let _span = tracing::info_span!("emit", shards = jobs.len(), workers).entered();
        let mut modules = Vec::with_capacity(jobs.len());
        for batch in jobs.chunks(workers.max(1)) {
            let rendered = std::thread::scope(|scope| {
                let handles: Vec<_> = batch
                    .iter()
                    .map(|job| {
                        let (translator, emitter) = (&translator, &emitter);
                        scope.spawn(move || {
                            let module = render_shard(job, translator, emitter, coverage_pct)?;
                            on_shard(job.index);
                            Ok(module)
                        })
                    })
                    .collect();

                handles
                    .into_iter()
                    .map(|handle| {
                        handle
                            .join()
                            .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
                    })
                    .collect::<TracegenResult<Vec<_>>>()
            })?;
            modules.extend(rendered);
        }
        Ok(modules)
    }
}

fn worker_count() -> usize {
    std::thread::available_parallelism().map_or(1, NonZeroUsize::get)
}

fn render_shard(
    job: &ShardJob<'_, '_>,
    translator: &ActionTranslator,
    emitter: &TestEmitter<WiredTigerPython>,
    coverage_pct: f64,
) -> TracegenResult<TestModule> {
    let cases = job
        .traces
        .iter()
        .enumerate()
        .map(|(i, trace)| {
            TestCase::from_trace(
                job.first_test + i,
                trace,
                translator,
                emitter.options().max_steps,
            )
        })
        .collect::<TracegenResult<Vec<_>>>()?;
    emitter.emit(&cases, coverage_pct)
}
