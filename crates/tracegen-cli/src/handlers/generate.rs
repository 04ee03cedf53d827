//! Generate command handler

use super::{load_graph, resolve_config};
use crate::commands::{GenerateArgs, StrategyArg};
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::ProgressReporter;
use tracegen::trace::traces_to_json;
use tracegen::{
    CallStyle, GenerationManifest, Generator, GeneratorConfig, RandomWalk, ShardConfig,
    StrategyConfig,
};

/// File name of the `n`-th module (1-based).
#[must_use]
pub fn module_file_name(n: usize) -> String {
    format!("model_tests_{n}.py")
}

/// Apply generation flags to `config`; returns the single shard to write, if any.
pub fn apply_overrides(
    config: &mut GeneratorConfig,
    args: &GenerateArgs,
) -> CliResult<Option<ShardConfig>> {
    if let Some(pct) = args.coverage_pct {
        config.coverage_pct = pct;
    }
    if args.compact {
        config.emit.style = CallStyle::Helper;
    }
    if let Some(style) = args.style {
        config.emit.style = style.into();
    }
    if args.no_comments {
        config.emit.verbose = false;
    }
    if let Some(max_steps) = args.max_steps {
        config.emit.max_steps = Some(max_steps);
    }
    if let Some(ref path) = args.preamble {
        config.emit.preamble = Some(std::fs::read_to_string(path)?);
    }
    if let Some(shards) = args.shards {
        config.shards = shards;
    }

    let shard = args.shard.as_deref().map(ShardConfig::parse).transpose()?;
    if let Some(shard) = shard {
        config.shards = shard.total;
    }

    config.strategy = resolve_strategy(config.strategy, args)?;
    Ok(shard)
}

fn resolve_strategy(current: StrategyConfig, args: &GenerateArgs) -> CliResult<StrategyConfig> {
    let mut strategy = match (args.strategy, current) {
        (None, current) => current,
        (Some(StrategyArg::Greedy), _) => StrategyConfig::Greedy,
        (Some(StrategyArg::RandomWalk), current @ StrategyConfig::RandomWalk { .. }) => current,
        (Some(StrategyArg::RandomWalk), StrategyConfig::Greedy) => {
            let walk = RandomWalk::default();
            StrategyConfig::RandomWalk {
                seed: walk.seed,
                num_paths: walk.num_paths,
                max_path_len: walk.max_path_len,
            }
        }
    };

    match strategy {
        StrategyConfig::RandomWalk {
            ref mut seed,
            ref mut num_paths,
            ref mut max_path_len,
        } => {
            *seed = args.seed.unwrap_or(*seed);
            *num_paths = args.num_paths.unwrap_or(*num_paths);
            *max_path_len = args.max_path_len.unwrap_or(*max_path_len);
        }
        StrategyConfig::Greedy => {
            if args.seed.is_some() || args.num_paths.is_some() || args.max_path_len.is_some() {
                return Err(CliError::invalid_argument(
                    "random-walk options need --strategy random-walk",
                ));
            }
        }
    }
    Ok(strategy)
}

/// Execute the generate command
pub fn execute_generate(config: &CliConfig, args: &GenerateArgs) -> CliResult<()> {
    let mut reporter = ProgressReporter::new(config.use_color, config.is_quiet());

    let mut generator_config = resolve_config(&args.graph)?;
    let shard = apply_overrides(&mut generator_config, args)?;
    let loaded = load_graph(&args.graph, &generator_config)?;
    let stats = loaded.graph.stats();
    reporter.info(&format!(
        "loaded {} states and {} edges; {} target states{}",
        stats.nodes,
        stats.edges,
        loaded.targets.len(),
        if loaded.reduced { " from reduced graph" } else { "" }
    ));

    let generator = Generator::new(generator_config)?;
    let coverage_pct = generator.config().coverage_pct;

    let output = match shard {
        Some(shard) => generator.run_shard(&loaded.graph, &loaded.targets, shard)?,
        None => {
            reporter.start_progress(generator.config().shards as u64, "emitting test modules");
            let bar = reporter.bar();
            let output = generator.run_with_progress(&loaded.graph, &loaded.targets, |_| {
                if let Some(ref pb) = bar {
                    pb.inc(1);
                }
            })?;
            reporter.finish();
            output
        }
    };

    let report = &output.cover.report;
    reporter.coverage(report);
    if args.strict_coverage {
        report
            .require(coverage_pct)
            .map_err(|e| CliError::generation(e.to_string()))?;
    } else if report.covered < report.total_targets {
        reporter.warning(&format!(
            "{} target states not covered",
            report.total_targets - report.covered
        ));
    }

    std::fs::create_dir_all(&args.output)?;
    let mut manifest = GenerationManifest::new(loaded.input_digest.clone(), report);
    for (n, module) in output.numbered_modules() {
        let name = module_file_name(n);
        std::fs::write(args.output.join(&name), &module.text)?;
        tracing::debug!(file = %name, traces = module.trace_count, "wrote test module");
        manifest.push(name, module.digest.clone(), module.trace_count);
    }
    let written = manifest.files.len();

    let manifest_path = args.output.join(GenerationManifest::FILE_NAME);
    if shard.is_some() && manifest_path.exists() {
        match GenerationManifest::read(&manifest_path) {
            Ok(previous) => {
                if !manifest.merge_previous(previous) {
                    reporter.warning("existing manifest is from another run; replacing it");
                }
            }
            Err(e) => reporter.warning(&format!("ignoring unreadable manifest: {e}")),
        }
    }
    manifest.write(&manifest_path)?;

    if let Some(ref path) = args.dump_traces {
        let traces = generator.traces(&loaded.graph, &output.cover)?;
        let selected = match shard {
            Some(s) => &traces[s.range(traces.len())],
            None => &traces[..],
        };
        let json = serde_json::to_string_pretty(&traces_to_json(selected))
            .map_err(|e| CliError::generation(format!("cannot serialize traces: {e}")))?;
        std::fs::write(path, json)?;
        reporter.info(&format!("wrote {} traces to {}", selected.len(), path.display()));
    }

    reporter.success(&format!(
        "wrote {written} test modules to {}",
        args.output.display()
    ));
    Ok(())
}
