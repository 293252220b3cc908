//! `tbrs`: run TBRS complex-span simulations from the command line.
//!
//! # Usage
//!
//! ```bash
//! tbrs --memoranda 5 --operations 8 -n 1000
//! tbrs --config params.toml --seed 42 --format json
//! tbrs --script "A1:B12C#" --verbose
//! tbrs --config params.toml --span-sweep
//! ```
//!
//! Recall traces and logs go to stderr; the report goes to stdout.

mod report;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use tbrs_core::{EmbeddingTable, StimulusScript, TbrsConfig, TrialDriver, run_span_sweep};

/// Simulate the time-based resource-sharing model of working memory.
#[derive(Parser, Debug)]
#[command(name = "tbrs", version, about, long_about = None)]
struct Args {
    /// TOML configuration file. Defaults are used when omitted.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Memoranda per list (nbmemo).
    #[arg(long, alias = "nbmemo")]
    memoranda: Option<usize>,

    /// Processing operations after each memorandum (nbop).
    #[arg(long, alias = "nbop")]
    operations: Option<usize>,

    /// Persistence of position codes between positions (P).
    #[arg(long, short = 'P')]
    persistence: Option<f64>,

    /// Decay rate of associations (D).
    #[arg(long, short = 'D')]
    decay_rate: Option<f64>,

    /// Mean memory processing rate (R).
    #[arg(long, alias = "R")]
    rate_mean: Option<f64>,

    /// Standard deviation of the processing rates (s).
    #[arg(long, alias = "s")]
    rate_std: Option<f64>,

    /// Recall threshold on activation (theta).
    #[arg(long)]
    theta: Option<f64>,

    /// Standard deviation of the retrieval noise (sigma).
    #[arg(long)]
    sigma: Option<f64>,

    /// Duration of one refresh (Tr), in seconds.
    #[arg(long, alias = "Tr")]
    refresh_duration: Option<f64>,

    /// Mean duration of a processing operation (Ta), in seconds.
    #[arg(long, alias = "Ta")]
    processing_duration: Option<f64>,

    /// Presentation time of each memorandum, in seconds.
    #[arg(long)]
    presentation_time: Option<f64>,

    /// Free time after each operation, in seconds.
    #[arg(long)]
    free_time: Option<f64>,

    /// Free time follows the operation instead of including it.
    #[arg(long)]
    free_time_excludes_operation: bool,

    /// Positions refreshed per focus pass.
    #[arg(long)]
    focus: Option<usize>,

    /// Resume refreshing after the last refreshed position.
    #[arg(long)]
    refresh_resumes: bool,

    /// Reuse a single distractor for every operation (sameDist).
    #[arg(long, alias = "sameDist")]
    same_distractor: bool,

    /// Fraction of a memorandum's features shared by its distractors (ido).
    #[arg(long, alias = "ido")]
    overlap: Option<f64>,

    /// Noise on the shared distractor features (idn).
    #[arg(long, alias = "idn")]
    overlap_noise: Option<f64>,

    /// Number of replications.
    #[arg(short = 'n', long)]
    replications: Option<usize>,

    /// Base seed; implies a deterministic run.
    #[arg(long)]
    seed: Option<u64>,

    /// Embedding table with one row of item values per memorandum.
    #[arg(long, value_name = "FILE")]
    embeddings: Option<PathBuf>,

    /// Custom stimulus script, e.g. "A12B12#".
    #[arg(long, conflicts_with = "span_sweep")]
    script: Option<String>,

    /// Run one batch per list length 1..=memoranda and report the span.
    #[arg(long)]
    span_sweep: bool,

    /// Run replications on the calling thread only.
    #[arg(long)]
    sequential: bool,

    /// Report format.
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Print the effective configuration as TOML and exit.
    #[arg(long)]
    dump_config: bool,

    /// Suppress per-replication traces and lower logging to warnings.
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Log every encoding, refresh and recall step.
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON lines.
    #[arg(long)]
    json_logs: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args);

    let config = load_config(&args)?;
    if args.dump_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    let table = args
        .embeddings
        .as_deref()
        .map(|path| {
            EmbeddingTable::from_file(path)
                .with_context(|| format!("loading embeddings from {}", path.display()))
        })
        .transpose()?;

    if args.span_sweep {
        let sweep = run_span_sweep(&config, table.as_ref())?;
        if !args.quiet {
            for batch in &sweep.batches {
                report::print_traces(batch);
            }
        }
        match args.format {
            Format::Text => report::print_sweep(&sweep),
            Format::Json => println!("{}", sweep.to_json()?),
        }
        return Ok(());
    }

    let mut driver = TrialDriver::new(config, table)?;
    if let Some(text) = &args.script {
        let script = StimulusScript::parse(text).context("parsing --script")?;
        driver = driver.with_script(script)?;
    }
    info!(script = %driver.script(), "running batch");

    let summary = driver.run_batch()?;
    if !args.quiet {
        report::print_traces(&summary);
    }
    match args.format {
        Format::Text => report::print_summary(&summary),
        Format::Json => println!("{}", summary.to_json()?),
    }
    Ok(())
}

/// `RUST_LOG` wins; otherwise `--verbose` / `--quiet` pick the default level.
fn init_logging(args: &Args) {
    let default_level = if args.verbose {
        "debug"
    } else if args.quiet {
        "warn"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if args.json_logs {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Config file (or defaults) with command-line overrides applied, validated.
fn load_config(args: &Args) -> Result<TbrsConfig> {
    let mut config = match args.config.as_deref() {
        Some(path) => {
            info!(path = %path.display(), "loading configuration");
            TbrsConfig::from_file(path)
                .with_context(|| format!("loading configuration from {}", path.display()))?
        }
        None => TbrsConfig::default(),
    };

    let model = &mut config.model;
    override_with(&mut model.position_persistence, args.persistence);
    override_with(&mut model.decay_rate, args.decay_rate);
    override_with(&mut model.rate_mean, args.rate_mean);
    override_with(&mut model.rate_std, args.rate_std);
    override_with(&mut model.retrieval_threshold, args.theta);
    override_with(&mut model.retrieval_noise, args.sigma);
    override_with(&mut model.refresh_duration, args.refresh_duration);
    override_with(&mut model.processing_duration, args.processing_duration);

    let task = &mut config.task;
    override_with(&mut task.memoranda, args.memoranda);
    override_with(&mut task.operations, args.operations);
    override_with(&mut task.presentation_time, args.presentation_time);
    override_with(&mut task.free_time, args.free_time);
    override_with(&mut task.attentional_focus, args.focus);
    override_with(&mut task.item_distractor_overlap, args.overlap);
    override_with(&mut task.item_distractor_noise, args.overlap_noise);
    task.free_time_includes_operation &= !args.free_time_excludes_operation;
    task.refresh_resumes |= args.refresh_resumes;
    task.same_distractor |= args.same_distractor;

    override_with(&mut config.run.replications, args.replications);
    if let Some(seed) = args.seed {
        config.run.seed = seed;
        config.run.deterministic = true;
    }
    if args.sequential {
        config.run.parallel = false;
    }

    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn override_with<T>(field: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *field = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("tbrs").chain(argv.iter().copied()))
            .expect("valid arguments")
    }

    #[test]
    fn overrides_apply_on_top_of_defaults() {
        let args = parse(&[
            "--nbmemo", "4", "--nbop", "2", "-P", "0", "--seed", "9", "--sequential",
        ]);
        let config = load_config(&args).expect("config");
        assert_eq!(config.task.memoranda, 4);
        assert_eq!(config.task.operations, 2);
        assert!(config.model.position_persistence.abs() < f64::EPSILON);
        assert!(config.run.deterministic);
        assert_eq!(config.run.seed, 9);
        assert!(!config.run.parallel);
    }

    #[test]
    fn model_and_task_knobs_can_be_overridden() {
        let args = parse(&[
            "--theta", "0.2", "--sigma", "0", "--R", "4", "--Tr", "0.1", "--ido", "0.6",
            "--sameDist", "--focus", "2", "--free-time-excludes-operation",
        ]);
        let config = load_config(&args).expect("config");
        assert!((config.model.retrieval_threshold - 0.2).abs() < f64::EPSILON);
        assert!(config.model.retrieval_noise.abs() < f64::EPSILON);
        assert!((config.model.rate_mean - 4.0).abs() < f64::EPSILON);
        assert!((config.model.refresh_duration - 0.1).abs() < f64::EPSILON);
        assert!((config.task.item_distractor_overlap - 0.6).abs() < f64::EPSILON);
        assert!(config.task.same_distractor);
        assert_eq!(config.task.attentional_focus, 2);
        assert!(!config.task.free_time_includes_operation);
        assert!(!config.task.refresh_resumes);
    }

    #[test]
    fn out_of_range_overlap_is_rejected() {
        let args = parse(&["--overlap", "1.5"]);
        assert!(load_config(&args).is_err());
    }

    #[test]
    fn invalid_override_is_reported() {
        let args = parse(&["--operations", "17"]);
        assert!(load_config(&args).is_err());
    }

    #[test]
    fn script_and_sweep_conflict() {
        let result = Args::try_parse_from(["tbrs", "--script", "A1#", "--span-sweep"]);
        assert!(result.is_err());
    }

    #[test]
    fn quiet_and_verbose_conflict() {
        assert!(Args::try_parse_from(["tbrs", "-q", "-v"]).is_err());
    }
}
