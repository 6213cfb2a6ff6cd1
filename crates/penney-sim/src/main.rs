use std::path::PathBuf;

use clap::Parser;

use penney_sim::config::{ResolvedOutputs, SimulationConfig};
use penney_sim::logging::init_logging;
use penney_sim::runner::ScoringRunner;

/// Penney's Game deck-scoring harness.
#[derive(Debug, Parser)]
#[command(
    name = "penney-sim",
    author,
    version,
    about = "Scores shuffled card decks for every Penney's Game matchup"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "sim/penney.yaml")]
    config: PathBuf,

    /// Override the number of decks to generate before scoring.
    #[arg(long, value_name = "COUNT")]
    decks: Option<usize>,

    /// Override the base RNG seed for deck generation.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Override the commit cadence (decks per commit).
    #[arg(long, value_name = "DECKS")]
    commit_every: Option<usize>,

    /// Skip deck generation and only score batches already pending.
    #[arg(long)]
    skip_generate: bool,

    /// Skip heatmap rendering.
    #[arg(long)]
    skip_plots: bool,

    /// Exit after validating the configuration (no scoring is run).
    #[arg(long)]
    validate_only: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = SimulationConfig::from_path(&cli.config)?;

    if let Some(decks) = cli.decks {
        config.decks.count = decks;
    }

    if let Some(seed) = cli.seed {
        config.decks.seed = Some(seed);
    }

    if let Some(every) = cli.commit_every {
        config.commit.every_decks = every;
    }

    if cli.skip_generate {
        config.decks.count = 0;
    }

    if cli.skip_plots {
        config.outputs.plots_dir = None;
    }

    config.validate()?;

    let outputs: ResolvedOutputs = config.resolved_outputs();
    let run_id = config.run_id.clone();
    let deck_count = config.decks.count;
    let per_batch = config.decks.per_batch;

    println!(
        "Loaded configuration '{run_id}' ({deck_count} deck{} to generate, {per_batch} per batch)",
        if deck_count == 1 { "" } else { "s" }
    );

    let _logging_guard = init_logging(&config.logging, &outputs)?;

    if cli.validate_only {
        println!("Validation-only mode: scoring skipped.");
        return Ok(());
    }

    let runner = ScoringRunner::new(config, outputs);
    let summary = runner.run()?;

    if summary.decks_scored == 0 {
        println!("No pending deck batches found for '{run_id}'; nothing to score.");
        return Ok(());
    }

    println!(
        "Scoring complete for '{run_id}': {} deck{} across {} batch{} → {} decks cumulative",
        summary.decks_scored,
        if summary.decks_scored == 1 { "" } else { "s" },
        summary.batches_consumed,
        if summary.batches_consumed == 1 { "" } else { "es" },
        summary.decks_total,
    );
    if let Some(table_path) = summary.table_path.as_ref() {
        println!("Results table: {}", table_path.display());
    }
    for path in &summary.heatmap_paths {
        println!("Heatmap: {}", path.display());
    }

    Ok(())
}
