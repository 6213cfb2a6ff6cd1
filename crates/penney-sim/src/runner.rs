use std::fs;
use std::path::PathBuf;

use penney_core::model::pair::ComboSet;
use penney_core::score::tally::TallyError;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::batch::{self, BatchError, BatchState, DeckBatch};
use crate::config::{ResolvedOutputs, SimulationConfig};
use crate::heatmap;
use crate::store::{ResultsStore, StoreError};

/// Primary entry point: generates deck batches when asked, scores all
/// pending batches against the 56-pair combo set, and folds the
/// outcomes into the committed results table.
pub struct ScoringRunner {
    config: SimulationConfig,
    outputs: ResolvedOutputs,
    store: ResultsStore,
}

/// Summary details returned after a run.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub run_id: String,
    pub decks_scored: u64,
    pub decks_total: u64,
    pub batches_consumed: usize,
    pub table_path: Option<PathBuf>,
    pub heatmap_paths: Vec<PathBuf>,
}

impl ScoringRunner {
    pub fn new(config: SimulationConfig, outputs: ResolvedOutputs) -> Self {
        let store = ResultsStore::new(outputs.results_dir.clone());
        Self {
            config,
            outputs,
            store,
        }
    }

    /// Execute one run. Batches are scored deck by deck; the table is
    /// committed whenever the uncommitted deck count reaches the
    /// configured cadence and again at end of input, and a batch is
    /// renamed to scored only once a commit covers all of its decks.
    pub fn run(&self) -> Result<RunSummary, RunnerError> {
        fs::create_dir_all(&self.outputs.data_dir).map_err(|source| RunnerError::Io {
            context: "creating data directory",
            source,
        })?;

        if self.config.decks.count > 0 {
            batch::generate(
                &self.outputs.data_dir,
                self.config.decks.count,
                self.config.decks.per_batch,
                self.config.decks.seed,
            )?;
        }

        let mut table = self.store.load_or_init(ComboSet::standard())?;
        let resumed_from = table.decks_scored();

        // Scored batch files are part of the durable record: their
        // deck counts must reconcile with the committed tag, otherwise
        // a batch could be folded in twice (crash between commit and
        // batch rename) or dropped (scored files removed by hand).
        let discovered = batch::discover(&self.outputs.data_dir)?;
        let scored_decks: u64 = discovered
            .iter()
            .filter(|batch| batch.state() == BatchState::Scored)
            .map(|batch| batch.count() as u64)
            .sum();
        if scored_decks != resumed_from {
            return Err(RunnerError::StateMismatch {
                tag: resumed_from,
                scored_decks,
            });
        }

        let pending = batch::pending(&self.outputs.data_dir)?;
        if pending.is_empty() {
            info!(target: "penney_sim::runner", "no pending deck batches, nothing to score");
            return Ok(RunSummary {
                run_id: self.config.run_id.clone(),
                decks_scored: 0,
                decks_total: resumed_from,
                batches_consumed: 0,
                table_path: None,
                heatmap_paths: Vec::new(),
            });
        }

        let decks_this_run: u64 = pending.iter().map(|b| b.count() as u64).sum();
        info!(
            target: "penney_sim::runner",
            batches = pending.len(),
            decks = decks_this_run,
            resumed_from,
            "scoring pending deck batches"
        );

        let mut processed: u64 = 0;
        let mut uncommitted_decks: usize = 0;
        let mut uncommitted_batches: Vec<DeckBatch> = Vec::new();
        let mut batches_consumed = 0;
        let mut table_path = None;

        for batch in pending {
            let decks = batch::read_decks(&batch)?;
            for deck in &decks {
                table.absorb_deck(deck);
                processed += 1;
                uncommitted_decks += 1;

                if processed % self.config.progress.every_decks as u64 == 0
                    || processed == decks_this_run
                {
                    info!(
                        target: "penney_sim::runner",
                        processed,
                        total = decks_this_run,
                        "deck scoring progress"
                    );
                }
            }
            uncommitted_batches.push(batch);
            batches_consumed += 1;

            if uncommitted_decks >= self.config.commit.every_decks {
                table_path = Some(self.commit(&table, &mut uncommitted_batches)?);
                uncommitted_decks = 0;
            }
        }

        if !uncommitted_batches.is_empty() {
            table_path = Some(self.commit(&table, &mut uncommitted_batches)?);
        }

        let heatmap_paths = self.render_heatmaps(&table);

        let summary = RunSummary {
            run_id: self.config.run_id.clone(),
            decks_scored: processed,
            decks_total: table.decks_scored(),
            batches_consumed,
            table_path,
            heatmap_paths,
        };
        self.write_summary(&summary)?;
        Ok(summary)
    }

    /// Commit the table, then flip every batch covered by the commit
    /// to scored. A crash between those two steps is caught on resume
    /// by the scored-deck reconciliation in `run`.
    fn commit(
        &self,
        table: &penney_core::score::tally::ResultsTable,
        covered: &mut Vec<DeckBatch>,
    ) -> Result<PathBuf, RunnerError> {
        table.check_invariant()?;
        let path = self.store.commit(table)?;
        for batch in covered.drain(..) {
            batch::mark_scored(batch)?;
        }
        Ok(path)
    }

    fn render_heatmaps(&self, table: &penney_core::score::tally::ResultsTable) -> Vec<PathBuf> {
        let Some(plots_dir) = self.outputs.plots_dir.as_ref() else {
            return Vec::new();
        };
        if let Err(source) = fs::create_dir_all(plots_dir) {
            warn!(
                target: "penney_sim::runner",
                dir = %plots_dir.display(),
                error = %source,
                "failed to create plots directory"
            );
            return Vec::new();
        }
        match heatmap::render_heatmaps(table, plots_dir) {
            Ok(paths) => paths,
            Err(err) => {
                warn!(target: "penney_sim::runner", error = %err, "heatmap rendering failed");
                Vec::new()
            }
        }
    }

    fn write_summary(&self, summary: &RunSummary) -> Result<(), RunnerError> {
        let path = self.outputs.results_dir.join("run_summary.json");
        let json = serde_json::to_vec_pretty(summary)?;
        fs::write(&path, json).map_err(|source| RunnerError::Io {
            context: "writing run summary",
            source,
        })?;
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("deck batch stage failed: {0}")]
    Batch(#[from] BatchError),
    #[error("merge stage failed: {0}")]
    Merge(#[from] TallyError),
    #[error("persistence stage failed: {0}")]
    Store(#[from] StoreError),
    #[error(
        "committed table claims {tag} decks but scored batches account for {scored_decks}; \
         refusing to score until the data and results directories are reconciled"
    )]
    StateMismatch { tag: u64, scored_decks: u64 },
    #[error("failed to serialize run summary: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::ScoringRunner;
    use crate::config::SimulationConfig;
    use tempfile::tempdir;

    fn config_yaml(root: &std::path::Path, decks: usize, commit_every: usize) -> String {
        format!(
            r#"
run_id: "runner_test"
decks:
  count: {decks}
  per_batch: 2
outputs:
  data_dir: "{data}"
  results_dir: "{results}"
commit:
  every_decks: {commit_every}
progress:
  every_decks: 1
"#,
            data = root.join("data").display(),
            results = root.join("results").display(),
        )
    }

    fn build(root: &std::path::Path, decks: usize, commit_every: usize) -> ScoringRunner {
        let mut cfg: SimulationConfig =
            serde_yaml::from_str(&config_yaml(root, decks, commit_every)).unwrap();
        cfg.validate().unwrap();
        let outputs = cfg.resolved_outputs();
        ScoringRunner::new(cfg, outputs)
    }

    #[test]
    fn empty_data_directory_is_nothing_to_do() {
        let dir = tempdir().unwrap();
        let runner = build(dir.path(), 0, 10);
        let summary = runner.run().unwrap();
        assert_eq!(summary.decks_scored, 0);
        assert_eq!(summary.batches_consumed, 0);
        assert!(summary.table_path.is_none());
    }

    #[test]
    fn run_scores_generated_batches_and_commits() {
        let dir = tempdir().unwrap();
        let runner = build(dir.path(), 5, 2);
        let summary = runner.run().unwrap();

        assert_eq!(summary.decks_scored, 5);
        assert_eq!(summary.decks_total, 5);
        assert_eq!(summary.batches_consumed, 3);
        let table_path = summary.table_path.unwrap();
        assert!(table_path.ends_with("scoring_analysis_N=5.csv"));
        assert!(table_path.exists());
        assert!(dir.path().join("results/run_summary.json").exists());

        // All batches consumed, none pending.
        let pending = crate::batch::pending(&dir.path().join("data")).unwrap();
        assert!(pending.is_empty());
    }

    #[test]
    fn interrupted_commit_window_is_detected_on_resume() {
        let dir = tempdir().unwrap();
        let runner = build(dir.path(), 2, 10);
        runner.run().unwrap();

        // Simulate a crash between commit and batch rename by flipping
        // a scored batch back to pending.
        let data = dir.path().join("data");
        std::fs::rename(
            data.join("scored-decks_seed0_n2.txt"),
            data.join("pending-decks_seed0_n2.txt"),
        )
        .unwrap();

        let again = build(dir.path(), 0, 10);
        let err = again.run().unwrap_err();
        assert!(matches!(
            err,
            super::RunnerError::StateMismatch {
                tag: 2,
                scored_decks: 0
            }
        ));
    }

    #[test]
    fn second_run_resumes_from_the_committed_tag() {
        let dir = tempdir().unwrap();
        let first = build(dir.path(), 4, 10);
        let summary = first.run().unwrap();
        assert_eq!(summary.decks_total, 4);

        let second = build(dir.path(), 2, 10);
        let summary = second.run().unwrap();
        assert_eq!(summary.decks_scored, 2);
        assert_eq!(summary.decks_total, 6);
    }
}
