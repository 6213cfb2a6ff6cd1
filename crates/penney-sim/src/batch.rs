use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use penney_core::model::deck::{Deck, DeckError};
use rand::SeedableRng;
use rand::rngs::StdRng;
use thiserror::Error;
use tracing::info;

const PENDING_PREFIX: &str = "pending-decks_";
const SCORED_PREFIX: &str = "scored-decks_";
const BATCH_SUFFIX: &str = ".txt";

/// Lifecycle of a deck batch file. Pending batches are waiting to be
/// scored; scored batches are kept for provenance but never rescanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Pending,
    Scored,
}

/// One deck batch file: a sequence of 52-character R/B lines, one deck
/// per line, named `pending-decks_seed<seed>_n<count>.txt`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckBatch {
    path: PathBuf,
    state: BatchState,
    seed: u64,
    count: usize,
}

impl DeckBatch {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> BatchState {
        self.state
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Recognize a batch file from its name; anything else is ignored
    /// by discovery.
    pub fn from_path(path: PathBuf) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        let (state, seed, count) = parse_file_name(name)?;
        Some(Self {
            path,
            state,
            seed,
            count,
        })
    }

    fn file_name(state: BatchState, seed: u64, count: usize) -> String {
        let prefix = match state {
            BatchState::Pending => PENDING_PREFIX,
            BatchState::Scored => SCORED_PREFIX,
        };
        format!("{prefix}seed{seed}_n{count}{BATCH_SUFFIX}")
    }
}

fn parse_file_name(name: &str) -> Option<(BatchState, u64, usize)> {
    let (state, rest) = if let Some(rest) = name.strip_prefix(PENDING_PREFIX) {
        (BatchState::Pending, rest)
    } else if let Some(rest) = name.strip_prefix(SCORED_PREFIX) {
        (BatchState::Scored, rest)
    } else {
        return None;
    };
    let rest = rest.strip_suffix(BATCH_SUFFIX)?;
    let rest = rest.strip_prefix("seed")?;
    let (seed, count) = rest.split_once("_n")?;
    Some((state, seed.parse().ok()?, count.parse().ok()?))
}

/// All recognized batch files in a directory, sorted by seed.
pub fn discover(dir: &Path) -> Result<Vec<DeckBatch>, BatchError> {
    let entries = fs::read_dir(dir).map_err(|source| BatchError::Io {
        context: "reading data directory",
        path: dir.to_path_buf(),
        source,
    })?;

    let mut batches = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| BatchError::Io {
            context: "reading data directory",
            path: dir.to_path_buf(),
            source,
        })?;
        if let Some(batch) = DeckBatch::from_path(entry.path()) {
            batches.push(batch);
        }
    }
    batches.sort_by_key(|batch| batch.seed);
    Ok(batches)
}

/// Pending batches only, in seed order.
pub fn pending(dir: &Path) -> Result<Vec<DeckBatch>, BatchError> {
    Ok(discover(dir)?
        .into_iter()
        .filter(|batch| batch.state == BatchState::Pending)
        .collect())
}

/// The next unused generation seed: one past the highest seed found in
/// either state, or zero for an empty directory.
pub fn next_seed(dir: &Path) -> Result<u64, BatchError> {
    Ok(discover(dir)?
        .iter()
        .map(|batch| batch.seed + 1)
        .max()
        .unwrap_or(0))
}

/// Generate `total` shuffled decks into pending batch files of at most
/// `per_batch` decks each. Each file gets its own seed, starting from
/// `base_seed` (or the directory's next unused seed), so a batch's
/// contents are reproducible from its name alone. Reusing a seed that
/// an existing batch already carries is refused: the duplicate would
/// score the same decks twice.
pub fn generate(
    dir: &Path,
    total: usize,
    per_batch: usize,
    base_seed: Option<u64>,
) -> Result<Vec<DeckBatch>, BatchError> {
    let mut remaining = total;
    let existing: Vec<u64> = discover(dir)?.iter().map(|batch| batch.seed).collect();
    let base = match base_seed {
        Some(seed) => seed,
        None => existing.iter().map(|seed| seed + 1).max().unwrap_or(0),
    };

    let mut batches = Vec::new();
    let mut seed = base;
    while remaining > 0 {
        if existing.contains(&seed) {
            return Err(BatchError::SeedInUse { seed });
        }
        let count = remaining.min(per_batch);
        let batch = write_batch(dir, seed, count)?;
        info!(
            target: "penney_sim::generate",
            path = %batch.path.display(),
            seed,
            count,
            "generated deck batch"
        );
        batches.push(batch);
        remaining -= count;
        seed += 1;
    }
    Ok(batches)
}

fn write_batch(dir: &Path, seed: u64, count: usize) -> Result<DeckBatch, BatchError> {
    let path = dir.join(DeckBatch::file_name(BatchState::Pending, seed, count));
    let file = File::create(&path).map_err(|source| BatchError::Io {
        context: "creating batch file",
        path: path.clone(),
        source,
    })?;
    let mut writer = BufWriter::new(file);
    let mut rng = StdRng::seed_from_u64(seed);
    for _ in 0..count {
        let deck = Deck::shuffled(&mut rng);
        writeln!(writer, "{deck}").map_err(|source| BatchError::Io {
            context: "writing batch file",
            path: path.clone(),
            source,
        })?;
    }
    writer.flush().map_err(|source| BatchError::Io {
        context: "flushing batch file",
        path: path.clone(),
        source,
    })?;

    Ok(DeckBatch {
        path,
        state: BatchState::Pending,
        seed,
        count,
    })
}

/// Read and validate every deck in a batch. The line count must match
/// the count advertised in the file name.
pub fn read_decks(batch: &DeckBatch) -> Result<Vec<Deck>, BatchError> {
    let file = File::open(&batch.path).map_err(|source| BatchError::Io {
        context: "opening batch file",
        path: batch.path.clone(),
        source,
    })?;

    let mut decks = Vec::with_capacity(batch.count);
    for (number, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|source| BatchError::Io {
            context: "reading batch file",
            path: batch.path.clone(),
            source,
        })?;
        let deck = line.parse::<Deck>().map_err(|source| BatchError::BadDeck {
            path: batch.path.clone(),
            line: number + 1,
            source,
        })?;
        decks.push(deck);
    }

    if decks.len() != batch.count {
        return Err(BatchError::CountMismatch {
            path: batch.path.clone(),
            expected: batch.count,
            found: decks.len(),
        });
    }
    Ok(decks)
}

/// Flip a pending batch to scored by renaming it in place.
pub fn mark_scored(batch: DeckBatch) -> Result<DeckBatch, BatchError> {
    if batch.state != BatchState::Pending {
        return Err(BatchError::NotPending {
            path: batch.path.clone(),
        });
    }

    let new_path = batch
        .path
        .with_file_name(DeckBatch::file_name(BatchState::Scored, batch.seed, batch.count));
    fs::rename(&batch.path, &new_path).map_err(|source| BatchError::Io {
        context: "renaming scored batch",
        path: batch.path.clone(),
        source,
    })?;

    Ok(DeckBatch {
        path: new_path,
        state: BatchState::Scored,
        seed: batch.seed,
        count: batch.count,
    })
}

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("{context} {path:?}: {source}")]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("bad deck in {path:?} line {line}: {source}")]
    BadDeck {
        path: PathBuf,
        line: usize,
        #[source]
        source: DeckError,
    },
    #[error("batch {path:?} advertises {expected} decks but contains {found}")]
    CountMismatch {
        path: PathBuf,
        expected: usize,
        found: usize,
    },
    #[error("batch {path:?} is not pending")]
    NotPending { path: PathBuf },
    #[error("generation seed {seed} is already used by an existing batch")]
    SeedInUse { seed: u64 },
}
