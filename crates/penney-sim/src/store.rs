use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use penney_core::model::pair::{ComboSet, PlayerPair};
use penney_core::score::tally::{ResultsTable, WinRecord};
use thiserror::Error;
use tracing::{info, warn};

const BASE_FILENAME: &str = "scoring_analysis";
const TMP_SUFFIX: &str = ".tmp";
const HEADER: &str =
    "p1,p2,p1_wins_tricks,p2_wins_tricks,draws_tricks,p1_wins_cards,p2_wins_cards,draws_cards";

/// Durable home of the cumulative results table. Exactly one committed
/// file exists at a time, named `scoring_analysis_N=<decks>.csv`; the
/// tag is the source of truth for resuming.
#[derive(Debug, Clone)]
pub struct ResultsStore {
    dir: PathBuf,
}

impl ResultsStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn tagged_path(&self, decks_scored: u64) -> PathBuf {
        self.dir
            .join(format!("{BASE_FILENAME}_N={decks_scored}.csv"))
    }

    /// The committed table file and its deck-count tag, if any.
    /// Partial `.tmp` files are ignored; more than one committed file
    /// means an interrupted cleanup that needs operator attention.
    pub fn find_committed(&self) -> Result<Option<(PathBuf, u64)>, StoreError> {
        if !self.dir.exists() {
            return Ok(None);
        }

        let mut found: Option<(PathBuf, u64)> = None;
        let entries = fs::read_dir(&self.dir).map_err(|source| StoreError::Io {
            context: "reading results directory",
            path: self.dir.clone(),
            source,
        })?;

        for entry in entries {
            let entry = entry.map_err(|source| StoreError::Io {
                context: "reading results directory",
                path: self.dir.clone(),
                source,
            })?;
            let path = entry.path();
            let Some(tag) = parse_tag(&path) else {
                continue;
            };
            if let Some((first, _)) = found.as_ref() {
                return Err(StoreError::MultipleCommitted {
                    first: first.clone(),
                    second: path,
                });
            }
            found = Some((path, tag));
        }
        Ok(found)
    }

    /// Load the committed table, or start blank when none exists. A
    /// present-but-unreadable table is an error, never a silent reset.
    pub fn load_or_init(&self, combos: ComboSet) -> Result<ResultsTable, StoreError> {
        match self.find_committed()? {
            Some((path, tag)) => {
                info!(
                    target: "penney_sim::store",
                    path = %path.display(),
                    decks_scored = tag,
                    "resuming from committed table"
                );
                self.load(&path, tag, combos)
            }
            None => {
                info!(target: "penney_sim::store", "no committed table found, starting blank");
                Ok(ResultsTable::blank(combos))
            }
        }
    }

    fn load(&self, path: &Path, tag: u64, combos: ComboSet) -> Result<ResultsTable, StoreError> {
        let file = File::open(path).map_err(|source| StoreError::Io {
            context: "opening committed table",
            path: path.to_path_buf(),
            source,
        })?;
        let mut lines = BufReader::new(file).lines();

        let header = lines
            .next()
            .transpose()
            .map_err(|source| StoreError::Io {
                context: "reading committed table",
                path: path.to_path_buf(),
                source,
            })?
            .ok_or_else(|| self.corrupt(path, "file is empty"))?;
        if header != HEADER {
            return Err(self.corrupt(path, format!("unexpected header '{header}'")));
        }

        let mut records: Vec<Option<WinRecord>> = vec![None; combos.len()];
        for (number, line) in lines.enumerate() {
            let line = line.map_err(|source| StoreError::Io {
                context: "reading committed table",
                path: path.to_path_buf(),
                source,
            })?;
            if line.is_empty() {
                continue;
            }
            let (pair, record) = parse_row(&line)
                .map_err(|reason| self.corrupt(path, format!("row {}: {reason}", number + 2)))?;
            let index = combos.index_of(pair).ok_or_else(|| {
                self.corrupt(path, format!("row {}: unknown pair {pair}", number + 2))
            })?;
            if records[index].is_some() {
                return Err(self.corrupt(path, format!("duplicate row for pair {pair}")));
            }
            records[index] = Some(record);
        }

        let mut complete = Vec::with_capacity(combos.len());
        for (index, record) in records.into_iter().enumerate() {
            let record = record.ok_or_else(|| {
                let pair = combos.pairs()[index];
                self.corrupt(path, format!("missing row for pair {pair}"))
            })?;
            complete.push(record);
        }

        ResultsTable::from_parts(combos, complete, tag)
            .map_err(|err| self.corrupt(path, err.to_string()))
    }

    /// Commit the table: write a fresh temp file, sync it, atomically
    /// rename it onto the tagged name, then drop any older tagged
    /// files. A crash at any step leaves the previous committed file
    /// loadable.
    pub fn commit(&self, table: &ResultsTable) -> Result<PathBuf, StoreError> {
        fs::create_dir_all(&self.dir).map_err(|source| StoreError::Io {
            context: "creating results directory",
            path: self.dir.clone(),
            source,
        })?;

        let final_path = self.tagged_path(table.decks_scored());
        let tmp_path = self
            .dir
            .join(format!("{BASE_FILENAME}_N={}.csv{TMP_SUFFIX}", table.decks_scored()));

        let file = File::create(&tmp_path).map_err(|source| StoreError::Io {
            context: "creating temp table",
            path: tmp_path.clone(),
            source,
        })?;
        let mut writer = BufWriter::new(file);
        let write_err = |source| StoreError::Io {
            context: "writing temp table",
            path: tmp_path.clone(),
            source,
        };
        writeln!(writer, "{HEADER}").map_err(write_err)?;
        for (pair, record) in table.combos().pairs().iter().zip(table.records()) {
            writeln!(
                writer,
                "{},{},{},{},{},{},{},{}",
                pair.mine(),
                pair.theirs(),
                record.wins_mine_tricks,
                record.wins_theirs_tricks,
                record.draws_tricks,
                record.wins_mine_cards,
                record.wins_theirs_cards,
                record.draws_cards,
            )
            .map_err(write_err)?;
        }

        let file = writer
            .into_inner()
            .map_err(|source| StoreError::Io {
                context: "flushing temp table",
                path: tmp_path.clone(),
                source: source.into_error(),
            })?;
        file.sync_all().map_err(|source| StoreError::Io {
            context: "syncing temp table",
            path: tmp_path.clone(),
            source,
        })?;

        fs::rename(&tmp_path, &final_path).map_err(|source| StoreError::Io {
            context: "publishing committed table",
            path: final_path.clone(),
            source,
        })?;

        self.remove_stale(&final_path)?;

        info!(
            target: "penney_sim::store",
            path = %final_path.display(),
            decks_scored = table.decks_scored(),
            "committed results table"
        );
        Ok(final_path)
    }

    /// Drop superseded tagged files plus abandoned temp files.
    fn remove_stale(&self, keep: &Path) -> Result<(), StoreError> {
        let entries = fs::read_dir(&self.dir).map_err(|source| StoreError::Io {
            context: "reading results directory",
            path: self.dir.clone(),
            source,
        })?;

        for entry in entries {
            let entry = entry.map_err(|source| StoreError::Io {
                context: "reading results directory",
                path: self.dir.clone(),
                source,
            })?;
            let path = entry.path();
            if path == keep {
                continue;
            }
            let stale_commit = parse_tag(&path).is_some();
            let stale_tmp = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| {
                    name.starts_with(BASE_FILENAME) && name.ends_with(TMP_SUFFIX)
                });
            if stale_commit || stale_tmp {
                if let Err(source) = fs::remove_file(&path) {
                    warn!(
                        target: "penney_sim::store",
                        path = %path.display(),
                        error = %source,
                        "failed to remove stale table file"
                    );
                }
            }
        }
        Ok(())
    }

    fn corrupt(&self, path: &Path, reason: impl Into<String>) -> StoreError {
        StoreError::Corrupt {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}

fn parse_tag(path: &Path) -> Option<u64> {
    let name = path.file_name()?.to_str()?;
    let rest = name.strip_prefix(BASE_FILENAME)?;
    let rest = rest.strip_prefix("_N=")?;
    let tag = rest.strip_suffix(".csv")?;
    tag.parse().ok()
}

fn parse_row(line: &str) -> Result<(PlayerPair, WinRecord), String> {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() != 8 {
        return Err(format!("expected 8 fields, got {}", fields.len()));
    }

    let mine = fields[0]
        .parse()
        .map_err(|err| format!("bad p1 pattern: {err}"))?;
    let theirs = fields[1]
        .parse()
        .map_err(|err| format!("bad p2 pattern: {err}"))?;
    let pair = PlayerPair::new(mine, theirs).map_err(|err| err.to_string())?;

    let mut counters = [0u64; 6];
    for (slot, field) in counters.iter_mut().zip(&fields[2..]) {
        *slot = field
            .parse()
            .map_err(|err| format!("bad counter '{field}': {err}"))?;
    }

    Ok((
        pair,
        WinRecord {
            wins_mine_tricks: counters[0],
            wins_theirs_tricks: counters[1],
            draws_tricks: counters[2],
            wins_mine_cards: counters[3],
            wins_theirs_cards: counters[4],
            draws_cards: counters[5],
        },
    ))
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{context} {path:?}: {source}")]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("committed table {path:?} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },
    #[error("multiple committed tables present ({first:?} and {second:?}); remove the stale one")]
    MultipleCommitted { first: PathBuf, second: PathBuf },
}
