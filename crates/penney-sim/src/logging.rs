use std::fs::{self, File};
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::{self, WorkerGuard};
use tracing_subscriber::EnvFilter;

use crate::config::{LoggingConfig, ResolvedOutputs};

/// Keeps the non-blocking telemetry writer alive for the life of the
/// run; dropping it flushes any buffered events.
pub struct LoggingGuard {
    _guard: WorkerGuard,
    pub telemetry_path: PathBuf,
}

/// Install a JSON event log at `<results_dir>/telemetry.jsonl` when
/// structured logging is enabled. `RUST_LOG` overrides the configured
/// level.
pub fn init_logging(
    logging: &LoggingConfig,
    outputs: &ResolvedOutputs,
) -> Result<Option<LoggingGuard>> {
    if !logging.enable_structured {
        return Ok(None);
    }

    fs::create_dir_all(&outputs.results_dir).with_context(|| {
        format!(
            "creating results directory {}",
            outputs.results_dir.display()
        )
    })?;
    let telemetry_path = outputs.results_dir.join("telemetry.jsonl");
    let sink = File::create(&telemetry_path)
        .with_context(|| format!("creating telemetry file {}", telemetry_path.display()))?;

    let (writer, guard) = non_blocking::NonBlockingBuilder::default()
        .lossy(false)
        .finish(sink);

    let fallback = logging.level().unwrap_or(tracing::Level::INFO);
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback.as_str()));

    let subscriber = tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_current_span(false)
        .with_writer(writer)
        .finish();

    // Tests may have installed a subscriber already; keep theirs.
    let _ = tracing::subscriber::set_global_default(subscriber);

    Ok(Some(LoggingGuard {
        _guard: guard,
        telemetry_path,
    }))
}
