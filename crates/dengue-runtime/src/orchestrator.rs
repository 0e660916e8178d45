//! Sequential pipeline over all source files.
//!
//! Files are processed one at a time in the order given. A file without a
//! recognisable header is skipped; any other failure aborts the whole run
//! and no partial tree is returned.

use std::time::Instant;

use chrono::{DateTime, Utc};
use dengue_core::error::{EtlError, Result};
use dengue_core::models::{AggregateTree, RawFile};
use dengue_data::aggregator::Aggregator;
use dengue_data::reader::{read_file, FileOutcome};
use dengue_data::store::ObjectStore;
use serde::Serialize;
use tracing::{info, warn};

// ── Public types ──────────────────────────────────────────────────────────────

/// Counters describing one completed rebuild.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub generated_at: DateTime<Utc>,
    pub files_processed: usize,
    pub files_skipped: usize,
    pub rows_accepted: u64,
    pub rows_rejected: u64,
    pub entries: u64,
    pub elapsed_seconds: f64,
}

/// Tree plus summary of a successful run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub tree: AggregateTree,
    pub summary: RunSummary,
}

/// What happened to one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileReport {
    Processed { rows: usize },
    Skipped,
}

// ── Pipeline ──────────────────────────────────────────────────────────────────

/// Incremental driver: feed files with [`Pipeline::process_file`], then
/// [`Pipeline::finish`].
pub struct Pipeline {
    aggregator: Aggregator,
    files_processed: usize,
    files_skipped: usize,
    started: Instant,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    pub fn new() -> Self {
        Self {
            aggregator: Aggregator::new(),
            files_processed: 0,
            files_skipped: 0,
            started: Instant::now(),
        }
    }

    /// Parse `file` and fold its rows. The raw bytes are dropped on return.
    pub fn process_file(&mut self, file: RawFile) -> Result<FileReport> {
        info!("Processing {}", file.key);

        let parsed = match read_file(&file)? {
            FileOutcome::Parsed(parsed) => parsed,
            FileOutcome::HeaderNotFound => {
                warn!("Header row not found in {}; skipping", file.key);
                self.files_skipped += 1;
                return Ok(FileReport::Skipped);
            }
        };

        let year = file.year();
        let frequency = file.frequency();
        drop(file);

        info!(year = %year, frequency = frequency.as_str(), rows = parsed.records.len(), "file parsed");
        self.aggregator
            .add_records(&year, frequency, &parsed.records);
        self.files_processed += 1;

        Ok(FileReport::Processed {
            rows: parsed.records.len(),
        })
    }

    pub fn finish(self) -> PipelineOutput {
        let elapsed_seconds = self.started.elapsed().as_secs_f64();
        let (tree, stats) = self.aggregator.finish();
        let summary = RunSummary {
            generated_at: Utc::now(),
            files_processed: self.files_processed,
            files_skipped: self.files_skipped,
            rows_accepted: stats.rows_accepted,
            rows_rejected: stats.rows_rejected,
            entries: stats.entries,
            elapsed_seconds,
        };
        PipelineOutput { tree, summary }
    }
}

// ── Entry points ──────────────────────────────────────────────────────────────

/// Run the pipeline over in-memory files.
pub fn run<I>(files: I) -> Result<PipelineOutput>
where
    I: IntoIterator<Item = RawFile>,
{
    let mut pipeline = Pipeline::new();
    for file in files {
        pipeline.process_file(file)?;
    }
    Ok(pipeline.finish())
}

/// Read each key from `store` and run the pipeline, one file in memory at
/// a time. A read failure is reported against the offending key.
pub fn run_from_store(store: &dyn ObjectStore, keys: &[String]) -> Result<PipelineOutput> {
    let mut pipeline = Pipeline::new();
    for key in keys {
        let bytes = match store.get(key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                return Err(EtlError::Processing {
                    key: key.clone(),
                    cause: "objeto não encontrado".to_string(),
                })
            }
            Err(e) => {
                return Err(EtlError::Processing {
                    key: key.clone(),
                    cause: e.to_string(),
                })
            }
        };
        pipeline.process_file(RawFile::new(key.clone(), bytes))?;
    }
    Ok(pipeline.finish())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
