//! One invocation: cache check, listing, rebuild, persist, envelope.
//!
//! The aggregate document doubles as a cache. When it already exists its
//! bytes are returned untouched and no CSV is read. Otherwise every `.csv`
//! under the prefix is processed, the new document is written back and a
//! short completion message is returned.

use dengue_core::error::{EtlError, Result};
use dengue_core::settings::PipelineConfig;
use dengue_data::store::{list_csv_keys, ObjectStore};
use serde_json::json;
use tracing::{error, info};

use crate::orchestrator::{run_from_store, RunSummary};

/// Content type of the aggregate document and of every response body.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Completion message of a successful rebuild.
pub const DONE_MESSAGE: &str = "Processamento concluído";

// ── Outcomes ──────────────────────────────────────────────────────────────────

/// Result of looking up the cached aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    Hit(Vec<u8>),
    Miss,
}

/// Successful end of an invocation.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// Cached document, byte for byte.
    Cached(Vec<u8>),
    /// Fresh document written to `output_key`.
    Rebuilt {
        output_key: String,
        summary: RunSummary,
    },
}

// ── Response ──────────────────────────────────────────────────────────────────

/// HTTP-style envelope handed back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status_code: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Response {
    fn json(status_code: u16, value: &serde_json::Value) -> Self {
        Self {
            status_code,
            content_type: JSON_CONTENT_TYPE,
            body: value.to_string().into_bytes(),
        }
    }

    pub fn from_outcome(outcome: &Outcome) -> Self {
        match outcome {
            Outcome::Cached(bytes) => Self {
                status_code: 200,
                content_type: JSON_CONTENT_TYPE,
                body: bytes.clone(),
            },
            Outcome::Rebuilt { output_key, .. } => Self::json(
                200,
                &json!({ "message": DONE_MESSAGE, "arquivo": output_key }),
            ),
        }
    }

    pub fn from_error(err: &EtlError) -> Self {
        Self::json(
            err.status_code(),
            &json!({ "error": err.category(), "details": err.details() }),
        )
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

// ── Steps ─────────────────────────────────────────────────────────────────────

/// Read the cached aggregate. A missing object is a [`CacheLookup::Miss`].
pub fn lookup_cache(store: &dyn ObjectStore, output_key: &str) -> Result<CacheLookup> {
    Ok(match store.get(output_key)? {
        Some(bytes) => CacheLookup::Hit(bytes),
        None => CacheLookup::Miss,
    })
}

/// Keys of every `.csv` under `prefix`; none at all is fatal.
pub fn list_sources(store: &dyn ObjectStore, prefix: &str) -> Result<Vec<String>> {
    let keys = list_csv_keys(store, prefix).map_err(|e| EtlError::Listing(e.to_string()))?;
    if keys.is_empty() {
        return Err(EtlError::EmptySource {
            prefix: prefix.to_string(),
        });
    }
    Ok(keys)
}

/// Run one invocation and return its typed outcome.
pub fn execute(store: &dyn ObjectStore, config: &PipelineConfig) -> Result<Outcome> {
    if config.use_cache {
        if let CacheLookup::Hit(bytes) = lookup_cache(store, &config.output_key)? {
            info!("Serving cached aggregate {}", config.output_key);
            return Ok(Outcome::Cached(bytes));
        }
        info!("Aggregate {} not cached; processing CSVs", config.output_key);
    }

    let keys = list_sources(store, &config.prefix)?;
    info!("{} CSV files under {}", keys.len(), config.prefix);

    let output = run_from_store(store, &keys)?;
    let document = output.tree.to_json_bytes()?;

    store
        .put(&config.output_key, &document, JSON_CONTENT_TYPE)
        .map_err(|e| EtlError::Persist(e.to_string()))?;

    let summary = output.summary;
    info!(
        summary = %serde_json::to_string(&summary)?,
        "Aggregate written to {}",
        config.output_key
    );

    Ok(Outcome::Rebuilt {
        output_key: config.output_key.clone(),
        summary,
    })
}

/// Run one invocation and wrap the result in a [`Response`].
pub fn handle(store: &dyn ObjectStore, config: &PipelineConfig) -> Response {
    match execute(store, config) {
        Ok(outcome) => Response::from_outcome(&outcome),
        Err(err) => {
            error!("{}", err);
            Response::from_error(&err)
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
