use thiserror::Error;

/// Fatal errors of a dengue-etl run.
///
/// Soft outcomes (cache miss, a file without a recognisable header, a row
/// without a municipality, a non-numeric case count) are not represented
/// here; they are ordinary branches of the pipeline.
#[derive(Error, Debug)]
pub enum EtlError {
    /// The source prefix holds no `.csv` objects.
    #[error("Nenhum arquivo .csv encontrado em {prefix}")]
    EmptySource { prefix: String },

    /// The object store could not list the source prefix.
    #[error("Failed to list objects: {0}")]
    Listing(String),

    /// A single source file could not be decoded or parsed.
    #[error("Failed to process {key}: {cause}")]
    Processing { key: String, cause: String },

    /// The aggregate document could not be written back.
    #[error("Failed to persist aggregate: {0}")]
    Persist(String),

    /// An object could not be read from or written to the backing store.
    #[error("Storage error on {key}: {source}")]
    Storage {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// A JSON document could not be produced or parsed.
    #[error("Failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl EtlError {
    /// Short category string placed in the `error` field of the envelope.
    pub fn category(&self) -> String {
        match self {
            EtlError::EmptySource { .. } | EtlError::Listing(_) => {
                "Erro ao listar arquivos".to_string()
            }
            EtlError::Processing { key, .. } => format!("Erro ao processar {}", key),
            EtlError::Persist(_) => "Erro ao salvar JSON".to_string(),
            EtlError::Storage { .. } => "Erro de armazenamento".to_string(),
            EtlError::Json(_) => "Erro ao gerar JSON".to_string(),
        }
    }

    /// Human-readable cause placed in the `details` field of the envelope.
    pub fn details(&self) -> String {
        match self {
            EtlError::Processing { cause, .. } => cause.clone(),
            EtlError::Listing(cause) | EtlError::Persist(cause) => cause.clone(),
            other => other.to_string(),
        }
    }

    /// HTTP-style status for the envelope. Every fatal path is a 500.
    pub fn status_code(&self) -> u16 {
        500
    }
}

/// Convenience alias used throughout the dengue-etl crates.
pub type Result<T> = std::result::Result<T, EtlError>;
