use thiserror::Error;

/// Errors surfaced by the network pipeline. All variants are recoverable:
/// the caller decides whether to abort the run or rebuild from source data.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or empty input data, e.g. no episodes with characters or an
    /// episode label without an extractable number.
    #[error("data error: {0}")]
    Data(String),

    /// The caller passed a structurally invalid matrix or graph, e.g.
    /// appearance vectors of mismatched length or a disconnected graph.
    #[error("precondition violated: {0}")]
    Precondition(String),

    /// Cache miss: no artifact at the configured location, or a stale one.
    #[error("not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serde(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
