use thiserror::Error;

/// Failures crossing the storage boundary.
///
/// Session-engine callers never see these; best-effort persistence swallows
/// them after logging. They surface only from the explicit store APIs.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("bad persisted record: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv export failed: {0}")]
    Csv(#[from] csv::Error),
}
