use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
  #[error("database connection error: {0}")]
  Connection(#[source] sqlx::Error),
  #[error("query failed: {0}")]
  Query(#[source] sqlx::Error),
  #[error("failed to decode aggregated participant/genre json: {0}")]
  Decode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum CheckpointError {
  #[error("failed to write checkpoint file {path}: {source}")]
  Write {
    path: String,
    #[source]
    source: std::io::Error,
  },
}
