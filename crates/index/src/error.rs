use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
  #[error("elasticsearch request failed: {0}")]
  Request(#[from] reqwest::Error),
  #[error("index creation failed with status {status}: {body}")]
  CreateFailed { status: u16, body: String },
}

#[derive(Debug, Error)]
pub enum LoadError {
  #[error("elasticsearch connection error: {0}")]
  Connection(#[source] reqwest::Error),
  #[error("elasticsearch request failed: {0}")]
  Request(#[from] reqwest::Error),
  #[error("failed to decode bulk response: {0}")]
  Decode(#[from] serde_json::Error),
}
