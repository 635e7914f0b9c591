use thiserror::Error;

#[derive(Debug, Error)]
pub enum SupervisorError {
  #[error("extractor error: {0}")]
  Extract(#[from] db::ExtractError),
  #[error("loader error: {0}")]
  Load(#[from] index::LoadError),
  #[error("checkpoint store error: {0}")]
  Checkpoint(#[from] db::CheckpointError),
}
