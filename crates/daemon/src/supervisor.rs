//! Service outer loop: open connections, run passes, sleep, repeat.
//!
//! State machine: Starting -> Idle -> Pass -> Idle(sleep) on success,
//! or Idle(sleep shorter) after an aborted pass; any state reacts to a
//! shutdown signal by stopping at the next page boundary.

use crate::error::SupervisorError;
use db::{CheckpointStore, Extractor};
use filmsync_core::config::Settings;
use index::Loader;
use std::time::Duration;
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

pub struct Supervisor {
  settings: Settings,
}

impl Supervisor {
  pub fn new(settings: Settings) -> Self {
    Self { settings }
  }

  /// Run until a shutdown signal arrives.
  pub async fn run(&self) -> Result<(), SupervisorError> {
    info!("starting filmsync supervisor");

    let pool = Extractor::connect(&self.settings).await?;
    let extractor = Extractor::new(pool, self.settings.batch_size);
    let loader = Loader::connect(&self.settings).await?;
    let checkpoint_store = CheckpointStore::new(self.settings.checkpoint_path.clone());

    let (shutdown_tx, mut shutdown_rx) = broadcast::channel::<()>(1);
    tokio::spawn(async move {
      if signal::ctrl_c().await.is_err() {
        warn!("failed to listen for ctrl-c");
        return;
      }
      info!("received shutdown signal");
      let _ = shutdown_tx.send(());
    });

    loop {
      if shutdown_rx.try_recv().is_ok() {
        break;
      }

      match self.run_pass(&extractor, &loader, &checkpoint_store, &mut shutdown_rx).await {
        Ok(processed) => {
          info!(
            processed,
            sleep_secs = self.settings.sleep_interval.as_secs(),
            "pass complete, sleeping"
          );
          if sleep_or_shutdown(self.settings.sleep_interval, &mut shutdown_rx).await {
            break;
          }
        }
        Err(err) => {
          error!(error = %err, "pass aborted, checkpoint not advanced for the failing page");
          if sleep_or_shutdown(self.settings.failed_pass_sleep, &mut shutdown_rx).await {
            break;
          }
        }
      }
    }

    info!("supervisor shutdown complete");
    Ok(())
  }

  /// Drain the extractor, piping each page through the transformer and
  /// loader, saving the checkpoint after each page's successful load.
  /// Returns the number of raw records processed in this pass.
  async fn run_pass(
    &self,
    extractor: &Extractor,
    loader: &Loader,
    checkpoint_store: &CheckpointStore,
    shutdown: &mut broadcast::Receiver<()>,
  ) -> Result<usize, SupervisorError> {
    let mut checkpoint = checkpoint_store.load();
    let mut processed = 0usize;

    loop {
      if shutdown.try_recv().is_ok() {
        info!("shutdown requested, stopping at page boundary");
        break;
      }

      let Some(page) = extractor.fetch_page(checkpoint).await? else {
        break;
      };

      let page_len = page.records.len();
      let documents: Vec<_> = transform::transform_all(page.records).collect();
      // Per-document failures are logged by the loader; they still count
      // as progress here, so the page as a whole advances the checkpoint.
      let _outcome = loader.load(&documents).await?;
      checkpoint_store.save(page.max_modified)?;
      checkpoint = page.max_modified;
      processed += page_len;

      info!(page_len, checkpoint = %checkpoint, "page processed");
    }

    Ok(processed)
  }
}

/// Sleep for `duration` unless a shutdown signal arrives first.
/// Returns `true` if shutdown won the race.
async fn sleep_or_shutdown(duration: Duration, shutdown: &mut broadcast::Receiver<()>) -> bool {
  tokio::select! {
    _ = tokio::time::sleep(duration) => false,
    _ = shutdown.recv() => true,
  }
}
