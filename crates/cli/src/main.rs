//! filmsync: incremental Postgres to Elasticsearch film catalog sync.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use daemon::Supervisor;
use filmsync_core::config::Settings;

mod logging;

use logging::init_logging;

#[derive(Parser)]
#[command(name = "filmsync")]
#[command(about = "Incremental ETL from Postgres into the movies search index")]
struct Cli {
  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Run the supervisor loop: extract, transform, load, sleep, repeat.
  Run,
  /// Create the `movies` index with its full mapping, if it doesn't exist.
  BootstrapIndex {
    /// Delete and recreate the index if it already exists.
    #[arg(long)]
    force: bool,
  },
}

#[tokio::main]
async fn main() -> Result<()> {
  init_logging();

  let cli = Cli::parse();
  let settings = Settings::from_env().context("configuration error")?;

  match cli.command {
    Commands::Run => {
      let supervisor = Supervisor::new(settings);
      supervisor.run().await.context("supervisor exited with an error")?;
    }
    Commands::BootstrapIndex { force } => {
      let client = reqwest::Client::builder()
        .connect_timeout(settings.connect_timeout)
        .timeout(settings.request_timeout)
        .build()
        .context("failed to build http client")?;
      let created = index::create_index_if_missing(&client, &settings.es_host, force)
        .await
        .context("failed to bootstrap movies index")?;
      if created {
        println!("created index {}", index::INDEX_NAME);
      } else {
        println!("index {} already exists", index::INDEX_NAME);
      }
    }
  }

  Ok(())
}
