//! prep-web server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), overridden
//! by `PREP_*` environment variables, opens the CSV response store and
//! serves the survey page over HTTP.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use prep_analysis::{GroupingCache, GroupingPipeline};
use prep_store_csv::CsvStore;
use prep_web::{AppState, ServerConfig, codebook_file};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "PrEP/HIV survey server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .set_default("host", "127.0.0.1")?
    .set_default("port", 8501)?
    .set_default("store_path", "respostas_prep.csv")?
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("PREP"))
    .build()
    .context("failed to read config file")?;

  let mut server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  server_cfg.store_path = expand_tilde(&server_cfg.store_path);
  server_cfg.codebook_path = server_cfg.codebook_path.as_deref().map(expand_tilde);

  let store = CsvStore::open(&server_cfg.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", server_cfg.store_path))?;

  let codebook = match &server_cfg.codebook_path {
    Some(path) => codebook_file::load(path)
      .with_context(|| format!("failed to read codebook at {path:?}"))?,
    None => Default::default(),
  };
  let grouping = Arc::new(GroupingCache::new(GroupingPipeline::default(), codebook));

  let state = AppState {
    store:    Arc::new(store),
    grouping: Arc::clone(&grouping),
    config:   Arc::new(server_cfg.clone()),
  };

  let app = prep_web::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

  // Pages save the codebook as it grows; catch anything since the last save.
  if let Some(path) = &server_cfg.codebook_path
    && let Some(book) = grouping.take_changed()
  {
    codebook_file::save(path, &book)
      .with_context(|| format!("failed to save codebook at {path:?}"))?;
  }

  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(error = %e, "failed to listen for shutdown signal");
    std::future::pending::<()>().await;
  }
  tracing::info!("shutting down");
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
