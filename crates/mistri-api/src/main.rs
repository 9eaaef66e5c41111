//! mistri-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens an
//! in-process SQLite store, and serves the marketplace API over HTTP.
//! Profiles come from the in-memory dev store seeded via `POST /profiles`;
//! the real deployment reads them from the identity platform instead.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use mistri_api::{api_router, profiles::profiles_router};
use mistri_core::{
  engine::{MatchingEngine, Messenger},
  profile::MemoryProfiles,
};
use mistri_store_sqlite::SqliteStore;
use serde::Deserialize;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "mistri marketplace server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
struct ServerConfig {
  #[serde(default = "default_host")]
  host:       String,
  #[serde(default = "default_port")]
  port:       u16,
  #[serde(default = "default_store_path")]
  store_path: PathBuf,
}

fn default_host() -> String { "127.0.0.1".into() }
fn default_port() -> u16 { 8322 }
fn default_store_path() -> PathBuf { PathBuf::from("mistri.db") }

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("MISTRI"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store = SqliteStore::open(&server_cfg.store_path)
    .await
    .with_context(|| {
      format!("failed to open store at {:?}", server_cfg.store_path)
    })?;
  let store = Arc::new(store);

  let profiles = Arc::new(MemoryProfiles::new());
  let engine = Arc::new(MatchingEngine::new(
    Arc::clone(&store),
    Arc::clone(&profiles),
  ));
  let messenger = Arc::new(Messenger::new(
    Arc::clone(&store),
    Arc::clone(&profiles),
  ));

  let app = api_router(engine, messenger)
    .nest("/profiles", profiles_router(Arc::clone(&profiles)))
    .layer(TraceLayer::new_for_http());

  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
