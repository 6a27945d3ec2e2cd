mod alerts;
mod config;
mod error;
mod logger;
mod models;
mod normalize;
mod relay;
mod router;
mod upstream;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use alerts::AlertStore;
use config::load_or_init;
use relay::ChatRelay;
use router::{run_router, RouterState};
use upstream::HttpUpstream;

#[derive(Parser)]
#[command(name = "vitals-relay")]
#[command(about = "Chat relay with model fallback and a vital-sign alert dashboard")]
#[command(version)]
struct Cli {
  /// Path to the JSON config file, created with defaults if missing
  #[arg(short, long, env = "RELAY_CONFIG", default_value = "relay.json")]
  config: PathBuf,

  /// Address to listen on, overrides the config file
  #[arg(short, long, env = "RELAY_LISTEN")]
  listen: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  let cli = Cli::parse();

  let mut config = load_or_init(&cli.config)
    .with_context(|| format!("loading config from {}", cli.config.display()))?;
  if let Some(listen) = cli.listen {
    config.listen_addr = listen;
  }

  logger::init(config.log_file.as_deref())?;
  tracing::info!(config = %cli.config.display(), "vitals-relay starting up");

  let upstream = HttpUpstream::new(config.upstream_url.clone(), config.request_timeout());
  let relay = ChatRelay::new(
    Arc::new(upstream),
    config.candidate_models.clone(),
    config.system_prompt.clone(),
  );
  let store = AlertStore::seeded(config.capacity());

  let listener = tokio::net::TcpListener::bind(&config.listen_addr)
    .await
    .with_context(|| format!("binding {}", config.listen_addr))?;
  tracing::info!(
    addr = %listener.local_addr()?,
    upstream = %config.upstream_url,
    models = ?config.candidate_models,
    "router listening"
  );

  run_router(listener, RouterState::new(relay, store)).await
}
