// apps/marketplace/src/main.rs

use actix_web::{web, App, HttpServer};
use std::sync::Arc;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

use marketplace::config::{AppConfig, LogFormat};
use marketplace::services::seed;
use marketplace::state::AppState;
use marketplace::store::{DocumentStore, MemoryStore};
use marketplace::web::configure_app_routes;

fn init_tracing(format: LogFormat) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_span_events(FmtSpan::CLOSE);
  match format {
    LogFormat::Json => builder.json().init(),
    LogFormat::Text => builder.init(),
  }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  let app_config = match AppConfig::from_env() {
    Ok(cfg) => cfg,
    Err(e) => {
      eprintln!("Configuration error: {}", e);
      std::process::exit(1);
    }
  };
  init_tracing(app_config.log_format);
  tracing::info!(config = ?app_config, "Starting marketplace server...");

  let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
  if app_config.seed_db {
    if let Err(e) = seed::seed_demo_data(store.as_ref()).await {
      tracing::error!(error = %e, "Failed to seed demo data.");
    }
  }

  let server_address = app_config.bind_address();
  let app_state = AppState::new(app_config, store);

  tracing::info!("Binding server to {}...", server_address);
  HttpServer::new(move || {
    App::new()
      .app_data(web::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await
}
