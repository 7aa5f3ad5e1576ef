// storefront/src/main.rs

use duka_storefront::config::AppConfig;
use duka_storefront::repository::{MemoryStore, PgStore, Store};
use duka_storefront::services::notifier::{MockEmailNotifier, Notifier};
use duka_storefront::services::temp_store::{MemoryTempStore, TempStore};
use duka_storefront::state::AppState;
use duka_storefront::web::{configure_app_routes, receipt_files};

use actix_web::{web, App, HttpServer};
use std::sync::Arc;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_span_events(FmtSpan::CLOSE)
    .init();

  tracing::info!("Starting storefront server...");

  let config = match AppConfig::from_env() {
    Ok(cfg) => cfg,
    Err(e) => {
      tracing::error!(error = %e, "Failed to load application configuration.");
      return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
    }
  };

  let store: Arc<dyn Store> = match config.database_url.as_deref() {
    Some(url) => match PgStore::connect(url).await {
      Ok(pg) => {
        tracing::info!("Connected to the database and applied migrations.");
        Arc::new(pg)
      }
      Err(e) => {
        tracing::error!(error = %e, "Failed to connect to the database.");
        return Err(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()));
      }
    },
    None => {
      tracing::warn!("DATABASE_URL is not set; orders are kept in memory and lost on restart.");
      Arc::new(MemoryStore::new())
    }
  };

  std::fs::create_dir_all(&config.receipts_dir)?;
  let receipts_dir = config.receipts_dir.clone();
  let server_address = format!("{}:{}", config.server_host, config.server_port);

  let memory_temp_store = Arc::new(MemoryTempStore::new());
  let _purger = memory_temp_store.spawn_purger(config.temp_purge_interval);
  let temp_store: Arc<dyn TempStore> = memory_temp_store;
  let notifier: Arc<dyn Notifier> = Arc::new(MockEmailNotifier::new(config.mock_email_sender.clone()));
  let app_state = AppState::new(config, store, temp_store, notifier);

  tracing::info!("Binding server to {}...", server_address);
  HttpServer::new(move || {
    App::new()
      .app_data(web::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(configure_app_routes)
      .service(receipt_files(&receipts_dir))
  })
  .bind(&server_address)?
  .run()
  .await
}
