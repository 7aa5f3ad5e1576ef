// storefront/src/state.rs

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::pipelines::register_all_pipelines;
use crate::repository::Store;
use crate::services::auth_service::AuthService;
use crate::services::notifier::Notifier;
use crate::services::payment_sim::PaymentSimulator;
use crate::services::pricing::PricingPolicy;
use crate::services::receipt::ReceiptGenerator;
use crate::services::temp_store::TempStore;
use duka_flow::Flows;
use std::sync::Arc;

/// Shared services handed to every request and every pipeline run.
#[derive(Clone)]
pub struct AppState {
  pub config: Arc<AppConfig>,
  pub store: Arc<dyn Store>,
  pub flows: Arc<Flows<AppError>>,
  pub pricing: PricingPolicy,
  pub payments: Arc<PaymentSimulator>,
  pub receipts: Arc<ReceiptGenerator>,
  pub notifier: Arc<dyn Notifier>,
  pub auth: Arc<AuthService>,
}

impl AppState {
  /// Wires the services together and registers every pipeline.
  pub fn new(
    config: AppConfig,
    store: Arc<dyn Store>,
    temp_store: Arc<dyn TempStore>,
    notifier: Arc<dyn Notifier>,
  ) -> Self {
    let config = Arc::new(config);

    let payments = PaymentSimulator::new(
      store.clone(),
      config.mock_payment_provider.clone(),
      config.mock_payment_latency,
    );
    let receipts = ReceiptGenerator::new(
      store.clone(),
      config.receipts_dir.clone(),
      config.app_base_url.clone(),
      config.store_name.clone(),
      config.currency.clone(),
    );
    let auth = AuthService::new(
      temp_store,
      store.clone(),
      notifier.clone(),
      config.otp_ttl,
      config.session_ttl,
    );

    let flows = Arc::new(Flows::<AppError>::new());
    register_all_pipelines(&flows);

    Self {
      pricing: PricingPolicy::from_config(&config),
      config,
      store,
      flows,
      payments: Arc::new(payments),
      receipts: Arc::new(receipts),
      notifier,
      auth: Arc::new(auth),
    }
  }
}
