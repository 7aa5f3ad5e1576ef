// tests/common/mod.rs
#![allow(dead_code)]

use duka_storefront::config::AppConfig;
use duka_storefront::models::{Customer, NewAddress, NewLineItem, Order, PaymentMethod};
use duka_storefront::pipelines::CheckoutInput;
use duka_storefront::repository::{CustomerRepository, MemoryStore, OrderDraft, OrderRepository};
use duka_storefront::services::notifier::MockEmailNotifier;
use duka_storefront::services::pricing::PriceLine;
use duka_storefront::services::temp_store::MemoryTempStore;
use duka_storefront::state::AppState;
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use uuid::Uuid;

pub const BASE_URL: &str = "http://shop.test";
pub const ADMIN_KEY: &str = "operator-secret";

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  let _ = tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::new("debug"))
    .with_test_writer()
    .try_init();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

/// A fully wired state over in-memory stores. The temp dir holds the
/// receipts and is removed when the harness is dropped.
pub struct Harness {
  pub state: AppState,
  pub store: Arc<MemoryStore>,
  pub notifier: Arc<MockEmailNotifier>,
  pub dir: TempDir,
}

impl Harness {
  pub fn new() -> Self {
    let dir = tempfile::tempdir().expect("temp dir");
    let receipts_dir = dir.path().join("receipts");
    Self::with_receipts_dir(dir, receipts_dir)
  }

  /// Receipts go to a path below a regular file, so every write fails.
  pub fn with_broken_receipts() -> Self {
    let dir = tempfile::tempdir().expect("temp dir");
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"not a directory").expect("write blocker");
    Self::with_receipts_dir(dir, blocker.join("receipts"))
  }

  fn with_receipts_dir(dir: TempDir, receipts_dir: PathBuf) -> Self {
    setup_tracing();
    let config = AppConfig {
      app_base_url: BASE_URL.to_string(),
      receipts_dir,
      mock_payment_latency: Duration::ZERO,
      admin_api_key: Some(ADMIN_KEY.to_string()),
      ..AppConfig::default()
    };
    let store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(MockEmailNotifier::new("noreply@shop.test"));
    let state = AppState::new(
      config,
      store.clone(),
      Arc::new(MemoryTempStore::new()),
      notifier.clone(),
    );
    Self {
      state,
      store,
      notifier,
      dir,
    }
  }

  pub fn receipts_dir(&self) -> PathBuf {
    self.state.config.receipts_dir.clone()
  }

  pub async fn customer(&self, email: &str) -> Customer {
    self.store.upsert_customer(email, Some("Test Customer")).await.expect("customer")
  }

  /// An order stored directly, without going through payment.
  pub async fn unpaid_order(&self, customer: &Customer, price: Decimal) -> Order {
    let address = self
      .store
      .create_address(customer.id, sample_address())
      .await
      .expect("address");
    let items = vec![line_item("Kikoi wrap", price, 1)];
    let pricing = self
      .state
      .pricing
      .quote(&[PriceLine::new(price, 1)])
      .expect("pricing");
    self
      .store
      .create_order(OrderDraft {
        user_id: customer.id,
        address_id: address.id,
        items,
        pricing,
        payment_method: PaymentMethod::MobileMoney,
        notes: None,
      })
      .await
      .expect("order")
  }
}

pub fn sample_address() -> NewAddress {
  NewAddress {
    recipient_name: "Achieng Odhiambo".to_string(),
    phone: "0712345678".to_string(),
    line1: "Kimathi Street 7".to_string(),
    line2: Some("Floor 3".to_string()),
    city: "Nairobi".to_string(),
    region: Some("Nairobi County".to_string()),
    postal_code: Some("00100".to_string()),
  }
}

pub fn line_item(name: &str, price: Decimal, quantity: i32) -> NewLineItem {
  NewLineItem {
    product_id: Uuid::new_v4(),
    name: name.to_string(),
    price,
    quantity,
    size: Some("M".to_string()),
    color: Some("Indigo".to_string()),
  }
}

pub fn checkout_input(items: Vec<NewLineItem>, phone: &str) -> CheckoutInput {
  CheckoutInput {
    address_id: None,
    address: Some(sample_address()),
    phone: phone.to_string(),
    items,
    notes: None,
  }
}
