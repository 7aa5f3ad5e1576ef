// storefront/src/services/payment_sim.rs

//! Simulated mobile-money gateway. Every charge succeeds.

use crate::errors::{AppError, Result};
use crate::models::{NewPayment, PaymentMethod, PaymentStatus};
use crate::repository::{OrderRepository, PaymentRepository, Store};
use crate::services::phone::normalize_msisdn;
use rand::Rng;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

const RECEIPT_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const RECEIPT_CODE_LEN: usize = 10;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResult {
  pub payment_id: Uuid,
  pub transaction_id: String,
  pub provider_receipt_code: String,
  pub amount: Decimal,
  pub phone_number: String,
  pub status: PaymentStatus,
}

pub struct PaymentSimulator {
  store: Arc<dyn Store>,
  provider: String,
  latency: Duration,
}

impl PaymentSimulator {
  pub fn new(store: Arc<dyn Store>, provider: impl Into<String>, latency: Duration) -> Self {
    Self {
      store,
      provider: provider.into(),
      latency,
    }
  }

  /// Charges `amount` to `phone` for the order and stores the resulting
  /// payment. Fails when the order does not exist or already has a payment.
  #[instrument(name = "payment_sim::charge", skip(self, phone), fields(provider = %self.provider), err(Display))]
  pub async fn charge(&self, order_id: Uuid, phone: &str, amount: Decimal) -> Result<PaymentResult> {
    let order = self
      .store
      .find_order(order_id)
      .await?
      .ok_or_else(|| AppError::not_found("Order", order_id))?;
    let msisdn = normalize_msisdn(phone)?;
    if amount < Decimal::ZERO {
      return Err(AppError::Validation("Payment amount cannot be negative".to_string()));
    }

    tokio::time::sleep(self.latency).await;

    let transaction_id = format!("TXN-{}", Uuid::new_v4().simple().to_string().to_uppercase());
    let provider_receipt_code = generate_receipt_code();
    let payment = self
      .store
      .insert_payment(NewPayment {
        order_id,
        transaction_id: transaction_id.clone(),
        provider_receipt_code: provider_receipt_code.clone(),
        phone_number: msisdn.clone(),
        amount,
        status: PaymentStatus::Completed,
        method: PaymentMethod::MobileMoney,
        metadata: json!({
          "provider": self.provider,
          "simulated": true,
          "orderNumber": order.order_number,
          "msisdn": msisdn,
        }),
      })
      .await?;

    info!(%transaction_id, order_number = %order.order_number, "Simulated payment completed.");
    Ok(PaymentResult {
      payment_id: payment.id,
      transaction_id: payment.transaction_id,
      provider_receipt_code: payment.provider_receipt_code,
      amount: payment.amount,
      phone_number: payment.phone_number,
      status: payment.status,
    })
  }
}

fn generate_receipt_code() -> String {
  let mut rng = rand::thread_rng();
  (0..RECEIPT_CODE_LEN)
    .map(|_| RECEIPT_CODE_ALPHABET[rng.gen_range(0..RECEIPT_CODE_ALPHABET.len())] as char)
    .collect()
}
