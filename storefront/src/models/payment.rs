// storefront/src/models/payment.rs

use super::{PaymentMethod, PaymentStatus};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
  pub id: Uuid,
  pub order_id: Uuid,
  pub transaction_id: String,
  pub provider_receipt_code: String,
  pub phone_number: String,
  pub amount: Decimal,
  pub status: PaymentStatus,
  pub method: PaymentMethod,
  pub metadata: serde_json::Value,
  pub created_at: DateTime<Utc>,
}

/// Payment record as produced by the gateway, before it is stored.
#[derive(Debug, Clone)]
pub struct NewPayment {
  pub order_id: Uuid,
  pub transaction_id: String,
  pub provider_receipt_code: String,
  pub phone_number: String,
  pub amount: Decimal,
  pub status: PaymentStatus,
  pub method: PaymentMethod,
  pub metadata: serde_json::Value,
}
