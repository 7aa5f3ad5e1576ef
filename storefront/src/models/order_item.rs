// storefront/src/models/order_item.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One checkout line, snapshotted from the catalog at order time so later
/// catalog edits never change a historical order.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineItem {
  pub id: Uuid,
  pub order_id: Uuid,
  pub product_id: Uuid,
  /// Zero-based position in the checkout sequence.
  pub position: i32,
  pub name: String,
  pub unit_price: Decimal,
  pub quantity: i32,
  pub size: Option<String>,
  pub color: Option<String>,
}

impl OrderLineItem {
  pub fn line_total(&self) -> Decimal {
    self.unit_price * Decimal::from(self.quantity)
  }
}

/// A line item as submitted at checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLineItem {
  pub product_id: Uuid,
  pub name: String,
  pub price: Decimal,
  pub quantity: i32,
  #[serde(default)]
  pub size: Option<String>,
  #[serde(default)]
  pub color: Option<String>,
}
