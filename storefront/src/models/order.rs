// storefront/src/models/order.rs

use super::{Customer, OrderLineItem, Payment, ShippingAddress};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type as SqlxType};
use std::fmt;
use uuid::Uuid;

/// Fulfilment stage of an order. Distinct from [`PaymentStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, SqlxType)]
#[sqlx(type_name = "order_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
  Created,
  Processing,
  Shipped,
  Delivered,
  Cancelled,
}

impl OrderStatus {
  pub fn is_terminal(self) -> bool {
    matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
  }

  /// Whether an operator may move an order from `self` to `next`.
  ///
  /// `Created -> Processing` is absent on purpose: only a completed payment
  /// performs that transition.
  pub fn operator_can_move_to(self, next: OrderStatus) -> bool {
    use OrderStatus::*;
    matches!(
      (self, next),
      (Processing, Shipped) | (Processing, Delivered) | (Shipped, Delivered) | (Created, Cancelled) | (Processing, Cancelled) | (Shipped, Cancelled)
    )
  }

  pub fn as_str(self) -> &'static str {
    match self {
      OrderStatus::Created => "CREATED",
      OrderStatus::Processing => "PROCESSING",
      OrderStatus::Shipped => "SHIPPED",
      OrderStatus::Delivered => "DELIVERED",
      OrderStatus::Cancelled => "CANCELLED",
    }
  }
}

impl fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, SqlxType)]
#[sqlx(type_name = "payment_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
  Pending,
  Completed,
  Failed,
}

impl fmt::Display for PaymentStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      PaymentStatus::Pending => "PENDING",
      PaymentStatus::Completed => "COMPLETED",
      PaymentStatus::Failed => "FAILED",
    };
    f.write_str(s)
  }
}

/// Only mobile money is accepted; cash on delivery is not offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, SqlxType)]
#[sqlx(type_name = "payment_method", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
  #[default]
  MobileMoney,
}

impl PaymentMethod {
  pub fn label(self) -> &'static str {
    match self {
      PaymentMethod::MobileMoney => "Mobile Money",
    }
  }
}

/// Order header. Amounts are fixed when the order is created and never
/// recomputed afterwards.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
  pub id: Uuid,
  pub order_number: String,
  pub user_id: Uuid,
  pub address_id: Uuid,
  pub subtotal: Decimal,
  pub tax: Decimal,
  pub shipping_cost: Decimal,
  pub total: Decimal,
  pub payment_method: PaymentMethod,
  pub status: OrderStatus,
  pub payment_status: PaymentStatus,
  pub receipt_url: Option<String>,
  pub notes: Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Order {
  pub fn is_paid(&self) -> bool {
    self.payment_status == PaymentStatus::Completed
  }
}

/// An order together with everything a receipt or an API response needs.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetails {
  #[serde(flatten)]
  pub order: Order,
  pub items: Vec<OrderLineItem>,
  pub address: ShippingAddress,
  pub customer: Customer,
  pub payment: Option<Payment>,
}

#[cfg(test)]
mod tests {
  use super::OrderStatus::*;

  #[test]
  fn terminal_states() {
    assert!(Delivered.is_terminal());
    assert!(Cancelled.is_terminal());
    assert!(!Created.is_terminal());
    assert!(!Processing.is_terminal());
    assert!(!Shipped.is_terminal());
  }

  #[test]
  fn operator_transitions() {
    assert!(Processing.operator_can_move_to(Shipped));
    assert!(Shipped.operator_can_move_to(Delivered));
    assert!(Processing.operator_can_move_to(Delivered));
    assert!(Created.operator_can_move_to(Cancelled));

    assert!(!Created.operator_can_move_to(Processing));
    assert!(!Created.operator_can_move_to(Delivered));
    assert!(!Cancelled.operator_can_move_to(Delivered));
    assert!(!Delivered.operator_can_move_to(Cancelled));
    assert!(!Shipped.operator_can_move_to(Processing));
  }
}
