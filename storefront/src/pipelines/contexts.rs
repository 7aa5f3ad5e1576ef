// storefront/src/pipelines/contexts.rs

//! Context data for each pipeline. Every context carries a clone of the
//! [`AppState`] so handlers can reach the services without globals.

use crate::models::{Order, OrderStatus, ShippingAddress};
use crate::pipelines::checkout_pipeline::CheckoutInput;
use crate::services::payment_sim::PaymentResult;
use crate::services::pricing::PriceBreakdown;
use crate::state::AppState;
use rust_decimal::Decimal;
use uuid::Uuid;

#[derive(Clone)]
pub struct CheckoutCtxData {
  pub state: AppState,
  pub user_id: Uuid,
  pub input: CheckoutInput,

  pub pricing: Option<PriceBreakdown>,
  pub address: Option<ShippingAddress>,
  pub order: Option<Order>,
  pub payment: Option<PaymentResult>,
  pub receipt_url: Option<String>,
  /// Post-payment problems that were logged but did not fail the checkout.
  pub warnings: Vec<String>,
}

impl CheckoutCtxData {
  pub fn new(state: AppState, user_id: Uuid, input: CheckoutInput) -> Self {
    Self {
      state,
      user_id,
      input,
      pricing: None,
      address: None,
      order: None,
      payment: None,
      receipt_url: None,
      warnings: Vec::new(),
    }
  }
}

#[derive(Clone)]
pub struct PaymentCtxData {
  pub state: AppState,
  pub order_id: Uuid,
  /// Customer paying; `None` when the caller has already checked ownership.
  pub requested_by: Option<Uuid>,
  pub phone: String,
  pub amount: Decimal,

  pub order: Option<Order>,
  pub payment: Option<PaymentResult>,
  pub receipt_url: Option<String>,
  pub warnings: Vec<String>,
}

impl PaymentCtxData {
  pub fn new(state: AppState, order_id: Uuid, requested_by: Option<Uuid>, phone: String, amount: Decimal) -> Self {
    Self {
      state,
      order_id,
      requested_by,
      phone,
      amount,
      order: None,
      payment: None,
      receipt_url: None,
      warnings: Vec::new(),
    }
  }
}

#[derive(Clone)]
pub struct StatusUpdateCtxData {
  pub state: AppState,
  pub order_id: Uuid,
  pub target: OrderStatus,

  pub order: Option<Order>,
  /// Set when the order already had the target status.
  pub unchanged: bool,
  pub warnings: Vec<String>,
}

impl StatusUpdateCtxData {
  pub fn new(state: AppState, order_id: Uuid, target: OrderStatus) -> Self {
    Self {
      state,
      order_id,
      target,
      order: None,
      unchanged: false,
      warnings: Vec::new(),
    }
  }

  /// Whether the order is moving to a state the customer hears about.
  pub fn notifies_customer(&self) -> bool {
    matches!(self.target, OrderStatus::Shipped | OrderStatus::Delivered)
  }

  /// A paid order leaving the warehouse must carry a receipt.
  pub fn needs_receipt(&self) -> bool {
    self.notifies_customer()
      && self
        .order
        .as_ref()
        .is_some_and(|order| order.is_paid() && order.receipt_url.is_none())
  }
}
