// storefront/src/pipelines/common_steps.rs

//! Building blocks shared by several pipelines.

use crate::errors::{AppError, Result};
use crate::models::Order;
use crate::repository::OrderRepository;
use crate::services::notifier::{Notification, Template};
use crate::services::receipt::format_money;
use crate::state::AppState;
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

/// Returns the value a previous step should have stored in the context.
pub fn required<T: Clone>(value: &Option<T>, what: &str) -> Result<T> {
  value
    .clone()
    .ok_or_else(|| AppError::Internal(format!("{} missing from pipeline context", what)))
}

/// Renders the receipt and records its URL on the order. Unpaid orders
/// have nothing to acknowledge and are refused.
pub async fn issue_receipt(state: &AppState, order_id: Uuid) -> Result<Order> {
  let order = state
    .store
    .find_order(order_id)
    .await?
    .ok_or_else(|| AppError::not_found("Order", order_id))?;
  if !order.is_paid() {
    return Err(AppError::Conflict(format!(
      "Order {} has no completed payment to issue a receipt for",
      order.order_number
    )));
  }

  let location = state.receipts.generate(order_id).await?;
  let order = state.store.attach_receipt_url(order_id, &location.url).await?;
  info!(order_number = %order.order_number, url = %location.url, "Receipt attached to order.");
  Ok(order)
}

/// Sends `template` about the order to the customer who placed it.
pub async fn notify_customer(state: &AppState, order_id: Uuid, template: Template) -> Result<()> {
  let details = state
    .store
    .find_details(order_id)
    .await?
    .ok_or_else(|| AppError::not_found("Order", order_id))?;
  let order = &details.order;
  let data = json!({
    "customerName": details.customer.display_name(),
    "orderNumber": order.order_number,
    "status": order.status,
    "itemCount": details.items.len(),
    "total": format_money(&state.config.currency, order.total),
    "receiptUrl": order.receipt_url,
    "storeName": state.config.store_name,
  });
  state
    .notifier
    .send(Notification::new(details.customer.email.clone(), template, data))
    .await?;
  Ok(())
}

/// Logs a failure that happened after payment on the `operator` target and
/// returns the message to report back to the caller.
pub fn report_downstream_failure(order_number: &str, stage: &str, err: &AppError) -> String {
  error!(
    target: "operator",
    order_number = %order_number,
    stage = stage,
    error = %err,
    "Post-payment step failed; order left in place for reconciliation."
  );
  format!("{} failed: {}", stage, err)
}
