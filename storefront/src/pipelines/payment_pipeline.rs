// storefront/src/pipelines/payment_pipeline.rs

use crate::errors::{AppError, Result};
use crate::models::{Order, OrderStatus};
use crate::pipelines::common_steps::{issue_receipt, notify_customer, report_downstream_failure, required};
use crate::pipelines::contexts::PaymentCtxData;
use crate::repository::OrderRepository;
use crate::services::notifier::Template;
use crate::services::payment_sim::PaymentResult;
use crate::state::AppState;
use duka_flow::{ContextData, Pipeline, PipelineControl, StepDef};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

pub const PAYMENT_PIPELINE: &str = "payment";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOutcome {
  #[serde(flatten)]
  pub payment: PaymentResult,
  pub receipt_url: Option<String>,
  #[serde(skip)]
  pub order: Order,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub warnings: Vec<String>,
}

pub fn build_payment_pipeline() -> Pipeline<PaymentCtxData, AppError> {
  let mut p = Pipeline::<PaymentCtxData, AppError>::new(
    PAYMENT_PIPELINE,
    vec![
      StepDef::required("load_order"),
      StepDef::required("guard_payable"),
      StepDef::required("charge"),
      StepDef::required("settle"),
      StepDef::required("generate_receipt"),
      StepDef::optional("send_confirmation"),
    ],
  );

  p.on("load_order", load_order);
  p.on("guard_payable", guard_payable);
  p.on("charge", charge);
  p.on("settle", settle);
  p.on("generate_receipt", generate_receipt);
  p.on("send_confirmation", send_confirmation);
  p
}

async fn load_order(ctx: ContextData<PaymentCtxData>) -> Result<PipelineControl> {
  let (state, order_id, requested_by) = ctx.with(|d| (d.state.clone(), d.order_id, d.requested_by));

  let order = state
    .store
    .find_order(order_id)
    .await?
    .filter(|order| requested_by.map_or(true, |user| user == order.user_id))
    .ok_or_else(|| AppError::not_found("Order", order_id))?;

  ctx.update(|d| d.order = Some(order));
  Ok(PipelineControl::Continue)
}

/// An order is paid once, in full, and never after cancellation.
async fn guard_payable(ctx: ContextData<PaymentCtxData>) -> Result<PipelineControl> {
  let (order, amount) = ctx.with(|d| (required(&d.order, "order"), d.amount));
  let order = order?;

  if order.is_paid() {
    return Err(AppError::Conflict(format!(
      "Order {} has already been paid",
      order.order_number
    )));
  }
  if order.status != OrderStatus::Created {
    return Err(AppError::Conflict(format!(
      "Order {} is {} and can no longer be paid",
      order.order_number, order.status
    )));
  }
  if amount != order.total {
    return Err(AppError::Validation(format!(
      "Payment amount {} does not match order total {}",
      amount, order.total
    )));
  }
  Ok(PipelineControl::Continue)
}

async fn charge(ctx: ContextData<PaymentCtxData>) -> Result<PipelineControl> {
  let (state, order_id, phone, amount) = ctx.with(|d| (d.state.clone(), d.order_id, d.phone.clone(), d.amount));
  let payment = state.payments.charge(order_id, &phone, amount).await?;
  ctx.update(|d| d.payment = Some(payment));
  Ok(PipelineControl::Continue)
}

async fn settle(ctx: ContextData<PaymentCtxData>) -> Result<PipelineControl> {
  let (state, order_id) = ctx.with(|d| (d.state.clone(), d.order_id));
  let order = state.store.mark_paid(order_id).await?;
  info!(order_number = %order.order_number, status = %order.status, "Order settled.");
  ctx.update(|d| d.order = Some(order));
  Ok(PipelineControl::Continue)
}

async fn generate_receipt(ctx: ContextData<PaymentCtxData>) -> Result<PipelineControl> {
  let (state, order) = ctx.with(|d| (d.state.clone(), required(&d.order, "order")));
  let order = order?;

  match issue_receipt(&state, order.id).await {
    Ok(updated) => ctx.update(|d| {
      d.receipt_url = updated.receipt_url.clone();
      d.order = Some(updated);
    }),
    Err(err) => {
      let warning = report_downstream_failure(&order.order_number, "receipt", &err);
      ctx.update(|d| d.warnings.push(warning));
    }
  }
  Ok(PipelineControl::Continue)
}

async fn send_confirmation(ctx: ContextData<PaymentCtxData>) -> Result<PipelineControl> {
  let (state, order) = ctx.with(|d| (d.state.clone(), required(&d.order, "order")));
  let order = order?;

  if let Err(err) = notify_customer(&state, order.id, Template::OrderConfirmation).await {
    let warning = report_downstream_failure(&order.order_number, "confirmation email", &err);
    ctx.update(|d| d.warnings.push(warning));
  }
  Ok(PipelineControl::Continue)
}

/// Runs the payment pipeline for one order.
///
/// `requested_by` restricts the payment to the order's owner; pass `None`
/// when ownership was established by the caller.
#[instrument(name = "payment::pay_order", skip(state, phone), err(Display))]
pub async fn pay_order(
  state: &AppState,
  order_id: Uuid,
  requested_by: Option<Uuid>,
  phone: &str,
  amount: Decimal,
) -> Result<PaymentOutcome> {
  let ctx = ContextData::new(PaymentCtxData::new(
    state.clone(),
    order_id,
    requested_by,
    phone.to_string(),
    amount,
  ));
  state.flows.run(ctx.clone()).await?;

  ctx.with(|d| -> Result<PaymentOutcome> {
    Ok(PaymentOutcome {
      payment: required(&d.payment, "payment")?,
      order: required(&d.order, "order")?,
      receipt_url: d.receipt_url.clone(),
      warnings: d.warnings.clone(),
    })
  })
}
