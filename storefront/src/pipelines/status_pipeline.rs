// storefront/src/pipelines/status_pipeline.rs

use crate::errors::{AppError, Result};
use crate::models::{Order, OrderStatus};
use crate::pipelines::common_steps::{issue_receipt, notify_customer, report_downstream_failure, required};
use crate::pipelines::contexts::StatusUpdateCtxData;
use crate::repository::OrderRepository;
use crate::services::notifier::Template;
use crate::state::AppState;
use duka_flow::{ContextData, Pipeline, PipelineControl, StepDef};
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

pub const STATUS_PIPELINE: &str = "order_status";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
  #[serde(flatten)]
  pub order: Order,
  pub changed: bool,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub warnings: Vec<String>,
}

pub fn build_status_pipeline() -> Pipeline<StatusUpdateCtxData, AppError> {
  let mut p = Pipeline::<StatusUpdateCtxData, AppError>::new(
    STATUS_PIPELINE,
    vec![
      StepDef::required("load_order"),
      StepDef::required("check_transition"),
      StepDef::required("persist_status"),
      StepDef::optional("ensure_receipt").skip_if(|d: &StatusUpdateCtxData| !d.needs_receipt()),
      StepDef::optional("notify_customer").skip_if(|d: &StatusUpdateCtxData| !d.notifies_customer()),
    ],
  );

  p.on("load_order", load_order);
  p.on("check_transition", check_transition);
  p.on("persist_status", persist_status);
  p.on("ensure_receipt", ensure_receipt);
  p.on("notify_customer", notify);
  p
}

async fn load_order(ctx: ContextData<StatusUpdateCtxData>) -> Result<PipelineControl> {
  let (state, order_id) = ctx.with(|d| (d.state.clone(), d.order_id));
  let order = state
    .store
    .find_order(order_id)
    .await?
    .ok_or_else(|| AppError::not_found("Order", order_id))?;
  ctx.update(|d| d.order = Some(order));
  Ok(PipelineControl::Continue)
}

/// Repeating the current status is a no-op and stops the run, so nothing is
/// written and nobody is notified twice.
async fn check_transition(ctx: ContextData<StatusUpdateCtxData>) -> Result<PipelineControl> {
  let (order, target) = ctx.with(|d| (required(&d.order, "order"), d.target));
  let order = order?;

  if order.status == target {
    info!(order_number = %order.order_number, status = %target, "Order already has this status.");
    ctx.update(|d| d.unchanged = true);
    return Ok(PipelineControl::Stop);
  }
  if target == OrderStatus::Processing && order.status == OrderStatus::Created {
    return Err(AppError::Conflict(format!(
      "Order {} moves to PROCESSING only through payment",
      order.order_number
    )));
  }
  if !order.status.operator_can_move_to(target) {
    return Err(AppError::Conflict(format!(
      "Order {} cannot move from {} to {}",
      order.order_number, order.status, target
    )));
  }
  Ok(PipelineControl::Continue)
}

async fn persist_status(ctx: ContextData<StatusUpdateCtxData>) -> Result<PipelineControl> {
  let (state, order_id, target) = ctx.with(|d| (d.state.clone(), d.order_id, d.target));
  let order = state.store.update_status(order_id, target).await?;
  info!(order_number = %order.order_number, status = %order.status, "Order status updated.");
  ctx.update(|d| d.order = Some(order));
  Ok(PipelineControl::Continue)
}

async fn ensure_receipt(ctx: ContextData<StatusUpdateCtxData>) -> Result<PipelineControl> {
  let (state, order) = ctx.with(|d| (d.state.clone(), required(&d.order, "order")));
  let order = order?;

  match issue_receipt(&state, order.id).await {
    Ok(updated) => ctx.update(|d| d.order = Some(updated)),
    Err(err) => {
      let warning = report_downstream_failure(&order.order_number, "receipt", &err);
      ctx.update(|d| d.warnings.push(warning));
    }
  }
  Ok(PipelineControl::Continue)
}

async fn notify(ctx: ContextData<StatusUpdateCtxData>) -> Result<PipelineControl> {
  let (state, order, target) = ctx.with(|d| (d.state.clone(), required(&d.order, "order"), d.target));
  let order = order?;
  let template = match target {
    OrderStatus::Delivered => Template::OrderDelivered,
    _ => Template::OrderShipped,
  };

  if let Err(err) = notify_customer(&state, order.id, template).await {
    let warning = report_downstream_failure(&order.order_number, "status email", &err);
    ctx.update(|d| d.warnings.push(warning));
  }
  Ok(PipelineControl::Continue)
}

/// Moves an order to `target` on behalf of an operator.
#[instrument(name = "order_status::change", skip(state), err(Display))]
pub async fn change_status(state: &AppState, order_id: Uuid, target: OrderStatus) -> Result<StatusChange> {
  let ctx = ContextData::new(StatusUpdateCtxData::new(state.clone(), order_id, target));
  state.flows.run(ctx.clone()).await?;

  ctx.with(|d| -> Result<StatusChange> {
    Ok(StatusChange {
      order: required(&d.order, "order")?,
      changed: !d.unchanged,
      warnings: d.warnings.clone(),
    })
  })
}

/// Marks an order delivered and tells the customer. Only PROCESSING and
/// SHIPPED orders qualify; a DELIVERED order is left untouched.
pub async fn mark_delivered(state: &AppState, order_id: Uuid) -> Result<StatusChange> {
  change_status(state, order_id, OrderStatus::Delivered).await
}
