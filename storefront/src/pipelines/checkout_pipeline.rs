// storefront/src/pipelines/checkout_pipeline.rs

use crate::errors::{AppError, Result};
use crate::models::{NewAddress, NewLineItem, OrderDetails, PaymentMethod};
use crate::pipelines::common_steps::required;
use crate::pipelines::contexts::CheckoutCtxData;
use crate::pipelines::payment_pipeline::pay_order;
use crate::repository::{CustomerRepository, OrderDraft, OrderRepository};
use crate::services::phone::normalize_msisdn;
use crate::services::pricing::PriceLine;
use crate::state::AppState;
use duka_flow::{ContextData, Pipeline, PipelineControl, StepDef};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

pub const CHECKOUT_PIPELINE: &str = "checkout";

/// Checkout request: a saved address or an inline one, the paying phone
/// number and the cart lines in display order.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutInput {
  #[serde(default)]
  pub address_id: Option<Uuid>,
  #[serde(default)]
  pub address: Option<NewAddress>,
  pub phone: String,
  pub items: Vec<NewLineItem>,
  #[serde(default)]
  pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutOutcome {
  #[serde(flatten)]
  pub details: OrderDetails,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub warnings: Vec<String>,
}

pub fn build_checkout_pipeline() -> Pipeline<CheckoutCtxData, AppError> {
  let mut p = Pipeline::<CheckoutCtxData, AppError>::new(
    CHECKOUT_PIPELINE,
    vec![
      StepDef::required("validate_input"),
      StepDef::required("price_items"),
      StepDef::required("resolve_address"),
      StepDef::required("create_order"),
      StepDef::required("process_payment"),
    ],
  );

  p.on("validate_input", validate_input);
  p.on("price_items", price_items);
  p.on("resolve_address", resolve_address);
  p.on("create_order", create_order);
  p.on("process_payment", process_payment);
  p
}

/// Everything that can be rejected without touching storage is rejected here.
async fn validate_input(ctx: ContextData<CheckoutCtxData>) -> Result<PipelineControl> {
  ctx.with(|d| -> Result<()> {
    let input = &d.input;
    if input.items.is_empty() {
      return Err(AppError::Validation("Checkout requires at least one item".to_string()));
    }
    for (index, item) in input.items.iter().enumerate() {
      if item.name.trim().is_empty() {
        return Err(AppError::Validation(format!("Item {} has no name", index)));
      }
      if item.quantity < 1 {
        return Err(AppError::Validation(format!(
          "Item {} ('{}') must have a quantity of at least 1",
          index, item.name
        )));
      }
    }
    normalize_msisdn(&input.phone)?;
    match (&input.address_id, &input.address) {
      (Some(_), Some(_)) => Err(AppError::Validation(
        "Provide either addressId or address, not both".to_string(),
      )),
      (None, None) => Err(AppError::Validation("A shipping address is required".to_string())),
      (None, Some(address)) => address.validate(),
      (Some(_), None) => Ok(()),
    }
  })?;
  Ok(PipelineControl::Continue)
}

async fn price_items(ctx: ContextData<CheckoutCtxData>) -> Result<PipelineControl> {
  let quote = ctx.with(|d| {
    let lines: Vec<PriceLine> = d.input.items.iter().map(|i| PriceLine::new(i.price, i.quantity)).collect();
    d.state.pricing.quote(&lines)
  })?;
  ctx.update(|d| d.pricing = Some(quote));
  Ok(PipelineControl::Continue)
}

async fn resolve_address(ctx: ContextData<CheckoutCtxData>) -> Result<PipelineControl> {
  let (state, user_id, address_id, inline) =
    ctx.with(|d| (d.state.clone(), d.user_id, d.input.address_id, d.input.address.clone()));

  let address = match (address_id, inline) {
    (Some(address_id), _) => state
      .store
      .find_address(address_id)
      .await?
      .filter(|address| address.user_id == user_id)
      .ok_or_else(|| AppError::not_found("Address", address_id))?,
    (None, Some(inline)) => state.store.create_address(user_id, inline).await?,
    (None, None) => return Err(AppError::Validation("A shipping address is required".to_string())),
  };

  ctx.update(|d| d.address = Some(address));
  Ok(PipelineControl::Continue)
}

fn order_draft(d: &CheckoutCtxData) -> Result<OrderDraft> {
  Ok(OrderDraft {
    user_id: d.user_id,
    address_id: required(&d.address, "address")?.id,
    items: d.input.items.clone(),
    pricing: required(&d.pricing, "pricing")?,
    payment_method: PaymentMethod::MobileMoney,
    notes: d.input.notes.clone().filter(|n| !n.trim().is_empty()),
  })
}

async fn create_order(ctx: ContextData<CheckoutCtxData>) -> Result<PipelineControl> {
  let (state, draft) = ctx.with(|d| (d.state.clone(), order_draft(d)));

  let order = state.store.create_order(draft?).await?;
  info!(order_number = %order.order_number, total = %order.total, "Order created.");
  ctx.update(|d| d.order = Some(order));
  Ok(PipelineControl::Continue)
}

/// Hands the new order to the payment pipeline, which also takes care of
/// the receipt and the confirmation email.
async fn process_payment(ctx: ContextData<CheckoutCtxData>) -> Result<PipelineControl> {
  let (state, user_id, phone, order) =
    ctx.with(|d| (d.state.clone(), d.user_id, d.input.phone.clone(), required(&d.order, "order")));
  let order = order?;

  let outcome = pay_order(&state, order.id, Some(user_id), &phone, order.total).await?;
  ctx.update(|d| {
    d.payment = Some(outcome.payment);
    d.order = Some(outcome.order);
    d.receipt_url = outcome.receipt_url;
    d.warnings.extend(outcome.warnings);
  });
  Ok(PipelineControl::Continue)
}

/// Places and pays an order for `user_id`.
///
/// Failures before the charge leave nothing behind except a saved inline
/// address. Receipt and email problems after the charge are reported in
/// [`CheckoutOutcome::warnings`] instead of failing the checkout.
#[instrument(name = "checkout", skip(state, input), fields(items = input.items.len()), err(Display))]
pub async fn checkout(state: &AppState, user_id: Uuid, input: CheckoutInput) -> Result<CheckoutOutcome> {
  let ctx = ContextData::new(CheckoutCtxData::new(state.clone(), user_id, input));
  state.flows.run(ctx.clone()).await?;

  let (order, warnings) = ctx.with(|d| (required(&d.order, "order"), d.warnings.clone()));
  let order = order?;
  let details = state
    .store
    .find_details(order.id)
    .await?
    .ok_or_else(|| AppError::not_found("Order", order.id))?;

  Ok(CheckoutOutcome { details, warnings })
}
