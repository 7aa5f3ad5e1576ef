// storefront/src/web/handlers/admin_handlers.rs

//! Operator endpoints. Every handler takes [`AdminAccess`].

use crate::errors::AppError;
use crate::models::OrderStatus;
use crate::pipelines::change_status;
use crate::pipelines::common_steps::issue_receipt;
use crate::repository::OrderRepository;
use crate::state::AppState;
use crate::web::extractors::AdminAccess;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct StatusUpdatePayload {
  pub status: OrderStatus,
}

#[instrument(name = "handler::admin_get_order", skip(app_state, _admin))]
pub async fn admin_get_order_handler(
  app_state: web::Data<AppState>,
  _admin: AdminAccess,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let order_id = path.into_inner();
  let details = app_state
    .store
    .find_details(order_id)
    .await?
    .ok_or_else(|| AppError::not_found("Order", order_id))?;
  Ok(HttpResponse::Ok().json(details))
}

#[instrument(name = "handler::update_status", skip(app_state, _admin, payload), fields(status = %payload.status))]
pub async fn update_status_handler(
  app_state: web::Data<AppState>,
  _admin: AdminAccess,
  path: web::Path<Uuid>,
  payload: web::Json<StatusUpdatePayload>,
) -> Result<HttpResponse, AppError> {
  let change = change_status(&app_state, path.into_inner(), payload.status).await?;
  Ok(HttpResponse::Ok().json(change))
}

/// Renders the receipt again from the current snapshot.
#[instrument(name = "handler::regenerate_receipt", skip(app_state, _admin))]
pub async fn regenerate_receipt_handler(
  app_state: web::Data<AppState>,
  _admin: AdminAccess,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let order = issue_receipt(&app_state, path.into_inner()).await?;
  info!(order_number = %order.order_number, "Receipt regenerated by operator.");
  Ok(HttpResponse::Ok().json(json!({
    "orderNumber": order.order_number,
    "receiptUrl": order.receipt_url,
  })))
}
