// storefront/src/web/handlers/payment_handlers.rs

use crate::errors::AppError;
use crate::pipelines::pay_order;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;
use actix_web::{web, HttpResponse};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequestPayload {
  pub order_id: Uuid,
  pub phone: String,
  pub amount: Decimal,
}

/// Pays an existing unpaid order, e.g. one whose checkout stopped at the charge.
#[instrument(
  name = "handler::pay_order",
  skip(app_state, payload, auth_user),
  fields(user_id = %auth_user.user_id, order_id = %payload.order_id)
)]
pub async fn pay_order_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  payload: web::Json<PaymentRequestPayload>,
) -> Result<HttpResponse, AppError> {
  let outcome = pay_order(
    &app_state,
    payload.order_id,
    Some(auth_user.user_id),
    &payload.phone,
    payload.amount,
  )
  .await?;
  Ok(HttpResponse::Ok().json(outcome))
}
