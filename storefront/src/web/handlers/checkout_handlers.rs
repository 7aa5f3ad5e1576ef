// storefront/src/web/handlers/checkout_handlers.rs

use crate::errors::AppError;
use crate::pipelines::{checkout, CheckoutInput};
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;
use actix_web::{web, HttpResponse};
use tracing::{info, instrument, warn};

#[instrument(
  name = "handler::checkout",
  skip(app_state, payload, auth_user),
  fields(user_id = %auth_user.user_id, items = payload.items.len())
)]
pub async fn checkout_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  payload: web::Json<CheckoutInput>,
) -> Result<HttpResponse, AppError> {
  let outcome = checkout(&app_state, auth_user.user_id, payload.into_inner()).await?;

  if outcome.warnings.is_empty() {
    info!(order_number = %outcome.details.order.order_number, "Checkout completed.");
  } else {
    warn!(
      order_number = %outcome.details.order.order_number,
      warnings = ?outcome.warnings,
      "Checkout completed with post-payment problems."
    );
  }
  Ok(HttpResponse::Created().json(outcome))
}
