// storefront/src/web/handlers/order_handlers.rs

use crate::errors::AppError;
use crate::repository::OrderRepository;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;
use actix_web::{web, HttpResponse};
use tracing::instrument;
use uuid::Uuid;

#[instrument(name = "handler::list_orders", skip_all, fields(user_id = %auth_user.user_id))]
pub async fn list_orders_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let orders = app_state.store.find_by_user(auth_user.user_id).await?;
  Ok(HttpResponse::Ok().json(orders))
}

/// Other customers' orders are reported as missing.
#[instrument(name = "handler::get_order", skip(app_state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let order_id = path.into_inner();
  let details = app_state
    .store
    .find_details(order_id)
    .await?
    .filter(|details| details.order.user_id == auth_user.user_id)
    .ok_or_else(|| AppError::not_found("Order", order_id))?;
  Ok(HttpResponse::Ok().json(details))
}
