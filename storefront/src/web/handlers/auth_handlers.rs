// storefront/src/web/handlers/auth_handlers.rs

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

#[derive(Debug, Deserialize)]
pub struct OtpRequestPayload {
  pub email: String,
  #[serde(default)]
  pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OtpVerifyPayload {
  pub email: String,
  pub code: String,
}

#[instrument(name = "handler::request_otp", skip(app_state, payload))]
pub async fn request_otp_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<OtpRequestPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = payload.into_inner();
  app_state.auth.request_otp(&payload.email, payload.name.as_deref()).await?;
  Ok(HttpResponse::Accepted().json(json!({
    "message": "A sign-in code has been sent.",
    "expiresInSecs": app_state.config.otp_ttl.as_secs(),
  })))
}

#[instrument(name = "handler::verify_otp", skip(app_state, payload))]
pub async fn verify_otp_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<OtpVerifyPayload>,
) -> Result<HttpResponse, AppError> {
  let session = app_state.auth.verify_otp(&payload.email, &payload.code).await?;
  Ok(HttpResponse::Ok().json(session))
}

#[instrument(name = "handler::sign_out", skip_all, fields(user_id = %auth_user.user_id))]
pub async fn sign_out_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  app_state.auth.sign_out(&auth_user.token).await?;
  Ok(HttpResponse::NoContent().finish())
}
