// storefront/src/web/extractors.rs

use crate::errors::AppError;
use crate::state::AppState;
use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};
use futures_util::future::{ready, LocalBoxFuture, Ready};
use tracing::warn;
use uuid::Uuid;

pub const ADMIN_KEY_HEADER: &str = "X-Admin-Key";

fn app_state(req: &HttpRequest) -> Result<web::Data<AppState>, AppError> {
  req
    .app_data::<web::Data<AppState>>()
    .cloned()
    .ok_or_else(|| AppError::Internal("Application state is not configured".to_string()))
}

fn bearer_token(req: &HttpRequest) -> Result<String, AppError> {
  let header = req
    .headers()
    .get(actix_web::http::header::AUTHORIZATION)
    .and_then(|value| value.to_str().ok())
    .ok_or_else(|| AppError::Auth("Missing Authorization header".to_string()))?;
  match header.split_once(' ') {
    Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
      Ok(token.trim().to_string())
    }
    _ => Err(AppError::Auth("Authorization header must be 'Bearer <token>'".to_string())),
  }
}

/// Customer behind a valid `Authorization: Bearer <token>` header.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
  pub user_id: Uuid,
  pub token: String,
}

impl FromRequest for AuthenticatedUser {
  type Error = AppError;
  type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let prepared = app_state(req).and_then(|state| Ok((state, bearer_token(req)?)));
    Box::pin(async move {
      let (state, token) = prepared?;
      match state.auth.authenticate(&token).await {
        Ok(user_id) => Ok(AuthenticatedUser { user_id, token }),
        Err(err) => {
          warn!(error = %err, "Rejected session token.");
          Err(err)
        }
      }
    })
  }
}

/// Request carrying the configured operator key.
#[derive(Debug, Clone, Copy)]
pub struct AdminAccess;

impl FromRequest for AdminAccess {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    ready(check_admin_key(req))
  }
}

fn check_admin_key(req: &HttpRequest) -> Result<AdminAccess, AppError> {
  let state = app_state(req)?;
  let Some(expected) = state.config.admin_api_key.as_deref() else {
    return Err(AppError::Auth("Operator endpoints are disabled".to_string()));
  };
  let provided = req
    .headers()
    .get(ADMIN_KEY_HEADER)
    .and_then(|value| value.to_str().ok())
    .unwrap_or_default();
  if provided.is_empty() || provided != expected {
    warn!("Rejected operator request with a missing or wrong admin key.");
    return Err(AppError::Auth("Invalid admin key".to_string()));
  }
  Ok(AdminAccess)
}
