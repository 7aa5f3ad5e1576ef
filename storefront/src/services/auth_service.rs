// storefront/src/services/auth_service.rs

//! One-time-code sign-in and opaque session tokens, both kept in a
//! [`TempStore`].

use crate::errors::{AppError, Result};
use crate::models::Customer;
use crate::repository::{CustomerRepository, Store};
use crate::services::notifier::{Notification, Notifier, Template};
use crate::services::temp_store::TempStore;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Guesses allowed per issued code. The code is burned once they run out.
pub const MAX_OTP_ATTEMPTS: u64 = 5;

#[derive(Debug, Serialize, Deserialize)]
struct PendingCode {
  code: String,
  name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
  pub token: String,
  pub expires_in_secs: u64,
  pub customer: Customer,
}

pub struct AuthService {
  temp_store: Arc<dyn TempStore>,
  store: Arc<dyn Store>,
  notifier: Arc<dyn Notifier>,
  otp_ttl: Duration,
  session_ttl: Duration,
}

fn otp_key(email: &str) -> String {
  format!("otp:{}", email)
}

fn attempts_key(email: &str) -> String {
  format!("otp_attempts:{}", email)
}

fn session_key(token: &str) -> String {
  format!("session:{}", token)
}

fn generate_code() -> String {
  format!("{:06}", rand::thread_rng().gen_range(0..1_000_000u32))
}

/// Lower-cases and trims an email address, rejecting obviously bad ones.
pub fn normalize_email(raw: &str) -> Result<String> {
  let email = raw.trim().to_lowercase();
  let valid = match email.split_once('@') {
    Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.'),
    None => false,
  };
  if !valid || email.contains(char::is_whitespace) {
    return Err(AppError::Validation(format!("'{}' is not a valid email address", raw.trim())));
  }
  Ok(email)
}

impl AuthService {
  pub fn new(
    temp_store: Arc<dyn TempStore>,
    store: Arc<dyn Store>,
    notifier: Arc<dyn Notifier>,
    otp_ttl: Duration,
    session_ttl: Duration,
  ) -> Self {
    Self {
      temp_store,
      store,
      notifier,
      otp_ttl,
      session_ttl,
    }
  }

  /// Issues a fresh six-digit code for `email` and mails it. A new request
  /// replaces any outstanding code.
  #[instrument(name = "auth_service::request_otp", skip(self, name), err(Display))]
  pub async fn request_otp(&self, email: &str, name: Option<&str>) -> Result<()> {
    let email = normalize_email(email)?;
    let code = generate_code();
    let pending = PendingCode {
      code: code.clone(),
      name: name.map(str::to_string),
    };
    let payload = serde_json::to_string(&pending).map_err(|e| AppError::Internal(e.to_string()))?;
    self.temp_store.put(&otp_key(&email), payload, self.otp_ttl).await?;
    self.temp_store.take(&attempts_key(&email)).await?;

    self
      .notifier
      .send(Notification::new(
        email.clone(),
        Template::OtpCode,
        json!({ "code": code, "expiresInSecs": self.otp_ttl.as_secs() }),
      ))
      .await?;
    info!("Sign-in code issued.");
    Ok(())
  }

  /// Checks `code` against the outstanding one. A correct code is consumed
  /// and exchanged for a session. A wrong one leaves it in place until
  /// [`MAX_OTP_ATTEMPTS`] guesses have been made, after which the code is
  /// discarded and a new one must be requested.
  #[instrument(name = "auth_service::verify_otp", skip(self, code), err(Display))]
  pub async fn verify_otp(&self, email: &str, code: &str) -> Result<Session> {
    let email = normalize_email(email)?;
    let key = otp_key(&email);
    let stored = self
      .temp_store
      .get(&key)
      .await?
      .ok_or_else(|| AppError::Auth("No active sign-in code for this email".to_string()))?;
    let pending: PendingCode = serde_json::from_str(&stored).map_err(|e| AppError::Internal(e.to_string()))?;

    // Counted before comparing, so parallel guesses share the same budget.
    let counter_key = attempts_key(&email);
    let attempt = self.temp_store.incr(&counter_key, self.otp_ttl).await?;
    if attempt > MAX_OTP_ATTEMPTS {
      self.temp_store.take(&key).await?;
      self.temp_store.take(&counter_key).await?;
      warn!(attempt, "Sign-in code discarded after too many attempts.");
      return Err(AppError::Auth(
        "Too many attempts; request a new sign-in code".to_string(),
      ));
    }
    if pending.code != code.trim() {
      warn!(attempt, "Sign-in code mismatch.");
      return Err(AppError::Auth("Invalid sign-in code".to_string()));
    }
    if self.temp_store.take(&key).await?.is_none() {
      return Err(AppError::Auth("Sign-in code expired".to_string()));
    }
    self.temp_store.take(&counter_key).await?;

    let customer = self.store.upsert_customer(&email, pending.name.as_deref()).await?;
    let token = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
    self
      .temp_store
      .put(&session_key(&token), customer.id.to_string(), self.session_ttl)
      .await?;

    info!(customer_id = %customer.id, "Session opened.");
    Ok(Session {
      token,
      expires_in_secs: self.session_ttl.as_secs(),
      customer,
    })
  }

  /// Resolves a bearer token to the customer id it was issued for.
  pub async fn authenticate(&self, token: &str) -> Result<Uuid> {
    let raw = self
      .temp_store
      .get(&session_key(token))
      .await?
      .ok_or_else(|| AppError::Auth("Invalid or expired session token".to_string()))?;
    let customer_id = Uuid::parse_str(&raw).map_err(|_| AppError::Auth("Corrupt session".to_string()))?;
    debug!(%customer_id, "Session token accepted.");
    Ok(customer_id)
  }

  pub async fn sign_out(&self, token: &str) -> Result<()> {
    self.temp_store.take(&session_key(token)).await?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::repository::MemoryStore;
  use crate::services::notifier::MockEmailNotifier;
  use crate::services::temp_store::MemoryTempStore;

  fn service(notifier: Arc<MockEmailNotifier>, otp_ttl: Duration) -> AuthService {
    AuthService::new(
      Arc::new(MemoryTempStore::new()),
      Arc::new(MemoryStore::new()),
      notifier,
      otp_ttl,
      Duration::from_secs(60),
    )
  }

  fn last_code(notifier: &MockEmailNotifier) -> String {
    let sent = notifier.sent_with(Template::OtpCode);
    sent.last().unwrap().notification.data["code"].as_str().unwrap().to_string()
  }

  #[test]
  fn email_normalization() {
    assert_eq!(normalize_email("  Amina@Example.COM ").unwrap(), "amina@example.com");
    assert!(normalize_email("amina").is_err());
    assert!(normalize_email("@example.com").is_err());
    assert!(normalize_email("amina@localhost").is_err());
  }

  #[tokio::test]
  async fn code_round_trip_opens_a_session() {
    let notifier = Arc::new(MockEmailNotifier::new("shop@example.com"));
    let auth = service(notifier.clone(), Duration::from_secs(60));

    auth.request_otp("amina@example.com", Some("Amina")).await.unwrap();
    let code = last_code(&notifier);
    assert_eq!(code.len(), 6);

    let session = auth.verify_otp("AMINA@example.com", &code).await.unwrap();
    assert_eq!(session.customer.name.as_deref(), Some("Amina"));
    assert_eq!(auth.authenticate(&session.token).await.unwrap(), session.customer.id);

    // The code is single use.
    assert!(matches!(
      auth.verify_otp("amina@example.com", &code).await,
      Err(AppError::Auth(_))
    ));
  }

  #[tokio::test]
  async fn wrong_code_is_rejected_and_right_code_still_works() {
    let notifier = Arc::new(MockEmailNotifier::new("shop@example.com"));
    let auth = service(notifier.clone(), Duration::from_secs(60));
    auth.request_otp("baraka@example.com", None).await.unwrap();
    let code = last_code(&notifier);
    let wrong = if code == "000000" { "111111" } else { "000000" };

    assert!(matches!(
      auth.verify_otp("baraka@example.com", wrong).await,
      Err(AppError::Auth(_))
    ));
    assert!(auth.verify_otp("baraka@example.com", &code).await.is_ok());
  }

  #[tokio::test]
  async fn code_is_burned_after_too_many_wrong_guesses() {
    let notifier = Arc::new(MockEmailNotifier::new("shop@example.com"));
    let auth = service(notifier.clone(), Duration::from_secs(60));
    auth.request_otp("eli@example.com", None).await.unwrap();
    let code = last_code(&notifier);
    let wrong = if code == "000000" { "111111" } else { "000000" };

    for _ in 0..MAX_OTP_ATTEMPTS {
      assert!(matches!(
        auth.verify_otp("eli@example.com", wrong).await,
        Err(AppError::Auth(_))
      ));
    }
    assert!(matches!(
      auth.verify_otp("eli@example.com", &code).await,
      Err(AppError::Auth(_))
    ));

    // A fresh code gets a fresh budget.
    auth.request_otp("eli@example.com", None).await.unwrap();
    let fresh = last_code(&notifier);
    let wrong = if fresh == "000000" { "111111" } else { "000000" };
    for _ in 0..MAX_OTP_ATTEMPTS - 1 {
      assert!(auth.verify_otp("eli@example.com", wrong).await.is_err());
    }
    assert!(auth.verify_otp("eli@example.com", &fresh).await.is_ok());
  }

  #[tokio::test]
  async fn expired_codes_are_rejected() {
    let notifier = Arc::new(MockEmailNotifier::new("shop@example.com"));
    let auth = service(notifier.clone(), Duration::from_millis(10));
    auth.request_otp("chebet@example.com", None).await.unwrap();
    let code = last_code(&notifier);

    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(matches!(
      auth.verify_otp("chebet@example.com", &code).await,
      Err(AppError::Auth(_))
    ));
  }

  #[tokio::test]
  async fn unknown_and_revoked_tokens_are_rejected() {
    let notifier = Arc::new(MockEmailNotifier::new("shop@example.com"));
    let auth = service(notifier.clone(), Duration::from_secs(60));
    assert!(matches!(auth.authenticate("nope").await, Err(AppError::Auth(_))));

    auth.request_otp("dan@example.com", None).await.unwrap();
    let session = auth.verify_otp("dan@example.com", &last_code(&notifier)).await.unwrap();
    auth.sign_out(&session.token).await.unwrap();
    assert!(matches!(auth.authenticate(&session.token).await, Err(AppError::Auth(_))));
  }
}
