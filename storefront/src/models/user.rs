// storefront/src/models/user.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
  pub id: Uuid,
  pub email: String,
  pub name: Option<String>,
  pub created_at: DateTime<Utc>,
}

impl Customer {
  /// Name shown on receipts and in greetings.
  pub fn display_name(&self) -> &str {
    match self.name.as_deref() {
      Some(name) if !name.trim().is_empty() => name,
      _ => &self.email,
    }
  }
}
