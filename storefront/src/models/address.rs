// storefront/src/models/address.rs

use crate::errors::{AppError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
  pub id: Uuid,
  pub user_id: Uuid,
  pub recipient_name: String,
  pub phone: String,
  pub line1: String,
  pub line2: Option<String>,
  pub city: String,
  pub region: Option<String>,
  pub postal_code: Option<String>,
  pub created_at: DateTime<Utc>,
}

impl ShippingAddress {
  /// Address lines as printed on a receipt.
  pub fn lines(&self) -> Vec<String> {
    let mut lines = vec![self.recipient_name.clone(), self.line1.clone()];
    if let Some(line2) = self.line2.as_deref().filter(|l| !l.is_empty()) {
      lines.push(line2.to_string());
    }
    let mut locality = self.city.clone();
    if let Some(region) = self.region.as_deref().filter(|r| !r.is_empty()) {
      locality.push_str(", ");
      locality.push_str(region);
    }
    if let Some(code) = self.postal_code.as_deref().filter(|c| !c.is_empty()) {
      locality.push(' ');
      locality.push_str(code);
    }
    lines.push(locality);
    lines.push(self.phone.clone());
    lines
  }
}

/// Inline address submitted with a checkout.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAddress {
  pub recipient_name: String,
  pub phone: String,
  pub line1: String,
  #[serde(default)]
  pub line2: Option<String>,
  pub city: String,
  #[serde(default)]
  pub region: Option<String>,
  #[serde(default)]
  pub postal_code: Option<String>,
}

impl NewAddress {
  pub fn validate(&self) -> Result<()> {
    let required = [
      ("recipientName", &self.recipient_name),
      ("phone", &self.phone),
      ("line1", &self.line1),
      ("city", &self.city),
    ];
    for (field, value) in required {
      if value.trim().is_empty() {
        return Err(AppError::Validation(format!("Address field '{}' is required", field)));
      }
    }
    Ok(())
  }
}
