// storefront/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use rust_decimal::Decimal;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  /// When unset the server keeps everything in memory.
  pub database_url: Option<String>,
  /// Prefix of every public URL handed out, receipt links included.
  pub app_base_url: String,

  pub store_name: String,
  pub currency: String,
  pub tax_rate: Decimal,
  pub shipping_fee: Decimal,
  pub free_shipping_threshold: Decimal,

  /// Flat directory holding `{orderNumber}.pdf` files.
  pub receipts_dir: PathBuf,

  pub mock_payment_provider: String,
  pub mock_payment_latency: Duration,
  pub mock_email_sender: String,

  /// Operator endpoints are disabled when unset.
  pub admin_api_key: Option<String>,
  pub otp_ttl: Duration,
  pub session_ttl: Duration,
  /// How often expired sign-in codes and sessions are swept.
  pub temp_purge_interval: Duration,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      server_host: "127.0.0.1".to_string(),
      server_port: 8080,
      database_url: None,
      app_base_url: "http://127.0.0.1:8080".to_string(),
      store_name: "Duka".to_string(),
      currency: "KES".to_string(),
      tax_rate: Decimal::new(16, 2),
      shipping_fee: Decimal::new(500, 0),
      free_shipping_threshold: Decimal::new(20_000, 0),
      receipts_dir: PathBuf::from("receipts"),
      mock_payment_provider: "M-Pesa (simulated)".to_string(),
      mock_payment_latency: Duration::from_millis(50),
      mock_email_sender: "noreply@duka.example".to_string(),
      admin_api_key: None,
      otp_ttl: Duration::from_secs(300),
      session_ttl: Duration::from_secs(86_400),
      temp_purge_interval: Duration::from_secs(60),
    }
  }
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok();
    let defaults = Self::default();

    let server_host = optional_env("SERVER_HOST").unwrap_or(defaults.server_host);
    let server_port = parse_env("SERVER_PORT", defaults.server_port)?;
    let app_base_url = optional_env("APP_BASE_URL")
      .unwrap_or_else(|| format!("http://{}:{}", server_host, server_port))
      .trim_end_matches('/')
      .to_string();

    let tax_rate = parse_env("TAX_RATE", defaults.tax_rate)?;
    if tax_rate < Decimal::ZERO || tax_rate >= Decimal::ONE {
      return Err(AppError::Config(format!("TAX_RATE must be in [0, 1), got {}", tax_rate)));
    }
    let shipping_fee = parse_env("SHIPPING_FEE", defaults.shipping_fee)?;
    let free_shipping_threshold = parse_env("FREE_SHIPPING_THRESHOLD", defaults.free_shipping_threshold)?;
    if shipping_fee < Decimal::ZERO || free_shipping_threshold < Decimal::ZERO {
      return Err(AppError::Config(
        "SHIPPING_FEE and FREE_SHIPPING_THRESHOLD must not be negative".to_string(),
      ));
    }

    let config = Self {
      server_host,
      server_port,
      database_url: optional_env("DATABASE_URL"),
      app_base_url,
      store_name: optional_env("STORE_NAME").unwrap_or(defaults.store_name),
      currency: optional_env("CURRENCY").unwrap_or(defaults.currency),
      tax_rate,
      shipping_fee,
      free_shipping_threshold,
      receipts_dir: optional_env("RECEIPTS_DIR")
        .map(PathBuf::from)
        .unwrap_or(defaults.receipts_dir),
      mock_payment_provider: optional_env("MOCK_PAYMENT_PROVIDER").unwrap_or(defaults.mock_payment_provider),
      mock_payment_latency: Duration::from_millis(parse_env("MOCK_PAYMENT_LATENCY_MS", 50u64)?),
      mock_email_sender: optional_env("MOCK_EMAIL_SENDER").unwrap_or(defaults.mock_email_sender),
      admin_api_key: optional_env("ADMIN_API_KEY"),
      otp_ttl: Duration::from_secs(parse_env("OTP_TTL_SECS", defaults.otp_ttl.as_secs())?),
      session_ttl: Duration::from_secs(parse_env("SESSION_TTL_SECS", defaults.session_ttl.as_secs())?),
      temp_purge_interval: Duration::from_secs(parse_env(
        "TEMP_PURGE_INTERVAL_SECS",
        defaults.temp_purge_interval.as_secs(),
      )?),
    };
    if config.temp_purge_interval.is_zero() {
      return Err(AppError::Config("TEMP_PURGE_INTERVAL_SECS must be at least 1".to_string()));
    }

    tracing::info!(
      base_url = %config.app_base_url,
      receipts_dir = %config.receipts_dir.display(),
      persistent = config.database_url.is_some(),
      "Application configuration loaded."
    );
    Ok(config)
  }
}

fn optional_env(var_name: &str) -> Option<String> {
  env::var(var_name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(var_name: &str, default: T) -> Result<T>
where
  T: FromStr,
  T::Err: std::fmt::Display,
{
  match optional_env(var_name) {
    Some(raw) => raw
      .trim()
      .parse::<T>()
      .map_err(|e| AppError::Config(format!("Invalid {}: {}", var_name, e))),
    None => Ok(default),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_match_flat_pricing_policy() {
    let config = AppConfig::default();
    assert_eq!(config.tax_rate.to_string(), "0.16");
    assert_eq!(config.shipping_fee, Decimal::new(500, 0));
    assert_eq!(config.free_shipping_threshold, Decimal::new(20_000, 0));
  }
}
