// tests/config_tests.rs

use duka_storefront::config::AppConfig;
use duka_storefront::errors::AppError;
use rust_decimal_macros::dec;
use serial_test::serial;
use std::env;
use std::path::PathBuf;

const VARS: &[&str] = &[
  "SERVER_HOST",
  "SERVER_PORT",
  "APP_BASE_URL",
  "RECEIPTS_DIR",
  "TAX_RATE",
  "SHIPPING_FEE",
  "FREE_SHIPPING_THRESHOLD",
  "ADMIN_API_KEY",
  "DATABASE_URL",
  "TEMP_PURGE_INTERVAL_SECS",
];

fn clear_env() {
  for var in VARS {
    env::remove_var(var);
  }
}

#[test]
#[serial]
fn defaults_apply_when_nothing_is_set() {
  clear_env();
  let config = AppConfig::from_env().expect("config");
  assert_eq!(config.tax_rate, dec!(0.16));
  assert_eq!(config.shipping_fee, dec!(500));
  assert_eq!(config.free_shipping_threshold, dec!(20000));
  assert_eq!(config.receipts_dir, PathBuf::from("receipts"));
  assert!(config.database_url.is_none());
  assert!(config.admin_api_key.is_none());
}

#[test]
#[serial]
fn environment_overrides_defaults() {
  clear_env();
  env::set_var("APP_BASE_URL", "https://duka.example/");
  env::set_var("RECEIPTS_DIR", "/var/lib/duka/receipts");
  env::set_var("SHIPPING_FEE", "350");
  env::set_var("ADMIN_API_KEY", "k");

  let config = AppConfig::from_env().expect("config");
  clear_env();

  assert_eq!(config.app_base_url, "https://duka.example");
  assert_eq!(config.receipts_dir, PathBuf::from("/var/lib/duka/receipts"));
  assert_eq!(config.shipping_fee, dec!(350));
  assert_eq!(config.admin_api_key.as_deref(), Some("k"));
}

#[test]
#[serial]
fn invalid_values_are_config_errors() {
  clear_env();
  env::set_var("TAX_RATE", "1.5");
  assert!(matches!(AppConfig::from_env(), Err(AppError::Config(_))));

  env::set_var("TAX_RATE", "abc");
  assert!(matches!(AppConfig::from_env(), Err(AppError::Config(_))));

  env::remove_var("TAX_RATE");
  env::set_var("SERVER_PORT", "not-a-port");
  assert!(matches!(AppConfig::from_env(), Err(AppError::Config(_))));

  env::remove_var("SERVER_PORT");
  env::set_var("TEMP_PURGE_INTERVAL_SECS", "0");
  assert!(matches!(AppConfig::from_env(), Err(AppError::Config(_))));
  clear_env();
}
