// storefront/src/services/phone.rs

//! Mobile-money phone numbers.

use crate::errors::{AppError, Result};

const COUNTRY_CODE: &str = "254";

/// Normalises a Kenyan mobile number to `254` followed by nine digits.
///
/// Accepts `07XXXXXXXX`, `01XXXXXXXX`, `+2547…`, `2547…` (and the `1`
/// variants), ignoring spaces and dashes.
pub fn normalize_msisdn(raw: &str) -> Result<String> {
  let compact: String = raw.chars().filter(|c| !c.is_whitespace() && *c != '-').collect();

  let national = if let Some(rest) = compact.strip_prefix('+') {
    rest.strip_prefix(COUNTRY_CODE)
  } else if let Some(rest) = compact.strip_prefix(COUNTRY_CODE) {
    Some(rest)
  } else {
    compact.strip_prefix('0')
  };

  match national {
    Some(digits)
      if digits.len() == 9
        && digits.chars().all(|c| c.is_ascii_digit())
        && (digits.starts_with('7') || digits.starts_with('1')) =>
    {
      Ok(format!("{}{}", COUNTRY_CODE, digits))
    }
    _ => Err(AppError::Validation(format!(
      "'{}' is not a valid mobile money number",
      raw.trim()
    ))),
  }
}
