// storefront/src/services/pricing.rs

//! Order pricing. Pure: no I/O, no clock, no randomness.

use crate::config::AppConfig;
use crate::errors::AppError;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use thiserror::Error;

/// Decimal places stored for every money column.
pub const MONEY_SCALE: u32 = 2;

/// Largest amount a money column holds (`NUMERIC(14, 2)`).
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(276_447_231, 23_283, 0, false, 2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceLine {
  pub unit_price: Decimal,
  pub quantity: i32,
}

impl PriceLine {
  pub fn new(unit_price: Decimal, quantity: i32) -> Self {
    Self { unit_price, quantity }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBreakdown {
  pub subtotal: Decimal,
  pub tax: Decimal,
  pub shipping: Decimal,
  pub total: Decimal,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PricingError {
  #[error("order has no line items")]
  Empty,
  #[error("line {index} has a negative price ({price})")]
  NegativePrice { index: usize, price: Decimal },
  #[error("line {index} has a non-positive quantity ({quantity})")]
  NonPositiveQuantity { index: usize, quantity: i32 },
  #[error("line {index} has a price with more than {} decimal places ({price})", MONEY_SCALE)]
  TooPrecise { index: usize, price: Decimal },
  #[error("order amount exceeds {}", MAX_AMOUNT)]
  Overflow,
}

impl From<PricingError> for AppError {
  fn from(err: PricingError) -> Self {
    AppError::Validation(err.to_string())
  }
}

/// Flat tax plus a fixed shipping fee waived at or above a threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricingPolicy {
  pub tax_rate: Decimal,
  pub shipping_fee: Decimal,
  pub free_shipping_threshold: Decimal,
  /// Decimal places of the smallest display unit the tax is rounded to.
  pub display_scale: u32,
}

impl Default for PricingPolicy {
  fn default() -> Self {
    Self {
      tax_rate: Decimal::new(16, 2),
      shipping_fee: Decimal::new(500, 0),
      free_shipping_threshold: Decimal::new(20_000, 0),
      display_scale: 0,
    }
  }
}

impl PricingPolicy {
  pub fn from_config(config: &AppConfig) -> Self {
    Self {
      tax_rate: config.tax_rate,
      shipping_fee: config.shipping_fee,
      free_shipping_threshold: config.free_shipping_threshold,
      ..Self::default()
    }
  }

  pub fn shipping_for(&self, subtotal: Decimal) -> Decimal {
    if subtotal >= self.free_shipping_threshold {
      Decimal::ZERO
    } else {
      self.shipping_fee
    }
  }

  /// Prices `lines`. The tax is the only rounded figure (half away from
  /// zero) and the total is the exact sum of the three parts.
  pub fn quote(&self, lines: &[PriceLine]) -> Result<PriceBreakdown, PricingError> {
    if lines.is_empty() {
      return Err(PricingError::Empty);
    }

    let mut subtotal = Decimal::ZERO;
    for (index, line) in lines.iter().enumerate() {
      if line.unit_price < Decimal::ZERO {
        return Err(PricingError::NegativePrice {
          index,
          price: line.unit_price,
        });
      }
      if line.quantity < 1 {
        return Err(PricingError::NonPositiveQuantity {
          index,
          quantity: line.quantity,
        });
      }
      if line.unit_price.normalize().scale() > MONEY_SCALE {
        return Err(PricingError::TooPrecise {
          index,
          price: line.unit_price,
        });
      }
      subtotal = line
        .unit_price
        .checked_mul(Decimal::from(line.quantity))
        .and_then(|line_total| subtotal.checked_add(line_total))
        .ok_or(PricingError::Overflow)?;
    }

    let tax = subtotal
      .checked_mul(self.tax_rate)
      .ok_or(PricingError::Overflow)?
      .round_dp_with_strategy(self.display_scale, RoundingStrategy::MidpointAwayFromZero);
    let shipping = self.shipping_for(subtotal);
    let total = subtotal
      .checked_add(tax)
      .and_then(|t| t.checked_add(shipping))
      .filter(|t| *t <= MAX_AMOUNT)
      .ok_or(PricingError::Overflow)?;

    Ok(PriceBreakdown {
      subtotal,
      tax,
      shipping,
      total,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use proptest::prelude::*;
  use rust_decimal_macros::dec;

  fn policy() -> PricingPolicy {
    PricingPolicy::default()
  }

  #[test]
  fn single_item_below_threshold() {
    let quote = policy().quote(&[PriceLine::new(dec!(15995), 1)]).unwrap();
    assert_eq!(quote.subtotal, dec!(15995));
    assert_eq!(quote.tax, dec!(2559));
    assert_eq!(quote.shipping, dec!(500));
    assert_eq!(quote.total, dec!(19054));
  }

  #[test]
  fn free_shipping_above_threshold() {
    let quote = policy()
      .quote(&[PriceLine::new(dec!(10000), 2), PriceLine::new(dec!(5000), 1)])
      .unwrap();
    assert_eq!(quote.subtotal, dec!(25000));
    assert_eq!(quote.tax, dec!(4000));
    assert_eq!(quote.shipping, dec!(0));
    assert_eq!(quote.total, dec!(29000));
  }

  #[test]
  fn threshold_boundary_is_inclusive() {
    let at = policy().quote(&[PriceLine::new(dec!(20000), 1)]).unwrap();
    assert_eq!(at.shipping, dec!(0));

    let below = policy().quote(&[PriceLine::new(dec!(19999), 1)]).unwrap();
    assert_eq!(below.shipping, dec!(500));
  }

  #[test]
  fn tax_rounds_half_away_from_zero() {
    let halves = PricingPolicy {
      tax_rate: dec!(0.5),
      ..policy()
    };
    let quote = halves.quote(&[PriceLine::new(dec!(3), 1)]).unwrap();
    assert_eq!(quote.tax, dec!(2));
    // 0.16 * 1003 = 160.48
    let quote = policy().quote(&[PriceLine::new(dec!(1003), 1)]).unwrap();
    assert_eq!(quote.tax, dec!(160));
  }

  #[test]
  fn free_items_are_allowed() {
    let quote = policy().quote(&[PriceLine::new(Decimal::ZERO, 3)]).unwrap();
    assert_eq!(quote.subtotal, Decimal::ZERO);
    assert_eq!(quote.total, dec!(500));
  }

  #[test]
  fn rejects_invalid_lines() {
    assert_eq!(policy().quote(&[]), Err(PricingError::Empty));
    assert_eq!(
      policy().quote(&[PriceLine::new(dec!(10), 1), PriceLine::new(dec!(-1), 1)]),
      Err(PricingError::NegativePrice {
        index: 1,
        price: dec!(-1)
      })
    );
    assert_eq!(
      policy().quote(&[PriceLine::new(dec!(10), 0)]),
      Err(PricingError::NonPositiveQuantity { index: 0, quantity: 0 })
    );
  }

  #[test]
  fn rejects_prices_finer_than_a_cent() {
    assert_eq!(
      policy().quote(&[PriceLine::new(dec!(0.333), 3)]),
      Err(PricingError::TooPrecise {
        index: 0,
        price: dec!(0.333)
      })
    );
    assert!(policy().quote(&[PriceLine::new(dec!(19.990), 1)]).is_ok());
  }

  #[test]
  fn huge_amounts_are_rejected_instead_of_overflowing() {
    assert_eq!(
      policy().quote(&[PriceLine::new(Decimal::MAX, 2)]),
      Err(PricingError::Overflow)
    );
    assert_eq!(
      policy().quote(&[PriceLine::new(MAX_AMOUNT, 1)]),
      Err(PricingError::Overflow)
    );
    assert!(policy().quote(&[PriceLine::new(dec!(1000000), 1)]).is_ok());
  }

  #[test]
  fn max_amount_matches_column_precision() {
    assert_eq!(MAX_AMOUNT, dec!(999999999999.99));
  }

  #[test]
  fn pricing_errors_become_validation_errors() {
    let err: AppError = PricingError::Empty.into();
    assert!(matches!(err, AppError::Validation(_)));
  }

  proptest! {
    #[test]
    fn breakdown_invariants_hold(lines in prop::collection::vec((0i64..5_000_000, 1i32..50), 1..12)) {
      let lines: Vec<PriceLine> = lines
        .into_iter()
        .map(|(cents, qty)| PriceLine::new(Decimal::new(cents, 2), qty))
        .collect();
      let policy = policy();
      let quote = policy.quote(&lines).unwrap();

      let expected_subtotal: Decimal = lines
        .iter()
        .map(|l| l.unit_price * Decimal::from(l.quantity))
        .sum();
      prop_assert_eq!(quote.subtotal, expected_subtotal);
      prop_assert_eq!(quote.total, quote.subtotal + quote.tax + quote.shipping);
      prop_assert_eq!(
        quote.tax,
        (quote.subtotal * dec!(0.16)).round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
      );
      if quote.subtotal >= dec!(20000) {
        prop_assert_eq!(quote.shipping, Decimal::ZERO);
      } else {
        prop_assert_eq!(quote.shipping, dec!(500));
      }
      prop_assert!(quote.total >= Decimal::ZERO);
    }
  }
}
