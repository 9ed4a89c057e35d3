//! Fixed-precision decimal helpers for every balance mutation.
//!
//! Each operation rounds its result to 8 decimal places immediately so that
//! drift cannot compound across thousands of accrual events. All
//! currency-bearing arithmetic in the services must go through these
//! functions.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{Error, Result};

pub const SCALE: u32 = 8;

fn quantize(value: Decimal) -> Decimal {
  value.round_dp_with_strategy(SCALE, RoundingStrategy::MidpointAwayFromZero)
}

pub fn add(a: Decimal, b: Decimal) -> Decimal {
  quantize(a + b)
}

pub fn subtract(a: Decimal, b: Decimal) -> Decimal {
  quantize(a - b)
}

pub fn multiply(a: Decimal, b: Decimal) -> Decimal {
  quantize(a * b)
}

pub fn divide(a: Decimal, b: Decimal) -> Result<Decimal> {
  if b.is_zero() {
    return Err(Error::DivisionByZero);
  }
  Ok(quantize(a / b))
}

/// Folds with per-step rounding, same as the pairwise operations.
pub fn sum<I: IntoIterator<Item = Decimal>>(values: I) -> Decimal {
  values.into_iter().fold(Decimal::ZERO, add)
}
