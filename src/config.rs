use rust_decimal_macros::dec;

use crate::{entity::setting, prelude::*};

/// Maximum depth of the referral up-line.
pub const MAX_REFERRAL_DEPTH: usize = 5;

/// Versioned snapshot of every financial knob. Calculations take a `&Rates`
/// argument instead of reading ambient global state, so stakes and referral
/// edges keep their creation-time terms no matter what is changed later.
#[derive(Clone, Debug, PartialEq)]
pub struct Rates {
  pub version: u32,
  /// USDT per GSD token.
  pub token_price: Decimal,
  /// Level-1 direct cashback rate. The legacy direct path paid 10% while
  /// the generic level table starts at 5%; both stay configurable until the
  /// platform owner settles on one.
  pub direct_rate: Decimal,
  /// Network commission rates for levels 1..=5.
  pub level_rates: [Decimal; MAX_REFERRAL_DEPTH],
  /// Share of a platform fee pool distributed to token holders.
  pub universal_pool_share: Decimal,
  pub weekly_target: Decimal,
  pub weekly_bonus: Decimal,
  pub monthly_target: Decimal,
  pub monthly_bonus: Decimal,
}

impl Default for Rates {
  fn default() -> Self {
    Self {
      version: 1,
      token_price: dec!(0.01),
      direct_rate: dec!(0.10),
      level_rates: [
        dec!(0.05),
        dec!(0.03),
        dec!(0.02),
        dec!(0.01),
        dec!(0.005),
      ],
      universal_pool_share: dec!(0.10),
      weekly_target: dec!(10000),
      weekly_bonus: dec!(100),
      monthly_target: dec!(100000),
      monthly_bonus: dec!(1000),
    }
  }
}

impl Rates {
  pub fn rate_for_level(&self, level: u32) -> Decimal {
    match level {
      1..=5 => self.level_rates[(level - 1) as usize],
      _ => Decimal::ZERO,
    }
  }

  /// Loads the defaults with any admin overrides from the settings table.
  pub async fn load(db: &DatabaseConnection) -> Result<Self> {
    let mut rates = Self::default();

    if let Some(setting) =
      setting::Entity::find_by_id("rates_version").one(db).await?
      && let Ok(version) = setting.value.parse()
    {
      rates.version = version;
    }

    if let Some(setting) =
      setting::Entity::find_by_id("token_price").one(db).await?
      && let Ok(price) = setting.value.parse()
    {
      rates.token_price = price;
    }

    if let Some(setting) =
      setting::Entity::find_by_id("direct_rate").one(db).await?
      && let Ok(rate) = setting.value.parse()
    {
      rates.direct_rate = rate;
    }

    Ok(rates)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn level_rates_decrease() {
    let rates = Rates::default();
    for level in 1..MAX_REFERRAL_DEPTH as u32 {
      assert!(rates.rate_for_level(level) > rates.rate_for_level(level + 1));
    }
    assert_eq!(rates.rate_for_level(0), Decimal::ZERO);
    assert_eq!(rates.rate_for_level(6), Decimal::ZERO);
  }
}
