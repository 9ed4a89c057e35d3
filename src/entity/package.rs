use sea_orm::{entity::prelude::*, prelude::Decimal};
use serde::{Deserialize, Serialize};

use super::stake;
use crate::{error::Result, ledger};

/// Admin-defined yield/lock template. Immutable once stakes reference it,
/// except for the availability flag.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "packages")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  #[sea_orm(unique)]
  pub name: String,
  pub description: Option<String>,
  pub min_stake: Decimal,
  pub max_stake: Option<Decimal>,
  /// Whole-number style daily yield: 0.05 means 0.05% per day.
  pub daily_yield_percentage: Decimal,
  pub lock_period_days: i32,
  pub is_active: bool,
  pub sort_order: i32,
  pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(has_many = "stake::Entity")]
  Stakes,
}

impl Related<stake::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Stakes.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
  pub fn is_available(&self) -> bool {
    self.is_active
  }

  pub fn daily_reward(&self, stake_amount: Decimal) -> Result<Decimal> {
    ledger::divide(
      ledger::multiply(stake_amount, self.daily_yield_percentage),
      Decimal::ONE_HUNDRED,
    )
  }

  pub fn total_reward(&self, stake_amount: Decimal) -> Result<Decimal> {
    Ok(ledger::multiply(
      self.daily_reward(stake_amount)?,
      Decimal::from(self.lock_period_days),
    ))
  }

  pub fn apy(&self) -> Decimal {
    ledger::multiply(self.daily_yield_percentage, Decimal::from(365))
  }
}
