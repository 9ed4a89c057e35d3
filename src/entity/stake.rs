use sea_orm::{entity::prelude::*, prelude::Decimal};
use serde::{Deserialize, Serialize};

use super::{account, package};

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
#[derive(EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum StakeStatus {
  #[sea_orm(string_value = "active")]
  #[default]
  Active,
  /// Terminal: reached via unlock, never left.
  #[sea_orm(string_value = "completed")]
  Completed,
  #[sea_orm(string_value = "cancelled")]
  Cancelled,
  #[sea_orm(string_value = "paused")]
  Paused,
}

/// A time-locked deposit. The package's yield and lock terms are copied
/// onto the stake at creation, so later package edits never alter running
/// stakes.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stakes")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  pub account_id: i32,
  pub package_id: i32,
  pub principal_amount: Decimal,
  pub daily_yield_percentage: Decimal,
  pub daily_reward_amount: Decimal,
  pub total_rewards_earned: Decimal,
  pub total_rewards_claimed: Decimal,
  pub start_date: DateTime,
  pub end_date: DateTime,
  pub unlock_date: DateTime,
  pub last_reward_date: Option<DateTime>,
  pub status: StakeStatus,
  pub is_locked: bool,
  pub lock_period_days: i32,
  pub days_elapsed: i32,
  pub days_remaining: i32,
  pub completion_percentage: Decimal,
  pub payment_tx_hash: Option<String>,
  pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "account::Entity",
    from = "Column::AccountId",
    to = "account::Column::Id"
  )]
  Account,
  #[sea_orm(
    belongs_to = "package::Entity",
    from = "Column::PackageId",
    to = "package::Column::Id"
  )]
  Package,
}

impl Related<account::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Account.def()
  }
}

impl Related<package::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Package.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
  pub fn can_unlock(&self, now: DateTime) -> bool {
    now >= self.unlock_date && self.status == StakeStatus::Active
  }
}
