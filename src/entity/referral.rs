use sea_orm::{entity::prelude::*, prelude::Decimal};
use serde::{Deserialize, Serialize};

use super::account;
use crate::ledger;

/// Directed, leveled edge between an ancestor (referrer) and a descendant
/// (referred) account. One row per (referrer, referred) pair; the level is
/// the chain distance recorded when the edge was created.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "referrals")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  pub referrer_id: i32,
  pub referred_id: i32,
  pub level: i32,
  /// Commission rate snapshot taken at edge creation.
  pub commission_rate: Decimal,
  pub total_earned: Decimal,
  /// Cumulative investment by the referred account, mirrored for reporting.
  pub total_invested: Decimal,
  pub direct_cashback_paid: Decimal,
  pub network_cashback_paid: Decimal,
  /// Ordered ancestor ids, comma-joined, root first, at most 5 entries.
  pub referral_path: Option<String>,
  pub is_qualified: bool,
  pub qualification_date: Option<DateTime>,
  pub is_active: bool,
  pub joined_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "account::Entity",
    from = "Column::ReferrerId",
    to = "account::Column::Id"
  )]
  Referrer,
  #[sea_orm(
    belongs_to = "account::Entity",
    from = "Column::ReferredId",
    to = "account::Column::Id"
  )]
  Referred,
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
  pub fn commission_amount(&self, investment: Decimal) -> Decimal {
    ledger::multiply(investment, self.commission_rate)
  }

  pub fn is_direct(&self) -> bool {
    self.level == 1
  }
}
