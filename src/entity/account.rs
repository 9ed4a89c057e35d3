use sea_orm::{entity::prelude::*, prelude::Decimal};
use serde::{Deserialize, Serialize};

use super::{Currency, stake, transaction, withdrawal};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  #[sea_orm(unique)]
  pub email: String,
  pub first_name: String,
  pub last_name: String,
  pub wallet_address: Option<String>,
  /// Public code handed out to invitees; immutable after creation.
  #[sea_orm(unique)]
  pub referral_code: String,
  /// Referral code of the upstream account. Weak reference, not ownership.
  pub referred_by: Option<String>,
  pub token_balance: Decimal,
  pub usdt_balance: Decimal,
  pub total_invested: Decimal,
  pub total_earned: Decimal,
  pub total_withdrawn: Decimal,
  pub is_active: bool,
  pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(has_many = "stake::Entity")]
  Stakes,
  #[sea_orm(has_many = "transaction::Entity")]
  Transactions,
  #[sea_orm(has_many = "withdrawal::Entity")]
  Withdrawals,
}

impl Related<stake::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Stakes.def()
  }
}

impl Related<transaction::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Transactions.def()
  }
}

impl Related<withdrawal::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Withdrawals.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
  pub fn balance(&self, currency: Currency) -> Decimal {
    match currency {
      Currency::Gsd => self.token_balance,
      Currency::Usdt => self.usdt_balance,
    }
  }
}
